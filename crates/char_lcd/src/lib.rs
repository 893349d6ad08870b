//! HD44780 16x2 character LCD driver for the PCF8574 I2C backpack.
//!
//! The backpack exposes the LCD's 4-bit parallel interface through a single
//! I2C port expander byte:
//!
//! ```text
//! bit 7..4  data nibble (D7..D4)
//! bit 3     backlight
//! bit 2     EN (strobe)
//! bit 1     RW (always 0, write only)
//! bit 0     RS (0 = command, 1 = data)
//! ```
//!
//! Each byte goes out as two nibbles, each latched by an EN pulse with a
//! settle delay around the falling edge.

#![cfg_attr(not(test), no_std)]

use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::I2c;

/// Default PCF8574 address (0x3F on some boards).
pub const DEFAULT_ADDRESS: u8 = 0x27;

/// Characters per row.
pub const LINE_WIDTH: usize = 16;

const BACKLIGHT: u8 = 0x08;
const ENABLE: u8 = 0b0000_0100;

/// Settle time around each strobe transition.
const STROBE_SETTLE_US: u32 = 500;
/// The controller executes "clear display" internally; writes issued before
/// this elapses are lost or garbled.
const CLEAR_SETTLE_MS: u32 = 5;

/// Commands used by this driver.
pub mod command {
    /// Two priming writes that leave the controller in 4-bit mode.
    pub const INIT_8BIT: u8 = 0x33;
    pub const INIT_4BIT: u8 = 0x32;
    /// Cursor moves right after each write.
    pub const ENTRY_MODE_INCREMENT: u8 = 0x06;
    /// Display on, cursor off, blink off.
    pub const DISPLAY_ON: u8 = 0x0C;
    /// 4-bit bus, 2 lines, 5x7 font.
    pub const FUNCTION_SET_2LINE: u8 = 0x28;
    pub const CLEAR: u8 = 0x01;
    pub const LINE1_ADDRESS: u8 = 0x80;
    pub const LINE2_ADDRESS: u8 = 0xC0;
}

/// RS line level for a byte transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Command = 0,
    Data = 1,
}

/// Row on the 2-line display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Line {
    First,
    Second,
}

impl Line {
    fn address(self) -> u8 {
        match self {
            Line::First => command::LINE1_ADDRESS,
            Line::Second => command::LINE2_ADDRESS,
        }
    }
}

/// Render `text` as exactly [`LINE_WIDTH`] display bytes: left-anchored,
/// space-padded when short, truncated when long. Characters outside printable
/// ASCII are shown as `?`.
pub fn format_line(text: &str) -> [u8; LINE_WIDTH] {
    let mut line = [b' '; LINE_WIDTH];
    for (slot, ch) in line.iter_mut().zip(text.chars()) {
        *slot = if (' '..='~').contains(&ch) { ch as u8 } else { b'?' };
    }
    line
}

pub struct CharLcd<I2C, D> {
    i2c: I2C,
    delay: D,
    address: u8,
}

impl<I2C, D> CharLcd<I2C, D>
where
    I2C: I2c,
    D: DelayNs,
{
    pub fn new(i2c: I2C, delay: D, address: u8) -> Self {
        Self { i2c, delay, address }
    }

    /// Run the power-on sequence and leave the display cleared.
    pub fn init(&mut self) -> Result<(), I2C::Error> {
        self.write_byte(command::INIT_8BIT, Mode::Command)?;
        self.write_byte(command::INIT_4BIT, Mode::Command)?;
        self.write_byte(command::ENTRY_MODE_INCREMENT, Mode::Command)?;
        self.write_byte(command::DISPLAY_ON, Mode::Command)?;
        self.write_byte(command::FUNCTION_SET_2LINE, Mode::Command)?;
        self.clear()
    }

    pub fn clear(&mut self) -> Result<(), I2C::Error> {
        self.write_byte(command::CLEAR, Mode::Command)?;
        self.delay.delay_ms(CLEAR_SETTLE_MS);
        Ok(())
    }

    /// Move to the start of `line` and overwrite all 16 cells.
    pub fn write_line(&mut self, line: Line, text: &str) -> Result<(), I2C::Error> {
        self.write_byte(line.address(), Mode::Command)?;
        for byte in format_line(text) {
            self.write_byte(byte, Mode::Data)?;
        }
        Ok(())
    }

    pub fn write_byte(&mut self, byte: u8, mode: Mode) -> Result<(), I2C::Error> {
        let rs = mode as u8;
        self.write_nibble(rs | (byte & 0xF0))?;
        self.write_nibble(rs | ((byte << 4) & 0xF0))
    }

    /// Put one nibble (already shifted into bits 7..4, plus RS) on the bus
    /// and latch it with an EN pulse.
    fn write_nibble(&mut self, bits: u8) -> Result<(), I2C::Error> {
        let bits = bits | BACKLIGHT;
        self.i2c.write(self.address, &[bits])?;
        self.i2c.write(self.address, &[bits | ENABLE])?;
        self.delay.delay_us(STROBE_SETTLE_US);
        self.i2c.write(self.address, &[bits & !ENABLE])?;
        self.delay.delay_us(STROBE_SETTLE_US);
        Ok(())
    }

    /// Give back the bus and delay.
    pub fn release(self) -> (I2C, D) {
        (self.i2c, self.delay)
    }
}
