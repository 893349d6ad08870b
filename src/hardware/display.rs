use std::time::Duration;

use char_lcd::CharLcd;
use clearance_core::Verdict;
use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::I2c;
use log::{info, warn};

pub use char_lcd::Line;

/// 違反時の点滅回数
pub const FLASH_COUNT: usize = 3;
/// 点滅時の表示時間
pub const FLASH_ON: Duration = Duration::from_millis(500);
/// 点滅時の消灯時間
pub const FLASH_OFF: Duration = Duration::from_millis(300);
/// 停止メッセージの表示時間
pub const SHUTDOWN_HOLD: Duration = Duration::from_secs(2);

const VIOLATION_BANNER: &str = "** VIOLATION **";

/// 2行テキストディスプレイのインターフェース
///
/// 実機（I2C LCD）とテスト用(Mock)の実装を切り替えるためのトレイトです。
pub trait TextDisplay {
    type Error: std::fmt::Debug;

    fn init(&mut self) -> Result<(), Self::Error>;

    /// 指定行を16文字で上書き
    fn write_line(&mut self, line: Line, text: &str) -> Result<(), Self::Error>;

    fn clear(&mut self) -> Result<(), Self::Error>;
}

impl<I2C, D> TextDisplay for CharLcd<I2C, D>
where
    I2C: I2c,
    D: DelayNs,
{
    type Error = I2C::Error;

    fn init(&mut self) -> Result<(), Self::Error> {
        CharLcd::init(self)
    }

    fn write_line(&mut self, line: Line, text: &str) -> Result<(), Self::Error> {
        CharLcd::write_line(self, line, text)
    }

    fn clear(&mut self) -> Result<(), Self::Error> {
        CharLcd::clear(self)
    }
}

/// 検出器の状態をLCDに表示する
///
/// LCDは診断用の補助表示です。バスが無い（`None`）場合は何もせず、
/// 書き込みエラーはその場でログに出して呼び出し元には返しません。
pub struct StatusDisplay<T: TextDisplay, D: DelayNs> {
    display: Option<T>,
    delay: D,
    device_id: String,
}

impl<T: TextDisplay, D: DelayNs> StatusDisplay<T, D> {
    pub fn new(display: Option<T>, delay: D, device_id: &str) -> Self {
        if display.is_none() {
            warn!("LCDが利用できません。表示なしで動作します");
        }
        Self {
            display,
            delay,
            device_id: device_id.to_string(),
        }
    }

    pub fn is_available(&self) -> bool {
        self.display.is_some()
    }

    pub fn init(&mut self) {
        if self.apply("初期化", |d| d.init()) {
            info!("✓ LCD初期化完了");
        }
    }

    pub fn clear(&mut self) {
        self.apply("クリア", |d| d.clear());
    }

    pub fn show_lines(&mut self, line1: &str, line2: &str) {
        self.apply("書き込み", |d| d.write_line(Line::First, line1));
        self.apply("書き込み", |d| d.write_line(Line::Second, line2));
    }

    /// 1行目にデバイスID、2行目にメッセージ
    pub fn show_status(&mut self, message: &str) {
        let header = format!("Det: {}", self.device_id);
        self.show_lines(&header, message);
    }

    pub fn show_measurement(&mut self, verdict: &Verdict) {
        let banner = if verdict.is_violation() {
            VIOLATION_BANNER
        } else {
            "Status: CLEAR"
        };
        self.show_lines(banner, &format!("Ht: {:.2}ft", verdict.height().feet()));
    }

    /// 違反表示を点滅させ、最後に高さを表示したままにします
    pub fn flash_violation(&mut self, height_ft: f64, excess_ft: f64) {
        let detail = format!("H:{:.2} +{:.2}", height_ft, excess_ft);
        for _ in 0..FLASH_COUNT {
            self.show_lines(VIOLATION_BANNER, &detail);
            self.hold(FLASH_ON);
            self.clear();
            self.hold(FLASH_OFF);
        }
        self.show_lines(VIOLATION_BANNER, &format!("Height:{:.1}ft", height_ft));
    }

    pub fn show_sensor_error(&mut self) {
        self.show_lines("Sensor Error", "Out of range");
    }

    pub fn show_shutdown(&mut self) {
        self.show_lines("System", "Stopped");
    }

    pub fn hold(&mut self, duration: Duration) {
        self.delay.delay_ms(duration.as_millis() as u32);
    }

    /// バスがあれば操作を実行し、成功したかを返す
    fn apply<F>(&mut self, operation: &str, f: F) -> bool
    where
        F: FnOnce(&mut T) -> Result<(), T::Error>,
    {
        let Some(display) = self.display.as_mut() else {
            return false;
        };
        match f(display) {
            Ok(()) => true,
            Err(e) => {
                warn!("LCD{}エラー: {:?}", operation, e);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hardware::mock::{DisplayOp, MockDisplay, RecordingDelay};
    use clearance_core::{classify, Distance};

    fn status_display(mock: &MockDisplay, delay: &RecordingDelay) -> StatusDisplay<MockDisplay, RecordingDelay> {
        StatusDisplay::new(Some(mock.clone()), delay.clone(), "TEST_001")
    }

    #[test]
    fn test_show_status() {
        let mock = MockDisplay::new();
        let mut display = status_display(&mock, &RecordingDelay::new());
        display.show_status("Ready!");

        assert_eq!(
            mock.written_lines(),
            vec![
                (Line::First, "Det: TEST_001".to_string()),
                (Line::Second, "Ready!".to_string()),
            ]
        );
    }

    #[test]
    fn test_show_measurement_clear() {
        let mock = MockDisplay::new();
        let mut display = status_display(&mock, &RecordingDelay::new());
        let verdict = classify(Distance::from_cm(300.0).unwrap(), 450.0, 13.5);
        display.show_measurement(&verdict);

        assert_eq!(
            mock.written_lines(),
            vec![
                (Line::First, "Status: CLEAR".to_string()),
                (Line::Second, "Ht: 4.92ft".to_string()),
            ]
        );
    }

    #[test]
    fn test_flash_violation_sequence() {
        let mock = MockDisplay::new();
        let delay = RecordingDelay::new();
        let mut display = status_display(&mock, &delay);
        display.flash_violation(13.78, 0.28);

        let ops = mock.ops();
        let flash = vec![
            DisplayOp::Write(Line::First, "** VIOLATION **".to_string()),
            DisplayOp::Write(Line::Second, "H:13.78 +0.28".to_string()),
            DisplayOp::Clear,
        ];
        let mut expected = Vec::new();
        for _ in 0..FLASH_COUNT {
            expected.extend(flash.clone());
        }
        expected.push(DisplayOp::Write(Line::First, "** VIOLATION **".to_string()));
        expected.push(DisplayOp::Write(Line::Second, "Height:13.8ft".to_string()));
        assert_eq!(ops, expected);

        // 0.5秒表示 + 0.3秒消灯 を3回
        assert_eq!(delay.total(), (FLASH_ON + FLASH_OFF) * FLASH_COUNT as u32);
    }

    #[test]
    fn test_missing_bus_is_noop() {
        let delay = RecordingDelay::new();
        let mut display: StatusDisplay<MockDisplay, _> = StatusDisplay::new(None, delay.clone(), "TEST_001");
        assert!(!display.is_available());

        display.init();
        display.show_status("Initializing...");
        display.show_sensor_error();
        display.clear();
    }

    #[test]
    fn test_bus_error_does_not_propagate() {
        let mock = MockDisplay::new();
        mock.set_fail(true);
        let mut display = status_display(&mock, &RecordingDelay::new());

        display.init();
        display.show_shutdown();
        display.flash_violation(15.0, 1.5);
        assert!(mock.ops().is_empty());

        // 復旧後は通常どおり書き込める
        mock.set_fail(false);
        display.show_sensor_error();
        assert_eq!(
            mock.written_lines(),
            vec![
                (Line::First, "Sensor Error".to_string()),
                (Line::Second, "Out of range".to_string()),
            ]
        );
    }
}
