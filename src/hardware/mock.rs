//! テスト用のハードウェアモック
//!
//! 実機なしでセンサー・LCD・遅延をシミュレートします。
//! 記録された操作はテストで検証できます。

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::convert::Infallible;
use std::rc::Rc;
use std::time::Duration;

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{ErrorType, InputPin, OutputPin};

use super::clock::MonotonicClock;
use super::display::{Line, TextDisplay};
use super::ultrasonic::RangeSensor;

/// 読むたびに `tick` だけ進むクロック
#[derive(Debug, Clone)]
pub struct FakeClock {
    now: Rc<Cell<Duration>>,
    tick: Duration,
}

impl FakeClock {
    pub fn new(tick: Duration) -> Self {
        Self {
            now: Rc::new(Cell::new(Duration::ZERO)),
            tick,
        }
    }

    /// これまでに進んだ時間
    pub fn elapsed(&self) -> Duration {
        self.now.get()
    }
}

impl MonotonicClock for FakeClock {
    fn now(&self) -> Duration {
        let t = self.now.get() + self.tick;
        self.now.set(t);
        t
    }
}

/// クロック上の時刻に応じてレベルが決まるエコー入力
///
/// `rise_at <= t < fall_at` の間だけ High になります。
#[derive(Debug, Clone)]
pub struct SimulatedEcho {
    now: Rc<Cell<Duration>>,
    rise_at: Option<Duration>,
    fall_at: Option<Duration>,
}

impl SimulatedEcho {
    /// `rise_at` から `width` だけ High になるパルス
    pub fn pulse(clock: &FakeClock, rise_at: Duration, width: Duration) -> Self {
        Self {
            now: clock.now.clone(),
            rise_at: Some(rise_at),
            fall_at: Some(rise_at + width),
        }
    }

    /// センサー未接続など、Low に張り付いた入力
    pub fn never_rises(clock: &FakeClock) -> Self {
        Self {
            now: clock.now.clone(),
            rise_at: None,
            fall_at: None,
        }
    }

    /// `rise_at` 以降 High に張り付いた入力
    pub fn never_falls(clock: &FakeClock, rise_at: Duration) -> Self {
        Self {
            now: clock.now.clone(),
            rise_at: Some(rise_at),
            fall_at: None,
        }
    }

    fn level(&self) -> bool {
        let t = self.now.get();
        match (self.rise_at, self.fall_at) {
            (Some(rise), Some(fall)) => rise <= t && t < fall,
            (Some(rise), None) => rise <= t,
            _ => false,
        }
    }
}

impl ErrorType for SimulatedEcho {
    type Error = Infallible;
}

impl InputPin for SimulatedEcho {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        Ok(self.level())
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        Ok(!self.level())
    }
}

/// 出力レベルの履歴を記録するトリガーピン
#[derive(Debug, Clone, Default)]
pub struct MockTrigger {
    levels: Rc<RefCell<Vec<bool>>>,
}

impl MockTrigger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn levels(&self) -> Vec<bool> {
        self.levels.borrow().clone()
    }
}

impl ErrorType for MockTrigger {
    type Error = Infallible;
}

impl OutputPin for MockTrigger {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.levels.borrow_mut().push(false);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.levels.borrow_mut().push(true);
        Ok(())
    }
}

/// 実際には待たずに待機時間を合計する遅延
#[derive(Debug, Clone, Default)]
pub struct RecordingDelay {
    total_ns: Rc<Cell<u64>>,
    calls: Rc<RefCell<Vec<u32>>>,
}

impl RecordingDelay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn total(&self) -> Duration {
        Duration::from_nanos(self.total_ns.get())
    }

    /// 各呼び出しの待機時間（ns）
    pub fn calls(&self) -> Vec<u32> {
        self.calls.borrow().clone()
    }

    pub fn reset(&self) {
        self.total_ns.set(0);
        self.calls.borrow_mut().clear();
    }
}

impl DelayNs for RecordingDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.total_ns.set(self.total_ns.get() + ns as u64);
        self.calls.borrow_mut().push(ns);
    }
}

/// 事前に積んだパルス幅を順番に返すセンサー
#[derive(Debug, Clone, Default)]
pub struct ScriptedSensor {
    readings: Rc<RefCell<VecDeque<Option<Duration>>>>,
    measure_calls: Rc<Cell<usize>>,
}

impl ScriptedSensor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn queue_pulse(&self, pulse: Duration) {
        self.readings.borrow_mut().push_back(Some(pulse));
    }

    /// 距離（cm）に対応するパルス幅を積む
    pub fn queue_distance_cm(&self, cm: f64) {
        self.queue_pulse(Duration::from_secs_f64(
            cm * 2.0 / clearance_core::SPEED_OF_SOUND_CM_PER_S,
        ));
    }

    pub fn queue_timeout(&self) {
        self.readings.borrow_mut().push_back(None);
    }

    pub fn measure_calls(&self) -> usize {
        self.measure_calls.get()
    }
}

impl RangeSensor for ScriptedSensor {
    fn measure(&mut self) -> Option<Duration> {
        self.measure_calls.set(self.measure_calls.get() + 1);
        self.readings.borrow_mut().pop_front().flatten()
    }
}

/// LCDに対する操作
#[derive(Debug, Clone, PartialEq)]
pub enum DisplayOp {
    Init,
    Clear,
    Write(Line, String),
}

/// 操作を記録するテキストディスプレイ
#[derive(Debug, Clone, Default)]
pub struct MockDisplay {
    ops: Rc<RefCell<Vec<DisplayOp>>>,
    fail: Rc<Cell<bool>>,
}

/// MockDisplay のバスエラー
#[derive(Debug, Clone, PartialEq)]
pub struct MockBusError;

impl MockDisplay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ops(&self) -> Vec<DisplayOp> {
        self.ops.borrow().clone()
    }

    pub fn clear_ops(&self) {
        self.ops.borrow_mut().clear();
    }

    /// 書き込まれた行テキストだけを取り出す
    pub fn written_lines(&self) -> Vec<(Line, String)> {
        self.ops
            .borrow()
            .iter()
            .filter_map(|op| match op {
                DisplayOp::Write(line, text) => Some((*line, text.clone())),
                _ => None,
            })
            .collect()
    }

    /// テスト用: バスエラーをシミュレート
    pub fn set_fail(&self, enable: bool) {
        self.fail.set(enable);
    }

    fn record(&self, op: DisplayOp) -> Result<(), MockBusError> {
        if self.fail.get() {
            return Err(MockBusError);
        }
        self.ops.borrow_mut().push(op);
        Ok(())
    }
}

impl TextDisplay for MockDisplay {
    type Error = MockBusError;

    fn init(&mut self) -> Result<(), Self::Error> {
        self.record(DisplayOp::Init)
    }

    fn write_line(&mut self, line: Line, text: &str) -> Result<(), Self::Error> {
        self.record(DisplayOp::Write(line, text.to_string()))
    }

    fn clear(&mut self) -> Result<(), Self::Error> {
        self.record(DisplayOp::Clear)
    }
}
