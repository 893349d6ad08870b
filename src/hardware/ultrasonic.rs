use std::time::Duration;

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{InputPin, OutputPin};
use log::{debug, warn};

use super::clock::MonotonicClock;

/// トリガーパルス幅（µs）
pub const TRIGGER_PULSE_US: u32 = 10;

/// 各エッジ待ちの上限時間
pub const ECHO_EDGE_TIMEOUT: Duration = Duration::from_millis(100);

/// 超音波センサーのエラー
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UltrasonicError {
    #[error("エコー立ち上がり待ちがタイムアウトしました")]
    RisingEdgeTimeout,

    #[error("エコー立ち下がり待ちがタイムアウトしました")]
    FallingEdgeTimeout,

    #[error("GPIO操作に失敗しました: {0}")]
    Pin(String),
}

/// エコーパルス幅を返す距離センサー
pub trait RangeSensor {
    /// 1回測定します。有効なエコーが得られなければ `None`
    fn measure(&mut self) -> Option<Duration>;
}

/// HC-SR04 のパルス幅計測
///
/// 割り込みを使わずポーリングでエッジを待ちます。どちらの待ちループも
/// 毎回期限を確認するため、エコー線が High/Low に張り付いても必ず戻ります。
///
/// # 配線例（ESP32）
/// ```text
/// HC-SR04:
/// - VCC  -> 5V
/// - TRIG -> GPIO5
/// - ECHO -> GPIO18（5V→3.3V レベルシフタ経由）
/// - GND  -> GND
/// ```
pub struct PulseTimer<T: OutputPin, E, D, C> {
    trigger: T,
    echo: E,
    delay: D,
    clock: C,
    edge_timeout: Duration,
}

impl<T, E, D, C> PulseTimer<T, E, D, C>
where
    T: OutputPin,
    E: InputPin,
    D: DelayNs,
    C: MonotonicClock,
{
    /// トリガーをLowにした状態で作成します
    pub fn new(mut trigger: T, echo: E, delay: D, clock: C) -> Result<Self, UltrasonicError> {
        trigger.set_low().map_err(pin_error)?;
        Ok(Self {
            trigger,
            echo,
            delay,
            clock,
            edge_timeout: ECHO_EDGE_TIMEOUT,
        })
    }

    pub fn with_edge_timeout(mut self, timeout: Duration) -> Self {
        self.edge_timeout = timeout;
        self
    }

    /// トリガーを送ってエコーパルス幅を計測します
    pub fn try_measure(&mut self) -> Result<Duration, UltrasonicError> {
        let rise_deadline = self.clock.now() + self.edge_timeout;

        self.trigger.set_high().map_err(pin_error)?;
        self.delay.delay_us(TRIGGER_PULSE_US);
        self.trigger.set_low().map_err(pin_error)?;

        let mut pulse_start = self.clock.now();
        while self.echo.is_low().map_err(pin_error)? {
            pulse_start = self.clock.now();
            if pulse_start > rise_deadline {
                return Err(UltrasonicError::RisingEdgeTimeout);
            }
        }

        let mut pulse_end = self.clock.now();
        let fall_deadline = pulse_start + self.edge_timeout;
        while self.echo.is_high().map_err(pin_error)? {
            pulse_end = self.clock.now();
            if pulse_end > fall_deadline {
                return Err(UltrasonicError::FallingEdgeTimeout);
            }
        }

        Ok(pulse_end.saturating_sub(pulse_start))
    }
}

impl<T, E, D, C> RangeSensor for PulseTimer<T, E, D, C>
where
    T: OutputPin,
    E: InputPin,
    D: DelayNs,
    C: MonotonicClock,
{
    fn measure(&mut self) -> Option<Duration> {
        match self.try_measure() {
            Ok(pulse) => {
                debug!("エコーパルス幅: {}µs", pulse.as_micros());
                Some(pulse)
            }
            Err(e) => {
                warn!("超音波センサー測定失敗: {}", e);
                None
            }
        }
    }
}

impl<T: OutputPin, E, D, C> Drop for PulseTimer<T, E, D, C> {
    fn drop(&mut self) {
        // 解放時はトリガーをLowに戻す
        let _ = self.trigger.set_low();
    }
}

fn pin_error<E: std::fmt::Debug>(err: E) -> UltrasonicError {
    UltrasonicError::Pin(format!("{:?}", err))
}
