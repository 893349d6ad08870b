use embedded_hal::digital::InputPin;
use log::{info, warn};

use crate::core::StopSignal;

/// 停止ボタン（押下でLow、内部プルアップ前提）
///
/// ESP32 では BOOT ボタン (GPIO0) をそのまま使えます。
pub struct StopButton<P: InputPin> {
    pin: P,
}

impl<P: InputPin> StopButton<P> {
    pub fn new(pin: P) -> Self {
        Self { pin }
    }
}

impl<P: InputPin> StopSignal for StopButton<P> {
    fn stop_requested(&mut self) -> bool {
        match self.pin.is_low() {
            Ok(true) => {
                info!("停止ボタンが押されました");
                true
            }
            Ok(false) => false,
            Err(e) => {
                warn!("停止ボタンの読み取りに失敗: {:?}", e);
                false
            }
        }
    }
}
