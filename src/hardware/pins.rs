use esp_idf_svc::hal::gpio::*;

/// 検出器のピン設定構造体
///
/// - TRIG: GPIO5
/// - ECHO: GPIO18（HC-SR04 は 5V 出力のためレベルシフタ経由）
/// - LCD SDA/SCL: GPIO21 / GPIO22
/// - 停止ボタン: GPIO0 (BOOT)
pub struct DetectorPins {
    pub trigger: Gpio5,
    pub echo: Gpio18,
    pub sda: Gpio21,
    pub scl: Gpio22,
    pub stop_button: Gpio0,
}

impl DetectorPins {
    /// 個別のピンから作成
    pub fn new(trigger: Gpio5, echo: Gpio18, sda: Gpio21, scl: Gpio22, stop_button: Gpio0) -> Self {
        Self {
            trigger,
            echo,
            sda,
            scl,
            stop_button,
        }
    }
}
