use std::time::Duration;

use char_lcd::CharLcd;
use esp_idf_hal::{
    delay::Delay,
    gpio::{PinDriver, Pull},
    i2c::{I2cConfig, I2cDriver},
    prelude::*,
};
use esp_idf_svc::{eventloop::EspSystemEventLoop, hal::peripherals::Peripherals, nvs::EspDefaultNvsPartition};
use log::{error, info, warn};

use clearance_detector::communication::{MqttReporter, NetworkManager};
use clearance_detector::core::{AppConfig, CycleSettings, MeasurementCycle};
use clearance_detector::hardware::{DetectorPins, PulseTimer, StatusDisplay, StopButton, SystemClock};

/// MQTT接続完了を待つ時間
const MQTT_CONNECT_WAIT: Duration = Duration::from_secs(5);

/// アプリケーションのメインエントリーポイント
fn main() -> anyhow::Result<()> {
    // ESP-IDFの基本初期化
    esp_idf_sys::link_patches();
    esp_idf_svc::log::EspLogger::initialize_default();

    // 設定ファイル読み込み
    let config = AppConfig::load().map_err(|e| {
        error!("設定ファイルの読み込みに失敗しました: {}", e);
        anyhow::anyhow!("設定ファイルの読み込みエラー: {}", e)
    })?;

    info!("==================================================");
    info!("Municipal Clearance Detector - {}", config.device_id);
    info!("設置場所: {}", config.location);
    info!("制限高さ: {} ft", config.clearance_height_ft);
    info!("センサー高さ: {:.2} ft", config.sensor_mount_height_ft());
    info!("バージョン: {}", clearance_detector::VERSION);
    info!("==================================================");

    // ペリフェラルとシステムリソースの初期化
    info!("ペリフェラルを初期化しています");
    let peripherals = Peripherals::take()?;
    let sysloop = EspSystemEventLoop::take()?;
    let nvs_partition = EspDefaultNvsPartition::take()?;

    let pins = peripherals.pins;
    let detector_pins = DetectorPins::new(pins.gpio5, pins.gpio18, pins.gpio21, pins.gpio22, pins.gpio0);
    let delay = Delay::new_default();

    // LCD（使えなくても測定は続ける）
    let lcd = if config.lcd_enabled {
        let i2c_config = I2cConfig::new().baudrate(100.kHz().into());
        match I2cDriver::new(peripherals.i2c0, detector_pins.sda, detector_pins.scl, &i2c_config) {
            Ok(i2c) => {
                info!("✓ I2Cバス初期化完了 (LCDアドレス: 0x{:02X})", config.lcd_i2c_address);
                Some(CharLcd::new(i2c, delay, config.lcd_i2c_address))
            }
            Err(e) => {
                warn!("✗ I2C初期化に失敗しました: {:?}", e);
                None
            }
        }
    } else {
        info!("LCDは無効に設定されています");
        None
    };

    let mut display = StatusDisplay::new(lcd, delay, &config.device_id);
    display.init();
    display.hold(Duration::from_millis(500));
    display.show_status("Initializing...");
    display.hold(Duration::from_secs(2));

    // ネットワーク（失敗しても測定とLCD表示は続ける）
    let wifi = match NetworkManager::connect_wifi(peripherals.modem, &sysloop, &nvs_partition, &config) {
        Ok(wifi) => Some(wifi),
        Err(e) => {
            error!("WiFi接続に失敗しました: {:?}", e);
            None
        }
    };

    let _sntp = if wifi.is_some() {
        NetworkManager::sync_time()
            .map_err(|e| warn!("SNTP初期化に失敗しました: {:?}", e))
            .ok()
    } else {
        None
    };

    let reporter = if wifi.is_some() {
        match MqttReporter::connect(&config) {
            Ok(reporter) => {
                if reporter.wait_connected(MQTT_CONNECT_WAIT) {
                    display.show_status("MQTT Connected");
                } else {
                    warn!("MQTTブローカーへの接続を待機中です（バックグラウンドで再試行）");
                }
                Some(reporter)
            }
            Err(e) => {
                error!("✗ MQTTクライアントの作成に失敗しました: {}", e);
                None
            }
        }
    } else {
        None
    };

    // 超音波センサーと停止ボタン
    let trigger = PinDriver::output(detector_pins.trigger)?;
    let echo = PinDriver::input(detector_pins.echo)?;
    let sensor = PulseTimer::new(trigger, echo, delay, SystemClock::new())?;

    let mut stop_pin = PinDriver::input(detector_pins.stop_button)?;
    stop_pin.set_pull(Pull::Up)?;
    let mut stop_button = StopButton::new(stop_pin);

    display.show_status("Ready!");
    display.hold(Duration::from_secs(1));

    let mut cycle = MeasurementCycle::new(sensor, display, reporter, delay, CycleSettings::from_config(&config));
    cycle.run(&mut stop_button);

    info!("検出器は停止しました");
    Ok(())
}
