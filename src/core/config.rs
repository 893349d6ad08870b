use std::time::Duration;

use chrono_tz::Tz;

use crate::core::config_validation::{
    parse_clearance_height, parse_heartbeat_every, parse_measurement_interval_ms,
    parse_mount_height, parse_timezone, validate_broker_url, validate_device_id, ValidationError,
};

/// アプリケーション設定
///
/// この構造体はビルド時に`cfg.toml`ファイルから読み込まれた設定を保持します。
/// `cfg.toml` が無い場合は各フィールドのデフォルト値が使われます。
#[toml_cfg::toml_config]
pub struct Config {
    #[default("")]
    wifi_ssid: &'static str,

    #[default("")]
    wifi_password: &'static str,

    #[default("mqtt://192.168.1.152:1883")]
    mqtt_broker_url: &'static str,

    #[default("TEST_001")]
    device_id: &'static str,

    #[default("Main Street Bridge")]
    location: &'static str,

    // toml-cfg では小数を文字列で受け取り、load() でパースする
    #[default("13.5")]
    clearance_height_ft: &'static str,

    #[default(450)] // 4.5m ≈ 14.76ft
    sensor_mount_height_cm: u32,

    #[default(2000)]
    measurement_interval_ms: u32,

    #[default(10)]
    heartbeat_every: u32,

    #[default(true)]
    lcd_enabled: bool,

    #[default(0x27)] // 基板によっては 0x3F
    lcd_i2c_address: u8,

    #[default("UTC")]
    timezone: &'static str,
}

/// 設定エラー
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("制限高さの値が無効です: {0}")]
    InvalidClearanceHeight(String),
    #[error("センサー取り付け高さの値が無効です: {0}cm")]
    InvalidMountHeight(u32),
    #[error("デバイスIDが無効です（空、空白、'/', '+', '#' は使用不可）: '{0}'")]
    InvalidDeviceId(String),
    #[error("MQTTブローカーURLが無効です: {0}")]
    InvalidBrokerUrl(String),
    #[error("タイムゾーンが無効です: {0}")]
    InvalidTimezone(String),
    #[error("heartbeat_every は1以上である必要があります: {0}")]
    InvalidHeartbeatEvery(u32),
    #[error("測定間隔が短すぎます（60ms以上）: {0}ms")]
    InvalidMeasurementInterval(u32),
}

/// アプリケーション設定を表す構造体
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// WiFi SSID
    pub wifi_ssid: String,

    /// WiFi パスワード（オープンネットワークなら空）
    pub wifi_password: String,

    /// MQTTブローカーURL (mqtt://host:port)
    pub mqtt_broker_url: String,

    /// デバイスID（MQTTトピックとLCDに表示）
    pub device_id: String,

    /// 設置場所（違反レポートに含める）
    pub location: String,

    /// 制限高さ（feet）
    pub clearance_height_ft: f64,

    /// 地面からのセンサー取り付け高さ（cm）
    pub sensor_mount_height_cm: f64,

    /// 測定サイクル間の待機時間
    pub measurement_interval: Duration,

    /// ハートビート送信間隔（測定サイクル数）
    pub heartbeat_every: u32,

    /// LCDを使用するか
    pub lcd_enabled: bool,

    /// LCD (PCF8574) のI2Cアドレス
    pub lcd_i2c_address: u8,

    /// タイムスタンプのタイムゾーン
    pub timezone: Tz,
}

impl AppConfig {
    /// 設定ファイルから設定をロードします
    pub fn load() -> Result<Self, ConfigError> {
        // toml_cfg によって生成された定数
        let config = CONFIG;

        validate_device_id(config.device_id).map_err(map_validation_error)?;
        validate_broker_url(config.mqtt_broker_url).map_err(map_validation_error)?;

        let clearance_height_ft =
            parse_clearance_height(config.clearance_height_ft).map_err(map_validation_error)?;
        let sensor_mount_height_cm =
            parse_mount_height(config.sensor_mount_height_cm).map_err(map_validation_error)?;
        let interval_ms =
            parse_measurement_interval_ms(config.measurement_interval_ms).map_err(map_validation_error)?;
        let heartbeat_every =
            parse_heartbeat_every(config.heartbeat_every).map_err(map_validation_error)?;
        let timezone = parse_timezone(config.timezone).map_err(map_validation_error)?;

        Ok(AppConfig {
            wifi_ssid: config.wifi_ssid.to_string(),
            wifi_password: config.wifi_password.to_string(),
            mqtt_broker_url: config.mqtt_broker_url.to_string(),
            device_id: config.device_id.to_string(),
            location: config.location.to_string(),
            clearance_height_ft,
            sensor_mount_height_cm,
            measurement_interval: Duration::from_millis(interval_ms as u64),
            heartbeat_every,
            lcd_enabled: config.lcd_enabled,
            lcd_i2c_address: config.lcd_i2c_address,
            timezone,
        })
    }

    /// センサー取り付け高さ（feet）
    pub fn sensor_mount_height_ft(&self) -> f64 {
        self.sensor_mount_height_cm * clearance_core::CM_TO_FEET
    }
}

fn map_validation_error(err: ValidationError) -> ConfigError {
    match err {
        ValidationError::InvalidClearanceHeight(v) => ConfigError::InvalidClearanceHeight(v),
        ValidationError::InvalidMountHeight(v) => ConfigError::InvalidMountHeight(v),
        ValidationError::InvalidDeviceId(v) => ConfigError::InvalidDeviceId(v),
        ValidationError::InvalidBrokerUrl(v) => ConfigError::InvalidBrokerUrl(v),
        ValidationError::InvalidTimezone(v) => ConfigError::InvalidTimezone(v),
        ValidationError::InvalidHeartbeatEvery(v) => ConfigError::InvalidHeartbeatEvery(v),
        ValidationError::InvalidMeasurementInterval(v) => ConfigError::InvalidMeasurementInterval(v),
    }
}
