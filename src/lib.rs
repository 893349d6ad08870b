/*!
 * # Clearance Detector Library
 *
 * 超音波センサー（HC-SR04）で通過車両の高さを測定し、制限高さを超えた車両を
 * 1602 I2C LCD に表示して MQTT で通知するためのライブラリ
 *
 * ## モジュール構成
 * - `core`: アプリケーションの核となる機能（設定、測定ループ、レポート）
 * - `hardware`: ハードウェア制御（超音波センサー、LCD、停止ボタン、ピン設定）
 * - `communication`: 通信機能（MQTT、WiFi/SNTP）
 *
 * 距離・高さの計算は `clearance-core`、LCDのバスプロトコルは `char-lcd` クレートにあります。
 */

// 公開モジュール
pub mod communication;
pub mod core;
pub mod hardware;

// 内部で使用する型をまとめてエクスポート
pub use clearance_core::{classify, to_distance, Distance, Severity, VehicleHeight, Verdict};
pub use self::core::{
    AppConfig, ConfigError, CycleOutcome, CycleSettings, MeasurementCycle, Report, ReportContext,
    ReportError, Reporter, StopSignal,
};
pub use hardware::{PulseTimer, RangeSensor, StatusDisplay, StopButton, TextDisplay};

/// ライブラリのバージョン情報
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
