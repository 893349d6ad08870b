/// コアシステムモジュール
pub mod config;
pub mod config_validation;
pub mod heartbeat;
pub mod measurement_cycle;
pub mod report;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

pub use config::{AppConfig, ConfigError};
pub use heartbeat::HeartbeatCounter;
pub use measurement_cycle::{CycleOutcome, CycleSettings, MeasurementCycle};
pub use report::{Report, ReportContext, ReportError, Reporter};

/// 測定ループの停止要求
///
/// ループはサイクルの合間にだけ確認します。
pub trait StopSignal {
    fn stop_requested(&mut self) -> bool;
}

impl StopSignal for Arc<AtomicBool> {
    fn stop_requested(&mut self) -> bool {
        self.load(Ordering::SeqCst)
    }
}
