use std::time::Duration;

use chrono_tz::Tz;
use clearance_core::{classify, to_distance, Distance, Verdict};
use embedded_hal::delay::DelayNs;
use log::{debug, info, warn};

use super::config::AppConfig;
use super::heartbeat::HeartbeatCounter;
use super::report::{timestamp_now, Report, ReportContext, Reporter};
use super::StopSignal;
use crate::hardware::display::{StatusDisplay, TextDisplay, SHUTDOWN_HOLD};
use crate::hardware::ultrasonic::RangeSensor;

/// 違反表示を残しておく時間
pub const VIOLATION_DWELL: Duration = Duration::from_secs(3);

/// 測定ループの設定
#[derive(Debug, Clone)]
pub struct CycleSettings {
    pub report: ReportContext,
    pub sensor_mount_height_cm: f64,
    pub clearance_height_ft: f64,
    pub interval: Duration,
    pub heartbeat_every: u32,
    pub timezone: Tz,
}

impl CycleSettings {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            report: ReportContext {
                device_id: config.device_id.clone(),
                location: config.location.clone(),
                clearance_height_ft: config.clearance_height_ft,
            },
            sensor_mount_height_cm: config.sensor_mount_height_cm,
            clearance_height_ft: config.clearance_height_ft,
            interval: config.measurement_interval,
            heartbeat_every: config.heartbeat_every,
            timezone: config.timezone,
        }
    }
}

/// 1サイクルの結果
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CycleOutcome {
    /// 有効な距離が得られ、判定まで完了した
    Measured { distance: Distance, verdict: Verdict },
    /// エコーが得られないか測定範囲外
    SensorError,
}

impl CycleOutcome {
    pub fn verdict(&self) -> Option<Verdict> {
        match self {
            CycleOutcome::Measured { verdict, .. } => Some(*verdict),
            CycleOutcome::SensorError => None,
        }
    }

    pub fn is_violation(&self) -> bool {
        self.verdict().is_some_and(|v| v.is_violation())
    }
}

/// 測定 → 判定 → 表示 → 送信 を繰り返す検出ループ
///
/// センサー・ディスプレイ・送信先を所有し、破棄時に停止表示を出して
/// ディスプレイをクリアします。ループ中のエラーはすべてログに出して継続します。
pub struct MeasurementCycle<S, T, D, R>
where
    S: RangeSensor,
    T: TextDisplay,
    D: DelayNs,
    R: Reporter,
{
    sensor: S,
    display: StatusDisplay<T, D>,
    reporter: R,
    delay: D,
    settings: CycleSettings,
    heartbeat: HeartbeatCounter,
    cycles: u64,
    shut_down: bool,
}

impl<S, T, D, R> MeasurementCycle<S, T, D, R>
where
    S: RangeSensor,
    T: TextDisplay,
    D: DelayNs,
    R: Reporter,
{
    pub fn new(sensor: S, display: StatusDisplay<T, D>, reporter: R, delay: D, settings: CycleSettings) -> Self {
        let heartbeat = HeartbeatCounter::new(settings.heartbeat_every);
        Self {
            sensor,
            display,
            reporter,
            delay,
            settings,
            heartbeat,
            cycles: 0,
            shut_down: false,
        }
    }

    pub fn settings(&self) -> &CycleSettings {
        &self.settings
    }

    /// 完了したサイクル数
    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    pub fn reporter(&self) -> &R {
        &self.reporter
    }

    /// 1回分の測定と後処理を行います（測定間隔の待機は含みません）
    pub fn run_once(&mut self) -> CycleOutcome {
        let outcome = match self.sensor.measure().and_then(to_distance) {
            Some(distance) => {
                let verdict = classify(
                    distance,
                    self.settings.sensor_mount_height_cm,
                    self.settings.clearance_height_ft,
                );
                self.handle_verdict(distance, verdict);
                CycleOutcome::Measured { distance, verdict }
            }
            None => {
                warn!("✗ 測定失敗: 範囲外またはエコーなし");
                self.display.show_sensor_error();
                CycleOutcome::SensorError
            }
        };

        if self.heartbeat.tick() {
            let report = self.settings.report.heartbeat(self.timestamp());
            self.publish(&report);
        }

        self.cycles += 1;
        outcome
    }

    /// 停止要求が来るまで測定を繰り返し、最後に停止処理を行います
    ///
    /// 停止要求はサイクルの合間にだけ確認するため、実行中のサイクルは最後まで完了します。
    pub fn run<P: StopSignal>(&mut self, stop: &mut P) {
        info!(
            "測定ループ開始: 間隔 {}ms, ハートビート {}サイクルごと",
            self.settings.interval.as_millis(),
            self.settings.heartbeat_every
        );

        while !stop.stop_requested() {
            self.run_once();
            self.wait(self.settings.interval);
        }

        info!("検出器を停止します（{}サイクル実行）", self.cycles);
        self.shutdown();
    }

    /// 停止表示を出してディスプレイをクリアします。2回目以降は何もしません
    pub fn shutdown(&mut self) {
        if self.shut_down {
            return;
        }
        self.shut_down = true;

        self.display.show_shutdown();
        self.wait(SHUTDOWN_HOLD);
        self.display.clear();
        info!("✓ クリーンアップ完了");
    }

    fn handle_verdict(&mut self, distance: Distance, verdict: Verdict) {
        let report = self
            .settings
            .report
            .verdict_report(&verdict, distance, self.timestamp());

        match verdict {
            Verdict::Violation { height, excess, severity } => {
                warn!(
                    "⚠️ 違反検出: 高さ {:.2}ft, 超過 {:.2}ft ({})",
                    height.feet(),
                    excess,
                    severity.as_str()
                );
                self.display.flash_violation(height.feet(), excess);
                if self.publish(&report) {
                    info!("違反を送信: {:.2}ft (超過 {:.2}ft)", height.feet(), excess);
                }
                self.wait(VIOLATION_DWELL);
            }
            Verdict::Clear { height } => {
                info!("✓ 高さ {:.2}ft (制限内)", height.feet());
                self.display.show_measurement(&verdict);
                self.publish(&report);
            }
        }
    }

    /// 送信に失敗してもループは止めない
    fn publish(&mut self, report: &Report) -> bool {
        match self.reporter.publish(report) {
            Ok(()) => {
                debug!("送信完了: {}", report.topic());
                true
            }
            Err(e) => {
                warn!("送信失敗 ({}): {}", report.topic(), e);
                false
            }
        }
    }

    fn timestamp(&self) -> String {
        timestamp_now(&self.settings.timezone)
    }

    fn wait(&mut self, duration: Duration) {
        self.delay.delay_ms(duration.as_millis() as u32);
    }
}

impl<S, T, D, R> Drop for MeasurementCycle<S, T, D, R>
where
    S: RangeSensor,
    T: TextDisplay,
    D: DelayNs,
    R: Reporter,
{
    fn drop(&mut self) {
        self.shutdown();
    }
}
