//! 測定ループの統合テスト（モックのセンサー・LCD・送信先を使用）

use std::time::Duration;

use clearance_detector::communication::mock::MockReporter;
use clearance_detector::core::report::ReportContext;
use clearance_detector::core::{CycleOutcome, CycleSettings, MeasurementCycle, Report, StopSignal};
use clearance_detector::hardware::mock::{DisplayOp, MockDisplay, RecordingDelay, ScriptedSensor};
use clearance_detector::hardware::{Line, StatusDisplay};
use clearance_detector::Severity;
use serde_json::Value;

type TestCycle = MeasurementCycle<ScriptedSensor, MockDisplay, RecordingDelay, MockReporter>;

struct Rig {
    sensor: ScriptedSensor,
    display: MockDisplay,
    delay: RecordingDelay,
    reporter: MockReporter,
}

impl Rig {
    fn new() -> Self {
        Self {
            sensor: ScriptedSensor::new(),
            display: MockDisplay::new(),
            delay: RecordingDelay::new(),
            reporter: MockReporter::new(),
        }
    }

    fn cycle(&self) -> TestCycle {
        let display = StatusDisplay::new(Some(self.display.clone()), self.delay.clone(), "TEST_001");
        MeasurementCycle::new(
            self.sensor.clone(),
            display,
            self.reporter.clone(),
            self.delay.clone(),
            settings(),
        )
    }
}

fn settings() -> CycleSettings {
    CycleSettings {
        report: ReportContext {
            device_id: "TEST_001".to_string(),
            location: "Main Street Bridge".to_string(),
            clearance_height_ft: 13.5,
        },
        sensor_mount_height_cm: 450.0,
        clearance_height_ft: 13.5,
        interval: Duration::from_secs(2),
        heartbeat_every: 10,
        timezone: chrono_tz::UTC,
    }
}

/// 指定回数の確認後に停止を要求する
struct StopAfter {
    remaining: usize,
    checks: usize,
}

impl StopAfter {
    fn new(cycles: usize) -> Self {
        Self {
            remaining: cycles,
            checks: 0,
        }
    }
}

impl StopSignal for StopAfter {
    fn stop_requested(&mut self) -> bool {
        self.checks += 1;
        if self.remaining == 0 {
            return true;
        }
        self.remaining -= 1;
        false
    }
}

fn payload(rig: &Rig, index: usize) -> Value {
    serde_json::from_str(&rig.reporter.published()[index].payload).unwrap()
}

#[test]
fn test_clear_vehicle_reports_height() {
    let rig = Rig::new();
    rig.sensor.queue_distance_cm(300.0);
    let mut cycle = rig.cycle();

    let outcome = cycle.run_once();
    assert!(matches!(outcome, CycleOutcome::Measured { .. }));
    assert!(!outcome.is_violation());

    assert_eq!(
        rig.display.written_lines(),
        vec![
            (Line::First, "Status: CLEAR".to_string()),
            (Line::Second, "Ht: 4.92ft".to_string()),
        ]
    );

    assert_eq!(rig.reporter.topics(), vec!["detector/TEST_001/height".to_string()]);
    let json = payload(&rig, 0);
    assert_eq!(json["height"], 4.92);
    assert_eq!(json["distance_cm"], 300.0);
    assert_eq!(json["sensor_status"], "OK");
    let timestamp = json["timestamp"].as_str().unwrap();
    assert!(chrono::DateTime::parse_from_rfc3339(timestamp).is_ok());

    // 制限内では追加の待機なし
    assert_eq!(rig.delay.total(), Duration::ZERO);
}

#[test]
fn test_tall_vehicle_flashes_and_reports_violation() {
    let rig = Rig::new();
    rig.sensor.queue_distance_cm(30.0);
    let mut cycle = rig.cycle();

    let outcome = cycle.run_once();
    assert!(outcome.is_violation());

    let lines = rig.display.written_lines();
    assert_eq!(lines[0], (Line::First, "** VIOLATION **".to_string()));
    assert_eq!(lines[1], (Line::Second, "H:13.78 +0.28".to_string()));
    assert_eq!(
        lines.last().unwrap(),
        &(Line::Second, "Height:13.8ft".to_string())
    );
    let clears = rig.display.ops().iter().filter(|op| **op == DisplayOp::Clear).count();
    assert_eq!(clears, 3);

    assert_eq!(rig.reporter.topics(), vec!["detector/TEST_001/violation".to_string()]);
    match &rig.reporter.published()[0].report {
        Report::Violation(v) => {
            assert_eq!(v.height, 13.78);
            assert_eq!(v.excess_height, 0.28);
            assert_eq!(v.severity, Severity::Medium);
        }
        other => panic!("unexpected report: {:?}", other),
    }
    let json = payload(&rig, 0);
    assert_eq!(json["location"], "Main Street Bridge");
    assert_eq!(json["clearance_height"], 13.5);
    assert_eq!(json["severity"], "MEDIUM");

    // 点滅 3 x (0.5s + 0.3s) + 表示維持 3s
    assert_eq!(rig.delay.total(), Duration::from_millis(2400 + 3000));
}

#[test]
fn test_missing_echo_shows_sensor_error_without_report() {
    let rig = Rig::new();
    rig.sensor.queue_timeout();
    let mut cycle = rig.cycle();

    assert_eq!(cycle.run_once(), CycleOutcome::SensorError);
    assert_eq!(
        rig.display.written_lines(),
        vec![
            (Line::First, "Sensor Error".to_string()),
            (Line::Second, "Out of range".to_string()),
        ]
    );
    assert_eq!(rig.reporter.attempts(), 0);
}

#[test]
fn test_out_of_range_distance_is_sensor_error() {
    let rig = Rig::new();
    rig.sensor.queue_distance_cm(410.0);
    rig.sensor.queue_distance_cm(1.0);
    let mut cycle = rig.cycle();

    assert_eq!(cycle.run_once(), CycleOutcome::SensorError);
    assert_eq!(cycle.run_once(), CycleOutcome::SensorError);
    assert!(rig.reporter.published().is_empty());
}

#[test]
fn test_heartbeat_every_ten_cycles() {
    let rig = Rig::new();
    for i in 0..20 {
        if i % 2 == 0 {
            rig.sensor.queue_distance_cm(300.0);
        } else {
            rig.sensor.queue_timeout();
        }
    }
    let mut cycle = rig.cycle();

    for _ in 0..9 {
        cycle.run_once();
    }
    assert!(!rig.reporter.topics().iter().any(|t| t.ends_with("/heartbeat")));

    cycle.run_once();
    let topics = rig.reporter.topics();
    assert_eq!(topics.last().unwrap(), "detector/TEST_001/heartbeat");

    for _ in 0..10 {
        cycle.run_once();
    }
    let heartbeats = rig
        .reporter
        .topics()
        .iter()
        .filter(|t| t.ends_with("/heartbeat"))
        .count();
    assert_eq!(heartbeats, 2);
    assert_eq!(cycle.cycles(), 20);
}

#[test]
fn test_publish_failure_does_not_stop_cycle() {
    let rig = Rig::new();
    rig.reporter.set_should_fail(true);
    rig.sensor.queue_distance_cm(300.0);
    rig.sensor.queue_distance_cm(300.0);
    let mut cycle = rig.cycle();

    assert!(matches!(cycle.run_once(), CycleOutcome::Measured { .. }));
    assert_eq!(rig.reporter.attempts(), 1);

    rig.reporter.set_should_fail(false);
    cycle.run_once();
    assert_eq!(rig.reporter.topics(), vec!["detector/TEST_001/height".to_string()]);
}

#[test]
fn test_missing_display_still_reports() {
    let rig = Rig::new();
    rig.sensor.queue_distance_cm(30.0);
    let display: StatusDisplay<MockDisplay, _> = StatusDisplay::new(None, rig.delay.clone(), "TEST_001");
    let mut cycle = MeasurementCycle::new(
        rig.sensor.clone(),
        display,
        rig.reporter.clone(),
        rig.delay.clone(),
        settings(),
    );

    assert!(cycle.run_once().is_violation());
    assert_eq!(rig.reporter.topics(), vec!["detector/TEST_001/violation".to_string()]);
}

#[test]
fn test_run_checks_stop_between_cycles() {
    let rig = Rig::new();
    for _ in 0..3 {
        rig.sensor.queue_distance_cm(300.0);
    }
    let mut stop = StopAfter::new(3);
    let mut cycle = rig.cycle();

    cycle.run(&mut stop);

    assert_eq!(rig.sensor.measure_calls(), 3);
    assert_eq!(stop.checks, 4);
    assert_eq!(cycle.cycles(), 3);
    // 測定間隔 3 x 2s + 停止表示 2s
    assert_eq!(rig.delay.total(), Duration::from_secs(8));
}

#[test]
fn test_shutdown_screen_written_once() {
    let rig = Rig::new();
    {
        let mut cycle = rig.cycle();
        cycle.run(&mut StopAfter::new(0));
        cycle.shutdown();
    }

    let stopped = rig
        .display
        .written_lines()
        .into_iter()
        .filter(|(_, text)| text == "Stopped")
        .count();
    assert_eq!(stopped, 1);
    assert_eq!(rig.display.ops().last(), Some(&DisplayOp::Clear));
    assert_eq!(rig.sensor.measure_calls(), 0);
}

#[test]
fn test_drop_runs_shutdown() {
    let rig = Rig::new();
    rig.sensor.queue_distance_cm(300.0);
    {
        let mut cycle = rig.cycle();
        cycle.run_once();
        rig.display.clear_ops();
    }

    assert_eq!(
        rig.display.ops(),
        vec![
            DisplayOp::Write(Line::First, "System".to_string()),
            DisplayOp::Write(Line::Second, "Stopped".to_string()),
            DisplayOp::Clear,
        ]
    );
}
