use chrono::{SecondsFormat, Utc};
use chrono_tz::Tz;
use clearance_core::{Distance, Severity, Verdict};
use serde::{Serialize, Serializer};

/// 正常時のセンサーステータス
pub const SENSOR_STATUS_OK: &str = "OK";
/// ハートビートのステータス
pub const STATUS_ONLINE: &str = "online";

/// レポート送信エラー
#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("ペイロードのシリアライズに失敗しました: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("ブローカーへの接続に失敗しました: {0}")]
    Connect(String),

    #[error("メッセージの送信に失敗しました: {0}")]
    Transport(String),
}

/// 測定結果の送信先
///
/// 送信は at-least-once (QoS 1) を前提とし、再送は実装側の責任です。
pub trait Reporter {
    fn publish(&mut self, report: &Report) -> Result<(), ReportError>;
}

/// 接続できなかった送信先は `None` のまま測定だけを続ける
impl<R: Reporter> Reporter for Option<R> {
    fn publish(&mut self, report: &Report) -> Result<(), ReportError> {
        match self {
            Some(reporter) => reporter.publish(report),
            None => Err(ReportError::Transport("送信先が未接続です".to_string())),
        }
    }
}

/// 通常の高さ測定メッセージ
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HeightMeasurement {
    pub device_id: String,
    pub height: f64,
    pub distance_cm: f64,
    pub timestamp: String,
    pub sensor_status: String,
}

/// 違反メッセージ
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ViolationReport {
    pub device_id: String,
    pub height: f64,
    pub clearance_height: f64,
    pub excess_height: f64,
    pub distance_cm: f64,
    pub timestamp: String,
    pub location: String,
    #[serde(serialize_with = "serialize_severity")]
    pub severity: Severity,
    pub sensor_status: String,
}

/// 稼働中であることを示すハートビート
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Heartbeat {
    pub device_id: String,
    pub timestamp: String,
    pub status: String,
}

/// 送信するメッセージ（種類ごとにトピックが分かれる）
#[derive(Debug, Clone, PartialEq)]
pub enum Report {
    Measurement(HeightMeasurement),
    Violation(ViolationReport),
    Heartbeat(Heartbeat),
}

impl Report {
    /// トピック末尾のチャンネル名
    pub fn channel(&self) -> &'static str {
        match self {
            Report::Measurement(_) => "height",
            Report::Violation(_) => "violation",
            Report::Heartbeat(_) => "heartbeat",
        }
    }

    pub fn device_id(&self) -> &str {
        match self {
            Report::Measurement(m) => &m.device_id,
            Report::Violation(v) => &v.device_id,
            Report::Heartbeat(h) => &h.device_id,
        }
    }

    /// `detector/<device_id>/<channel>`
    pub fn topic(&self) -> String {
        format!("detector/{}/{}", self.device_id(), self.channel())
    }

    pub fn to_json(&self) -> Result<String, ReportError> {
        let json = match self {
            Report::Measurement(m) => serde_json::to_string(m)?,
            Report::Violation(v) => serde_json::to_string(v)?,
            Report::Heartbeat(h) => serde_json::to_string(h)?,
        };
        Ok(json)
    }
}

/// レポート作成に必要な設置情報
#[derive(Debug, Clone)]
pub struct ReportContext {
    pub device_id: String,
    pub location: String,
    pub clearance_height_ft: f64,
}

impl ReportContext {
    /// 判定結果に応じて測定メッセージまたは違反メッセージを作成します
    pub fn verdict_report(&self, verdict: &Verdict, distance: Distance, timestamp: String) -> Report {
        let height = round_to(verdict.height().feet(), 2);
        let distance_cm = round_to(distance.cm(), 1);

        match *verdict {
            Verdict::Clear { .. } => Report::Measurement(HeightMeasurement {
                device_id: self.device_id.clone(),
                height,
                distance_cm,
                timestamp,
                sensor_status: SENSOR_STATUS_OK.to_string(),
            }),
            Verdict::Violation { excess, severity, .. } => Report::Violation(ViolationReport {
                device_id: self.device_id.clone(),
                height,
                clearance_height: self.clearance_height_ft,
                excess_height: round_to(excess, 2),
                distance_cm,
                timestamp,
                location: self.location.clone(),
                severity,
                sensor_status: SENSOR_STATUS_OK.to_string(),
            }),
        }
    }

    pub fn heartbeat(&self, timestamp: String) -> Report {
        Report::Heartbeat(Heartbeat {
            device_id: self.device_id.clone(),
            timestamp,
            status: STATUS_ONLINE.to_string(),
        })
    }
}

/// 現在時刻を ISO-8601 (RFC 3339, ミリ秒) で返します
pub fn timestamp_now(timezone: &Tz) -> String {
    Utc::now()
        .with_timezone(timezone)
        .to_rfc3339_opts(SecondsFormat::Millis, false)
}

/// 小数点以下 `places` 桁に丸める
pub fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

fn serialize_severity<S: Serializer>(severity: &Severity, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(severity.as_str())
}
