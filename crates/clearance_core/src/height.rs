use crate::distance::Distance;

/// cm → feet 換算係数
pub const CM_TO_FEET: f64 = 0.0328084;

/// 車両高さ（feet、常に 0 以上）
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct VehicleHeight(f64);

impl VehicleHeight {
    /// cm から作成します。負の値は 0 にクランプされます。
    pub fn from_cm(height_cm: f64) -> Self {
        Self((height_cm * CM_TO_FEET).max(0.0))
    }

    pub fn feet(&self) -> f64 {
        self.0
    }
}

/// 違反の深刻度（超過高さのみで決まる）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Critical,
    High,
    Medium,
}

impl Severity {
    pub fn from_excess(excess_ft: f64) -> Self {
        if excess_ft > 2.0 {
            Severity::Critical
        } else if excess_ft > 1.0 {
            Severity::High
        } else {
            Severity::Medium
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Critical => "CRITICAL",
            Severity::High => "HIGH",
            Severity::Medium => "MEDIUM",
        }
    }
}

/// 1サンプル分の判定結果
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Verdict {
    Clear {
        height: VehicleHeight,
    },
    Violation {
        height: VehicleHeight,
        /// 制限高さからの超過分（feet、常に正）
        excess: f64,
        severity: Severity,
    },
}

impl Verdict {
    pub fn height(&self) -> VehicleHeight {
        match self {
            Verdict::Clear { height } | Verdict::Violation { height, .. } => *height,
        }
    }

    pub fn is_violation(&self) -> bool {
        matches!(self, Verdict::Violation { .. })
    }
}

/// 距離と取り付け高さから車両高さを求め、制限高さと比較します
///
/// センサーは真下を向いているため、エコーが近いほど車両が高いことになります。
/// 距離が取り付け高さを超える場合（センサーの傾きなど）は高さ 0 として扱います。
pub fn classify(distance: Distance, sensor_mount_height_cm: f64, clearance_height_ft: f64) -> Verdict {
    let height = VehicleHeight::from_cm(sensor_mount_height_cm - distance.cm());

    if height.feet() > clearance_height_ft {
        let excess = height.feet() - clearance_height_ft;
        Verdict::Violation {
            height,
            excess,
            severity: Severity::from_excess(excess),
        }
    } else {
        Verdict::Clear { height }
    }
}
