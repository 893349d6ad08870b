use std::time::Duration;

/// 音速 (cm/s)
pub const SPEED_OF_SOUND_CM_PER_S: f64 = 34300.0;

/// センサーのデータシート上の有効測定範囲（cm）
pub const MIN_DISTANCE_CM: f64 = 2.0;
pub const MAX_DISTANCE_CM: f64 = 400.0;

/// 有効範囲 [2, 400] cm 内であることが保証された距離
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Distance(f64);

impl Distance {
    /// 範囲外の値は `None`
    pub fn from_cm(cm: f64) -> Option<Self> {
        if (MIN_DISTANCE_CM..=MAX_DISTANCE_CM).contains(&cm) {
            Some(Self(cm))
        } else {
            None
        }
    }

    pub fn cm(&self) -> f64 {
        self.0
    }
}

/// エコーパルス幅を距離に変換します（往復なので 1/2）
///
/// 有効範囲外の結果はノイズとして `None` を返します。
pub fn to_distance(pulse: Duration) -> Option<Distance> {
    let distance_cm = pulse.as_secs_f64() * SPEED_OF_SOUND_CM_PER_S / 2.0;
    Distance::from_cm(distance_cm)
}
