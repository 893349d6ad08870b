//! 車両高さ判定のコアロジック（ハードウェア非依存）
//!
//! - `distance`: エコーパルス幅から距離への変換と有効範囲チェック
//! - `height`: 距離と取り付け高さから車両高さを求め、制限高さ違反を判定

pub mod distance;
pub mod height;

pub use distance::{to_distance, Distance, MAX_DISTANCE_CM, MIN_DISTANCE_CM, SPEED_OF_SOUND_CM_PER_S};
pub use height::{classify, Severity, VehicleHeight, Verdict, CM_TO_FEET};
