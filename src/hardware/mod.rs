/// ハードウェア制御モジュール
pub mod clock;
pub mod display;
pub mod stop_button;
pub mod ultrasonic;

#[cfg(feature = "esp")]
pub mod pins;

// Mock実装（テストとnon-espビルドで使用可能）
#[cfg(not(feature = "esp"))]
pub mod mock;

pub use clock::{MonotonicClock, SystemClock};
pub use display::{Line, StatusDisplay, TextDisplay};
pub use stop_button::StopButton;
pub use ultrasonic::{PulseTimer, RangeSensor, UltrasonicError};

#[cfg(feature = "esp")]
pub use pins::DetectorPins;
