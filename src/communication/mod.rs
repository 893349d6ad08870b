/// 通信モジュール
#[cfg(feature = "esp")]
pub mod mqtt;
#[cfg(feature = "esp")]
pub mod network_manager;

// Mock実装（テストとnon-espビルドで使用可能）
#[cfg(not(feature = "esp"))]
pub mod mock;

#[cfg(feature = "esp")]
pub use mqtt::MqttReporter;
#[cfg(feature = "esp")]
pub use network_manager::NetworkManager;

#[cfg(not(feature = "esp"))]
pub use mock::MockReporter;
