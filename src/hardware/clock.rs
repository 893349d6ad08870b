use std::time::{Duration, Instant};

/// 単調増加クロック
///
/// エッジ待ちのタイムアウト計算に使用します。壁時計（SNTPで補正される）とは
/// 独立しているため、時刻同期で値が巻き戻ることはありません。
pub trait MonotonicClock {
    /// 任意の起点からの経過時間
    fn now(&self) -> Duration;
}

/// `std::time::Instant` による実装（ESP-IDF では esp_timer ベース）
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self { origin: Instant::now() }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl MonotonicClock for SystemClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }
}
