/// デフォルトのハートビート間隔（測定サイクル数）
pub const DEFAULT_HEARTBEAT_EVERY: u32 = 10;

/// N サイクルごとにハートビートの送信時期を知らせるカウンター
///
/// センサーエラーで終わったサイクルも1回として数えます。
#[derive(Debug, Clone)]
pub struct HeartbeatCounter {
    every: u32,
    count: u32,
}

impl HeartbeatCounter {
    /// `every` が0の場合は1として扱います
    pub fn new(every: u32) -> Self {
        Self {
            every: every.max(1),
            count: 0,
        }
    }

    /// 1サイクル進め、送信時期なら `true` を返してカウンターを戻します
    pub fn tick(&mut self) -> bool {
        self.count += 1;
        if self.count >= self.every {
            self.count = 0;
            true
        } else {
            false
        }
    }

    pub fn count(&self) -> u32 {
        self.count
    }
}

impl Default for HeartbeatCounter {
    fn default() -> Self {
        Self::new(DEFAULT_HEARTBEAT_EVERY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fires_every_tenth_tick() {
        let mut counter = HeartbeatCounter::default();
        let fired: Vec<usize> = (1..=30).filter(|_| counter.tick()).collect();
        assert_eq!(fired, vec![10, 20, 30]);
    }

    #[test]
    fn test_resets_after_fire() {
        let mut counter = HeartbeatCounter::new(3);
        counter.tick();
        counter.tick();
        assert_eq!(counter.count(), 2);
        assert!(counter.tick());
        assert_eq!(counter.count(), 0);
    }

    #[test]
    fn test_zero_interval_fires_every_tick() {
        let mut counter = HeartbeatCounter::new(0);
        assert!(counter.tick());
        assert!(counter.tick());
    }
}
