//! 滑动窗口限流
//!
//! 任意 `window` 时间窗内最多放行 `capacity` 次调用。
//! 超出时调用方挂起，直到窗口内最早的一次调用过期；调用只会被推迟，不会被丢弃。

use std::collections::VecDeque;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::{sleep, Instant};
use tracing::info;

/// 滑动窗口限流器
#[derive(Debug)]
pub struct SlidingWindowLimiter {
    capacity: usize,
    window: Duration,
    granted: Mutex<VecDeque<Instant>>,
}

impl SlidingWindowLimiter {
    pub fn new(capacity: usize, window: Duration) -> Self {
        Self {
            capacity: capacity.max(1),
            window,
            granted: Mutex::new(VecDeque::new()),
        }
    }

    /// 每分钟最多 `calls` 次
    pub fn per_minute(calls: usize) -> Self {
        Self::new(calls, Duration::from_secs(60))
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// 获取一次调用许可，必要时等待
    pub async fn acquire(&self) {
        loop {
            let wait = {
                let mut granted = self.granted.lock().await;
                let now = Instant::now();
                while let Some(&oldest) = granted.front() {
                    if now.duration_since(oldest) >= self.window {
                        granted.pop_front();
                    } else {
                        break;
                    }
                }

                if granted.len() < self.capacity {
                    granted.push_back(now);
                    return;
                }

                match granted.front() {
                    Some(&oldest) => (oldest + self.window).saturating_duration_since(now),
                    None => Duration::ZERO,
                }
            };

            info!("⏳ 已达到每 {:?} {} 次的调用上限，等待 {:?}", self.window, self.capacity, wait);
            sleep(wait).await;
        }
    }
}
