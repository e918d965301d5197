//! Per-service token-bucket rate limiting.
//!
//! One limiter is scoped to one service's execution and shared by that
//! service's workers. Capacity equals the configured rate, refill is
//! continuous from elapsed wall-clock time, and `acquire` is a bounded
//! spin-wait with a short sleep, so it is safe from any worker task.

use std::sync::Mutex;
use std::time::{Duration, Instant};

const POLL_INTERVAL: Duration = Duration::from_millis(10);

#[derive(Debug)]
struct Bucket {
    tokens: f64,
    last_refill: Instant,
}

/// Token bucket bounding call issuance to `rate` per second, with bursts up
/// to the full bucket after idle periods. Calls are delayed, never dropped.
#[derive(Debug)]
pub struct RateLimiter {
    capacity: f64,
    bucket: Mutex<Bucket>,
}

impl RateLimiter {
    pub fn new(rate_per_second: u32) -> Self {
        let capacity = f64::from(rate_per_second.max(1));
        Self {
            capacity,
            bucket: Mutex::new(Bucket {
                tokens: capacity,
                last_refill: Instant::now(),
            }),
        }
    }

    /// Try to take one token without waiting.
    fn try_acquire(&self) -> bool {
        let mut bucket = self.bucket.lock().expect("rate limiter lock poisoned");
        let now = Instant::now();
        let elapsed = now.duration_since(bucket.last_refill).as_secs_f64();
        bucket.tokens = (bucket.tokens + elapsed * self.capacity).min(self.capacity);
        bucket.last_refill = now;
        if bucket.tokens >= 1.0 {
            bucket.tokens -= 1.0;
            true
        } else {
            false
        }
    }

    /// Wait until a token is available, then consume it.
    pub async fn acquire(&self) {
        loop {
            if self.try_acquire() {
                return;
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_burst_up_to_capacity_is_immediate() {
        let limiter = RateLimiter::new(5);
        let start = Instant::now();
        for _ in 0..5 {
            limiter.acquire().await;
        }
        assert!(start.elapsed() < Duration::from_millis(50));
    }

    #[tokio::test]
    async fn test_sustained_rate_is_bounded() {
        // Capacity 5 absorbs the first 5 acquires; the remaining 3 must wait
        // for refill at 5/s, so the whole sequence takes at least ~0.6s minus
        // scheduling tolerance.
        let limiter = RateLimiter::new(5);
        let start = Instant::now();
        for _ in 0..8 {
            limiter.acquire().await;
        }
        assert!(
            start.elapsed() >= Duration::from_millis(500),
            "8 acquires at rate 5 finished too fast: {:?}",
            start.elapsed()
        );
    }

    #[tokio::test]
    async fn test_zero_rate_is_clamped_to_one() {
        let limiter = RateLimiter::new(0);
        // Must not divide by zero or stall forever.
        limiter.acquire().await;
    }

    #[tokio::test]
    async fn test_concurrent_workers_share_the_bucket() {
        let limiter = std::sync::Arc::new(RateLimiter::new(4));
        let start = Instant::now();
        let mut handles = Vec::new();
        for _ in 0..8 {
            let limiter = limiter.clone();
            handles.push(tokio::spawn(async move { limiter.acquire().await }));
        }
        for handle in handles {
            handle.await.unwrap();
        }
        // 4 burst + 4 refilled at 4/s -> at least ~1s total.
        assert!(start.elapsed() >= Duration::from_millis(800));
    }
}
