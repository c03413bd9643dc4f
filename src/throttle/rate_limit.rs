use std::sync::{Mutex, MutexGuard};
use std::time::Duration;
use tokio::time::{sleep_until, Instant};

/// Enforces a minimum interval between consecutive calls of one kind.
///
/// Each call type (listing, deleting, ...) owns its own limiter so their
/// budgets stay independent. The clock is `tokio::time`, which tests pause
/// and advance deterministically.
#[derive(Debug)]
pub struct RateLimiter {
    min_interval: Duration,
    last_call: Mutex<Option<Instant>>,
}

impl RateLimiter {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_call: Mutex::new(None),
        }
    }

    /// Allow at most `calls` invocations per minute. Zero is treated as one.
    pub fn per_minute(calls: u32) -> Self {
        Self::new(Duration::from_secs(60) / calls.max(1))
    }

    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }

    fn last(&self) -> MutexGuard<'_, Option<Instant>> {
        // Nothing can leave the timestamp half-written, so a poisoned lock is still usable.
        self.last_call.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Wait until `min_interval` has passed since the previous permitted call,
    /// then record now as the start of this one.
    pub async fn throttle(&self) {
        let deadline = self.last().map(|last| last + self.min_interval);

        if let Some(deadline) = deadline {
            if deadline > Instant::now() {
                sleep_until(deadline).await;
            }
        }

        *self.last() = Some(Instant::now());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_first_call_does_not_wait() {
        let limiter = RateLimiter::per_minute(90);
        let start = Instant::now();
        limiter.throttle().await;
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_n_calls_take_at_least_n_minus_one_intervals() {
        let limiter = RateLimiter::per_minute(90);
        let start = Instant::now();
        for _ in 0..5 {
            limiter.throttle().await;
        }
        // 60 / 90 = 666.67ms, four gaps between five calls
        let expected = limiter.min_interval() * 4;
        assert!(start.elapsed() >= expected);
        assert!(start.elapsed() < expected + Duration::from_millis(10));
    }

    #[tokio::test(start_paused = true)]
    async fn test_time_spent_elsewhere_counts_toward_interval() {
        let limiter = RateLimiter::per_minute(60);
        limiter.throttle().await;
        tokio::time::sleep(Duration::from_millis(700)).await;

        let before = Instant::now();
        limiter.throttle().await;
        assert_eq!(before.elapsed(), Duration::from_millis(300));
    }

    #[tokio::test(start_paused = true)]
    async fn test_limiters_have_independent_budgets() {
        let list = RateLimiter::per_minute(60);
        let delete = RateLimiter::per_minute(60);
        list.throttle().await;

        let before = Instant::now();
        delete.throttle().await;
        assert_eq!(before.elapsed(), Duration::ZERO);
    }
}
