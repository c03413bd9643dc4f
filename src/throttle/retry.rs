use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

use crate::error::{CleanupError, Result};

pub const DEFAULT_INITIAL_BACKOFF: Duration = Duration::from_secs(2);
pub const DEFAULT_MAX_RETRIES: u32 = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub initial_backoff: Duration,
    pub max_retries: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            initial_backoff: DEFAULT_INITIAL_BACKOFF,
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }
}

/// Runs one logical remote operation with exponential backoff on transient errors.
///
/// Backoff and the retry counter live on the stack of `invoke`, so every
/// logical operation starts again from `initial_backoff`.
#[derive(Debug, Clone, Default)]
pub struct RetryingCaller {
    policy: RetryPolicy,
}

impl RetryingCaller {
    pub fn new(policy: RetryPolicy) -> Self {
        Self { policy }
    }

    /// Call `attempt` until it succeeds, fails permanently, or has been retried
    /// `max_retries` times. Each attempt is expected to pass through its own
    /// rate limiter before touching the network.
    pub async fn invoke<T, F, Fut>(&self, operation: &str, mut attempt: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut retries = 0;
        let mut backoff = self.policy.initial_backoff;

        loop {
            match attempt().await {
                Ok(value) => {
                    if retries > 0 {
                        debug!("{} succeeded after {} retries", operation, retries);
                    }
                    return Ok(value);
                }
                Err(e) if e.is_transient() && retries < self.policy.max_retries => {
                    warn!(
                        "{} failed with {}. Retrying in {:?} ({}/{})",
                        operation,
                        e.status().unwrap_or_default(),
                        backoff,
                        retries + 1,
                        self.policy.max_retries
                    );
                    tokio::time::sleep(backoff).await;
                    retries += 1;
                    backoff *= 2;
                }
                Err(e) if e.is_transient() => {
                    return Err(CleanupError::RetriesExhausted {
                        operation: operation.to_string(),
                        retries,
                        source: Box::new(e),
                    });
                }
                Err(e) => return Err(e),
            }
        }
    }
}
