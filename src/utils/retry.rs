//! Retry Utilities
//!
//! Bounded exponential backoff for provider calls. Only errors classified
//! as transient by [`crate::error::ToolkitError::is_transient`] are retried.

use std::future::Future;
use std::time::Duration;
use tracing::{error, info, warn};

use crate::error::ToolkitResult;

#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one.
    pub max_attempts: u32,
    /// Wait after the first failure; doubled after each further failure.
    pub base_wait: Duration,
    pub min_wait: Duration,
    pub max_wait: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_wait: Duration::from_secs(1),
            min_wait: Duration::from_secs(1),
            max_wait: Duration::from_secs(60),
        }
    }
}

impl RetryPolicy {
    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts.max(1);
        self
    }

    pub fn with_waits(mut self, base: Duration, min: Duration, max: Duration) -> Self {
        self.base_wait = base;
        self.min_wait = min;
        self.max_wait = max.max(min);
        self
    }

    /// Wait before the attempt following failed attempt number `attempt` (1-based).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(31);
        let raw = self.base_wait.saturating_mul(1u32 << exponent);
        raw.clamp(self.min_wait, self.max_wait)
    }

    /// Every wait the policy can produce, in order.
    pub fn schedule(&self) -> Vec<Duration> {
        (1..self.max_attempts).map(|a| self.delay_for(a)).collect()
    }

    /// Run `op` until it succeeds, fails permanently, or attempts run out.
    /// The closure receives the 1-based attempt number. The last error is
    /// returned unchanged.
    pub async fn run<T, F, Fut>(&self, label: &str, mut op: F) -> ToolkitResult<T>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = ToolkitResult<T>>,
    {
        let mut attempt = 1;
        loop {
            match op(attempt).await {
                Ok(value) => {
                    if attempt > 1 {
                        info!("{}: succeeded on attempt {}", label, attempt);
                    }
                    return Ok(value);
                }
                Err(e) if e.is_transient() && attempt < self.max_attempts => {
                    let wait = self.delay_for(attempt);
                    warn!(
                        "{}: attempt {}/{} failed ({}), retrying in {:?}",
                        label, attempt, self.max_attempts, e, wait
                    );
                    tokio::time::sleep(wait).await;
                    attempt += 1;
                }
                Err(e) => {
                    error!("{}: giving up after attempt {}: {}", label, attempt, e);
                    return Err(e);
                }
            }
        }
    }
}

/// Policy with millisecond waits, for tests that exercise the retry loop.
pub fn fast_policy(max_attempts: u32) -> RetryPolicy {
    RetryPolicy::default().with_max_attempts(max_attempts).with_waits(
        Duration::from_millis(1),
        Duration::from_millis(1),
        Duration::from_millis(4),
    )
}
