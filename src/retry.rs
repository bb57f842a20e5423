use crate::config::{BackoffKind, ScrapeConfig};
use crate::error::ProviderError;
use std::future::Future;
use std::time::Duration;
use tracing::debug;

/// Bounded retry for flaky upstream calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one.
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub backoff: BackoffKind,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(1),
            backoff: BackoffKind::Linear,
        }
    }
}

impl RetryPolicy {
    /// A single attempt, no retries.
    #[cfg(test)]
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            base_delay: Duration::ZERO,
            backoff: BackoffKind::Fixed,
        }
    }

    pub fn from_config(cfg: &ScrapeConfig) -> Self {
        Self {
            max_attempts: cfg.max_attempts.max(1),
            base_delay: Duration::from_millis(cfg.backoff_ms),
            backoff: cfg.backoff,
        }
    }

    /// Delay before retry number `attempt` (1 = first retry).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        match self.backoff {
            BackoffKind::Fixed => self.base_delay,
            BackoffKind::Linear => self.base_delay.saturating_mul(attempt.max(1)),
        }
    }

    /// Run `op` until it succeeds, fails with an error `retryable` rejects,
    /// or attempts run out.
    pub async fn run<T, F, Fut, P>(&self, mut op: F, retryable: P) -> Result<T, ProviderError>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, ProviderError>>,
        P: Fn(&ProviderError) -> bool,
    {
        let max = self.max_attempts.max(1);
        let mut attempt = 1;
        loop {
            match op(attempt).await {
                Ok(v) => return Ok(v),
                Err(e) if attempt < max && retryable(&e) => {
                    let delay = self.delay_for(attempt);
                    debug!(attempt, delay_ms = delay.as_millis() as u64, error = %e, "retrying after failure");
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}
