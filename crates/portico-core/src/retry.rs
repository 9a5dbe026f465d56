//! Bounded retry with jittered exponential backoff for provider calls.
//!
//! Only [`ProviderError::is_retryable`] errors are retried. A 429 with
//! `Retry-After` waits that long (capped, ±10% jitter); everything else uses
//! full-jitter exponential backoff.

use std::future::Future;
use std::time::Duration;

use rand::Rng;
use tracing::warn;

use crate::error::ProviderError;

const RETRY_AFTER_CAP: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Attempts after the first one.
    pub max_retries: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 2,
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(8),
        }
    }
}

impl RetryPolicy {
    /// No retries at all.
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn with_base_delay(mut self, base_delay: Duration) -> Self {
        self.base_delay = base_delay;
        self
    }

    /// Delay before retry number `retry` (1-based).
    pub fn backoff(&self, retry: u32, retry_after: Option<Duration>) -> Duration {
        let mut rng = rand::thread_rng();
        match retry_after {
            Some(retry_after) => {
                let base_ms = retry_after.min(RETRY_AFTER_CAP).as_millis() as u64;
                let jitter_factor: f64 = rng.gen_range(0.9_f64..=1.1_f64);
                let jittered_ms = ((base_ms as f64) * jitter_factor).round() as u64;
                Duration::from_millis(jittered_ms.max(100))
            }
            None => {
                let exp = self
                    .base_delay
                    .saturating_mul(1u32 << retry.saturating_sub(1).min(16));
                let ceiling = exp.min(self.max_delay);
                let jittered_ms = rng.gen_range(0..=ceiling.as_millis() as u64);
                Duration::from_millis(jittered_ms.max(1))
            }
        }
    }

    /// Runs `attempt` until it succeeds, fails with a non-retryable error, or
    /// the retry budget is spent. The last error is returned.
    pub async fn run<T, F, Fut>(&self, operation: &str, mut attempt: F) -> Result<T, ProviderError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, ProviderError>>,
    {
        let mut retries = 0;

        loop {
            match attempt().await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_retryable() && retries < self.max_retries => {
                    retries += 1;
                    let backoff = self.backoff(retries, e.retry_after());

                    warn!(
                        operation,
                        error = %e,
                        retry = retries,
                        max_retries = self.max_retries,
                        backoff_ms = backoff.as_millis() as u64,
                        "retrying provider request"
                    );

                    tokio::time::sleep(backoff).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}
