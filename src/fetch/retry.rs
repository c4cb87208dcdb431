use std::future::Future;
use rand::Rng;
use tokio::time::{sleep, Duration};
use tokio_util::sync::CancellationToken;

use crate::error::{DashError, Result};
use crate::logging::{log_fetch_attempt, log_fetch_failure};

/// Retry configuration
#[derive(Clone, Debug)]
pub struct RetryConfig {
    pub max_retries: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
    pub jitter_factor: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 2,
            base_delay_ms: 100,
            max_delay_ms: 5000,
            jitter_factor: 0.3,
        }
    }
}

impl RetryConfig {
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            ..Default::default()
        }
    }

    /// Calculate delay with exponential backoff and jitter
    pub(crate) fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let base = self.base_delay_ms as f64 * 2.0_f64.powi(attempt as i32);
        let clamped = base.min(self.max_delay_ms as f64);

        // ±jitter_factor of the delay
        let jitter_range = clamped * self.jitter_factor;
        let jitter: f64 = if jitter_range > 0.0 {
            rand::thread_rng().gen_range(-jitter_range..=jitter_range)
        } else {
            0.0
        };
        let final_delay = (clamped + jitter).max(0.0);

        Duration::from_millis(final_delay as u64)
    }
}

/// Retry a fetch while its error is retryable. Cancellation stops both the
/// attempt in flight and any pending backoff.
pub async fn retry_async<F, Fut, T>(
    config: &RetryConfig,
    url: &str,
    cancel: &CancellationToken,
    mut operation: F,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let max_attempts = config.max_retries + 1;
    let mut attempt = 0;

    loop {
        attempt += 1;
        log_fetch_attempt(url, attempt, max_attempts);

        let err = match operation().await {
            Ok(result) => return Ok(result),
            Err(e) => e,
        };

        let will_retry = attempt < max_attempts && err.is_retryable();
        log_fetch_failure(url, attempt, &err.to_string(), will_retry);
        if !will_retry {
            return Err(err);
        }

        let delay = config.delay_for_attempt(attempt - 1);
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                return Err(DashError::Cancelled { url: url.to_string() });
            }
            _ = sleep(delay) => {}
        }
    }
}
