//! Retry with exponential backoff for backend calls.
//!
//! Only the REST collaborator retries, and only for idempotent requests.
//! The dispatcher itself never retries a failed collaborator call.

use std::future::Future;
use std::time::Duration;

use tokio::time::sleep;
use tracing::{debug, info, warn};

/// Configuration for retry behavior.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryConfig {
    /// Total attempts, including the first
    pub max_attempts: u32,

    /// Delay before the first retry
    pub initial_delay: Duration,

    /// Upper bound for any delay
    pub max_delay: Duration,

    /// Factor applied to the delay after each failure
    pub multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(10),
            multiplier: 2.0,
        }
    }
}

impl RetryConfig {
    /// Default backoff with the given number of attempts (at least one).
    pub fn with_attempts(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            ..Self::default()
        }
    }

    /// A single attempt.
    pub fn no_retry() -> Self {
        Self::with_attempts(1)
    }

    fn next_delay(&self, current: Duration) -> Duration {
        current.mul_f64(self.multiplier).min(self.max_delay)
    }
}

/// Run `operation` until it succeeds, fails with a non-retryable error, or
/// the attempts are used up. Returns the last error in the failure cases.
pub async fn with_retry_if<F, Fut, T, E, P>(
    config: &RetryConfig,
    mut operation: F,
    is_retryable: P,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
    P: Fn(&E) -> bool,
{
    let mut delay = config.initial_delay;
    let mut attempt = 1;

    loop {
        let error = match operation().await {
            Ok(value) => {
                if attempt > 1 {
                    info!(attempts = attempt, "Backend call succeeded after retry");
                }
                return Ok(value);
            }
            Err(e) => e,
        };

        if !is_retryable(&error) {
            debug!(error = %error, "Backend error is not retryable");
            return Err(error);
        }
        if attempt >= config.max_attempts {
            warn!(attempts = attempt, error = %error, "Backend retries exhausted");
            return Err(error);
        }

        warn!(
            attempt,
            max_attempts = config.max_attempts,
            delay_ms = delay.as_millis() as u64,
            error = %error,
            "Backend call failed, retrying"
        );
        sleep(delay).await;
        delay = config.next_delay(delay);
        attempt += 1;
    }
}

/// Like `with_retry_if`, treating every error as retryable.
pub async fn with_retry<F, Fut, T, E>(config: &RetryConfig, operation: F) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    with_retry_if(config, operation, |_| true).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn test_backoff_is_capped() {
        let config = RetryConfig {
            max_attempts: 5,
            initial_delay: Duration::from_secs(4),
            max_delay: Duration::from_secs(10),
            multiplier: 2.0,
        };
        assert_eq!(config.next_delay(Duration::from_secs(4)), Duration::from_secs(8));
        assert_eq!(config.next_delay(Duration::from_secs(8)), Duration::from_secs(10));
    }

    #[test]
    fn test_with_attempts_floor() {
        assert_eq!(RetryConfig::with_attempts(0).max_attempts, 1);
        assert_eq!(RetryConfig::no_retry().max_attempts, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_succeeds_after_failures() {
        let calls = AtomicU32::new(0);

        let result = with_retry(&RetryConfig::default(), || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if n < 2 {
                    Err("not yet")
                } else {
                    Ok(n)
                }
            }
        })
        .await;

        assert_eq!(result, Ok(2));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhausts_attempts() {
        let calls = AtomicU32::new(0);

        let result: Result<(), &str> = with_retry(&RetryConfig::with_attempts(2), || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err("always fails") }
        })
        .await;

        assert_eq!(result, Err("always fails"));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_non_retryable_returns_immediately() {
        let calls = AtomicU32::new(0);

        let result: Result<(), &str> = with_retry_if(
            &RetryConfig::default(),
            || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err("permanent") }
            },
            |_| false,
        )
        .await;

        assert_eq!(result, Err("permanent"));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
