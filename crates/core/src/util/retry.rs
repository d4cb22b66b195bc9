//! Retry utilities with exponential backoff
//!
//! Used by the hosted inference backends; hosted models answer 503 while
//! they are being loaded, and rate limits come back as 429.

use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, warn};

/// Configuration for retry behavior
#[derive(Clone, Debug)]
pub struct RetryConfig {
    /// Maximum number of attempts, including the first one
    pub max_attempts: u32,
    /// Initial delay between retries
    pub initial_delay: Duration,
    /// Multiplier for exponential backoff
    pub backoff_multiplier: f64,
    /// Maximum delay between retries
    pub max_delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 4,
            initial_delay: Duration::from_secs(2),
            backoff_multiplier: 2.0,
            max_delay: Duration::from_secs(20),
        }
    }
}

impl RetryConfig {
    pub fn new(max_attempts: u32, initial_delay: Duration) -> Self {
        Self {
            max_attempts,
            initial_delay,
            ..Default::default()
        }
    }

    /// No retries at all.
    pub fn disabled() -> Self {
        Self::new(1, Duration::ZERO)
    }

    fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(i32::MAX as u32) as i32;
        let delay_ms =
            self.initial_delay.as_millis() as f64 * self.backoff_multiplier.powi(exponent);
        let delay = Duration::from_millis(delay_ms as u64);
        delay.min(self.max_delay)
    }
}

/// Retry a function with exponential backoff.
///
/// `max_attempts == 0` behaves like 1.
pub async fn retry_with_backoff<F, T, E, Fut>(
    config: &RetryConfig,
    mut f: F,
    is_retryable: impl Fn(&E) -> bool,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T, E>>,
{
    let max_attempts = config.max_attempts.max(1);
    let mut attempt = 1;

    loop {
        match f().await {
            Ok(result) => {
                if attempt > 1 {
                    debug!(attempt, "operation succeeded after retry");
                }
                return Ok(result);
            }
            Err(e) => {
                if attempt >= max_attempts || !is_retryable(&e) {
                    return Err(e);
                }
                let delay = config.delay_for_attempt(attempt);
                warn!(
                    attempt,
                    max_attempts,
                    delay_ms = delay.as_millis() as u64,
                    "operation failed, retrying"
                );
                sleep(delay).await;
                attempt += 1;
            }
        }
    }
}

/// Check if an HTTP status is worth retrying
pub fn is_http_retryable(status: u16) -> bool {
    matches!(status, 408 | 429 | 500..=599)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn test_retry_config_delay_calculation() {
        let config = RetryConfig::new(5, Duration::from_millis(100));

        assert_eq!(config.delay_for_attempt(1), Duration::from_millis(100));
        assert_eq!(config.delay_for_attempt(2), Duration::from_millis(200));
        assert_eq!(config.delay_for_attempt(3), Duration::from_millis(400));
    }

    #[test]
    fn test_retry_config_max_delay() {
        let config = RetryConfig {
            max_attempts: 10,
            initial_delay: Duration::from_millis(100),
            backoff_multiplier: 10.0,
            max_delay: Duration::from_secs(1),
        };

        assert_eq!(config.delay_for_attempt(5), Duration::from_secs(1));
    }

    #[test]
    fn test_is_http_retryable() {
        assert!(is_http_retryable(503)); // model loading
        assert!(is_http_retryable(429));
        assert!(is_http_retryable(408));
        assert!(!is_http_retryable(400));
        assert!(!is_http_retryable(401));
        assert!(!is_http_retryable(404));
    }

    #[tokio::test]
    async fn retries_until_success() {
        let calls = AtomicU32::new(0);
        let config = RetryConfig::new(3, Duration::from_millis(1));
        let result: Result<u32, &str> = retry_with_backoff(
            &config,
            || {
                let n = calls.fetch_add(1, Ordering::Relaxed) + 1;
                async move {
                    if n < 3 {
                        Err("busy")
                    } else {
                        Ok(n)
                    }
                }
            },
            |_| true,
        )
        .await;
        assert_eq!(result, Ok(3));
        assert_eq!(calls.load(Ordering::Relaxed), 3);
    }

    #[tokio::test]
    async fn non_retryable_error_returns_immediately() {
        let calls = AtomicU32::new(0);
        let config = RetryConfig::new(5, Duration::from_millis(1));
        let result: Result<(), &str> = retry_with_backoff(
            &config,
            || {
                calls.fetch_add(1, Ordering::Relaxed);
                async { Err("bad request") }
            },
            |_| false,
        )
        .await;
        assert_eq!(result, Err("bad request"));
        assert_eq!(calls.load(Ordering::Relaxed), 1);
    }

    #[tokio::test]
    async fn disabled_config_makes_a_single_attempt() {
        let calls = AtomicU32::new(0);
        let result: Result<(), &str> = retry_with_backoff(
            &RetryConfig::disabled(),
            || {
                calls.fetch_add(1, Ordering::Relaxed);
                async { Err("loading") }
            },
            |_| true,
        )
        .await;
        assert_eq!(result, Err("loading"));
        assert_eq!(calls.load(Ordering::Relaxed), 1);
    }

    #[tokio::test]
    async fn zero_attempts_still_calls_once() {
        let calls = AtomicU32::new(0);
        let config = RetryConfig::new(0, Duration::from_millis(1));
        let _: Result<(), &str> = retry_with_backoff(
            &config,
            || {
                calls.fetch_add(1, Ordering::Relaxed);
                async { Err("down") }
            },
            |_| true,
        )
        .await;
        assert_eq!(calls.load(Ordering::Relaxed), 1);
    }
}
