use std::future::Future;
use std::time::Duration;

use log::{debug, info, warn};

use crate::error::{AppError, AppResult};

#[derive(Debug, Clone)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
    pub backoff_multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(1000),
            max_delay: Duration::from_secs(30),
            backoff_multiplier: 2.0,
        }
    }
}

impl RetryConfig {
    /// Retry policy for the daily dataset refresh.
    pub fn refresh(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
            max_delay: base_delay * 4,
            backoff_multiplier: 2.0,
        }
    }

    /// Delay before attempt `attempt + 1`, counting attempts from 1.
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let factor = self.backoff_multiplier.powi(attempt.saturating_sub(1) as i32);
        let millis = (self.base_delay.as_millis() as f64 * factor) as u64;
        std::cmp::min(Duration::from_millis(millis), self.max_delay)
    }
}

/// Runs `operation` until it succeeds, fails with a non-transient error, or
/// `max_attempts` is used up.
pub async fn retry_with_exponential_backoff<T, F, Fut>(config: &RetryConfig, operation: F) -> AppResult<T>
where
    F: Fn() -> Fut,
    Fut: Future<Output = AppResult<T>>,
{
    let max_attempts = config.max_attempts.max(1);
    let mut attempt = 1;

    loop {
        match operation().await {
            Ok(value) => {
                if attempt > 1 {
                    info!("Operation succeeded on attempt {}", attempt);
                }
                return Ok(value);
            }
            Err(e) if !e.is_transient() => {
                debug!("Attempt {} failed with non-transient error, not retrying: {}", attempt, e);
                return Err(e);
            }
            Err(e) if attempt >= max_attempts => {
                warn!("Operation failed after {} attempts: {}", max_attempts, e);
                return Err(AppError::operation_failed(format!(
                    "Failed after {} retry attempts: {}",
                    max_attempts, e
                )));
            }
            Err(e) => {
                let delay = config.delay_after(attempt);
                debug!("Attempt {} failed transiently, retrying in {:?}: {}", attempt, delay, e);
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    fn fast() -> RetryConfig {
        RetryConfig {
            max_attempts: 3,
            base_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(5),
            backoff_multiplier: 2.0,
        }
    }

    #[tokio::test]
    async fn test_retry_success_on_second_attempt() {
        let attempt_count = Arc::new(AtomicU32::new(0));

        let result = retry_with_exponential_backoff(&fast(), || {
            let count = attempt_count.clone();
            async move {
                if count.fetch_add(1, Ordering::SeqCst) == 0 {
                    Err(AppError::NetworkUnavailable)
                } else {
                    Ok("success")
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), "success");
        assert_eq!(attempt_count.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_retry_non_transient_error() {
        let attempt_count = Arc::new(AtomicU32::new(0));

        let result: AppResult<&str> = retry_with_exponential_backoff(&fast(), || {
            let count = attempt_count.clone();
            async move {
                count.fetch_add(1, Ordering::SeqCst);
                Err(AppError::malformed_dataset("timetable is not an array"))
            }
        })
        .await;

        assert!(matches!(result, Err(AppError::MalformedDataset(_))));
        assert_eq!(attempt_count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_retry_is_bounded() {
        let attempt_count = Arc::new(AtomicU32::new(0));

        let result: AppResult<()> = retry_with_exponential_backoff(&fast(), || {
            let count = attempt_count.clone();
            async move {
                count.fetch_add(1, Ordering::SeqCst);
                Err(AppError::scheduling("platform busy"))
            }
        })
        .await;

        assert!(result.unwrap_err().to_string().contains("Failed after 3 retry attempts"));
        assert_eq!(attempt_count.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_backoff_delays() {
        let config = RetryConfig::refresh(3, Duration::from_secs(300));
        assert_eq!(config.delay_after(1), Duration::from_secs(300));
        assert_eq!(config.delay_after(2), Duration::from_secs(600));
        assert_eq!(config.delay_after(3), Duration::from_secs(1200));
        assert_eq!(config.delay_after(4), Duration::from_secs(1200));
    }
}
