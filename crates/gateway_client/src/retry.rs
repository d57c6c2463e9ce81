//! Retry logic for gateway calls
//!
//! Retries a fallible async operation on a fixed interval until it
//! succeeds, fails with a non-retryable error, or a global deadline is
//! reached. Optional jitter spreads concurrent callers.
//!
//! # Example
//!
//! ```rust,ignore
//! use gateway_client::retry::{RetryConfig, with_retry};
//!
//! let config = RetryConfig::default();
//! let result = with_retry(&config, || async {
//!     gateway.call().await
//! }).await;
//! ```

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Configuration for fixed-interval retry with a global deadline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Sleep between attempts in milliseconds (default: 5000ms)
    #[serde(default = "default_interval")]
    pub interval_ms: u64,

    /// Total time budget across all attempts in milliseconds
    /// (default: 300000ms = 5 minutes)
    #[serde(default = "default_max_wait")]
    pub max_wait_ms: u64,

    /// Whether to add jitter to the interval (default: true)
    #[serde(default = "default_true")]
    pub jitter_enabled: bool,

    /// Maximum jitter factor (0.0 to 1.0, default: 0.1 = 10%)
    #[serde(default = "default_jitter_factor")]
    pub jitter_factor: f64,
}

const fn default_interval() -> u64 {
    5_000
}

const fn default_max_wait() -> u64 {
    300_000
}

const fn default_true() -> bool {
    true
}

const fn default_jitter_factor() -> f64 {
    0.1
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            interval_ms: default_interval(),
            max_wait_ms: default_max_wait(),
            jitter_enabled: default_true(),
            jitter_factor: default_jitter_factor(),
        }
    }
}

impl RetryConfig {
    /// Create a new retry configuration with custom parameters
    #[must_use]
    pub const fn new(interval_ms: u64, max_wait_ms: u64) -> Self {
        Self {
            interval_ms,
            max_wait_ms,
            jitter_enabled: true,
            jitter_factor: 0.1,
        }
    }

    /// Create a configuration for quick calls (interactive use, tests)
    #[must_use]
    pub const fn fast() -> Self {
        Self {
            interval_ms: 50,
            max_wait_ms: 1_000,
            jitter_enabled: true,
            jitter_factor: 0.1,
        }
    }

    /// Create a configuration for waiting on slow provisioning
    #[must_use]
    pub const fn patient() -> Self {
        Self {
            interval_ms: 10_000,
            max_wait_ms: 600_000,
            jitter_enabled: true,
            jitter_factor: 0.2,
        }
    }

    /// Disable jitter
    #[must_use]
    pub const fn without_jitter(mut self) -> Self {
        self.jitter_enabled = false;
        self
    }

    /// Calculate the sleep duration before the next attempt
    ///
    /// The interval is fixed; jitter, when enabled, shifts it by up to
    /// `jitter_factor` in either direction.
    #[must_use]
    #[allow(
        clippy::cast_precision_loss,
        clippy::cast_sign_loss,
        clippy::cast_possible_truncation
    )]
    pub fn delay(&self) -> Duration {
        let interval = self.interval_ms as f64;

        let final_delay = if self.jitter_enabled {
            let jitter_range = interval * self.jitter_factor;
            let jitter = rand::rng().random_range(-jitter_range..=jitter_range);
            (interval + jitter).max(0.0)
        } else {
            interval
        };

        // Safe: final_delay is non-negative and bounded by interval * (1 + factor)
        Duration::from_millis(final_delay as u64)
    }

    /// The global deadline as a `Duration`
    #[must_use]
    pub const fn deadline(&self) -> Duration {
        Duration::from_millis(self.max_wait_ms)
    }
}

/// Trait for errors that can be checked for retryability
pub trait Retryable {
    /// Returns true if this error is retryable
    fn is_retryable(&self) -> bool;
}

impl Retryable for crate::error::GatewayError {
    fn is_retryable(&self) -> bool {
        Self::is_retryable(self)
    }
}

/// Retry result containing either success or the last error
#[derive(Debug)]
pub struct RetryResult<T, E> {
    /// The result of the operation
    pub result: Result<T, E>,
    /// Number of attempts made (1 = no retries, 2 = one retry, etc.)
    pub attempts: u32,
    /// Total time spent including retries
    pub total_duration: Duration,
}

impl<T, E> RetryResult<T, E> {
    /// Check if the operation succeeded
    #[must_use]
    pub const fn is_ok(&self) -> bool {
        self.result.is_ok()
    }

    /// Check if the operation failed
    #[must_use]
    pub const fn is_err(&self) -> bool {
        self.result.is_err()
    }

    /// Convert to standard Result, discarding metadata
    pub fn into_result(self) -> Result<T, E> {
        self.result
    }
}

/// Execute an async operation with fixed-interval retry and a deadline
///
/// The operation is attempted immediately. On a retryable error the helper
/// sleeps for the configured interval and tries again, never exceeding the
/// global deadline; the final attempt's error is returned when the budget
/// runs out. Non-retryable errors are returned without sleeping.
#[allow(clippy::cast_possible_truncation)]
pub async fn with_retry<F, Fut, T, E>(config: &RetryConfig, mut operation: F) -> RetryResult<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Retryable + std::fmt::Display,
{
    let start = Instant::now();
    let deadline = config.deadline();
    let mut attempts = 0u32;

    loop {
        attempts += 1;
        let result = operation().await;

        match result {
            Ok(value) => {
                if attempts > 1 {
                    debug!(
                        attempts = attempts,
                        duration_ms = start.elapsed().as_millis() as u64,
                        "Operation succeeded after retries"
                    );
                }
                return RetryResult {
                    result: Ok(value),
                    attempts,
                    total_duration: start.elapsed(),
                };
            },
            Err(err) => {
                if !err.is_retryable() {
                    debug!(
                        attempts = attempts,
                        error = %err,
                        "Operation failed with non-retryable error"
                    );
                    return RetryResult {
                        result: Err(err),
                        attempts,
                        total_duration: start.elapsed(),
                    };
                }

                let elapsed = start.elapsed();
                if elapsed >= deadline {
                    warn!(
                        attempts = attempts,
                        waited_ms = elapsed.as_millis() as u64,
                        max_wait_ms = config.max_wait_ms,
                        error = %err,
                        "Operation failed, deadline exhausted"
                    );
                    return RetryResult {
                        result: Err(err),
                        attempts,
                        total_duration: elapsed,
                    };
                }

                // Never sleep past the deadline
                let delay = config.delay().min(deadline - elapsed);
                warn!(
                    attempt = attempts,
                    delay_ms = delay.as_millis() as u64,
                    error = %err,
                    "Operation failed, retrying"
                );

                tokio::time::sleep(delay).await;
            },
        }
    }
}

/// Execute an async operation with retry logic, returning only the Result
///
/// This is a convenience wrapper around `with_retry` that discards metadata.
pub async fn retry<F, Fut, T, E>(config: &RetryConfig, operation: F) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Retryable + std::fmt::Display,
{
    with_retry(config, operation).await.into_result()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[derive(Debug, Clone)]
    struct TestError {
        message: String,
        retryable: bool,
    }

    impl std::fmt::Display for TestError {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "{}", self.message)
        }
    }

    impl Retryable for TestError {
        fn is_retryable(&self) -> bool {
            self.retryable
        }
    }

    fn retryable_error() -> TestError {
        TestError {
            message: "temporary failure".to_string(),
            retryable: true,
        }
    }

    #[test]
    fn config_default_values() {
        let config = RetryConfig::default();
        assert_eq!(config.interval_ms, 5_000);
        assert_eq!(config.max_wait_ms, 300_000);
        assert!(config.jitter_enabled);
        assert!((config.jitter_factor - 0.1).abs() < f64::EPSILON);
    }

    #[test]
    fn config_fast_preset() {
        let config = RetryConfig::fast();
        assert_eq!(config.interval_ms, 50);
        assert_eq!(config.max_wait_ms, 1_000);
    }

    #[test]
    fn config_patient_preset() {
        let config = RetryConfig::patient();
        assert_eq!(config.interval_ms, 10_000);
        assert_eq!(config.max_wait_ms, 600_000);
    }

    #[test]
    fn config_without_jitter() {
        let config = RetryConfig::default().without_jitter();
        assert!(!config.jitter_enabled);
    }

    #[test]
    fn delay_is_fixed_without_jitter() {
        let config = RetryConfig::new(200, 10_000).without_jitter();
        assert_eq!(config.delay().as_millis(), 200);
        assert_eq!(config.delay().as_millis(), 200);
    }

    #[test]
    fn delay_with_jitter_in_range() {
        let config = RetryConfig {
            interval_ms: 1000,
            max_wait_ms: 10_000,
            jitter_enabled: true,
            jitter_factor: 0.1,
        };

        for _ in 0..20 {
            let delay_ms = config.delay().as_millis();
            assert!(
                (900..=1100).contains(&delay_ms),
                "delay_ms={delay_ms} out of range"
            );
        }
    }

    #[test]
    fn config_serialization() {
        let config = RetryConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        assert!(json.contains("interval_ms"));
        assert!(json.contains("max_wait_ms"));
    }

    #[test]
    fn config_deserialization_with_defaults() {
        let json = r#"{"interval_ms":200}"#;
        let config: RetryConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.interval_ms, 200);
        assert_eq!(config.max_wait_ms, 300_000);
        assert!(config.jitter_enabled);
    }

    #[tokio::test]
    async fn succeeds_first_try_without_sleeping() {
        let config = RetryConfig::default();
        let call_count = Arc::new(AtomicU32::new(0));

        let start = Instant::now();
        let result = with_retry(&config, || {
            let count = Arc::clone(&call_count);
            async move {
                count.fetch_add(1, Ordering::SeqCst);
                Ok::<_, TestError>(42)
            }
        })
        .await;

        assert!(result.is_ok());
        assert_eq!(result.attempts, 1);
        assert_eq!(call_count.load(Ordering::SeqCst), 1);
        // No interval sleep on the success path
        assert!(start.elapsed().as_millis() < 1_000);
    }

    #[tokio::test]
    async fn succeeds_after_retries() {
        let config = RetryConfig::new(10, 1_000).without_jitter();
        let call_count = Arc::new(AtomicU32::new(0));

        let result = with_retry(&config, || {
            let count = Arc::clone(&call_count);
            async move {
                let calls = count.fetch_add(1, Ordering::SeqCst) + 1;
                if calls < 3 {
                    Err(retryable_error())
                } else {
                    Ok(42)
                }
            }
        })
        .await;

        assert!(result.is_ok());
        assert_eq!(result.attempts, 3);
        assert_eq!(call_count.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn non_retryable_error_aborts_immediately() {
        let config = RetryConfig::default();
        let call_count = Arc::new(AtomicU32::new(0));

        let result = with_retry(&config, || {
            let count = Arc::clone(&call_count);
            async move {
                count.fetch_add(1, Ordering::SeqCst);
                Err::<i32, _>(TestError {
                    message: "permanent failure".to_string(),
                    retryable: false,
                })
            }
        })
        .await;

        assert!(result.is_err());
        assert_eq!(result.attempts, 1);
        assert_eq!(call_count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn deadline_exhaustion_returns_last_error() {
        let config = RetryConfig::new(10, 60).without_jitter();

        let result = with_retry(&config, || async { Err::<i32, _>(retryable_error()) }).await;

        assert!(result.is_err());
        // At least the immediate attempt plus several interval retries
        assert!(result.attempts > 1);
        assert!(result.total_duration.as_millis() >= 60);
        // The deadline caps the sleep, so the loop cannot run far past it
        assert!(result.total_duration.as_millis() < 1_000);
    }

    #[tokio::test]
    async fn retry_convenience_function() {
        let config = RetryConfig::fast().without_jitter();

        let result: Result<i32, TestError> = retry(&config, || async { Ok(42) }).await;

        assert_eq!(result.unwrap(), 42);
    }

    #[test]
    fn retry_result_accessors() {
        let ok: RetryResult<i32, TestError> = RetryResult {
            result: Ok(42),
            attempts: 2,
            total_duration: Duration::from_millis(100),
        };
        assert!(ok.is_ok());
        assert!(!ok.is_err());
        assert_eq!(ok.into_result().unwrap(), 42);

        let err: RetryResult<i32, TestError> = RetryResult {
            result: Err(retryable_error()),
            attempts: 5,
            total_duration: Duration::from_millis(500),
        };
        assert!(err.is_err());
        assert!(err.into_result().is_err());
    }
}
