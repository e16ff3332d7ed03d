//! Error recovery strategies for different types of errors.
//!
//! Request-scoped failures never touch the shared corpus or embedder; this
//! module only decides whether a failed operation is retried, skipped, or
//! handed back to the caller for a fallback.

use crate::{CoreError, ErrorExt};
use std::time::Duration;
use tracing::info;

/// Fraction of the current delay added as random jitter between attempts
const JITTER_FACTOR: f64 = 0.1;

/// Recovery strategy for handling errors
#[derive(Debug, Clone)]
pub enum RecoveryStrategy {
    /// Retry the operation with exponential backoff
    RetryWithBackoff {
        max_attempts: usize,
        initial_delay: Duration,
        max_delay: Duration,
    },
    /// Give up and let the caller substitute a fallback value
    Fallback,
    /// Skip the operation and continue
    Skip,
    /// Fail immediately
    Fail,
}

/// Result of an error recovery attempt
#[derive(Debug)]
pub enum RecoveryResult<T> {
    /// Operation succeeded, possibly after retries
    Recovered(T),
    /// Operation should be skipped
    Skipped,
    /// Operation failed, but the caller has a fallback for it
    FellBack(CoreError),
    /// Operation failed and the error should be propagated
    Failed(CoreError),
}

impl<T> RecoveryResult<T> {
    pub fn is_recovered(&self) -> bool {
        matches!(self, RecoveryResult::Recovered(_))
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self, RecoveryResult::Skipped)
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, RecoveryResult::FellBack(_))
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, RecoveryResult::Failed(_))
    }

    /// Converts into a plain `Result`, treating skip as an `Internal` error
    pub fn into_result(self) -> Result<T, CoreError> {
        match self {
            RecoveryResult::Recovered(value) => Ok(value),
            RecoveryResult::FellBack(error) | RecoveryResult::Failed(error) => Err(error),
            RecoveryResult::Skipped => Err(CoreError::Internal {
                message: "operation skipped".to_string(),
            }),
        }
    }
}

/// Error recovery handler that provides strategies for different error types
pub struct ErrorRecovery;

impl ErrorRecovery {
    /// Determine the appropriate recovery strategy for a given error
    pub fn determine_strategy(error: &CoreError) -> RecoveryStrategy {
        match error {
            // Transient generation failures are retried, the rest fall back
            CoreError::Llm(llm_error) => {
                if llm_error.is_retryable() {
                    RecoveryStrategy::RetryWithBackoff {
                        max_attempts: 3,
                        initial_delay: Duration::from_secs(1),
                        max_delay: Duration::from_secs(30),
                    }
                } else {
                    RecoveryStrategy::Fallback
                }
            }

            CoreError::Network(_) | CoreError::Io(_) => RecoveryStrategy::RetryWithBackoff {
                max_attempts: 3,
                initial_delay: Duration::from_secs(1),
                max_delay: Duration::from_secs(30),
            },

            CoreError::Timeout { .. } => RecoveryStrategy::RetryWithBackoff {
                max_attempts: 2,
                initial_delay: Duration::from_secs(2),
                max_delay: Duration::from_secs(10),
            },

            // The request fails; the caller reports "no recommendations"
            CoreError::Embedding(_) => RecoveryStrategy::Fail,

            // Startup problems need operator intervention
            CoreError::Corpus(_) | CoreError::Config(_) => RecoveryStrategy::Fail,

            CoreError::InvalidInput { .. } | CoreError::NotFound { .. } => RecoveryStrategy::Skip,

            CoreError::Serialization(_) | CoreError::Internal { .. } => RecoveryStrategy::Fail,
        }
    }

    /// Apply the recovery strategy to an operation
    pub async fn apply_strategy<F, T, Fut>(
        strategy: RecoveryStrategy,
        mut operation: F,
    ) -> RecoveryResult<T>
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = Result<T, CoreError>>,
    {
        match strategy {
            RecoveryStrategy::RetryWithBackoff {
                max_attempts,
                initial_delay,
                max_delay,
            } => Self::retry_with_backoff(operation, max_attempts, initial_delay, max_delay).await,
            RecoveryStrategy::Fallback => match operation().await {
                Ok(value) => RecoveryResult::Recovered(value),
                Err(error) => RecoveryResult::FellBack(error),
            },
            RecoveryStrategy::Skip => RecoveryResult::Skipped,
            RecoveryStrategy::Fail => match operation().await {
                Ok(value) => RecoveryResult::Recovered(value),
                Err(error) => RecoveryResult::Failed(error),
            },
        }
    }

    /// Retry an operation with exponential backoff and jitter
    async fn retry_with_backoff<F, T, Fut>(
        mut operation: F,
        max_attempts: usize,
        initial_delay: Duration,
        max_delay: Duration,
    ) -> RecoveryResult<T>
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = Result<T, CoreError>>,
    {
        let mut attempt = 0;
        let mut delay = initial_delay;

        loop {
            match operation().await {
                Ok(result) => return RecoveryResult::Recovered(result),
                Err(error) => {
                    attempt += 1;

                    if attempt >= max_attempts || !error.is_retryable() {
                        return RecoveryResult::FellBack(error);
                    }

                    if let Some(retry_delay) = error.retry_after() {
                        delay = retry_delay;
                    }
                    delay = with_jitter(delay).min(max_delay);

                    info!(
                        "Recovery attempt {}/{} failed. Retrying after {:?}: {}",
                        attempt,
                        max_attempts,
                        delay,
                        error.user_friendly_message()
                    );

                    tokio::time::sleep(delay).await;

                    delay = std::cmp::min(delay * 2, max_delay);
                }
            }
        }
    }
}

fn with_jitter(delay: Duration) -> Duration {
    let jitter_range = (delay.as_millis() as f64 * JITTER_FACTOR) as u64;
    delay + Duration::from_millis(fastrand::u64(0..=jitter_range))
}
