//! Retry utilities with exponential backoff for resilient API calls.

use std::future::Future;
use std::time::Duration;
use tokio::time::{sleep, timeout};

use crate::sources::SourceError;

/// Configuration for retry behavior
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryConfig {
    /// Maximum number of attempts, the first one included
    pub max_attempts: u32,
    /// Delay before the first retry
    pub initial_delay: Duration,
    /// Maximum delay between retries
    pub max_delay: Duration,
    /// Multiplier for exponential backoff
    pub backoff_multiplier: f64,
    /// Deadline for all attempts and delays together
    pub max_total_time: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 2,
            initial_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(4),
            backoff_multiplier: 2.0,
            max_total_time: Duration::from_secs(45),
        }
    }
}

impl RetryConfig {
    /// A config that never retries
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    /// Backoff delay after the given failed attempt (1-based)
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exp = self.initial_delay.as_secs_f64()
            * self
                .backoff_multiplier
                .powi(attempt.saturating_sub(1) as i32);
        Duration::from_secs_f64(exp.min(self.max_delay.as_secs_f64()))
    }
}

/// Kinds of failure worth retrying
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransientError {
    /// Network connectivity issues
    Network,
    /// Request timeout
    Timeout,
    /// Too many requests (429)
    RateLimit,
    /// Server error (5xx)
    ServerError(u16),
}

impl TransientError {
    /// Classify a SourceError, `None` when it is permanent
    pub fn from_source_error(err: &SourceError) -> Option<Self> {
        match err {
            SourceError::Network(_) => Some(TransientError::Network),
            SourceError::Timeout(_) => Some(TransientError::Timeout),
            SourceError::RateLimit => Some(TransientError::RateLimit),
            SourceError::Api { status, .. } if *status >= 500 => {
                Some(TransientError::ServerError(*status))
            }
            _ => None,
        }
    }
}

/// Execute an async operation with retry logic.
///
/// Transient failures are retried with exponential backoff until
/// `max_attempts` is reached. The whole run, delays included, is bounded by
/// `max_total_time`; hitting that deadline yields [`SourceError::Timeout`].
pub async fn with_retry<T, F, Fut>(config: RetryConfig, operation: F) -> Result<T, SourceError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, SourceError>>,
{
    match timeout(config.max_total_time, retry_loop(config, operation)).await {
        Ok(result) => result,
        Err(_) => {
            tracing::warn!(deadline = ?config.max_total_time, "Operation exceeded retry deadline");
            Err(SourceError::Timeout(format!(
                "no response within {:?}",
                config.max_total_time
            )))
        }
    }
}

async fn retry_loop<T, F, Fut>(config: RetryConfig, mut operation: F) -> Result<T, SourceError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, SourceError>>,
{
    let mut attempts = 0;

    loop {
        attempts += 1;

        match operation().await {
            Ok(result) => {
                if attempts > 1 {
                    tracing::debug!(attempts, "Operation succeeded after retry");
                }
                return Ok(result);
            }
            Err(error) => {
                let Some(transient) = TransientError::from_source_error(&error) else {
                    return Err(error);
                };

                if attempts >= config.max_attempts {
                    tracing::debug!(attempts, error = %error, "Giving up after transient failures");
                    return Err(error);
                }

                let delay = config.delay_for(attempts);
                tracing::debug!(
                    attempt = attempts,
                    ?transient,
                    ?delay,
                    "Transient error, retrying"
                );
                sleep(delay).await;
            }
        }
    }
}
