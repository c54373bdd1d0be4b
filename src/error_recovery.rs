// src/error_recovery.rs
//! Retry with exponential backoff for API operations.

use crate::error::AppError;
use std::time::Duration;

/// How often and how patiently a single upstream request is retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Extra attempts after the first one.
    pub retries: u32,
    /// Wait before the first retry.
    pub min_timeout: Duration,
    /// Multiplier applied to the wait after every retry.
    pub factor: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            retries: crate::constants::REQUEST_RETRIES,
            min_timeout: crate::constants::REQUEST_RETRY_MIN_TIMEOUT,
            factor: crate::constants::REQUEST_RETRY_FACTOR,
        }
    }
}

impl RetryPolicy {
    /// Same attempt count, no waiting. Used where wall-clock delay is
    /// irrelevant, e.g. against in-memory doubles.
    pub fn immediate() -> Self {
        Self {
            min_timeout: Duration::ZERO,
            ..Self::default()
        }
    }

    /// Delay before retry number `retry` (1-based).
    pub fn delay_for(&self, retry: u32) -> Duration {
        self.min_timeout * self.factor.saturating_pow(retry.saturating_sub(1))
    }
}

/// Retries an async operation with exponential backoff.
///
/// Client errors (4xx) bail out on the first failure and are returned as-is.
/// Everything else is retried `policy.retries` times before the last error
/// is propagated.
pub async fn retry_with_backoff<F, T, Fut>(policy: &RetryPolicy, mut operation: F) -> Result<T, AppError>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T, AppError>>,
{
    let mut retry = 0;

    loop {
        match operation().await {
            Ok(result) => return Ok(result),
            Err(e) if e.is_client_error() => return Err(e),
            Err(e) if retry >= policy.retries => return Err(e),
            Err(e) => {
                retry += 1;
                let delay = policy.delay_for(retry);
                log::warn!(
                    "Request failed ({}), retry {}/{} after {:?}",
                    e,
                    retry,
                    policy.retries,
                    delay
                );
                tokio::time::sleep(delay).await;
            }
        }
    }
}
