//! Retry logic with exponential backoff
//!
//! Only errors classified as transient by [`NewsletterError::is_transient`]
//! are retried. Everything else is returned on the first failure.

use crate::config::NewsletterConfig;
use crate::error::{NewsletterError, Result};
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, warn};

/// Retry policy configuration
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Maximum number of attempts, including the first
    pub max_attempts: u32,

    /// Initial backoff duration
    pub initial_backoff: Duration,

    /// Maximum backoff duration
    pub max_backoff: Duration,

    /// Backoff multiplier (typically 2.0 for exponential backoff)
    pub backoff_multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_secs(1),
            max_backoff: Duration::from_secs(30),
            backoff_multiplier: 2.0,
        }
    }
}

impl RetryPolicy {
    /// Build a policy from the pipeline configuration
    pub fn from_config(config: &NewsletterConfig) -> Self {
        Self {
            max_attempts: config.max_retries,
            initial_backoff: config.retry_backoff_base,
            ..Self::default()
        }
    }

    /// Create a policy with no retries
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            initial_backoff: Duration::ZERO,
            max_backoff: Duration::ZERO,
            backoff_multiplier: 1.0,
        }
    }

    /// Create a policy with fast retries (for testing)
    pub fn fast() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_millis(10),
            max_backoff: Duration::from_millis(100),
            backoff_multiplier: 2.0,
        }
    }

    /// Backoff before retry number `attempt` (1-based)
    pub fn backoff_duration(&self, attempt: u32) -> Duration {
        if attempt == 0 {
            return Duration::ZERO;
        }

        let backoff_ms = self.initial_backoff.as_millis() as f64
            * self.backoff_multiplier.powi((attempt - 1) as i32);

        Duration::from_millis(backoff_ms as u64).min(self.max_backoff)
    }

    /// Execute an async operation with retry logic
    ///
    /// Returns the first success, the first non-transient error, or the last
    /// transient error once attempts run out.
    pub async fn execute<F, Fut, T>(&self, operation_name: &str, mut operation: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = Result<T>>,
    {
        let attempts = self.max_attempts.max(1);
        let mut attempt = 0;

        loop {
            attempt += 1;
            debug!("Attempt {}/{} for {}", attempt, attempts, operation_name);

            match operation().await {
                Ok(result) => {
                    if attempt > 1 {
                        debug!("{} succeeded after {} retries", operation_name, attempt - 1);
                    }
                    return Ok(result);
                }
                Err(e) if !e.is_transient() => {
                    debug!("{} failed with non-retryable error: {}", operation_name, e);
                    return Err(e);
                }
                Err(e) if attempt >= attempts => {
                    warn!("{} failed after {} attempts: {}", operation_name, attempts, e);
                    return Err(e);
                }
                Err(e) => {
                    let backoff = self.backoff_duration(attempt);
                    warn!(
                        "{} failed (attempt {}/{}): {}. Retrying in {:?}",
                        operation_name, attempt, attempts, e, backoff
                    );
                    sleep(backoff).await;
                }
            }
        }
    }
}
