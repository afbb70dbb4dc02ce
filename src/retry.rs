use crate::error::{LedgerError, Result};
use log::{debug, warn};
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;

#[derive(Debug, Clone)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
    pub backoff_multiplier: f64,
}

impl RetryConfig {
    pub fn with_attempts(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            ..Self::default()
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(30),
            backoff_multiplier: 2.0,
        }
    }
}

/// Re-run an idempotent operation while it fails with a retryable error.
///
/// Never wrap a balance mutation in this: a store fault after commit would
/// apply the adjustment twice.
pub async fn retry_with_backoff<F, Fut, T>(
    mut operation: F,
    config: RetryConfig,
    operation_name: &str,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut delay = config.base_delay;
    let mut attempt = 1;

    loop {
        debug!(
            "Attempting operation '{}' (attempt {}/{})",
            operation_name, attempt, config.max_attempts
        );

        let error = match operation().await {
            Ok(result) => {
                if attempt > 1 {
                    debug!("Operation '{operation_name}' succeeded on attempt {attempt}");
                }
                return Ok(result);
            }
            Err(error) => error,
        };

        warn!("Operation '{operation_name}' failed on attempt {attempt}: {error}");

        if !error.is_retryable() {
            warn!("Error is not retryable, stopping attempts");
            return Err(error);
        }

        if attempt >= config.max_attempts {
            warn!(
                "Operation '{}' failed after {} attempts: {}",
                operation_name, config.max_attempts, error
            );
            return Err(error);
        }

        debug!("Waiting {delay:?} before next attempt");
        sleep(delay).await;

        delay = std::cmp::min(
            Duration::from_millis((delay.as_millis() as f64 * config.backoff_multiplier) as u64),
            config.max_delay,
        );
        attempt += 1;
    }
}

/// Bound one collaborator round-trip; an elapsed timeout is a store fault.
pub async fn with_timeout<Fut, T>(limit: Duration, operation_name: &str, operation: Fut) -> Result<T>
where
    Fut: Future<Output = Result<T>>,
{
    match tokio::time::timeout(limit, operation).await {
        Ok(result) => result,
        Err(_) => {
            warn!("Operation '{operation_name}' timed out after {limit:?}");
            Err(LedgerError::store_unavailable(format!(
                "{operation_name} timed out after {}s",
                limit.as_secs_f64()
            )))
        }
    }
}
