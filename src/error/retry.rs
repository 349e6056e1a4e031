use std::time::Duration;
use tokio::time::sleep;
use rand::Rng;
use tracing::{warn, debug, error};
use crate::adapters::AdapterError;

/// Configuration for exponential backoff retry logic
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of attempts, including the first (default: 3)
    pub max_attempts: u32,
    /// Base delay for exponential backoff in milliseconds (default: 100ms)
    pub base_delay_ms: u64,
    /// Maximum delay cap in milliseconds (default: 5000ms)
    pub max_delay_ms: u64,
    /// Jitter factor to prevent thundering herd (0.0 to 1.0, default: 0.1)
    pub jitter_factor: f64,
    /// Exponential backoff multiplier (default: 2.0)
    pub backoff_multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 100,
            max_delay_ms: 5000,
            jitter_factor: 0.1,
            backoff_multiplier: 2.0,
        }
    }
}

impl RetryConfig {
    /// Retry configuration for chain RPC calls made by adapters
    pub fn for_blockchain() -> Self {
        Self {
            max_attempts: 4,
            base_delay_ms: 1000,
            max_delay_ms: 8000,
            jitter_factor: 0.25,
            backoff_multiplier: 2.0,
        }
    }
}

/// Determines if an adapter error is transient and worth another attempt
pub fn is_retryable_error(error: &AdapterError) -> bool {
    match error {
        AdapterError::RpcError(msg) | AdapterError::ContractError(msg) => {
            let msg_lower = msg.to_lowercase();
            msg_lower.contains("network")
                || msg_lower.contains("timeout")
                || msg_lower.contains("timed out")
                || msg_lower.contains("connection")
                || msg_lower.contains("rate limit")
                || msg_lower.contains("429")
                || msg_lower.contains("503")
        }

        // Not-deployed is an answer, not a transient failure
        AdapterError::NotDeployedAtBlock { .. }
        | AdapterError::AdapterMissing { .. }
        | AdapterError::InvalidData(_)
        | AdapterError::UnsupportedToken(_)
        | AdapterError::CalculationError(_) => false,
    }
}

/// Calculate the delay for the next retry attempt with exponential backoff and jitter
fn calculate_delay(attempt: u32, config: &RetryConfig) -> Duration {
    let exponential_delay = config.base_delay_ms as f64
        * config.backoff_multiplier.powi(attempt as i32);

    let capped_delay = exponential_delay.min(config.max_delay_ms as f64);

    let mut rng = rand::thread_rng();
    let jitter_range = capped_delay * config.jitter_factor;
    let jitter = if jitter_range > 0.0 {
        rng.gen_range(-jitter_range..=jitter_range)
    } else {
        0.0
    };
    let final_delay = (capped_delay + jitter).max(0.0) as u64;

    Duration::from_millis(final_delay)
}

/// Execute an adapter call with exponential backoff retry logic
pub async fn with_retry<F, Fut, T>(
    operation_name: &str,
    config: &RetryConfig,
    operation: F,
) -> Result<T, AdapterError>
where
    F: Fn() -> Fut,
    Fut: std::future::Future<Output = Result<T, AdapterError>>,
{
    let max_attempts = config.max_attempts.max(1);
    let mut attempt = 0;

    loop {
        match operation().await {
            Ok(result) => {
                if attempt > 0 {
                    debug!(
                        operation = operation_name,
                        attempt = attempt + 1,
                        "Operation succeeded after retry"
                    );
                }
                return Ok(result);
            }
            Err(error) if !is_retryable_error(&error) => return Err(error),
            Err(error) if attempt + 1 >= max_attempts => {
                error!(
                    operation = operation_name,
                    attempt = attempt + 1,
                    max_attempts,
                    error = %error,
                    "Operation failed after all retry attempts"
                );
                return Err(error);
            }
            Err(error) => {
                let delay = calculate_delay(attempt, config);
                warn!(
                    operation = operation_name,
                    attempt = attempt + 1,
                    max_attempts,
                    delay_ms = delay.as_millis() as u64,
                    error = %error,
                    "Operation failed, retrying after delay"
                );

                sleep(delay).await;
                attempt += 1;
            }
        }
    }
}
