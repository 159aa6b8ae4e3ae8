use std::{future::Future, time::Duration};
use tokio::time::sleep;
use tracing::warn;

use crate::error::{DiscshelfError, Result};

/// Timeout for individual upstream requests (15 seconds)
pub const REQUEST_TIMEOUT_SECS: u64 = 15;

/// Maximum attempts for transient errors
const MAX_RETRIES: u32 = 3;

/// Base delay for exponential backoff (milliseconds)
const BASE_DELAY_MS: u64 = 500;

/// Maximum backoff delay cap (milliseconds)
const MAX_BACKOFF_MS: u64 = 5000;

fn backoff(attempt: u32) -> Duration {
    Duration::from_millis(std::cmp::min(BASE_DELAY_MS * 2u64.pow(attempt), MAX_BACKOFF_MS))
}

/// Retries an async operation with exponential backoff and a per-attempt timeout.
/// Only transient failures (timeouts, connection errors, 5xx, 429) are retried.
pub async fn with_retry<T, F, Fut>(operation_name: &str, mut operation: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut last_error = None;

    for attempt in 0..MAX_RETRIES {
        let result =
            tokio::time::timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS), operation()).await;

        let error = match result {
            Ok(Ok(value)) => return Ok(value),
            Ok(Err(e)) if !e.is_transient() => {
                warn!("{} failed with non-retryable error: {}", operation_name, e);
                return Err(e);
            }
            Ok(Err(e)) => e,
            Err(_elapsed) => DiscshelfError::Timeout {
                operation: operation_name.to_string(),
                secs: REQUEST_TIMEOUT_SECS,
            },
        };

        if attempt < MAX_RETRIES - 1 {
            let delay = backoff(attempt);
            warn!(
                "{} failed (attempt {}/{}), retrying in {}ms: {}",
                operation_name,
                attempt + 1,
                MAX_RETRIES,
                delay.as_millis(),
                error
            );
            sleep(delay).await;
        }
        last_error = Some(error);
    }

    Err(last_error.unwrap_or(DiscshelfError::Timeout {
        operation: operation_name.to_string(),
        secs: REQUEST_TIMEOUT_SECS,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test(start_paused = true)]
    async fn test_retries_transient_errors() {
        let calls = AtomicU32::new(0);
        let result = with_retry("flaky", || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if n < 2 {
                    Err(DiscshelfError::Api {
                        status: 503,
                        message: "busy".to_string(),
                    })
                } else {
                    Ok(n)
                }
            }
        })
        .await;
        assert_eq!(result.unwrap(), 2);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_does_not_retry_client_errors() {
        let calls = AtomicU32::new(0);
        let result: Result<()> = with_retry("bad request", || {
            calls.fetch_add(1, Ordering::SeqCst);
            async {
                Err(DiscshelfError::Api {
                    status: 401,
                    message: "unauthorized".to_string(),
                })
            }
        })
        .await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_gives_up_after_max_retries() {
        let calls = AtomicU32::new(0);
        let result: Result<()> = with_retry("down", || {
            calls.fetch_add(1, Ordering::SeqCst);
            async {
                Err(DiscshelfError::Api {
                    status: 500,
                    message: "boom".to_string(),
                })
            }
        })
        .await;
        assert!(matches!(result, Err(DiscshelfError::Api { status: 500, .. })));
        assert_eq!(calls.load(Ordering::SeqCst), MAX_RETRIES);
    }
}
