//! Retrying Telegram requests.
//!
//! A 429 carries the server's `retry_after`, which is honoured exactly. Network and IO failures
//! back off exponentially. API errors (blocked, chat not found, bad markup) are final.

use std::future::Future;
use std::time::Duration;

use teloxide::RequestError;
use tracing::warn;

#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Total attempts, including the first.
    pub max_attempts: u32,
    /// Backoff before the second attempt after a transient failure; doubles afterwards.
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(500),
        }
    }
}

impl RetryPolicy {
    /// Delay before attempt `attempt + 1`, or `None` when `err` should not be retried.
    fn delay_for(&self, err: &RequestError, attempt: u32) -> Option<Duration> {
        match err {
            RequestError::RetryAfter(secs) => Some(secs.duration()),
            RequestError::Network(_) | RequestError::Io(_) => {
                Some(self.base_delay * 2u32.saturating_pow(attempt.saturating_sub(1)))
            }
            _ => None,
        }
    }
}

/// Runs `op` until it succeeds, fails permanently, or `policy.max_attempts` is reached. The last
/// error is returned.
pub async fn with_retry<T, F, Fut>(
    operation: &str,
    policy: RetryPolicy,
    mut op: F,
) -> Result<T, RequestError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, RequestError>>,
{
    let mut attempt = 1;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) => {
                let delay = match policy.delay_for(&e, attempt) {
                    Some(delay) if attempt < policy.max_attempts => delay,
                    _ => return Err(e),
                };
                warn!(
                    operation,
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    error = %e,
                    "Telegram request failed, retrying"
                );
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
    use teloxide::types::Seconds;
    use teloxide::ApiError;

    /// **Test: A 429 is retried after exactly the server-given delay.**
    #[tokio::test(start_paused = true)]
    async fn test_retry_after_is_honoured() {
        let calls = AtomicU32::new(0);
        let started = tokio::time::Instant::now();

        let result = with_retry("send_message", RetryPolicy::default(), || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if n == 0 {
                    Err(RequestError::RetryAfter(Seconds::from_seconds(7)))
                } else {
                    Ok(42)
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert!(started.elapsed() >= Duration::from_secs(7));
    }

    /// **Test: API errors are final and not retried.**
    #[tokio::test(start_paused = true)]
    async fn test_api_error_is_not_retried() {
        let calls = AtomicU32::new(0);
        let result: Result<(), _> = with_retry("send_message", RetryPolicy::default(), || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(RequestError::Api(ApiError::BotBlocked)) }
        })
        .await;

        assert!(matches!(result, Err(RequestError::Api(ApiError::BotBlocked))));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    /// **Test: Persistent rate limiting gives up after max_attempts and returns the 429.**
    #[tokio::test(start_paused = true)]
    async fn test_gives_up_after_max_attempts() {
        let calls = AtomicU32::new(0);
        let policy = RetryPolicy {
            max_attempts: 5,
            base_delay: Duration::from_millis(10),
        };
        let result: Result<(), _> = with_retry("set_webhook", policy, || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(RequestError::RetryAfter(Seconds::from_seconds(1))) }
        })
        .await;

        assert!(matches!(result, Err(RequestError::RetryAfter(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 5);
    }
}
