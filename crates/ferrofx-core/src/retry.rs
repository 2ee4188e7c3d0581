//! Bounded retry with a fixed delay between attempts.

use std::time::Duration;

use crate::http_client::{HttpClient, HttpError, HttpRequest, HttpResponse};

/// Configuration for the bounded retry mechanism.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryConfig {
    /// The maximum number of retries to attempt.
    /// Total attempts = `max_retries + 1`.
    pub max_retries: u32,
    /// Delay between two attempts.
    pub delay: Duration,
    /// HTTP status codes that should trigger a retry.
    pub retry_on_status: Vec<u16>,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 0,
            delay: Duration::from_millis(100),
            retry_on_status: vec![408, 429, 500, 502, 503, 504],
        }
    }
}

impl RetryConfig {
    pub fn fixed(delay: Duration, max_retries: u32) -> Self {
        Self {
            max_retries,
            delay,
            ..Self::default()
        }
    }

    /// Builds the policy from a total attempt count, where `1` means no retry.
    pub fn from_attempts(times: u32, delay: Duration) -> Self {
        Self::fixed(delay, times.saturating_sub(1))
    }

    pub fn no_retry() -> Self {
        Self::default()
    }

    pub const fn total_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    pub fn should_retry_status(&self, status: u16) -> bool {
        self.retry_on_status.contains(&status)
    }
}

/// Executes `request`, retrying transport failures and retryable statuses.
///
/// The last response is returned as-is once attempts are exhausted, so the
/// caller still sees the upstream status.
pub async fn send_with_retry(
    client: &dyn HttpClient,
    request: HttpRequest,
    retry: &RetryConfig,
) -> Result<HttpResponse, HttpError> {
    let attempts = retry.total_attempts();
    let mut attempt = 1;

    loop {
        let outcome = client.execute(request.clone()).await;
        let has_more = attempt < attempts;

        match outcome {
            Ok(response) if has_more && retry.should_retry_status(response.status) => {
                tracing::warn!(
                    url = %request.url,
                    status = response.status,
                    attempt,
                    attempts,
                    "retryable upstream status"
                );
            }
            Err(error) if has_more && error.retryable() => {
                tracing::warn!(
                    url = %request.url,
                    error = %error,
                    attempt,
                    attempts,
                    "transport failure, retrying"
                );
            }
            other => return other,
        }

        if !retry.delay.is_zero() {
            tokio::time::sleep(retry.delay).await;
        }
        attempt += 1;
    }
}
