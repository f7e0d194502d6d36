//! Retry logic with exponential backoff for upstream HTTP calls.
//!
//! Retries on transport errors (connection failures, timeouts) and on 5xx
//! responses. A 4xx response, 404 included, is returned immediately.

use crate::config::RetryPolicy;

/// Send an HTTP request with exponential backoff.
///
/// The closure `f` is called up to `policy.max_retries + 1` times. The
/// last attempt's outcome is returned as-is, whether a transport error or
/// a 5xx response.
pub(crate) async fn retry_send<F, Fut>(
    policy: &RetryPolicy,
    endpoint: &str,
    f: F,
) -> Result<reqwest::Response, reqwest::Error>
where
    F: Fn() -> Fut,
    Fut: std::future::Future<Output = Result<reqwest::Response, reqwest::Error>>,
{
    for attempt in 0..policy.max_retries {
        let delay = policy.delay(attempt);
        match f().await {
            Ok(resp) if resp.status().is_server_error() => {
                tracing::warn!(
                    endpoint,
                    attempt = attempt + 1,
                    max_retries = policy.max_retries,
                    status = resp.status().as_u16(),
                    "upstream returned server error, retrying in {delay:?}"
                );
            }
            Ok(resp) => return Ok(resp),
            Err(e) => {
                tracing::warn!(
                    endpoint,
                    attempt = attempt + 1,
                    max_retries = policy.max_retries,
                    "upstream request failed, retrying in {delay:?}: {e}"
                );
            }
        }
        tokio::time::sleep(delay).await;
    }
    f().await
}
