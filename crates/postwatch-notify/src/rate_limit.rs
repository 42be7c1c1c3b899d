//! Retry with back-off for webhook deliveries.
//!
//! Discord answers bursts with HTTP 429 and a `retry_after` hint; that hint
//! is honoured exactly. Other transient failures (network errors, 5xx) back
//! off exponentially with jitter. Everything else is returned at once.

use std::future::Future;
use std::time::Duration;

use crate::error::NotifyError;

/// Upper bound on any single wait, including server-provided hints.
const MAX_DELAY_MS: u64 = 60_000;

/// Returns `true` for errors that are worth retrying after a delay.
///
/// **Retriable:** 429 rate limits, timeouts, connection failures, and 5xx.
///
/// **Not retriable:** other 4xx statuses (a deleted or malformed webhook
/// will not recover), an invalid URL, and a closed channel.
pub(crate) fn is_retriable(err: &NotifyError) -> bool {
    match err {
        NotifyError::RateLimited { .. } => true,
        NotifyError::Http(e) => {
            e.is_timeout() || e.is_connect() || e.status().is_some_and(|s| s.is_server_error())
        }
        NotifyError::UnexpectedStatus { status, .. } => *status >= 500,
        NotifyError::InvalidWebhookUrl(_) | NotifyError::Closed => false,
    }
}

/// Delay before retry number `attempt` (1-based).
fn retry_delay(err: &NotifyError, attempt: u32, backoff_base_ms: u64) -> Duration {
    if let NotifyError::RateLimited { retry_after_ms } = err {
        return Duration::from_millis((*retry_after_ms).min(MAX_DELAY_MS));
    }
    let computed = backoff_base_ms.saturating_mul(1u64 << (attempt - 1).min(10));
    let capped = computed.min(MAX_DELAY_MS);
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    let jittered = (capped as f64 * (rand::random::<f64>() * 0.5 + 0.75)) as u64;
    Duration::from_millis(jittered)
}

/// Runs `operation` with up to `max_retries` additional attempts on
/// transient errors. The last error is returned once retries run out.
pub(crate) async fn retry_with_backoff<T, F, Fut>(
    max_retries: u32,
    backoff_base_ms: u64,
    mut operation: F,
) -> Result<T, NotifyError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, NotifyError>>,
{
    let mut attempt = 0u32;
    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                if !is_retriable(&err) || attempt >= max_retries {
                    return Err(err);
                }
                attempt += 1;
                let delay = retry_delay(&err, attempt, backoff_base_ms);
                tracing::warn!(
                    attempt,
                    max_retries,
                    delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                    error = %err,
                    "webhook delivery failed, retrying"
                );
                tokio::time::sleep(delay).await;
            }
        }
    }
}
