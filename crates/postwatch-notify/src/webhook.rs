//! Discord webhook client.
//!
//! Posts plain-text messages with mentions disabled, so a post that
//! contains `@everyone` cannot ping the channel.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::error::NotifyError;
use crate::notifier::Notifier;
use crate::rate_limit::retry_with_backoff;

/// Fallback wait when a 429 carries no usable hint.
const DEFAULT_RETRY_AFTER_MS: u64 = 1_000;

#[derive(Debug, Clone)]
pub struct WebhookOptions {
    pub timeout_secs: u64,
    /// Additional attempts after the first failure, for retriable errors.
    pub max_retries: u32,
    pub backoff_base_secs: u64,
}

impl Default for WebhookOptions {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            max_retries: 3,
            backoff_base_secs: 1,
        }
    }
}

#[derive(Debug, Serialize)]
struct WebhookMessage<'a> {
    content: &'a str,
    allowed_mentions: AllowedMentions,
}

#[derive(Debug, Serialize)]
struct AllowedMentions {
    parse: [&'static str; 0],
}

#[derive(Debug, Deserialize)]
struct RateLimitBody {
    retry_after: f64,
}

/// One open webhook channel. Cheap to share by reference across profiles.
pub struct DiscordWebhook {
    client: Client,
    url: String,
    label: String,
    max_retries: u32,
    backoff_base_ms: u64,
    closed: AtomicBool,
}

impl std::fmt::Debug for DiscordWebhook {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiscordWebhook")
            .field("label", &self.label)
            .field("url", &"[redacted]")
            .field("max_retries", &self.max_retries)
            .field("closed", &self.closed.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}

impl DiscordWebhook {
    /// Opens a webhook channel. `label` names the channel in logs, since the
    /// URL itself is a secret.
    ///
    /// # Errors
    ///
    /// Returns [`NotifyError::InvalidWebhookUrl`] when `url` is not an
    /// absolute http(s) URL, and [`NotifyError::Http`] if the HTTP client
    /// cannot be built.
    pub fn new(url: &str, label: &str, options: &WebhookOptions) -> Result<Self, NotifyError> {
        let parsed = reqwest::Url::parse(url)
            .map_err(|e| NotifyError::InvalidWebhookUrl(format!("{label}: {e}")))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(NotifyError::InvalidWebhookUrl(format!(
                "{label}: unsupported scheme {}",
                parsed.scheme()
            )));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(options.timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self {
            client,
            url: url.to_owned(),
            label: label.to_owned(),
            max_retries: options.max_retries,
            backoff_base_ms: options.backoff_base_secs.saturating_mul(1_000),
            closed: AtomicBool::new(false),
        })
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    async fn post_once(&self, content: &str) -> Result<(), NotifyError> {
        let body = WebhookMessage {
            content,
            allowed_mentions: AllowedMentions { parse: [] },
        };
        let response = self.client.post(&self.url).json(&body).send().await?;
        let status = response.status();

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let header_ms = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.trim().parse::<f64>().ok())
                .map(secs_to_ms);
            let text = response.text().await.unwrap_or_default();
            let body_ms = serde_json::from_str::<RateLimitBody>(&text)
                .ok()
                .map(|b| secs_to_ms(b.retry_after));
            return Err(NotifyError::RateLimited {
                retry_after_ms: body_ms.or(header_ms).unwrap_or(DEFAULT_RETRY_AFTER_MS),
            });
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(NotifyError::UnexpectedStatus {
                status: status.as_u16(),
                body,
            });
        }

        Ok(())
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn secs_to_ms(secs: f64) -> u64 {
    if secs.is_finite() && secs > 0.0 {
        (secs * 1_000.0).ceil() as u64
    } else {
        0
    }
}

#[async_trait]
impl Notifier for DiscordWebhook {
    async fn notify(&self, message: &str) -> Result<(), NotifyError> {
        if self.is_closed() {
            return Err(NotifyError::Closed);
        }
        retry_with_backoff(self.max_retries, self.backoff_base_ms, || {
            self.post_once(message)
        })
        .await
    }

    async fn close(&self) {
        if !self.closed.swap(true, Ordering::SeqCst) {
            tracing::debug!(destination = %self.label, "webhook channel closed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_body_disables_mentions() {
        let body = WebhookMessage {
            content: "https://x.com/a/status/1",
            allowed_mentions: AllowedMentions { parse: [] },
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "content": "https://x.com/a/status/1",
                "allowed_mentions": { "parse": [] }
            })
        );
    }

    #[test]
    fn secs_to_ms_rounds_up_and_clamps() {
        assert_eq!(secs_to_ms(0.2501), 251);
        assert_eq!(secs_to_ms(2.0), 2_000);
        assert_eq!(secs_to_ms(-1.0), 0);
        assert_eq!(secs_to_ms(f64::NAN), 0);
    }

    #[test]
    fn rejects_non_http_url() {
        let err = DiscordWebhook::new("ftp://example.com/hook", "g1", &WebhookOptions::default())
            .unwrap_err();
        assert!(matches!(err, NotifyError::InvalidWebhookUrl(_)));
    }

    #[test]
    fn rejects_relative_url() {
        let err =
            DiscordWebhook::new("not a url", "g1", &WebhookOptions::default()).unwrap_err();
        assert!(matches!(err, NotifyError::InvalidWebhookUrl(_)));
    }

    #[test]
    fn debug_redacts_url() {
        let hook = DiscordWebhook::new(
            "https://discord.com/api/webhooks/1/secret-token",
            "group_1",
            &WebhookOptions::default(),
        )
        .unwrap();
        let debug = format!("{hook:?}");
        assert!(!debug.contains("secret-token"));
    }
}
