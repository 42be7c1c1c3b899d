use thiserror::Error;

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("rate limited by destination (retry after {retry_after_ms}ms)")]
    RateLimited { retry_after_ms: u64 },

    #[error("unexpected HTTP status {status} from destination: {body}")]
    UnexpectedStatus { status: u16, body: String },

    #[error("invalid webhook URL: {0}")]
    InvalidWebhookUrl(String),

    #[error("destination channel already closed")]
    Closed,
}
