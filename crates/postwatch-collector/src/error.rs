use thiserror::Error;

#[derive(Debug, Error)]
pub enum CollectorError {
    #[error("browser error: {0}")]
    Browser(String),

    #[error("navigation to {url} failed: {reason}")]
    Navigation { url: String, reason: String },

    #[error("timed out after {secs}s waiting for {what}")]
    Timeout { what: String, secs: u64 },

    #[error("could not read posts from page: {0}")]
    Extraction(String),

    #[error("invalid cookie header: {0}")]
    InvalidCookie(String),

    #[error("invalid post URL pattern for profile {profile}: {source}")]
    Pattern {
        profile: String,
        #[source]
        source: regex::Error,
    },
}

impl From<chromiumoxide::error::CdpError> for CollectorError {
    fn from(err: chromiumoxide::error::CdpError) -> Self {
        CollectorError::Browser(err.to_string())
    }
}
