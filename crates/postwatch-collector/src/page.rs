use std::time::Duration;

use async_trait::async_trait;

use crate::error::CollectorError;
use crate::types::RawPost;

/// A logged-in browser page the collector can drive.
///
/// Session bootstrap (cookies, browser lifecycle) happens before a value of
/// this type exists; the collector only navigates, scrolls, waits, and reads.
#[async_trait]
pub trait AuthenticatedPage: Send + Sync {
    /// Load `url` in the page.
    async fn navigate(&self, url: &str) -> Result<(), CollectorError>;

    /// Scroll the viewport down by `pixels`.
    async fn scroll_by(&self, pixels: u32) -> Result<(), CollectorError>;

    /// Fixed-duration wait for asynchronous rendering to settle.
    async fn pause(&self, duration: Duration) {
        if !duration.is_zero() {
            tokio::time::sleep(duration).await;
        }
    }

    /// Wait until an element matching `selector` exists, or fail with
    /// [`CollectorError::Timeout`] after `timeout`.
    async fn wait_for_selector(&self, selector: &str, timeout: Duration)
        -> Result<(), CollectorError>;

    /// Read every currently rendered post element.
    async fn extract_posts(&self) -> Result<Vec<RawPost>, CollectorError>;
}
