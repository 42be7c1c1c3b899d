//! Timeline collection for postwatch.
//!
//! Drives an authenticated browser page through scroll steps, extracts post
//! records, and narrows them to recent posts by the target profile.

pub mod browser;
pub mod collector;
pub mod error;
pub mod filter;
pub mod page;
pub mod types;

pub use browser::{parse_cookie_header, BrowserOptions, ChromiumSession};
pub use collector::{CollectorOptions, FeedCollector, SeenUrls};
pub use error::CollectorError;
pub use filter::{filter_recent, post_url_pattern, RecencyFilter};
pub use page::AuthenticatedPage;
pub use types::{PostRecord, RawPost};
