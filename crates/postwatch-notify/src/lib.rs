//! Destination delivery for postwatch: the `Notifier` capability, the
//! Discord webhook client behind it, and the per-run set of open
//! destinations.

pub mod destinations;
pub mod error;
pub mod notifier;
pub mod webhook;

mod rate_limit;

pub use destinations::Destinations;
pub use error::NotifyError;
pub use notifier::{DryRunNotifier, Notifier};
pub use webhook::{DiscordWebhook, WebhookOptions};
