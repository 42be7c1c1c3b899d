//! Shared types and configuration for postwatch.
//!
//! Holds the post URL normalizer used as the dedup identity, the
//! destination-group model, and environment-driven application config.

pub mod app_config;
pub mod config;
pub mod error;
pub mod groups;
pub mod normalize;

pub use app_config::{AppConfig, SeenMatchPolicy};
pub use config::{load_app_config, load_app_config_from_env};
pub use error::ConfigError;
pub use groups::Group;
pub use normalize::normalize_url;
