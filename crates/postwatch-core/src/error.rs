use thiserror::Error;

/// Startup configuration faults. All of these are fatal before any profile
/// is fetched.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing required env var: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for env var {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("group {index} is incomplete: {missing} is missing or empty")]
    IncompleteGroup { index: u32, missing: String },

    #[error("no groups configured; expected DISCORD_WEBHOOK_1 and X_USERNAMES1")]
    NoGroups,
}
