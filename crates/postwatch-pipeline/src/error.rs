use std::path::PathBuf;

use postwatch_collector::CollectorError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StateError {
    #[error("state file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to encode state: {0}")]
    Encode(#[from] serde_json::Error),
}

/// A fault inside one profile's collect, filter, and dispatch pass.
#[derive(Debug, Error)]
pub enum ProfileError {
    #[error(transparent)]
    Collect(#[from] CollectorError),

    #[error(transparent)]
    State(#[from] StateError),

    #[error("no destination channel open for group {0}")]
    MissingDestination(u32),
}
