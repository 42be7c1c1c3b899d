//! Per-profile pipeline for postwatch: dedup state, dispatch, and the group
//! router that ties collection, filtering, and delivery together.

pub mod dispatch;
pub mod error;
pub mod router;
pub mod state;

pub use dispatch::{DispatchReport, Dispatcher, LinkRewrite};
pub use error::{ProfileError, StateError};
pub use router::{GroupRouter, RunSummary};
pub use state::{BlobStore, DedupStore, FsBlobStore, MemoryBlobStore, ReadOnlyStore, StateKey};
