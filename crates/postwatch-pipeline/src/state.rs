//! Persisted dedup state: one JSON blob per (destination, profile).
//!
//! A blob is a pretty-printed, sorted JSON array of normalized post URLs.
//! Unreadable or malformed blobs load as the empty set. Writes replace the
//! whole blob; callers merge before saving.
//!
//! There is no cross-process locking. Two runs sharing a state directory
//! can race on read-merge-write and lose an entry, so one runner per state
//! directory is assumed.

use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;
use postwatch_core::normalize_url;

use crate::error::StateError;

/// Identifies one dedup blob.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StateKey {
    pub destination_key: String,
    pub profile: String,
}

impl StateKey {
    pub fn new(destination_key: &str, profile: &str) -> Self {
        Self {
            destination_key: destination_key.to_owned(),
            profile: profile.to_owned(),
        }
    }

    /// `<destination_key>_last_link_<safe profile>.json`
    pub fn file_name(&self) -> String {
        format!(
            "{}_last_link_{}.json",
            self.destination_key,
            safe_profile(&self.profile)
        )
    }
}

impl std::fmt::Display for StateKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.destination_key, self.profile)
    }
}

/// Replaces every character outside `[A-Za-z0-9_.-]` with `_`.
pub fn safe_profile(profile: &str) -> String {
    profile
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Key to bytes storage for state blobs.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Returns `Ok(None)` when no blob exists for `key`.
    async fn get(&self, key: &StateKey) -> Result<Option<Vec<u8>>, StateError>;

    async fn put(&self, key: &StateKey, bytes: Vec<u8>) -> Result<(), StateError>;
}

#[async_trait]
impl<B: BlobStore + ?Sized> BlobStore for Box<B> {
    async fn get(&self, key: &StateKey) -> Result<Option<Vec<u8>>, StateError> {
        (**self).get(key).await
    }

    async fn put(&self, key: &StateKey, bytes: Vec<u8>) -> Result<(), StateError> {
        (**self).put(key, bytes).await
    }
}

/// Blobs as files in one directory, created on first write.
#[derive(Debug, Clone)]
pub struct FsBlobStore {
    dir: PathBuf,
}

impl FsBlobStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, key: &StateKey) -> PathBuf {
        self.dir.join(key.file_name())
    }
}

fn io_error(path: &Path, source: std::io::Error) -> StateError {
    StateError::Io {
        path: path.to_path_buf(),
        source,
    }
}

#[async_trait]
impl BlobStore for FsBlobStore {
    async fn get(&self, key: &StateKey) -> Result<Option<Vec<u8>>, StateError> {
        let path = self.path_for(key);
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(io_error(&path, e)),
        }
    }

    async fn put(&self, key: &StateKey, bytes: Vec<u8>) -> Result<(), StateError> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| io_error(&self.dir, e))?;

        // Write-then-rename so a crash never leaves a truncated blob.
        let path = self.path_for(key);
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, bytes)
            .await
            .map_err(|e| io_error(&tmp, e))?;
        tokio::fs::rename(&tmp, &path)
            .await
            .map_err(|e| io_error(&path, e))?;
        Ok(())
    }
}

/// In-process blobs keyed by file name.
#[derive(Debug, Default)]
pub struct MemoryBlobStore {
    blobs: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw bytes currently stored for `key`.
    pub fn raw(&self, key: &StateKey) -> Option<Vec<u8>> {
        self.blobs
            .lock()
            .ok()
            .and_then(|blobs| blobs.get(&key.file_name()).cloned())
    }

    pub fn insert_raw(&self, key: &StateKey, bytes: Vec<u8>) {
        if let Ok(mut blobs) = self.blobs.lock() {
            blobs.insert(key.file_name(), bytes);
        }
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn get(&self, key: &StateKey) -> Result<Option<Vec<u8>>, StateError> {
        Ok(self.raw(key))
    }

    async fn put(&self, key: &StateKey, bytes: Vec<u8>) -> Result<(), StateError> {
        self.insert_raw(key, bytes);
        Ok(())
    }
}

/// Reads through to `inner` and discards writes. Used by dry runs.
#[derive(Debug)]
pub struct ReadOnlyStore<S> {
    inner: S,
}

impl<S> ReadOnlyStore<S> {
    pub fn new(inner: S) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl<S: BlobStore> BlobStore for ReadOnlyStore<S> {
    async fn get(&self, key: &StateKey) -> Result<Option<Vec<u8>>, StateError> {
        self.inner.get(key).await
    }

    async fn put(&self, key: &StateKey, bytes: Vec<u8>) -> Result<(), StateError> {
        tracing::info!(key = %key, bytes = bytes.len(), "dry-run: state not written");
        Ok(())
    }
}

/// The set of normalized URLs already delivered, per [`StateKey`].
#[derive(Debug)]
pub struct DedupStore<S> {
    blobs: S,
}

impl<S: BlobStore> DedupStore<S> {
    pub fn new(blobs: S) -> Self {
        Self { blobs }
    }

    pub fn blobs(&self) -> &S {
        &self.blobs
    }

    /// Loads the delivered set for `key`. Entries are normalized on load so
    /// state written by older versions still matches.
    ///
    /// Never fails: missing, unreadable, or malformed blobs yield an empty
    /// set and a warning.
    pub async fn load(&self, key: &StateKey) -> BTreeSet<String> {
        let bytes = match self.blobs.get(key).await {
            Ok(Some(bytes)) => bytes,
            Ok(None) => return BTreeSet::new(),
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "failed to read state, treating as empty");
                return BTreeSet::new();
            }
        };

        match serde_json::from_slice::<Vec<String>>(&bytes) {
            Ok(urls) => urls.iter().map(|u| normalize_url(u)).collect(),
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "malformed state, treating as empty");
                BTreeSet::new()
            }
        }
    }

    /// Replaces the blob for `key` with `urls`.
    ///
    /// # Errors
    ///
    /// Returns [`StateError`] if encoding or the underlying write fails.
    pub async fn save(&self, key: &StateKey, urls: &BTreeSet<String>) -> Result<(), StateError> {
        let list: Vec<&String> = urls.iter().collect();
        let mut bytes = serde_json::to_vec_pretty(&list)?;
        bytes.push(b'\n');
        self.blobs.put(key, bytes).await?;
        tracing::debug!(key = %key, count = urls.len(), "saved state");
        Ok(())
    }
}

#[cfg(test)]
#[path = "state_test.rs"]
mod tests;
