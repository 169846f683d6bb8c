//! Main DiskCache implementation

use super::backend::DiskBackend;
use super::error::DiskCacheError;
use super::tokio_backend::TokioFsBackend;
use super::utils::entry_path;
use crate::cache::{CacheEntry, CacheKey, CachedPayload};
use crate::constants::NEGATIVE_ENTRY_SENTINEL;
use bytes::Bytes;
use std::path::PathBuf;
use std::sync::Arc;

/// Disk-based cache rooted at a directory
#[derive(Clone)]
pub struct DiskCache {
    root: PathBuf,
    backend: Arc<dyn DiskBackend>,
}

impl std::fmt::Debug for DiskCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiskCache").field("root", &self.root).finish()
    }
}

impl DiskCache {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self::with_backend(root, Arc::new(TokioFsBackend::new()))
    }

    pub fn with_backend(root: impl Into<PathBuf>, backend: Arc<dyn DiskBackend>) -> Self {
        Self {
            root: root.into(),
            backend,
        }
    }

    pub fn entry_path(&self, key: &CacheKey) -> PathBuf {
        entry_path(&self.root, key.hash())
    }

    /// Look up an entry; `Ok(None)` when nothing is stored for `key`
    ///
    /// A positive hit refreshes the file's access time. Failing to do so is
    /// not an error.
    pub async fn get(&self, key: &CacheKey) -> Result<Option<CacheEntry>, DiskCacheError> {
        let path = self.entry_path(key);
        let data = match self.backend.read_file(&path).await {
            Ok(data) => data,
            Err(e) if e.is_not_found() => return Ok(None),
            Err(e) => return Err(e),
        };
        let stored_at = self.backend.modified_at(&path).await?;

        let payload = if data.as_ref() == NEGATIVE_ENTRY_SENTINEL {
            CachedPayload::Missing
        } else {
            if let Err(e) = self.backend.touch(&path).await {
                tracing::debug!(path = %path.display(), error = %e, "Failed to refresh cache entry access time");
            }
            CachedPayload::Bytes(data)
        };

        Ok(Some(CacheEntry {
            key: key.clone(),
            payload,
            stored_at,
        }))
    }

    /// Store a payload under `key`, replacing any prior entry
    ///
    /// A payload identical to the negative-entry sentinel is not stored, so
    /// a sentinel on disk always means the key is missing.
    pub async fn put(&self, key: &CacheKey, data: Bytes) -> Result<(), DiskCacheError> {
        if data.as_ref() == NEGATIVE_ENTRY_SENTINEL {
            tracing::debug!(key = %key.hash(), "Payload matches the negative marker, not caching");
            return Ok(());
        }
        self.backend
            .write_file_atomic(&self.entry_path(key), data)
            .await
    }

    /// Record that the object store has no object for `key`
    pub async fn put_missing(&self, key: &CacheKey) -> Result<(), DiskCacheError> {
        self.backend
            .write_file_atomic(
                &self.entry_path(key),
                Bytes::from_static(NEGATIVE_ENTRY_SENTINEL),
            )
            .await
    }
}
