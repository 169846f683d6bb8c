//! Backend trait for filesystem operations

use super::error::DiskCacheError;
use async_trait::async_trait;
use bytes::Bytes;
use std::path::Path;
use std::time::SystemTime;

/// Abstraction over the filesystem calls the cache makes
#[async_trait]
pub trait DiskBackend: Send + Sync {
    /// Read entire file contents
    async fn read_file(&self, path: &Path) -> Result<Bytes, DiskCacheError>;

    /// Write file contents atomically (unique temp file + rename)
    async fn write_file_atomic(&self, path: &Path, data: Bytes) -> Result<(), DiskCacheError>;

    /// Last modification time
    async fn modified_at(&self, path: &Path) -> Result<SystemTime, DiskCacheError>;

    /// Set the access time to now
    async fn touch(&self, path: &Path) -> Result<(), DiskCacheError>;
}
