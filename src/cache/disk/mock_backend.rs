//! Mock disk backend for testing (in-memory HashMap storage)

use super::backend::DiskBackend;
use super::error::DiskCacheError;
use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;

#[derive(Clone)]
struct MockFile {
    data: Bytes,
    modified: SystemTime,
    touches: usize,
}

/// Mock backend that stores files in memory for testing
#[derive(Clone, Default)]
pub struct MockDiskBackend {
    files: Arc<RwLock<HashMap<PathBuf, MockFile>>>,
    /// Simulate errors if true
    simulate_read_failure: Arc<RwLock<bool>>,
    simulate_write_failure: Arc<RwLock<bool>>,
}

impl MockDiskBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every read fail with a permission error
    pub fn set_read_failure(&self, enabled: bool) {
        *self.simulate_read_failure.write() = enabled;
    }

    /// Make every write fail with a storage-full error
    pub fn set_write_failure(&self, enabled: bool) {
        *self.simulate_write_failure.write() = enabled;
    }

    /// Get number of stored files
    pub fn file_count(&self) -> usize {
        self.files.read().len()
    }

    pub fn contents(&self, path: &Path) -> Option<Bytes> {
        self.files.read().get(path).map(|f| f.data.clone())
    }

    pub fn touch_count(&self, path: &Path) -> usize {
        self.files.read().get(path).map(|f| f.touches).unwrap_or(0)
    }

    fn not_found() -> DiskCacheError {
        DiskCacheError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "File not found",
        ))
    }
}

#[async_trait]
impl DiskBackend for MockDiskBackend {
    async fn read_file(&self, path: &Path) -> Result<Bytes, DiskCacheError> {
        if *self.simulate_read_failure.read() {
            return Err(DiskCacheError::Io(std::io::Error::new(
                std::io::ErrorKind::PermissionDenied,
                "Simulated permission denied",
            )));
        }

        self.files
            .read()
            .get(path)
            .map(|f| f.data.clone())
            .ok_or_else(Self::not_found)
    }

    async fn write_file_atomic(&self, path: &Path, data: Bytes) -> Result<(), DiskCacheError> {
        if *self.simulate_write_failure.read() {
            return Err(DiskCacheError::Io(std::io::Error::new(
                std::io::ErrorKind::Other,
                "Simulated storage full",
            )));
        }

        self.files.write().insert(
            path.to_path_buf(),
            MockFile {
                data,
                modified: SystemTime::now(),
                touches: 0,
            },
        );
        Ok(())
    }

    async fn modified_at(&self, path: &Path) -> Result<SystemTime, DiskCacheError> {
        self.files
            .read()
            .get(path)
            .map(|f| f.modified)
            .ok_or_else(Self::not_found)
    }

    async fn touch(&self, path: &Path) -> Result<(), DiskCacheError> {
        match self.files.write().get_mut(path) {
            Some(file) => {
                file.touches += 1;
                Ok(())
            }
            None => Err(Self::not_found()),
        }
    }
}
