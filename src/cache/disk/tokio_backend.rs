//! Tokio-based filesystem backend

use super::backend::DiskBackend;
use super::error::DiskCacheError;
use super::utils::temp_path;
use async_trait::async_trait;
use bytes::Bytes;
use std::fs::{File, FileTimes};
use std::path::Path;
use std::time::SystemTime;

/// Filesystem backend using tokio::fs
#[derive(Default)]
pub struct TokioFsBackend;

impl TokioFsBackend {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl DiskBackend for TokioFsBackend {
    async fn read_file(&self, path: &Path) -> Result<Bytes, DiskCacheError> {
        let data = tokio::fs::read(path).await?;
        Ok(Bytes::from(data))
    }

    async fn write_file_atomic(&self, path: &Path, data: Bytes) -> Result<(), DiskCacheError> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        // Unique name so concurrent writers never share a temp file
        let temp = temp_path(path);
        if let Err(e) = tokio::fs::write(&temp, &data).await {
            let _ = tokio::fs::remove_file(&temp).await;
            return Err(e.into());
        }

        if let Err(e) = tokio::fs::rename(&temp, path).await {
            let _ = tokio::fs::remove_file(&temp).await;
            return Err(e.into());
        }

        Ok(())
    }

    async fn modified_at(&self, path: &Path) -> Result<SystemTime, DiskCacheError> {
        let metadata = tokio::fs::metadata(path).await?;
        Ok(metadata.modified()?)
    }

    async fn touch(&self, path: &Path) -> Result<(), DiskCacheError> {
        let path = path.to_path_buf();
        tokio::task::spawn_blocking(move || {
            let file = File::open(&path)?;
            file.set_times(FileTimes::new().set_accessed(SystemTime::now()))
        })
        .await
        .map_err(|e| DiskCacheError::Task(e.to_string()))??;
        Ok(())
    }
}
