//! Asset fetching
//!
//! Turns a logical asset path (source image or watermark) into raw bytes.
//! Which backend serves the bytes is fixed at startup from the `storage`
//! config section.

mod local;
mod remote;
mod s3;
mod store;

pub use local::LocalSource;
pub use remote::RemoteSource;
pub use s3::S3ObjectStore;
pub use store::{MemoryObjectStore, ObjectStore, ObjectStoreError};

use crate::cache::{CacheConfig, DiskCache};
use crate::config::StorageConfig;
use crate::error::ResizeError;
use crate::metrics::Metrics;
use async_trait::async_trait;
use bytes::Bytes;
use std::sync::Arc;

/// A place assets can be read from
#[async_trait]
pub trait AssetSource: Send + Sync {
    /// Fetch the asset at `logical_path`; missing assets are `NotFound`
    async fn fetch(&self, logical_path: &str) -> Result<Bytes, ResizeError>;

    /// Backend label for logs
    fn name(&self) -> &'static str;
}

/// Shared handle over the configured asset source
#[derive(Clone)]
pub struct AssetFetcher {
    source: Arc<dyn AssetSource>,
}

impl AssetFetcher {
    pub fn new(source: Arc<dyn AssetSource>) -> Self {
        Self { source }
    }

    /// Build the fetcher for the configured storage backend
    pub async fn from_config(
        storage: &StorageConfig,
        cache: &CacheConfig,
        metrics: Arc<Metrics>,
    ) -> Self {
        let source: Arc<dyn AssetSource> = match storage {
            StorageConfig::Local(local) => {
                if cache.enabled {
                    tracing::info!("Disk cache is not used with the local storage backend");
                }
                Arc::new(LocalSource::new(&local.base_dir))
            }
            StorageConfig::S3(s3) => {
                let store = Arc::new(S3ObjectStore::from_config(s3).await);
                let disk_cache = cache.enabled.then(|| DiskCache::new(&cache.dir));
                Arc::new(RemoteSource::new(store, &s3.bucket, disk_cache, metrics))
            }
        };

        tracing::info!(backend = source.name(), "Asset fetcher ready");
        Self { source }
    }

    pub async fn fetch(&self, logical_path: &str) -> Result<Bytes, ResizeError> {
        self.source.fetch(logical_path).await
    }

    pub fn backend_name(&self) -> &'static str {
        self.source.name()
    }
}

impl std::fmt::Debug for AssetFetcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AssetFetcher")
            .field("backend", &self.source.name())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LocalStorageConfig;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_from_config_local_backend() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("a.jpg"), b"a").unwrap();

        let storage = StorageConfig::Local(LocalStorageConfig {
            base_dir: dir.path().to_string_lossy().into_owned(),
        });
        let fetcher =
            AssetFetcher::from_config(&storage, &CacheConfig::default(), Arc::new(Metrics::new()))
                .await;

        assert_eq!(fetcher.backend_name(), "local");
        assert_eq!(fetcher.fetch("a.jpg").await.unwrap(), Bytes::from_static(b"a"));
    }

    #[tokio::test]
    async fn test_fetcher_delegates_to_remote_source() {
        let store = Arc::new(MemoryObjectStore::new());
        store.insert("bucket", "wm/logo.png", Bytes::from_static(b"png"));
        let fetcher = AssetFetcher::new(Arc::new(RemoteSource::new(
            store,
            "bucket",
            None,
            Arc::new(Metrics::new()),
        )));

        assert_eq!(fetcher.backend_name(), "s3");
        assert_eq!(fetcher.fetch("wm/logo.png").await.unwrap(), Bytes::from_static(b"png"));
    }
}
