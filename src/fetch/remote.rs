//! Object store asset source with disk cache

use super::store::{ObjectStore, ObjectStoreError};
use super::AssetSource;
use crate::cache::{CacheKey, CachedPayload, DiskCache};
use crate::error::ResizeError;
use crate::metrics::{CacheOutcome, Metrics};
use async_trait::async_trait;
use bytes::Bytes;
use std::sync::Arc;

/// Fetches `<bucket>/<logical path>` from an object store
///
/// With a cache configured, successful fetches are stored and `NoSuchKey`
/// answers are stored as negative entries. Cache I/O problems never fail
/// a request.
pub struct RemoteSource {
    store: Arc<dyn ObjectStore>,
    bucket: String,
    cache: Option<DiskCache>,
    metrics: Arc<Metrics>,
}

impl RemoteSource {
    pub fn new(
        store: Arc<dyn ObjectStore>,
        bucket: impl Into<String>,
        cache: Option<DiskCache>,
        metrics: Arc<Metrics>,
    ) -> Self {
        Self {
            store,
            bucket: bucket.into(),
            cache,
            metrics,
        }
    }

    async fn lookup(&self, cache: &DiskCache, key: &CacheKey, path: &str) -> Option<CachedPayload> {
        match cache.get(key).await {
            Ok(Some(entry)) => {
                let outcome = if entry.is_negative() {
                    CacheOutcome::NegativeHit
                } else {
                    CacheOutcome::Hit
                };
                self.metrics.record_cache_lookup(outcome);
                tracing::debug!(path = %path, negative = entry.is_negative(), "Disk cache hit");
                Some(entry.payload)
            }
            Ok(None) => {
                self.metrics.record_cache_lookup(CacheOutcome::Miss);
                None
            }
            Err(e) => {
                self.metrics.record_cache_lookup(CacheOutcome::Miss);
                tracing::warn!(path = %path, error = %e, "Disk cache read failed, treating as miss");
                None
            }
        }
    }

    async fn store_in_cache(&self, key: &CacheKey, path: &str, payload: Option<Bytes>) {
        let Some(cache) = &self.cache else {
            return;
        };
        let result = match payload {
            Some(data) => cache.put(key, data).await,
            None => cache.put_missing(key).await,
        };
        if let Err(e) = result {
            self.metrics.increment_cache_write_failure();
            tracing::warn!(path = %path, error = %e, "Disk cache write failed");
        }
    }
}

#[async_trait]
impl AssetSource for RemoteSource {
    async fn fetch(&self, logical_path: &str) -> Result<Bytes, ResizeError> {
        let key = CacheKey::for_path(logical_path);

        if let Some(cache) = &self.cache {
            match self.lookup(cache, &key, logical_path).await {
                Some(CachedPayload::Bytes(data)) => return Ok(data),
                Some(CachedPayload::Missing) => return Err(ResizeError::not_found(logical_path)),
                None => {}
            }
        }

        self.metrics.increment_store_fetch();
        match self.store.get(&self.bucket, logical_path).await {
            Ok(data) => {
                self.store_in_cache(&key, logical_path, Some(data.clone()))
                    .await;
                Ok(data)
            }
            Err(ObjectStoreError::NoSuchKey) => {
                self.metrics.increment_store_error("NoSuchKey");
                self.store_in_cache(&key, logical_path, None).await;
                Err(ResizeError::not_found(logical_path))
            }
            Err(ObjectStoreError::Other { code, message }) => {
                self.metrics.increment_store_error(&code);
                Err(ResizeError::store(code, message))
            }
        }
    }

    fn name(&self) -> &'static str {
        "s3"
    }
}
