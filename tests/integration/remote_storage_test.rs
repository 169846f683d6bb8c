// Object store backend with the disk cache in front of it

use super::test_harness::*;
use bytes::Bytes;
use image::GenericImageView;
use shashin::cache::{CacheKey, CachedPayload, DiskCache};
use shashin::fetch::{MemoryObjectStore, ObjectStoreError};
use shashin::metrics::{CacheOutcome, Metrics};
use std::sync::Arc;
use tempfile::TempDir;

#[tokio::test]
async fn test_remote_fetch_is_cached_on_disk() {
    let cache_dir = TempDir::new().unwrap();
    let store = Arc::new(MemoryObjectStore::new());
    store.insert(BUCKET, "photos/cat.jpg", jpeg(80, 40));
    let metrics = Arc::new(Metrics::new());
    let handler = remote_handler(Arc::clone(&store), Some(cache_dir.path()), Arc::clone(&metrics));

    let first = get(&handler, "/r40/photos/cat.jpg").await;
    let second = get(&handler, "/r20/photos/cat.jpg").await;

    assert_eq!(first.status, 200);
    assert_eq!(second.status, 200);
    assert_eq!(decode(&second.body).dimensions(), (20, 10));
    assert_eq!(store.call_count(), 1);
    assert_eq!(metrics.get_cache_lookup_count(CacheOutcome::Miss), 1);
    assert_eq!(metrics.get_cache_lookup_count(CacheOutcome::Hit), 1);

    // Entry lives at <root>/<2 hex>/<64 hex>
    let key = CacheKey::for_path("photos/cat.jpg");
    let entry_path = cache_dir.path().join(key.shard()).join(key.hash());
    assert!(entry_path.exists());
    assert_eq!(key.hash().len(), 64);
}

#[tokio::test]
async fn test_missing_key_is_negatively_cached() {
    let cache_dir = TempDir::new().unwrap();
    let store = Arc::new(MemoryObjectStore::new());
    let metrics = Arc::new(Metrics::new());
    let handler = remote_handler(Arc::clone(&store), Some(cache_dir.path()), Arc::clone(&metrics));

    let first = get(&handler, "/n/p").await;
    let second = get(&handler, "/n/p").await;

    assert_eq!(first.status, 404);
    assert_eq!(second.status, 404);
    assert_eq!(store.call_count(), 1);
    assert_eq!(metrics.get_cache_lookup_count(CacheOutcome::NegativeHit), 1);

    let entry = DiskCache::new(cache_dir.path())
        .get(&CacheKey::for_path("p"))
        .await
        .unwrap()
        .unwrap();
    assert!(entry.is_negative());
    assert_eq!(entry.payload, CachedPayload::Missing);
}

#[tokio::test]
async fn test_store_errors_are_500_and_not_cached() {
    let cache_dir = TempDir::new().unwrap();
    let store = Arc::new(MemoryObjectStore::new());
    store.fail_with(ObjectStoreError::other("AccessDenied", "forbidden"));
    let metrics = Arc::new(Metrics::new());
    let handler = remote_handler(Arc::clone(&store), Some(cache_dir.path()), Arc::clone(&metrics));

    let first = get(&handler, "/n/a.jpg").await;
    let second = get(&handler, "/n/a.jpg").await;

    assert_eq!(first.status, 500);
    assert_eq!(second.status, 500);
    assert_eq!(first.body, Bytes::from_static(b"Internal Server Error"));
    assert_eq!(store.call_count(), 2);
    assert_eq!(metrics.get_store_error_count("AccessDenied"), 2);
    assert_eq!(metrics.get_error_count("store"), 2);
}

#[tokio::test]
async fn test_without_cache_every_request_hits_store() {
    let store = Arc::new(MemoryObjectStore::new());
    store.insert(BUCKET, "a.jpg", jpeg(10, 10));
    let handler = remote_handler(Arc::clone(&store), None, Arc::new(Metrics::new()));

    get(&handler, "/n/a.jpg").await;
    get(&handler, "/n/a.jpg").await;
    assert_eq!(store.call_count(), 2);
}

#[tokio::test]
async fn test_watermark_assets_share_the_cache() {
    let cache_dir = TempDir::new().unwrap();
    let store = Arc::new(MemoryObjectStore::new());
    store.insert(BUCKET, "a.jpg", jpeg(50, 50));
    store.insert(BUCKET, "logo.png", png(10, 10, [255, 255, 255, 200]));
    let handler = remote_handler(
        Arc::clone(&store),
        Some(cache_dir.path()),
        Arc::new(Metrics::new()),
    );

    assert_eq!(get(&handler, "/wc-logo.png/a.jpg").await.status, 200);
    assert_eq!(get(&handler, "/wc-50-logo.png/a.jpg").await.status, 200);
    assert_eq!(store.call_count(), 2);
}

#[tokio::test]
async fn test_concurrent_requests_for_same_path() {
    let cache_dir = TempDir::new().unwrap();
    let store = Arc::new(MemoryObjectStore::new());
    store.insert(BUCKET, "a.jpg", jpeg(16, 16));
    let handler = Arc::new(remote_handler(
        Arc::clone(&store),
        Some(cache_dir.path()),
        Arc::new(Metrics::new()),
    ));

    let mut tasks = Vec::new();
    for _ in 0..8 {
        let handler = Arc::clone(&handler);
        tasks.push(tokio::spawn(async move {
            get(&handler, "/r8/a.jpg").await.status
        }));
    }
    for task in tasks {
        assert_eq!(task.await.unwrap(), 200);
    }

    // Racing writers leave one complete entry and no temp files behind
    let key = CacheKey::for_path("a.jpg");
    let shard_dir = cache_dir.path().join(key.shard());
    let files: Vec<_> = std::fs::read_dir(&shard_dir)
        .unwrap()
        .map(|e| e.unwrap().file_name())
        .collect();
    assert_eq!(files.len(), 1);
    assert_eq!(
        std::fs::read(shard_dir.join(key.hash())).unwrap(),
        jpeg(16, 16)
    );
}
