//! Object store abstraction
//!
//! The fetcher only needs `get(bucket, key)`. Missing keys are reported
//! separately from every other failure so they can be negatively cached.

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ObjectStoreError {
    #[error("no such key")]
    NoSuchKey,

    #[error("{code}: {message}")]
    Other { code: String, message: String },
}

impl ObjectStoreError {
    pub fn other(code: impl Into<String>, message: impl Into<String>) -> Self {
        ObjectStoreError::Other {
            code: code.into(),
            message: message.into(),
        }
    }

    /// Error code used for metrics labels
    pub fn code(&self) -> &str {
        match self {
            ObjectStoreError::NoSuchKey => "NoSuchKey",
            ObjectStoreError::Other { code, .. } => code,
        }
    }
}

#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn get(&self, bucket: &str, key: &str) -> Result<Bytes, ObjectStoreError>;
}

/// In-memory object store
///
/// Counts every `get` call, which makes it the store of choice for tests
/// that assert how often the remote side was contacted.
#[derive(Default)]
pub struct MemoryObjectStore {
    objects: RwLock<HashMap<(String, String), Bytes>>,
    failure: RwLock<Option<ObjectStoreError>>,
    calls: AtomicUsize,
}

impl MemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, bucket: &str, key: &str, data: impl Into<Bytes>) {
        self.objects
            .write()
            .insert((bucket.to_string(), key.to_string()), data.into());
    }

    /// Make every subsequent `get` fail with `error`
    pub fn fail_with(&self, error: ObjectStoreError) {
        *self.failure.write() = Some(error);
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn get(&self, bucket: &str, key: &str) -> Result<Bytes, ObjectStoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(error) = self.failure.read().clone() {
            return Err(error);
        }
        self.objects
            .read()
            .get(&(bucket.to_string(), key.to_string()))
            .cloned()
            .ok_or(ObjectStoreError::NoSuchKey)
    }
}
