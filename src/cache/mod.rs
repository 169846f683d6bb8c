// Cache module
//
// Content-addressed local cache for object store fetches. Entries are keyed
// by a hash of the logical asset path and may record that the store has no
// such key (negative entry).

use serde::{Deserialize, Serialize};
use std::time::SystemTime;

pub mod disk;

pub use disk::{DiskCache, DiskCacheError};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CacheConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_cache_dir")]
    pub dir: String,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            dir: default_cache_dir(),
        }
    }
}

fn default_cache_dir() -> String {
    crate::constants::DEFAULT_CACHE_DIR.to_string()
}

impl CacheConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.enabled && self.dir.trim().is_empty() {
            return Err("cache.dir cannot be empty when the cache is enabled".to_string());
        }
        Ok(())
    }
}

/// Cache key derived from a logical asset path
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    hash: String,
}

impl CacheKey {
    pub fn for_path(logical_path: &str) -> Self {
        Self {
            hash: disk::utils::path_to_hash(logical_path),
        }
    }

    /// Full 64-char lowercase hex digest
    pub fn hash(&self) -> &str {
        &self.hash
    }

    /// Two-char directory shard
    pub fn shard(&self) -> &str {
        &self.hash[..2]
    }
}

/// What a cache entry holds
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CachedPayload {
    Bytes(bytes::Bytes),
    /// The object store reported the key as missing
    Missing,
}

/// One stored cache entry
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub key: CacheKey,
    pub payload: CachedPayload,
    pub stored_at: SystemTime,
}

impl CacheEntry {
    pub fn is_negative(&self) -> bool {
        matches!(self.payload, CachedPayload::Missing)
    }
}
