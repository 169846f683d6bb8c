//! Disk-based cache
//!
//! Layout: `<root>/<first two hex chars>/<full sha256 hex>`. A file holds either
//! the raw payload or a fixed sentinel marking a negative entry. Writes go
//! through a uniquely named temp file and a rename, so readers never observe
//! a partial entry.

pub use self::disk_cache::DiskCache;
pub use self::error::DiskCacheError;

pub mod backend;
mod disk_cache;
mod error;
pub mod tokio_backend;
pub mod utils;

#[cfg(test)]
mod mock_backend;
