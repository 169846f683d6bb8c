//! Error types for disk cache operations

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DiskCacheError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Blocking task failed: {0}")]
    Task(String),
}

impl DiskCacheError {
    /// Whether the error just means "no entry"
    pub fn is_not_found(&self) -> bool {
        matches!(self, DiskCacheError::Io(e) if e.kind() == std::io::ErrorKind::NotFound)
    }
}
