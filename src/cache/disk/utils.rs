//! Utility functions for disk cache

use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};

/// SHA-256 of a logical path, lowercase hex
pub fn path_to_hash(logical_path: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(logical_path.as_bytes());
    hex::encode(hasher.finalize())
}

/// `<root>/<hash[..2]>/<hash>`
pub fn entry_path(root: &Path, hash: &str) -> PathBuf {
    root.join(&hash[..2]).join(hash)
}

/// Sibling temp file for an atomic write; unique per call
pub fn temp_path(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!(".{}.{}.tmp", name, uuid::Uuid::new_v4()))
}
