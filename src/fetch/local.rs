//! Local filesystem asset source

use super::AssetSource;
use crate::error::ResizeError;
use async_trait::async_trait;
use bytes::Bytes;
use std::path::{Component, Path, PathBuf};

/// Reads assets from `<base_dir>/<logical path>`; never cached
#[derive(Debug, Clone)]
pub struct LocalSource {
    base_dir: PathBuf,
}

impl LocalSource {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    /// Map a logical path under the base directory, refusing anything that
    /// could point outside it
    fn resolve(&self, logical_path: &str) -> Option<PathBuf> {
        let relative = Path::new(logical_path);
        let escapes = relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
        if escapes {
            return None;
        }
        Some(self.base_dir.join(relative))
    }
}

#[async_trait]
impl AssetSource for LocalSource {
    async fn fetch(&self, logical_path: &str) -> Result<Bytes, ResizeError> {
        let path = self
            .resolve(logical_path)
            .ok_or_else(|| ResizeError::not_found(logical_path))?;

        match tokio::fs::read(&path).await {
            Ok(data) => Ok(Bytes::from(data)),
            Err(e) => {
                tracing::debug!(path = %path.display(), error = %e, "Local asset read failed");
                Err(ResizeError::not_found(logical_path))
            }
        }
    }

    fn name(&self) -> &'static str {
        "local"
    }
}
