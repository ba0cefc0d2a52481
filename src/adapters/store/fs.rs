//! Filesystem artifact store.
//!
//! Anchors all relative paths at one run directory and preserves the
//! external layout contract: `tasks/<effect_id>/input.json`,
//! `tasks/<effect_id>/result.json`, `state.json`, `journal.jsonl`,
//! `breakpoints/...`. Writes go through a flush before returning so a
//! crashed run never leaves a recorded-but-empty artifact behind.

use async_trait::async_trait;
use serde_json::Value;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::ports::store::ArtifactStore;

/// Artifact store rooted at one run directory.
#[derive(Debug, Clone)]
pub struct FsArtifactStore {
    root: PathBuf,
}

impl FsArtifactStore {
    /// Create the run directory (and parents) and return a store for it.
    pub async fn create(root: impl Into<PathBuf>) -> DomainResult<Self> {
        let root = root.into();
        tokio::fs::create_dir_all(&root).await?;
        Ok(Self { root })
    }

    /// Open an existing run directory without creating anything.
    pub fn open(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn resolve(&self, rel: &str) -> DomainResult<PathBuf> {
        // Relative-only paths keep every write inside the run directory.
        let rel_path = Path::new(rel);
        if rel_path.is_absolute()
            || rel_path
                .components()
                .any(|c| matches!(c, std::path::Component::ParentDir))
        {
            return Err(DomainError::Storage(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("artifact path '{rel}' escapes the run directory"),
            )));
        }
        Ok(self.root.join(rel_path))
    }
}

#[async_trait]
impl ArtifactStore for FsArtifactStore {
    fn root(&self) -> &Path {
        &self.root
    }

    async fn write_json(&self, rel: &str, value: &Value) -> DomainResult<()> {
        let path = self.resolve(rel)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let mut file = tokio::fs::File::create(&path).await?;
        let mut body = serde_json::to_vec_pretty(value)?;
        body.push(b'\n');
        file.write_all(&body).await?;
        file.flush().await?;
        Ok(())
    }

    async fn read_json(&self, rel: &str) -> DomainResult<Value> {
        let path = self.resolve(rel)?;
        let raw = tokio::fs::read(&path).await?;
        Ok(serde_json::from_slice(&raw)?)
    }

    async fn append_line(&self, rel: &str, line: &str) -> DomainResult<()> {
        let path = self.resolve(rel)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await?;
        file.write_all(line.as_bytes()).await?;
        file.write_all(b"\n").await?;
        file.flush().await?;
        Ok(())
    }

    async fn exists(&self, rel: &str) -> bool {
        match self.resolve(rel) {
            Ok(path) => tokio::fs::try_exists(&path).await.unwrap_or(false),
            Err(_) => false,
        }
    }
}
