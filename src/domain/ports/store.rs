//! Artifact store port - persistence for one run's directory.

use async_trait::async_trait;
use serde_json::Value;
use std::path::Path;

use crate::domain::errors::DomainResult;

/// Trait for per-run artifact persistence.
///
/// All paths are relative to the run directory, preserving the external
/// layout contract (`tasks/<effect_id>/input.json`, `state.json`,
/// `journal.jsonl`, `breakpoints/...`). Writes create parent directories
/// and truncate existing files, which is what makes retried attempts under
/// the same effect id idempotent.
#[async_trait]
pub trait ArtifactStore: Send + Sync {
    /// Absolute root of the run directory.
    fn root(&self) -> &Path;

    /// Serialize a JSON value to `rel`, flushing before returning.
    async fn write_json(&self, rel: &str, value: &Value) -> DomainResult<()>;

    /// Read and parse a JSON document at `rel`.
    async fn read_json(&self, rel: &str) -> DomainResult<Value>;

    /// Append one line to the file at `rel`, creating it if needed.
    async fn append_line(&self, rel: &str, line: &str) -> DomainResult<()>;

    /// Whether a file exists at `rel`.
    async fn exists(&self, rel: &str) -> bool;
}
