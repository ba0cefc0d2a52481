//! Artifact references and the per-run artifact trail.

use serde::{Deserialize, Serialize};
use std::sync::Mutex;

/// Format tag of a persisted artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactFormat {
    Json,
    Text,
    Markdown,
    Other,
}

impl Default for ArtifactFormat {
    fn default() -> Self {
        Self::Json
    }
}

/// Reference to a persisted output, relative to the run directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Artifact {
    pub path: String,
    #[serde(default)]
    pub format: ArtifactFormat,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// Optional inline copy of small payloads, for reviewers that cannot
    /// reach the run directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<serde_json::Value>,
}

impl Artifact {
    pub fn json(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            format: ArtifactFormat::Json,
            label: None,
            content: None,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }
}

/// Append-only sequence of artifacts produced during one run.
///
/// The engine appends an entry only after the corresponding file write has
/// succeeded, so every recorded path exists on disk. Artifacts accumulate
/// across phases regardless of eventual success or failure, for post-mortem
/// inspection.
#[derive(Debug, Default)]
pub struct ArtifactTrail {
    entries: Mutex<Vec<Artifact>>,
}

impl ArtifactTrail {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&self, artifact: Artifact) {
        self.entries
            .lock()
            .expect("artifact trail lock poisoned")
            .push(artifact);
    }

    /// Snapshot of the trail in append order.
    pub fn snapshot(&self) -> Vec<Artifact> {
        self.entries
            .lock()
            .expect("artifact trail lock poisoned")
            .clone()
    }

    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .expect("artifact trail lock poisoned")
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Artifacts whose label matches, in append order.
    pub fn labeled(&self, label: &str) -> Vec<Artifact> {
        self.snapshot()
            .into_iter()
            .filter(|a| a.label.as_deref() == Some(label))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trail_preserves_append_order() {
        let trail = ArtifactTrail::new();
        trail.append(Artifact::json("tasks/a/input.json"));
        trail.append(Artifact::json("tasks/a/result.json"));
        trail.append(Artifact::json("tasks/b/input.json"));

        let paths: Vec<String> = trail.snapshot().into_iter().map(|a| a.path).collect();
        assert_eq!(
            paths,
            vec![
                "tasks/a/input.json",
                "tasks/a/result.json",
                "tasks/b/input.json"
            ]
        );
    }

    #[test]
    fn test_labeled_lookup() {
        let trail = ArtifactTrail::new();
        trail.append(Artifact::json("tasks/a/result.json").with_label("inventory"));
        trail.append(Artifact::json("tasks/b/result.json").with_label("report"));

        let found = trail.labeled("inventory");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].path, "tasks/a/result.json");
    }
}
