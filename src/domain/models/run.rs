//! Process run state and the final report contract.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::domain::errors::DomainError;
use crate::domain::models::artifact::Artifact;

/// Status of a process run, persisted in the run directory's `state.json`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Running,
    /// Blocked at a breakpoint awaiting an external decision.
    Suspended,
    Completed,
    Failed,
    Canceled,
}

impl RunStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Canceled)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Suspended => "suspended",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Canceled => "canceled",
        }
    }
}

impl std::fmt::Display for RunStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The `state.json` document of one run directory.
///
/// External tooling inspects this file to find a run's status without
/// replaying the journal; `next_event_id` is the monotonic counter the
/// journal allocates entry ids from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunState {
    pub run_id: Uuid,
    pub process_id: String,
    pub status: RunStatus,
    pub next_event_id: u64,
    pub started_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl RunState {
    pub fn new(run_id: Uuid, process_id: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            run_id,
            process_id: process_id.into(),
            status: RunStatus::Running,
            next_event_id: 1,
            started_at: now,
            updated_at: now,
        }
    }
}

/// Metadata attached to every process report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunMetadata {
    pub process_id: String,
    pub run_id: Uuid,
    pub timestamp: DateTime<Utc>,
}

/// The structured outcome of one process run.
///
/// A run never surfaces as an unhandled error: callers always get a report
/// and can branch on `success`. On success the process's domain fields are
/// flattened into the top level; on failure `error` and `details` describe
/// the terminal condition. Artifacts reflect everything persisted before the
/// run stopped, success or not.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessReport {
    pub success: bool,
    #[serde(flatten)]
    pub output: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
    pub artifacts: Vec<Artifact>,
    pub duration_ms: u64,
    pub metadata: RunMetadata,
}

impl ProcessReport {
    /// Build a success report from a process function's return value.
    ///
    /// Object outputs flatten into the top level; anything else is reported
    /// under a single `result` field.
    pub fn success(
        output: Value,
        artifacts: Vec<Artifact>,
        duration_ms: u64,
        metadata: RunMetadata,
    ) -> Self {
        let output = match output {
            Value::Object(map) => map,
            Value::Null => Map::new(),
            other => {
                let mut map = Map::new();
                map.insert("result".to_string(), other);
                map
            }
        };
        Self {
            success: true,
            output,
            error: None,
            details: None,
            artifacts,
            duration_ms,
            metadata,
        }
    }

    /// Build a failure report from the terminal error.
    pub fn failure(
        error: &DomainError,
        artifacts: Vec<Artifact>,
        duration_ms: u64,
        metadata: RunMetadata,
    ) -> Self {
        Self {
            success: false,
            output: Map::new(),
            error: Some(error.to_string()),
            details: Some(serde_json::json!({ "kind": error.kind() })),
            artifacts,
            duration_ms,
            metadata,
        }
    }

    /// Fetch a domain field from a success report.
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.output.get(name)
    }
}
