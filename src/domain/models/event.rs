//! Journal entry model.
//!
//! Each run directory carries an append-only `journal.jsonl`; one line per
//! significant runner transition. Entry ids are allocated from the run
//! state's monotonic counter so external tooling can detect gaps.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One line of a run's `journal.jsonl`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JournalEntry {
    pub timestamp: DateTime<Utc>,
    /// Entry class; always "event" today, kept open for tooling.
    #[serde(rename = "type")]
    pub entry_type: String,
    /// Monotonic per-run id, stringified for journal compatibility.
    pub id: String,
    /// Event name, e.g. `task_completed`, `breakpoint_armed`.
    pub event: String,
    #[serde(default)]
    pub data: Value,
}

impl JournalEntry {
    pub fn new(id: u64, event: impl Into<String>, data: Value) -> Self {
        Self {
            timestamp: Utc::now(),
            entry_type: "event".to_string(),
            id: id.to_string(),
            event: event.into(),
            data,
        }
    }
}

/// Event names emitted by the runner. Centralized so journal consumers and
/// tests never drift from the producer.
pub mod events {
    pub const RUN_STARTED: &str = "run_started";
    pub const PHASE_STARTED: &str = "phase_started";
    pub const TASK_ATTEMPT: &str = "task_attempt";
    pub const TASK_COMPLETED: &str = "task_completed";
    pub const TASK_FAILED: &str = "task_failed";
    pub const BREAKPOINT_ARMED: &str = "breakpoint_armed";
    pub const BREAKPOINT_RESOLVED: &str = "breakpoint_resolved";
    pub const BREAKPOINT_ABORTED: &str = "breakpoint_aborted";
    pub const RUN_COMPLETED: &str = "run_completed";
    pub const RUN_FAILED: &str = "run_failed";
}
