//! Per-run event journal.
//!
//! Every significant runner transition appends one line to the run
//! directory's `journal.jsonl` and rewrites `state.json` with the bumped
//! event counter, so external tooling can follow a run without attaching to
//! the process. Entries are allocated ids from a monotonic per-run counter.

use serde_json::Value;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::domain::errors::DomainResult;
use crate::domain::models::event::JournalEntry;
use crate::domain::models::run::{RunState, RunStatus};
use crate::domain::ports::store::ArtifactStore;

pub const STATE_FILE: &str = "state.json";
pub const JOURNAL_FILE: &str = "journal.jsonl";

/// Writer for one run's `journal.jsonl` + `state.json` pair.
pub struct RunJournal {
    store: Arc<dyn ArtifactStore>,
    state: Mutex<RunState>,
}

impl RunJournal {
    /// Create the journal, persisting the initial run state.
    pub async fn create(store: Arc<dyn ArtifactStore>, state: RunState) -> DomainResult<Self> {
        store
            .write_json(STATE_FILE, &serde_json::to_value(&state)?)
            .await?;
        Ok(Self {
            store,
            state: Mutex::new(state),
        })
    }

    /// Append an event and bump the state counter.
    pub async fn append(&self, event: &str, data: Value) -> DomainResult<()> {
        let mut state = self.state.lock().await;
        let entry = JournalEntry::new(state.next_event_id, event, data);

        self.store
            .append_line(JOURNAL_FILE, &serde_json::to_string(&entry)?)
            .await?;

        state.next_event_id += 1;
        state.updated_at = entry.timestamp;
        self.store
            .write_json(STATE_FILE, &serde_json::to_value(&*state)?)
            .await?;
        Ok(())
    }

    /// Update the run status and persist it.
    pub async fn set_status(&self, status: RunStatus) -> DomainResult<()> {
        let mut state = self.state.lock().await;
        state.status = status;
        state.updated_at = chrono::Utc::now();
        self.store
            .write_json(STATE_FILE, &serde_json::to_value(&*state)?)
            .await?;
        Ok(())
    }

    pub async fn status(&self) -> RunStatus {
        self.state.lock().await.status
    }
}
