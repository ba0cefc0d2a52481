//! Breakpoint controller.
//!
//! The one deliberate suspension point in the system: a process phase hands
//! over a `BreakpointRequest` and the controller blocks its control flow
//! until an external decision arrives, the configured timeout elapses, or
//! the run is cancelled. States: Armed -> Suspended -> Resumed | Aborted.

use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::breakpoint::{BreakpointRequest, BreakpointState, Decision, Verdict};
use crate::domain::models::event::events;
use crate::domain::models::run::RunStatus;
use crate::domain::ports::decision::DecisionSource;
use crate::domain::ports::store::ArtifactStore;
use crate::services::journal::RunJournal;

/// Controller for human-in-the-loop breakpoints within one run.
pub struct BreakpointController {
    source: Arc<dyn DecisionSource>,
    store: Arc<dyn ArtifactStore>,
    journal: Arc<RunJournal>,
    timeout: Duration,
    cancel: CancellationToken,
}

impl BreakpointController {
    pub fn new(
        source: Arc<dyn DecisionSource>,
        store: Arc<dyn ArtifactStore>,
        journal: Arc<RunJournal>,
        timeout: Duration,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            source,
            store,
            journal,
            timeout,
            cancel,
        }
    }

    /// Raise a breakpoint and block until it resolves.
    ///
    /// Returns the decision on approve/amend. A reject decision, a timeout,
    /// and cancellation are all terminal errors for the enclosing run -
    /// breakpoints are blocking gates, not advisory checks.
    pub async fn request(&self, mut request: BreakpointRequest) -> DomainResult<Decision> {
        // Armed: candidate files are a promise, not a guarantee. Verify and
        // flag rather than assume.
        for file in &mut request.files {
            if !self.store.exists(&file.path).await {
                warn!(
                    breakpoint = %request.title,
                    path = %file.path,
                    "breakpoint references a file that does not exist yet"
                );
                file.missing = true;
            }
        }

        self.journal_event(
            events::BREAKPOINT_ARMED,
            json!({
                "breakpoint_id": request.id,
                "title": request.title,
                "files": request.files,
            }),
        )
        .await;

        self.source.publish(&request).await?;

        // Suspended: the run status is externally visible while blocked.
        let _ = self.journal.set_status(RunStatus::Suspended).await;
        debug!(
            breakpoint = %request.title,
            state = BreakpointState::Suspended.as_str(),
            timeout_secs = self.timeout.as_secs(),
            "awaiting external decision"
        );

        let suspended_at = Instant::now();
        let outcome = tokio::select! {
            () = self.cancel.cancelled() => Err(DomainError::Canceled),
            decided = tokio::time::timeout(self.timeout, self.source.await_decision(&request)) => {
                match decided {
                    Ok(result) => result,
                    Err(_) => Err(DomainError::BreakpointTimeout {
                        title: request.title.clone(),
                        waited_ms: suspended_at.elapsed().as_millis() as u64,
                    }),
                }
            }
        };

        match outcome {
            Ok(decision) => {
                self.journal_event(
                    events::BREAKPOINT_RESOLVED,
                    json!({
                        "breakpoint_id": request.id,
                        "verdict": decision.verdict.as_str(),
                        "note": decision.note,
                    }),
                )
                .await;
                let _ = self.journal.set_status(RunStatus::Running).await;

                if decision.verdict == Verdict::Reject {
                    return Err(DomainError::BreakpointRejected {
                        title: request.title,
                        note: decision.note,
                    });
                }
                Ok(decision)
            }
            Err(err) => {
                self.journal_event(
                    events::BREAKPOINT_ABORTED,
                    json!({
                        "breakpoint_id": request.id,
                        "reason": err.kind(),
                    }),
                )
                .await;
                Err(err)
            }
        }
    }

    async fn journal_event(&self, event: &str, data: serde_json::Value) {
        if let Err(err) = self.journal.append(event, data).await {
            warn!(event = %event, error = %err, "failed to append journal entry");
        }
    }
}
