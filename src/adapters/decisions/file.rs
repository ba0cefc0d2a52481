//! File decision source.
//!
//! Publishes each breakpoint request as
//! `breakpoints/<breakpoint_id>.json` inside the run directory and polls
//! for a reviewer-written `breakpoints/<breakpoint_id>.decision.json`.
//! The `foreman decide` command writes that file; any tool (or a human with
//! an editor) can do the same.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use uuid::Uuid;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::breakpoint::{BreakpointRequest, Decision};
use crate::domain::ports::decision::DecisionSource;
use crate::domain::ports::store::ArtifactStore;

/// Relative path of a published breakpoint request.
pub fn request_path(breakpoint_id: Uuid) -> String {
    format!("breakpoints/{breakpoint_id}.json")
}

/// Relative path a reviewer records the decision at.
pub fn decision_path(breakpoint_id: Uuid) -> String {
    format!("breakpoints/{breakpoint_id}.decision.json")
}

/// Decision source backed by the run directory.
pub struct FileDecisionSource {
    store: Arc<dyn ArtifactStore>,
    poll_interval: Duration,
}

impl FileDecisionSource {
    pub fn new(store: Arc<dyn ArtifactStore>, poll_interval: Duration) -> Self {
        Self {
            store,
            poll_interval,
        }
    }
}

#[async_trait]
impl DecisionSource for FileDecisionSource {
    fn name(&self) -> &'static str {
        "file"
    }

    async fn publish(&self, request: &BreakpointRequest) -> DomainResult<()> {
        self.store
            .write_json(&request_path(request.id), &serde_json::to_value(request)?)
            .await
    }

    async fn await_decision(&self, request: &BreakpointRequest) -> DomainResult<Decision> {
        let path = decision_path(request.id);
        loop {
            if self.store.exists(&path).await {
                let raw = self.store.read_json(&path).await?;
                return serde_json::from_value::<Decision>(raw)
                    .map_err(|err| DomainError::InvalidDecision(err.to_string()));
            }
            sleep(self.poll_interval).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::store::FsArtifactStore;
    use crate::domain::models::breakpoint::Verdict;
    use serde_json::json;

    async fn store_in(dir: &std::path::Path) -> Arc<dyn ArtifactStore> {
        Arc::new(FsArtifactStore::create(dir.join("run")).await.unwrap())
    }

    #[tokio::test]
    async fn test_publish_writes_request_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(dir.path()).await;
        let source = FileDecisionSource::new(store.clone(), Duration::from_millis(10));

        let request = BreakpointRequest::new("Review inventory", "Approve the totals?");
        source.publish(&request).await.unwrap();

        let raw = store.read_json(&request_path(request.id)).await.unwrap();
        assert_eq!(raw["title"], json!("Review inventory"));
        assert_eq!(raw["question"], json!("Approve the totals?"));
    }

    #[tokio::test]
    async fn test_decision_file_resolves_waiter() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(dir.path()).await;
        let source = Arc::new(FileDecisionSource::new(
            store.clone(),
            Duration::from_millis(5),
        ));

        let request = BreakpointRequest::new("Review", "Proceed?");
        source.publish(&request).await.unwrap();

        let waiter = {
            let source = source.clone();
            let request = request.clone();
            tokio::spawn(async move { source.await_decision(&request).await })
        };

        // A minimal hand-written decision file: no decided_at.
        store
            .write_json(
                &decision_path(request.id),
                &json!({"verdict": "amend", "payload": {"scope": "reduced"}}),
            )
            .await
            .unwrap();

        let decision = waiter.await.unwrap().unwrap();
        assert_eq!(decision.verdict, Verdict::Amend);
        assert_eq!(decision.payload.unwrap()["scope"], json!("reduced"));
    }

    #[tokio::test]
    async fn test_unparseable_decision_is_invalid() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(dir.path()).await;
        let source = FileDecisionSource::new(store.clone(), Duration::from_millis(5));

        let request = BreakpointRequest::new("Review", "Proceed?");
        store
            .write_json(&decision_path(request.id), &json!({"verdict": "maybe"}))
            .await
            .unwrap();

        let err = source.await_decision(&request).await.unwrap_err();
        assert!(matches!(err, DomainError::InvalidDecision(_)));
    }
}
