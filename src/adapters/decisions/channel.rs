//! In-process decision source.
//!
//! Decisions are pushed onto a queue by the embedding application (or a
//! test) and consumed by breakpoints in arrival order. Published requests
//! are retained for inspection.

use async_trait::async_trait;
use std::collections::VecDeque;
use tokio::sync::{Mutex, Notify};

use crate::domain::errors::DomainResult;
use crate::domain::models::breakpoint::{BreakpointRequest, Decision};
use crate::domain::ports::decision::DecisionSource;

/// Queue-backed decision source for embedded and test use.
#[derive(Default)]
pub struct ChannelDecisionSource {
    queue: Mutex<VecDeque<Decision>>,
    published: Mutex<Vec<BreakpointRequest>>,
    notify: Notify,
}

impl ChannelDecisionSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a decision for the next breakpoint that awaits one.
    pub async fn enqueue(&self, decision: Decision) {
        self.queue.lock().await.push_back(decision);
        self.notify.notify_one();
    }

    /// All requests published so far, in order.
    pub async fn published(&self) -> Vec<BreakpointRequest> {
        self.published.lock().await.clone()
    }
}

#[async_trait]
impl DecisionSource for ChannelDecisionSource {
    fn name(&self) -> &'static str {
        "channel"
    }

    async fn publish(&self, request: &BreakpointRequest) -> DomainResult<()> {
        self.published.lock().await.push(request.clone());
        Ok(())
    }

    async fn await_decision(&self, _request: &BreakpointRequest) -> DomainResult<Decision> {
        loop {
            if let Some(decision) = self.queue.lock().await.pop_front() {
                return Ok(decision);
            }
            self.notify.notified().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::breakpoint::Verdict;
    use std::sync::Arc;
    use std::time::Duration;

    #[tokio::test]
    async fn test_enqueued_decision_resolves_waiter() {
        let source = Arc::new(ChannelDecisionSource::new());
        let request = BreakpointRequest::new("Review", "Proceed?");
        source.publish(&request).await.unwrap();

        let waiter = {
            let source = source.clone();
            let request = request.clone();
            tokio::spawn(async move { source.await_decision(&request).await })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;
        source.enqueue(Decision::approve()).await;

        let decision = waiter.await.unwrap().unwrap();
        assert_eq!(decision.verdict, Verdict::Approve);
        assert_eq!(source.published().await.len(), 1);
    }

    #[tokio::test]
    async fn test_preloaded_decision_resolves_immediately() {
        let source = ChannelDecisionSource::new();
        source.enqueue(Decision::reject("scope too broad")).await;

        let request = BreakpointRequest::new("Review", "Proceed?");
        let decision = source.await_decision(&request).await.unwrap();
        assert_eq!(decision.verdict, Verdict::Reject);
    }
}
