//! Decision source port - the external channel breakpoints resolve through.

use async_trait::async_trait;

use crate::domain::errors::DomainResult;
use crate::domain::models::breakpoint::{BreakpointRequest, Decision};

/// Trait for breakpoint decision channels.
///
/// Publishing makes the request visible to an external actor; awaiting
/// blocks until that actor records a decision. The controller, not the
/// source, owns the timeout and cancellation around `await_decision`.
#[async_trait]
pub trait DecisionSource: Send + Sync {
    /// Source type name.
    fn name(&self) -> &'static str;

    /// Make the request visible to the external decider.
    async fn publish(&self, request: &BreakpointRequest) -> DomainResult<()>;

    /// Block until a decision for this request is recorded.
    async fn await_decision(&self, request: &BreakpointRequest) -> DomainResult<Decision>;
}
