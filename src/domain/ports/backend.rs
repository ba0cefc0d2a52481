//! Agent backend port - the capability boundary for executing agents.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::errors::DomainResult;
use crate::domain::models::descriptor::TaskDescriptor;
use crate::domain::models::schema::SchemaViolations;

/// One agent invocation: the descriptor plus its resolved arguments.
///
/// On validation retries the previous attempt's violations are carried so
/// the backend can surface them to the agent for self-correction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvocationRequest {
    pub descriptor: TaskDescriptor,
    pub args: Value,
    /// 1-based attempt counter across validation retries.
    pub attempt: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feedback: Option<SchemaViolations>,
}

impl InvocationRequest {
    pub fn new(descriptor: TaskDescriptor, args: Value) -> Self {
        Self {
            descriptor,
            args,
            attempt: 1,
            feedback: None,
        }
    }

    /// Derive the next attempt's request after a validation failure.
    pub fn with_feedback(mut self, feedback: SchemaViolations) -> Self {
        self.attempt += 1;
        self.feedback = Some(feedback);
        self
    }
}

/// Trait for agent execution backends.
///
/// A backend is whatever actually performs an agent's work: a subprocess
/// wrapping an LLM CLI, a remote agent service, a deterministic calculator,
/// or a scripted mock. The only hard contract: produce a JSON value or fail.
/// A malformed response is an error for that invocation, never a best-effort
/// guess - the engine's retry policy decides what happens next.
#[async_trait]
pub trait AgentBackend: Send + Sync {
    /// Backend type name.
    fn name(&self) -> &'static str;

    /// Check whether the backend is reachable and properly configured.
    async fn is_available(&self) -> DomainResult<bool>;

    /// Execute one invocation to completion.
    async fn invoke(&self, request: &InvocationRequest) -> DomainResult<Value>;
}

/// Factory for creating backend instances by type name.
pub trait BackendFactory: Send + Sync {
    fn create(&self, backend_type: &str) -> Option<std::sync::Arc<dyn AgentBackend>>;

    fn available_types(&self) -> Vec<&'static str>;
}
