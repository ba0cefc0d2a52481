//! Domain errors for the foreman orchestration core.

use thiserror::Error;

use crate::domain::models::schema::SchemaViolations;

/// Domain-level errors that can occur while running a process.
#[derive(Debug, Error)]
pub enum DomainError {
    /// A task builder omitted a required descriptor field. Raised at
    /// process-definition time, before any agent is invoked.
    #[error("Task descriptor '{task}' is incomplete: missing {}", missing.join(", "))]
    DescriptorIncomplete { task: String, missing: Vec<String> },

    /// An agent response did not conform to the task's output schema.
    /// Recoverable: the engine retries with the violations fed back.
    #[error("Schema validation failed: {0}")]
    SchemaValidation(SchemaViolations),

    /// The agent backend failed to produce a response.
    #[error("Agent invocation via '{backend}' failed: {reason}")]
    AgentInvocation {
        backend: String,
        reason: String,
        /// Transient failures (timeouts, 5xx, unavailable backend) are
        /// retried; permanent ones are not.
        transient: bool,
    },

    /// Validation retries were exhausted for a task. Terminal for the phase.
    #[error("Task '{task}' failed schema validation after {attempts} attempts: {violations}")]
    ValidationExhausted {
        task: String,
        attempts: u32,
        violations: SchemaViolations,
    },

    /// Transient retries were exhausted for a task. Terminal for the phase.
    #[error("Task '{task}' execution failed: {reason}")]
    TaskExecution { task: String, reason: String },

    /// No decision arrived for a breakpoint within the configured timeout.
    /// Terminal for the whole run.
    #[error("Breakpoint '{title}' timed out after {waited_ms}ms awaiting a decision")]
    BreakpointTimeout { title: String, waited_ms: u64 },

    /// A reviewer rejected the run at a breakpoint gate.
    #[error("Breakpoint '{title}' rejected{}", note.as_ref().map(|n| format!(": {n}")).unwrap_or_default())]
    BreakpointRejected { title: String, note: Option<String> },

    /// The run was cancelled from outside. Terminal, no retry; artifacts
    /// written so far are left intact.
    #[error("Run was cancelled")]
    Canceled,

    /// A declarative process spec failed structural validation.
    #[error("Invalid process spec: {0}")]
    InvalidProcessSpec(String),

    /// A phase referenced a backend that is not configured.
    #[error("Unknown agent backend: {0}")]
    UnknownBackend(String),

    /// A declarative phase referenced an input, result, or decision that
    /// does not exist at that point in the pipeline.
    #[error("Unresolved reference '{reference}' in phase '{phase}'")]
    UnresolvedReference { phase: String, reference: String },

    /// A recorded decision could not be parsed or carried an unknown verdict.
    #[error("Invalid decision: {0}")]
    InvalidDecision(String),

    #[error("Storage error: {0}")]
    Storage(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl DomainError {
    /// Whether the engine's transient-failure retry policy applies.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::AgentInvocation { transient: true, .. })
    }

    /// Short machine-readable tag used in journal entries and reports.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::DescriptorIncomplete { .. } => "descriptor_incomplete",
            Self::SchemaValidation(_) => "schema_validation",
            Self::AgentInvocation { .. } => "agent_invocation",
            Self::ValidationExhausted { .. } => "validation_exhausted",
            Self::TaskExecution { .. } => "task_execution",
            Self::BreakpointTimeout { .. } => "breakpoint_timeout",
            Self::BreakpointRejected { .. } => "breakpoint_rejected",
            Self::Canceled => "canceled",
            Self::InvalidProcessSpec(_) => "invalid_process_spec",
            Self::UnknownBackend(_) => "unknown_backend",
            Self::UnresolvedReference { .. } => "unresolved_reference",
            Self::InvalidDecision(_) => "invalid_decision",
            Self::Storage(_) => "storage",
            Self::Serialization(_) => "serialization",
        }
    }
}

pub type DomainResult<T> = Result<T, DomainError>;
