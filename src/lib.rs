//! Foreman - process orchestration for agent-delegated workflows.
//!
//! Foreman executes multi-phase processes in which each phase either
//! delegates a unit of work to a named agent (through a pluggable backend)
//! and validates the returned JSON against a declared output schema, or
//! suspends at a human-review breakpoint until an external decision is
//! recorded. Every run persists its inputs, results, and event journal
//! under a stable run-directory layout for external tooling.
//!
//! # Architecture
//!
//! - **Domain Layer** (`domain`): models, ports, and the error taxonomy
//! - **Service Layer** (`services`): validator, task engine, breakpoint
//!   controller, journal, and the process runner
//! - **Adapters** (`adapters`): agent backends, decision sources, and the
//!   filesystem artifact store
//! - **Infrastructure** (`infrastructure`): configuration and logging
//! - **CLI Layer** (`cli`): the `foreman` binary's commands
//!
//! # Example
//!
//! ```ignore
//! use foreman::services::{DecisionSourceProvider, ProcessDefinition, ProcessRunner};
//!
//! let definition = ProcessDefinition::from_fn("review-study", |inputs, ctx| async move {
//!     let result = ctx.task(&study_task(), inputs).await?;
//!     Ok(result)
//! });
//! let report = runner.run(&definition, serde_json::json!({})).await;
//! assert!(report.success);
//! ```

pub mod adapters;
pub mod cli;
pub mod domain;
pub mod infrastructure;
pub mod services;

// Re-export commonly used types for convenience
pub use domain::errors::{DomainError, DomainResult};
pub use domain::models::{
    define_task, AgentSpec, Artifact, BreakpointRequest, Config, Decision, EffectId, OutputSchema,
    ProcessReport, ProcessSpec, PromptSpec, PropertyType, RunStatus, TaskDescriptor, TaskFactory,
    Verdict,
};
pub use domain::ports::{AgentBackend, ArtifactStore, DecisionSource, InvocationRequest};
pub use infrastructure::config::{ConfigError, ConfigLoader};
pub use services::{
    DecisionSourceProvider, ProcessCtx, ProcessDefinition, ProcessRunner, TaskEngine,
};
