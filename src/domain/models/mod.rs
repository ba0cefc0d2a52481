//! Domain models.

pub mod artifact;
pub mod breakpoint;
pub mod config;
pub mod descriptor;
pub mod event;
pub mod process_spec;
pub mod run;
pub mod schema;

pub use artifact::{Artifact, ArtifactFormat, ArtifactTrail};
pub use breakpoint::{
    ArtifactCandidate, BreakpointRequest, BreakpointState, Decision, Verdict,
};
pub use config::{
    BackendsConfig, CommandBackendConfig, Config, HttpBackendConfig, LoggingConfig, RetryConfig,
    StorageConfig, TimeoutConfig,
};
pub use descriptor::{
    define_task, AgentSpec, EffectId, PromptSpec, TaskCtx, TaskDescriptor, TaskDescriptorShape,
    TaskFactory, TaskIo, TaskKind,
};
pub use event::JournalEntry;
pub use process_spec::{
    resolve_refs, BreakpointSpec, PhaseKindSpec, PhaseSpec, ProcessSpec, ReferenceEnv, TaskSpec,
};
pub use run::{ProcessReport, RunMetadata, RunState, RunStatus};
pub use schema::{OutputSchema, PropertyType, SchemaViolation, SchemaViolations};
