//! Task descriptor domain model.
//!
//! A `TaskDescriptor` is the immutable value describing one unit of delegated
//! work: which agent persona runs it, what prompt it receives, what shape its
//! output must take, and where its input/result artifacts are persisted.
//! Descriptors are produced by a `TaskFactory` (see [`define_task`]) once per
//! invocation and never mutated afterwards.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::schema::OutputSchema;

/// Opaque unique identifier minted per task invocation.
///
/// Effect ids namespace the artifact paths of one invocation
/// (`tasks/<effect_id>/input.json`, `tasks/<effect_id>/result.json`) and are
/// globally unique across concurrent runs, so the shared artifact namespace
/// needs no further coordination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EffectId(Uuid);

impl EffectId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for EffectId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for EffectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Kind of task. Only agent-delegated work is observed today; the tag keeps
/// the serialized form open for other kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskKind {
    Agent,
}

impl Default for TaskKind {
    fn default() -> Self {
        Self::Agent
    }
}

/// The prompt handed to an agent backend.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PromptSpec {
    /// Persona framing, e.g. "senior environmental engineer".
    #[serde(default)]
    pub role: String,
    /// The work to perform, in natural language.
    pub task: String,
    /// Structured context made available to the agent.
    #[serde(default)]
    pub context: Value,
    /// Step-by-step instructions.
    #[serde(default)]
    pub instructions: Vec<String>,
    /// Expected response format, e.g. "json".
    #[serde(default)]
    pub output_format: String,
}

/// The named agent persona a task delegates to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentSpec {
    /// Agent name, e.g. "environmental-engineer". Backends and the registry
    /// route on this.
    pub name: String,
    /// Optional skill tags the backend may surface to the agent.
    #[serde(default)]
    pub skills: Vec<String>,
    pub prompt: PromptSpec,
}

/// Artifact persistence paths for one task invocation, relative to the run
/// directory. Both are pure functions of the effect id, so re-invocation
/// under the same id is idempotent for persistence purposes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskIo {
    pub input_json_path: String,
    pub output_json_path: String,
}

impl TaskIo {
    pub fn for_effect(effect_id: EffectId) -> Self {
        Self {
            input_json_path: format!("tasks/{effect_id}/input.json"),
            output_json_path: format!("tasks/{effect_id}/result.json"),
        }
    }
}

/// Immutable description of one unit of delegated work.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskDescriptor {
    /// Identifier, unique within a process.
    pub name: String,
    #[serde(default)]
    pub kind: TaskKind,
    /// Human-readable title.
    pub title: String,
    pub agent: AgentSpec,
    pub output_schema: OutputSchema,
    pub io: TaskIo,
    #[serde(default)]
    pub labels: Vec<String>,
    /// The invocation this descriptor was minted for.
    pub effect_id: EffectId,
}

/// Per-invocation context handed to a task builder.
#[derive(Debug, Clone, Copy)]
pub struct TaskCtx {
    pub effect_id: EffectId,
}

/// The fields a task builder returns; the factory completes them into a
/// [`TaskDescriptor`] or rejects the definition.
#[derive(Debug, Clone, Default)]
pub struct TaskDescriptorShape {
    pub title: Option<String>,
    pub agent: Option<AgentSpec>,
    pub output_schema: Option<OutputSchema>,
    pub labels: Vec<String>,
}

impl TaskDescriptorShape {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn agent(mut self, agent: AgentSpec) -> Self {
        self.agent = Some(agent);
        self
    }

    pub fn output_schema(mut self, schema: OutputSchema) -> Self {
        self.output_schema = Some(schema);
        self
    }

    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.labels.push(label.into());
        self
    }
}

type BuildFn = dyn Fn(&Value, &TaskCtx) -> TaskDescriptorShape + Send + Sync;

/// Factory producing immutable task descriptors from call-time arguments.
///
/// Created once per task definition via [`define_task`]; invoked once per
/// task execution with that invocation's arguments and effect id.
#[derive(Clone)]
pub struct TaskFactory {
    name: String,
    build: Arc<BuildFn>,
}

impl TaskFactory {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Build the descriptor for one invocation.
    ///
    /// Fails fast with [`DomainError::DescriptorIncomplete`] when the builder
    /// omitted the agent spec or the output schema, so misconfiguration
    /// surfaces at definition time rather than deep into a run.
    pub fn build(&self, args: &Value, ctx: &TaskCtx) -> DomainResult<TaskDescriptor> {
        let shape = (self.build)(args, ctx);

        let mut missing = Vec::new();
        if shape.agent.is_none() {
            missing.push("agent".to_string());
        }
        if shape.output_schema.is_none() {
            missing.push("output_schema".to_string());
        }
        if !missing.is_empty() {
            return Err(DomainError::DescriptorIncomplete {
                task: self.name.clone(),
                missing,
            });
        }

        Ok(TaskDescriptor {
            name: self.name.clone(),
            kind: TaskKind::Agent,
            title: shape.title.unwrap_or_else(|| self.name.clone()),
            agent: shape.agent.expect("checked above"),
            output_schema: shape.output_schema.expect("checked above"),
            io: TaskIo::for_effect(ctx.effect_id),
            labels: shape.labels,
            effect_id: ctx.effect_id,
        })
    }
}

impl fmt::Debug for TaskFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskFactory")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// Define a task: returns a factory that builds a descriptor per invocation.
pub fn define_task<F>(name: impl Into<String>, build: F) -> TaskFactory
where
    F: Fn(&Value, &TaskCtx) -> TaskDescriptorShape + Send + Sync + 'static,
{
    TaskFactory {
        name: name.into(),
        build: Arc::new(build),
    }
}
