//! Process runner.
//!
//! Executes a process definition - a Rust async function or a declarative
//! YAML spec - against its inputs, supplying the `ProcessCtx` facade
//! (`task`, `breakpoint`, `log`, `now`, `run_id`) built from the engine,
//! the breakpoint controller, and the run journal. Phases run strictly
//! sequentially; the first failing phase stops the run; artifacts
//! accumulate across phases regardless of outcome. A run always ends in a
//! structured `ProcessReport`, never an unhandled error.

use chrono::{DateTime, Utc};
use futures::future::BoxFuture;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use uuid::Uuid;

use crate::adapters::backends::BackendRegistry;
use crate::adapters::store::FsArtifactStore;
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::artifact::{Artifact, ArtifactTrail};
use crate::domain::models::breakpoint::{BreakpointRequest, Decision};
use crate::domain::models::config::Config;
use crate::domain::models::descriptor::{EffectId, TaskCtx, TaskFactory};
use crate::domain::models::event::events;
use crate::domain::models::process_spec::{
    resolve_refs, PhaseKindSpec, ProcessSpec, ReferenceEnv, TaskSpec,
};
use crate::domain::models::run::{ProcessReport, RunMetadata, RunState, RunStatus};
use crate::domain::ports::store::ArtifactStore;
use crate::services::breakpoint::BreakpointController;
use crate::services::engine::TaskEngine;
use crate::services::journal::RunJournal;

type ProcessFn =
    dyn Fn(Value, ProcessCtx) -> BoxFuture<'static, DomainResult<Value>> + Send + Sync;

enum ProcessBody {
    Function(Arc<ProcessFn>),
    Spec(ProcessSpec),
}

/// One named, executable process.
pub struct ProcessDefinition {
    id: String,
    body: ProcessBody,
}

impl ProcessDefinition {
    /// Define a process from an async function.
    pub fn from_fn<F, Fut>(id: impl Into<String>, process: F) -> Self
    where
        F: Fn(Value, ProcessCtx) -> Fut + Send + Sync + 'static,
        Fut: std::future::Future<Output = DomainResult<Value>> + Send + 'static,
    {
        Self {
            id: id.into(),
            body: ProcessBody::Function(Arc::new(move |inputs, ctx| {
                Box::pin(process(inputs, ctx))
            })),
        }
    }

    /// Define a process from a declarative spec, validating it up front.
    pub fn from_spec(spec: ProcessSpec) -> DomainResult<Self> {
        spec.validate().map_err(DomainError::InvalidProcessSpec)?;
        Ok(Self {
            id: spec.process.clone(),
            body: ProcessBody::Spec(spec),
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }
}

/// The per-run context facade threaded through every phase.
///
/// One instance exists per run, scoped to its lifetime - explicit dependency
/// injection rather than ambient state. Cloning is cheap and shares the run.
#[derive(Clone)]
pub struct ProcessCtx {
    inner: Arc<CtxInner>,
}

struct CtxInner {
    run_id: Uuid,
    process_id: String,
    store: Arc<dyn ArtifactStore>,
    journal: Arc<RunJournal>,
    registry: Arc<BackendRegistry>,
    breakpoints: BreakpointController,
    config: Config,
    cancel: CancellationToken,
    trail: ArtifactTrail,
}

impl ProcessCtx {
    pub fn run_id(&self) -> Uuid {
        self.inner.run_id
    }

    pub fn process_id(&self) -> &str {
        &self.inner.process_id
    }

    pub fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    /// Structured log line scoped to this run.
    pub fn log(&self, level: tracing::Level, message: &str) {
        let run_id = self.inner.run_id;
        match level {
            tracing::Level::TRACE => tracing::trace!(run_id = %run_id, "{message}"),
            tracing::Level::DEBUG => tracing::debug!(run_id = %run_id, "{message}"),
            tracing::Level::INFO => tracing::info!(run_id = %run_id, "{message}"),
            tracing::Level::WARN => tracing::warn!(run_id = %run_id, "{message}"),
            tracing::Level::ERROR => tracing::error!(run_id = %run_id, "{message}"),
        }
    }

    /// Execute one task phase: mint an effect id, build the descriptor, and
    /// run it through the engine against the agent's configured backend.
    pub async fn task(&self, factory: &TaskFactory, args: Value) -> DomainResult<Value> {
        let effect_id = EffectId::new();
        let descriptor = factory.build(&args, &TaskCtx { effect_id })?;
        let backend = self.inner.registry.for_agent(&descriptor.agent.name)?;

        let engine = TaskEngine::new(
            backend,
            self.inner.store.clone(),
            self.inner.journal.clone(),
            self.inner.config.retry.clone(),
            Duration::from_secs(self.inner.config.timeouts.invoke_timeout_secs),
            self.inner.cancel.clone(),
        );
        engine.execute(&descriptor, &args, &self.inner.trail).await
    }

    /// Suspend at a human-review gate until a decision arrives.
    ///
    /// The run id is injected into the request context so external
    /// reviewers can correlate the breakpoint with its run.
    pub async fn breakpoint(&self, request: BreakpointRequest) -> DomainResult<Decision> {
        let mut request = request;
        let mut context = match request.context.take() {
            Value::Object(map) => map,
            Value::Null => serde_json::Map::new(),
            other => {
                let mut map = serde_json::Map::new();
                map.insert("context".to_string(), other);
                map
            }
        };
        context.insert("run_id".to_string(), json!(self.inner.run_id));
        request.context = Value::Object(context);

        self.inner.breakpoints.request(request).await
    }

    /// Snapshot of the artifacts recorded so far.
    pub fn artifacts(&self) -> Vec<Artifact> {
        self.inner.trail.snapshot()
    }

    /// Artifacts labeled with a task name (the engine labels each result
    /// artifact with its task's name).
    pub fn artifacts_for(&self, label: &str) -> Vec<Artifact> {
        self.inner.trail.labeled(label)
    }
}

/// How the runner obtains a decision source for each run.
pub enum DecisionSourceProvider {
    /// A file source scoped to each run's directory (`breakpoints/...`),
    /// resolvable by external tooling such as `foreman decide`.
    File,
    /// One shared in-process source across runs (embedding, tests).
    Shared(Arc<dyn crate::domain::ports::decision::DecisionSource>),
}

impl DecisionSourceProvider {
    fn for_run(
        &self,
        store: Arc<dyn ArtifactStore>,
        poll_interval: Duration,
    ) -> Arc<dyn crate::domain::ports::decision::DecisionSource> {
        match self {
            Self::File => Arc::new(crate::adapters::decisions::FileDecisionSource::new(
                store,
                poll_interval,
            )),
            Self::Shared(source) => source.clone(),
        }
    }
}

/// Executes process definitions, one run directory per invocation.
pub struct ProcessRunner {
    config: Config,
    registry: Arc<BackendRegistry>,
    decisions: DecisionSourceProvider,
}

impl ProcessRunner {
    pub fn new(
        config: Config,
        registry: Arc<BackendRegistry>,
        decisions: DecisionSourceProvider,
    ) -> Self {
        Self {
            config,
            registry,
            decisions,
        }
    }

    /// Run a process to its structured report with a fresh cancellation
    /// scope.
    pub async fn run(&self, definition: &ProcessDefinition, inputs: Value) -> ProcessReport {
        self.run_with_cancel(definition, inputs, CancellationToken::new())
            .await
    }

    /// Run a process under an externally owned cancellation token.
    ///
    /// Cancellation is a "stop advancing" signal: it interrupts whichever
    /// suspension point is active and leaves all written artifacts intact.
    pub async fn run_with_cancel(
        &self,
        definition: &ProcessDefinition,
        inputs: Value,
        cancel: CancellationToken,
    ) -> ProcessReport {
        let run_id = Uuid::new_v4();
        let started = Instant::now();
        let metadata = RunMetadata {
            process_id: definition.id.clone(),
            run_id,
            timestamp: Utc::now(),
        };

        info!(run_id = %run_id, process = %definition.id, "run started");

        match self.execute(definition, inputs, run_id, cancel).await {
            Ok((output, artifacts)) => {
                info!(run_id = %run_id, process = %definition.id, "run completed");
                ProcessReport::success(
                    output,
                    artifacts,
                    started.elapsed().as_millis() as u64,
                    metadata,
                )
            }
            Err((err, artifacts)) => {
                warn!(
                    run_id = %run_id,
                    process = %definition.id,
                    error = %err,
                    "run failed"
                );
                ProcessReport::failure(
                    &err,
                    artifacts,
                    started.elapsed().as_millis() as u64,
                    metadata,
                )
            }
        }
    }

    async fn execute(
        &self,
        definition: &ProcessDefinition,
        inputs: Value,
        run_id: Uuid,
        cancel: CancellationToken,
    ) -> Result<(Value, Vec<Artifact>), (DomainError, Vec<Artifact>)> {
        let run_dir = std::path::Path::new(&self.config.storage.root).join(run_id.to_string());
        let store: Arc<dyn ArtifactStore> = Arc::new(
            FsArtifactStore::create(run_dir)
                .await
                .map_err(|err| (err, Vec::new()))?,
        );

        let journal = Arc::new(
            RunJournal::create(store.clone(), RunState::new(run_id, &definition.id))
                .await
                .map_err(|err| (err, Vec::new()))?,
        );

        let decision_source = self.decisions.for_run(
            store.clone(),
            Duration::from_millis(self.config.timeouts.decision_poll_ms),
        );
        let breakpoints = BreakpointController::new(
            decision_source,
            store.clone(),
            journal.clone(),
            Duration::from_secs(self.config.timeouts.breakpoint_timeout_secs),
            cancel.clone(),
        );

        let ctx = ProcessCtx {
            inner: Arc::new(CtxInner {
                run_id,
                process_id: definition.id.clone(),
                store: store.clone(),
                journal: journal.clone(),
                registry: self.registry.clone(),
                breakpoints,
                config: self.config.clone(),
                cancel,
                trail: ArtifactTrail::new(),
            }),
        };

        let _ = journal
            .append(events::RUN_STARTED, json!({"process": definition.id}))
            .await;

        let result = match &definition.body {
            ProcessBody::Function(process) => (process.as_ref())(inputs, ctx.clone()).await,
            ProcessBody::Spec(spec) => run_spec(spec, inputs, &ctx).await,
        };

        let artifacts = ctx.artifacts();
        match result {
            Ok(output) => {
                let _ = journal.append(events::RUN_COMPLETED, json!({})).await;
                let _ = journal.set_status(RunStatus::Completed).await;
                Ok((output, artifacts))
            }
            Err(err) => {
                let _ = journal
                    .append(
                        events::RUN_FAILED,
                        json!({"error": err.kind(), "message": err.to_string()}),
                    )
                    .await;
                let status = if matches!(err, DomainError::Canceled) {
                    RunStatus::Canceled
                } else {
                    RunStatus::Failed
                };
                let _ = journal.set_status(status).await;
                Err((err, artifacts))
            }
        }
    }
}

/// Interpret a declarative spec: a strict fold over the ordered phase list,
/// threading earlier results forward through the reference environment.
async fn run_spec(spec: &ProcessSpec, inputs: Value, ctx: &ProcessCtx) -> DomainResult<Value> {
    let mut env = ReferenceEnv::new(inputs);

    for phase in &spec.phases {
        let kind = match &phase.kind {
            PhaseKindSpec::Task(_) => "task",
            PhaseKindSpec::Breakpoint(_) => "breakpoint",
        };
        let _ = ctx
            .inner
            .journal
            .append(
                events::PHASE_STARTED,
                json!({"phase": phase.name, "kind": kind}),
            )
            .await;

        match &phase.kind {
            PhaseKindSpec::Task(task_spec) => {
                let args = resolve_refs(&task_spec.args, &env, &phase.name)?;
                let factory = task_factory_for(&phase.name, task_spec);
                let result = ctx.task(&factory, args).await?;
                env.results.insert(phase.name.clone(), result);
            }
            PhaseKindSpec::Breakpoint(bp_spec) => {
                let context = resolve_refs(&bp_spec.context, &env, &phase.name)?;
                let mut request =
                    BreakpointRequest::new(&bp_spec.title, &bp_spec.question).with_context(context);
                for phase_ref in &bp_spec.files {
                    for artifact in ctx.artifacts_for(phase_ref) {
                        request = request.with_file(&artifact);
                    }
                }
                let decision = ctx.breakpoint(request).await?;
                env.decisions
                    .insert(phase.name.clone(), serde_json::to_value(&decision)?);
            }
        }
    }

    // The process's domain fields: every task phase's result, keyed by
    // phase name in execution order.
    Ok(Value::Object(env.results))
}

fn task_factory_for(phase_name: &str, spec: &TaskSpec) -> TaskFactory {
    let spec = spec.clone();
    crate::domain::models::descriptor::define_task(phase_name, move |_args, _task_ctx| {
        let mut shape = crate::domain::models::descriptor::TaskDescriptorShape::new()
            .agent(spec.agent.clone())
            .output_schema(spec.output_schema.clone());
        if let Some(title) = &spec.title {
            shape = shape.title(title.clone());
        }
        for label in &spec.labels {
            shape = shape.label(label.clone());
        }
        shape
    })
}
