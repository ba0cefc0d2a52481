//! Task execution engine.
//!
//! Orchestrates one task invocation: persist the input artifact, invoke the
//! agent backend, validate the response against the task's output schema,
//! persist the result artifact, and hand the validated value back. Owns the
//! retry policy for a single task - transient backend failures retry with
//! exponential backoff, schema failures retry with the violations fed back
//! into the prompt - and never exposes an unvalidated result to the caller.

use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::artifact::{Artifact, ArtifactTrail};
use crate::domain::models::config::RetryConfig;
use crate::domain::models::descriptor::TaskDescriptor;
use crate::domain::models::event::events;
use crate::domain::ports::backend::{AgentBackend, InvocationRequest};
use crate::domain::ports::store::ArtifactStore;
use crate::services::journal::RunJournal;
use crate::services::validator;

/// Engine for executing tasks against one agent backend.
pub struct TaskEngine {
    backend: Arc<dyn AgentBackend>,
    store: Arc<dyn ArtifactStore>,
    journal: Arc<RunJournal>,
    retry: RetryConfig,
    invoke_timeout: Duration,
    cancel: CancellationToken,
}

impl TaskEngine {
    pub fn new(
        backend: Arc<dyn AgentBackend>,
        store: Arc<dyn ArtifactStore>,
        journal: Arc<RunJournal>,
        retry: RetryConfig,
        invoke_timeout: Duration,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            backend,
            store,
            journal,
            retry,
            invoke_timeout,
            cancel,
        }
    }

    /// Execute one task invocation to a validated result.
    ///
    /// Exactly one input-artifact write happens up front and exactly one
    /// result-artifact write on success; retried attempts overwrite the same
    /// paths, so persistence is idempotent under the descriptor's effect id.
    /// The input artifact is recorded on the trail even when the invocation
    /// later fails, for post-mortem inspection.
    pub async fn execute(
        &self,
        descriptor: &TaskDescriptor,
        args: &Value,
        trail: &ArtifactTrail,
    ) -> DomainResult<Value> {
        self.store
            .write_json(&descriptor.io.input_json_path, args)
            .await?;
        trail.append(
            Artifact::json(&descriptor.io.input_json_path)
                .with_label(format!("{}.input", descriptor.name)),
        );

        let result = self.invoke_validated(descriptor, args).await;

        match result {
            Ok(value) => {
                self.store
                    .write_json(&descriptor.io.output_json_path, &value)
                    .await?;
                trail.append(
                    Artifact::json(&descriptor.io.output_json_path)
                        .with_label(descriptor.name.clone()),
                );
                self.journal_event(
                    events::TASK_COMPLETED,
                    json!({
                        "task": descriptor.name,
                        "effect_id": descriptor.effect_id,
                    }),
                )
                .await;
                Ok(value)
            }
            Err(err) => {
                self.journal_event(
                    events::TASK_FAILED,
                    json!({
                        "task": descriptor.name,
                        "effect_id": descriptor.effect_id,
                        "error": err.kind(),
                    }),
                )
                .await;
                Err(err)
            }
        }
    }

    /// Invocation loop with validation feedback.
    async fn invoke_validated(
        &self,
        descriptor: &TaskDescriptor,
        args: &Value,
    ) -> DomainResult<Value> {
        let mut request = InvocationRequest::new(descriptor.clone(), args.clone());

        loop {
            self.journal_event(
                events::TASK_ATTEMPT,
                json!({
                    "task": descriptor.name,
                    "effect_id": descriptor.effect_id,
                    "attempt": request.attempt,
                    "backend": self.backend.name(),
                }),
            )
            .await;

            let raw = self.invoke_once_with_transient_retry(&request).await?;

            match validator::validate(&raw, &descriptor.output_schema) {
                Ok(()) => {
                    if request.attempt > 1 {
                        debug!(
                            task = %descriptor.name,
                            attempt = request.attempt,
                            "response validated after correction"
                        );
                    }
                    return Ok(raw);
                }
                Err(DomainError::SchemaValidation(violations)) => {
                    if request.attempt >= self.retry.validation_attempts {
                        return Err(DomainError::ValidationExhausted {
                            task: descriptor.name.clone(),
                            attempts: request.attempt,
                            violations,
                        });
                    }
                    warn!(
                        task = %descriptor.name,
                        attempt = request.attempt,
                        violations = %violations,
                        "agent response failed validation, retrying with feedback"
                    );
                    request = request.with_feedback(violations);
                }
                Err(other) => return Err(other),
            }
        }
    }

    /// One backend call wrapped in the transient-failure retry policy.
    ///
    /// Backoff doubles per attempt from `initial_backoff_ms`, capped at
    /// `max_backoff_ms`. Permanent invocation errors fail immediately.
    async fn invoke_once_with_transient_retry(
        &self,
        request: &InvocationRequest,
    ) -> DomainResult<Value> {
        let task = &request.descriptor.name;
        let mut attempt: u32 = 0;

        loop {
            let outcome = tokio::select! {
                () = self.cancel.cancelled() => return Err(DomainError::Canceled),
                invoked = tokio::time::timeout(self.invoke_timeout, self.backend.invoke(request)) => {
                    match invoked {
                        Ok(inner) => inner,
                        Err(_) => Err(DomainError::AgentInvocation {
                            backend: self.backend.name().to_string(),
                            reason: format!(
                                "timed out after {}s",
                                self.invoke_timeout.as_secs()
                            ),
                            transient: true,
                        }),
                    }
                }
            };

            match outcome {
                Ok(value) => return Ok(value),
                Err(err) if err.is_transient() && attempt < self.retry.transient_retries => {
                    let backoff = self.calculate_backoff(attempt);
                    warn!(
                        task = %task,
                        attempt = attempt + 1,
                        error = %err,
                        backoff_ms = backoff.as_millis() as u64,
                        "transient backend failure, retrying"
                    );
                    tokio::select! {
                        () = self.cancel.cancelled() => return Err(DomainError::Canceled),
                        () = sleep(backoff) => {}
                    }
                    attempt += 1;
                }
                Err(DomainError::Canceled) => return Err(DomainError::Canceled),
                Err(err @ DomainError::AgentInvocation { .. }) => {
                    return Err(DomainError::TaskExecution {
                        task: task.clone(),
                        reason: err.to_string(),
                    });
                }
                Err(other) => return Err(other),
            }
        }
    }

    /// min(initial * 2^attempt, max)
    fn calculate_backoff(&self, attempt: u32) -> Duration {
        let backoff_ms = self
            .retry
            .initial_backoff_ms
            .saturating_mul(2_u64.saturating_pow(attempt))
            .min(self.retry.max_backoff_ms);
        Duration::from_millis(backoff_ms)
    }

    /// Journaling is observability, not control flow: failures are logged
    /// and never mask the task outcome.
    async fn journal_event(&self, event: &str, data: Value) {
        if let Err(err) = self.journal.append(event, data).await {
            warn!(event = %event, error = %err, "failed to append journal entry");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::backends::mock::{MockBackend, MockScript};
    use crate::adapters::store::FsArtifactStore;
    use crate::domain::models::descriptor::{
        define_task, AgentSpec, EffectId, PromptSpec, TaskCtx, TaskDescriptorShape,
    };
    use crate::domain::models::run::RunState;
    use crate::domain::models::schema::{OutputSchema, PropertyType};
    use uuid::Uuid;

    fn descriptor_for(schema: OutputSchema) -> TaskDescriptor {
        let factory = define_task("inventory", move |_args, _ctx| {
            TaskDescriptorShape::new()
                .agent(AgentSpec {
                    name: "estimator".to_string(),
                    skills: vec![],
                    prompt: PromptSpec {
                        task: "Estimate totals".to_string(),
                        ..PromptSpec::default()
                    },
                })
                .output_schema(schema.clone())
        });
        factory
            .build(
                &json!({}),
                &TaskCtx {
                    effect_id: EffectId::new(),
                },
            )
            .unwrap()
    }

    async fn engine_with(
        backend: Arc<dyn AgentBackend>,
        dir: &std::path::Path,
        retry: RetryConfig,
    ) -> (TaskEngine, Arc<dyn ArtifactStore>) {
        let store: Arc<dyn ArtifactStore> =
            Arc::new(FsArtifactStore::create(dir.join("run")).await.unwrap());
        let journal = Arc::new(
            RunJournal::create(store.clone(), RunState::new(Uuid::new_v4(), "test"))
                .await
                .unwrap(),
        );
        let engine = TaskEngine::new(
            backend,
            store.clone(),
            journal,
            retry,
            Duration::from_secs(5),
            CancellationToken::new(),
        );
        (engine, store)
    }

    fn fast_retry() -> RetryConfig {
        RetryConfig {
            validation_attempts: 2,
            transient_retries: 2,
            initial_backoff_ms: 1,
            max_backoff_ms: 10,
        }
    }

    #[tokio::test]
    async fn test_successful_execution_persists_both_artifacts() {
        let dir = tempfile::tempdir().unwrap();
        let backend = Arc::new(MockBackend::returning(json!({"total": 12.5})));
        let (engine, store) = engine_with(backend, dir.path(), fast_retry()).await;

        let descriptor =
            descriptor_for(OutputSchema::new().required_property("total", PropertyType::Number));
        let trail = ArtifactTrail::new();
        let result = engine
            .execute(&descriptor, &json!({"year": 2026}), &trail)
            .await
            .unwrap();

        assert_eq!(result, json!({"total": 12.5}));
        assert!(store.exists(&descriptor.io.input_json_path).await);
        assert!(store.exists(&descriptor.io.output_json_path).await);
        assert_eq!(trail.len(), 2);
    }

    #[tokio::test]
    async fn test_validation_retry_feeds_back_and_succeeds() {
        let dir = tempfile::tempdir().unwrap();
        let backend = Arc::new(MockBackend::scripted(vec![
            MockScript::value(json!({"total": "not-a-number"})),
            MockScript::value(json!({"total": 9.0})),
        ]));
        let (engine, _store) = engine_with(backend.clone(), dir.path(), fast_retry()).await;

        let descriptor =
            descriptor_for(OutputSchema::new().required_property("total", PropertyType::Number));
        let trail = ArtifactTrail::new();
        let result = engine.execute(&descriptor, &json!({}), &trail).await.unwrap();

        assert_eq!(result, json!({"total": 9.0}));
        assert_eq!(backend.invocations().await.len(), 2);
        // Second invocation carried the first attempt's violations.
        let second = &backend.invocations().await[1];
        assert_eq!(second.attempt, 2);
        assert!(second.feedback.as_ref().unwrap().mentions("total"));
    }

    #[tokio::test]
    async fn test_validation_exhaustion_respects_bound() {
        let dir = tempfile::tempdir().unwrap();
        let backend = Arc::new(MockBackend::returning(json!({"total": "not-a-number"})));
        let (engine, store) = engine_with(backend.clone(), dir.path(), fast_retry()).await;

        let descriptor =
            descriptor_for(OutputSchema::new().required_property("total", PropertyType::Number));
        let trail = ArtifactTrail::new();
        let err = engine.execute(&descriptor, &json!({}), &trail).await.unwrap_err();

        assert_eq!(backend.invocations().await.len(), 2);
        match err {
            DomainError::ValidationExhausted {
                task,
                attempts,
                violations,
            } => {
                assert_eq!(task, "inventory");
                assert_eq!(attempts, 2);
                assert!(violations.mentions("total"));
            }
            other => panic!("expected ValidationExhausted, got {other:?}"),
        }
        // Input artifact persisted and recorded; no result artifact.
        assert!(store.exists(&descriptor.io.input_json_path).await);
        assert!(!store.exists(&descriptor.io.output_json_path).await);
        assert_eq!(trail.len(), 1);
    }

    #[tokio::test]
    async fn test_transient_failures_retry_then_succeed() {
        let dir = tempfile::tempdir().unwrap();
        let backend = Arc::new(MockBackend::scripted(vec![
            MockScript::transient_failure("backend unavailable"),
            MockScript::transient_failure("backend unavailable"),
            MockScript::value(json!({"ok": true})),
        ]));
        let (engine, _store) = engine_with(backend.clone(), dir.path(), fast_retry()).await;

        let descriptor = descriptor_for(OutputSchema::new());
        let trail = ArtifactTrail::new();
        let result = engine.execute(&descriptor, &json!({}), &trail).await.unwrap();

        assert_eq!(result, json!({"ok": true}));
        assert_eq!(backend.invocations().await.len(), 3);
    }

    #[tokio::test]
    async fn test_transient_exhaustion_is_task_execution_error() {
        let dir = tempfile::tempdir().unwrap();
        let backend = Arc::new(MockBackend::always_failing("backend unavailable"));
        let retry = RetryConfig {
            transient_retries: 1,
            ..fast_retry()
        };
        let (engine, _store) = engine_with(backend.clone(), dir.path(), retry).await;

        let descriptor = descriptor_for(OutputSchema::new());
        let trail = ArtifactTrail::new();
        let err = engine.execute(&descriptor, &json!({}), &trail).await.unwrap_err();

        // Initial attempt + 1 retry.
        assert_eq!(backend.invocations().await.len(), 2);
        assert!(matches!(err, DomainError::TaskExecution { .. }));
    }

    #[tokio::test]
    async fn test_permanent_backend_error_does_not_retry() {
        let dir = tempfile::tempdir().unwrap();
        let backend = Arc::new(MockBackend::scripted(vec![MockScript::permanent_failure(
            "malformed response",
        )]));
        let (engine, _store) = engine_with(backend.clone(), dir.path(), fast_retry()).await;

        let descriptor = descriptor_for(OutputSchema::new());
        let trail = ArtifactTrail::new();
        let err = engine.execute(&descriptor, &json!({}), &trail).await.unwrap_err();

        assert_eq!(backend.invocations().await.len(), 1);
        assert!(matches!(err, DomainError::TaskExecution { .. }));
    }

    #[tokio::test]
    async fn test_cancellation_interrupts_invocation() {
        let dir = tempfile::tempdir().unwrap();
        let backend = Arc::new(MockBackend::hanging());
        let store: Arc<dyn ArtifactStore> = Arc::new(
            FsArtifactStore::create(dir.path().join("run")).await.unwrap(),
        );
        let journal = Arc::new(
            RunJournal::create(store.clone(), RunState::new(Uuid::new_v4(), "test"))
                .await
                .unwrap(),
        );
        let cancel = CancellationToken::new();
        let engine = TaskEngine::new(
            backend,
            store,
            journal,
            fast_retry(),
            Duration::from_secs(60),
            cancel.clone(),
        );

        let descriptor = descriptor_for(OutputSchema::new());
        let trail = ArtifactTrail::new();

        let handle = tokio::spawn(async move {
            engine.execute(&descriptor, &json!({}), &trail).await
        });
        tokio::time::sleep(Duration::from_millis(20)).await;
        cancel.cancel();

        let err = handle.await.unwrap().unwrap_err();
        assert!(matches!(err, DomainError::Canceled));
    }

    #[test]
    fn test_backoff_curve() {
        let retry = RetryConfig {
            validation_attempts: 2,
            transient_retries: 5,
            initial_backoff_ms: 1000,
            max_backoff_ms: 60_000,
        };
        let dir = tempfile::tempdir().unwrap();
        let rt = tokio::runtime::Runtime::new().unwrap();
        let (engine, _store) = rt.block_on(engine_with(
            Arc::new(MockBackend::returning(json!({}))),
            dir.path(),
            retry,
        ));

        assert_eq!(engine.calculate_backoff(0), Duration::from_millis(1000));
        assert_eq!(engine.calculate_backoff(1), Duration::from_millis(2000));
        assert_eq!(engine.calculate_backoff(5), Duration::from_millis(32_000));
        assert_eq!(engine.calculate_backoff(6), Duration::from_millis(60_000));
        assert_eq!(engine.calculate_backoff(7), Duration::from_millis(60_000));
    }
}
