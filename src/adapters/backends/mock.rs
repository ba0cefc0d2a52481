//! Mock agent backend for testing and dry runs.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::ports::backend::{AgentBackend, InvocationRequest};

/// One scripted backend behavior.
#[derive(Debug, Clone)]
pub enum MockScript {
    /// Return this value.
    Value(Value),
    /// Fail with a transient invocation error.
    TransientFailure(String),
    /// Fail with a permanent invocation error.
    PermanentFailure(String),
    /// Never resolve (for timeout and cancellation tests).
    Hang,
}

impl MockScript {
    pub fn value(value: Value) -> Self {
        Self::Value(value)
    }

    pub fn transient_failure(reason: impl Into<String>) -> Self {
        Self::TransientFailure(reason.into())
    }

    pub fn permanent_failure(reason: impl Into<String>) -> Self {
        Self::PermanentFailure(reason.into())
    }
}

/// Mock backend with a scripted response sequence and per-task overrides.
///
/// Scripted entries are consumed in order; when the script is exhausted the
/// last entry repeats. Every invocation request is recorded for assertions.
pub struct MockBackend {
    script: RwLock<Vec<MockScript>>,
    task_overrides: RwLock<HashMap<String, Value>>,
    invocations: Arc<RwLock<Vec<InvocationRequest>>>,
}

impl MockBackend {
    /// Always return the same value.
    pub fn returning(value: Value) -> Self {
        Self::scripted(vec![MockScript::Value(value)])
    }

    /// Always fail with a transient error.
    pub fn always_failing(reason: impl Into<String>) -> Self {
        Self::scripted(vec![MockScript::transient_failure(reason)])
    }

    /// Never resolve any invocation.
    pub fn hanging() -> Self {
        Self::scripted(vec![MockScript::Hang])
    }

    pub fn scripted(script: Vec<MockScript>) -> Self {
        Self {
            script: RwLock::new(script),
            task_overrides: RwLock::new(HashMap::new()),
            invocations: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Fix the response for one task name, regardless of the script.
    pub async fn set_response_for_task(&self, task: impl Into<String>, value: Value) {
        self.task_overrides.write().await.insert(task.into(), value);
    }

    /// All invocation requests seen so far, in order.
    pub async fn invocations(&self) -> Vec<InvocationRequest> {
        self.invocations.read().await.clone()
    }

    async fn next_script(&self) -> MockScript {
        let mut script = self.script.write().await;
        if script.len() > 1 {
            script.remove(0)
        } else {
            script
                .first()
                .cloned()
                .unwrap_or(MockScript::Value(Value::Null))
        }
    }
}

#[async_trait]
impl AgentBackend for MockBackend {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn is_available(&self) -> DomainResult<bool> {
        Ok(true)
    }

    async fn invoke(&self, request: &InvocationRequest) -> DomainResult<Value> {
        self.invocations.write().await.push(request.clone());

        if let Some(value) = self
            .task_overrides
            .read()
            .await
            .get(&request.descriptor.name)
        {
            return Ok(value.clone());
        }

        match self.next_script().await {
            MockScript::Value(value) => Ok(value),
            MockScript::TransientFailure(reason) => Err(DomainError::AgentInvocation {
                backend: "mock".to_string(),
                reason,
                transient: true,
            }),
            MockScript::PermanentFailure(reason) => Err(DomainError::AgentInvocation {
                backend: "mock".to_string(),
                reason,
                transient: false,
            }),
            MockScript::Hang => {
                futures::future::pending::<()>().await;
                unreachable!()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::descriptor::{
        define_task, AgentSpec, EffectId, PromptSpec, TaskCtx, TaskDescriptorShape,
    };
    use crate::domain::models::schema::OutputSchema;
    use serde_json::json;

    fn request(task: &str) -> InvocationRequest {
        let name = task.to_string();
        let factory = define_task(task, move |_args, _ctx| {
            TaskDescriptorShape::new()
                .agent(AgentSpec {
                    name: format!("{name}-agent"),
                    skills: vec![],
                    prompt: PromptSpec {
                        task: "work".to_string(),
                        ..PromptSpec::default()
                    },
                })
                .output_schema(OutputSchema::new())
        });
        let descriptor = factory
            .build(
                &json!({}),
                &TaskCtx {
                    effect_id: EffectId::new(),
                },
            )
            .unwrap();
        InvocationRequest::new(descriptor, json!({}))
    }

    #[tokio::test]
    async fn test_script_consumed_in_order_then_repeats() {
        let backend = MockBackend::scripted(vec![
            MockScript::value(json!(1)),
            MockScript::value(json!(2)),
        ]);

        assert_eq!(backend.invoke(&request("t")).await.unwrap(), json!(1));
        assert_eq!(backend.invoke(&request("t")).await.unwrap(), json!(2));
        assert_eq!(backend.invoke(&request("t")).await.unwrap(), json!(2));
        assert_eq!(backend.invocations().await.len(), 3);
    }

    #[tokio::test]
    async fn test_task_override_wins() {
        let backend = MockBackend::returning(json!({"default": true}));
        backend
            .set_response_for_task("special", json!({"special": true}))
            .await;

        assert_eq!(
            backend.invoke(&request("special")).await.unwrap(),
            json!({"special": true})
        );
        assert_eq!(
            backend.invoke(&request("other")).await.unwrap(),
            json!({"default": true})
        );
    }

    #[tokio::test]
    async fn test_failure_scripts() {
        let backend = MockBackend::scripted(vec![
            MockScript::transient_failure("down"),
            MockScript::permanent_failure("bad"),
        ]);

        let err = backend.invoke(&request("t")).await.unwrap_err();
        assert!(err.is_transient());
        let err = backend.invoke(&request("t")).await.unwrap_err();
        assert!(!err.is_transient());
    }
}
