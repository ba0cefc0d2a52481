//! Shared helpers for integration tests.

use std::sync::Arc;

use serde_json::{json, Value};

use foreman::adapters::backends::{BackendRegistry, MockBackend, MockScript};
use foreman::domain::models::config::{BackendsConfig, Config, RetryConfig, TimeoutConfig};
use foreman::domain::models::descriptor::{TaskDescriptorShape, TaskFactory};
use foreman::domain::models::schema::{OutputSchema, PropertyType};
use foreman::services::runner::{DecisionSourceProvider, ProcessRunner};
use foreman::{define_task, AgentSpec, PromptSpec};

/// Config pointing storage at a temp dir, with millisecond backoff.
pub fn test_config(root: &std::path::Path) -> Config {
    Config {
        storage: foreman::domain::models::config::StorageConfig {
            root: root.join("runs").to_string_lossy().into_owned(),
        },
        backends: BackendsConfig {
            default_backend: "mock".to_string(),
            ..BackendsConfig::default()
        },
        retry: RetryConfig {
            validation_attempts: 2,
            transient_retries: 2,
            initial_backoff_ms: 1,
            max_backoff_ms: 5,
        },
        timeouts: TimeoutConfig {
            invoke_timeout_secs: 5,
            breakpoint_timeout_secs: 5,
            decision_poll_ms: 10,
        },
        ..Config::default()
    }
}

/// Runner whose mock backend plays the given script.
pub fn scripted_runner(
    root: &std::path::Path,
    script: Vec<MockScript>,
    decisions: DecisionSourceProvider,
) -> (ProcessRunner, Arc<MockBackend>) {
    let backend = Arc::new(MockBackend::scripted(script));
    let registry = BackendRegistry::new(BackendsConfig {
        default_backend: "mock".to_string(),
        ..BackendsConfig::default()
    })
    .expect("registry")
    .with_mock(backend.clone());

    let runner = ProcessRunner::new(test_config(root), Arc::new(registry), decisions);
    (runner, backend)
}

pub fn agent(name: &str) -> AgentSpec {
    AgentSpec {
        name: name.to_string(),
        skills: vec![],
        prompt: PromptSpec {
            role: "a domain specialist".to_string(),
            task: format!("Perform the {name} analysis."),
            context: json!({}),
            instructions: vec!["Respond with JSON only.".to_string()],
            output_format: "json".to_string(),
        },
    }
}

/// Task whose schema requires a numeric `total`.
pub fn total_task(name: &str) -> TaskFactory {
    let agent_name = format!("{name}-agent");
    define_task(name, move |_args: &Value, _ctx| {
        TaskDescriptorShape::new()
            .agent(agent(&agent_name))
            .output_schema(OutputSchema::new().required_property("total", PropertyType::Number))
    })
}

/// Task with no schema constraints.
pub fn open_task(name: &str) -> TaskFactory {
    let agent_name = format!("{name}-agent");
    define_task(name, move |_args: &Value, _ctx| {
        TaskDescriptorShape::new()
            .agent(agent(&agent_name))
            .output_schema(OutputSchema::new())
    })
}
