//! `foreman run` - execute a declarative process spec.

use anyhow::{Context, Result};
use serde_json::{json, Value};
use std::sync::Arc;

use crate::adapters::backends::BackendRegistry;
use crate::cli::output::create_spinner;
use crate::cli::types::RunArgs;
use crate::domain::models::config::Config;
use crate::domain::models::process_spec::ProcessSpec;
use crate::domain::ports::backend::{AgentBackend, BackendFactory};
use crate::services::runner::{DecisionSourceProvider, ProcessDefinition, ProcessRunner};

pub async fn execute(args: RunArgs, json: bool, mut config: Config) -> Result<()> {
    let yaml = std::fs::read_to_string(&args.spec)
        .with_context(|| format!("failed to read spec {}", args.spec.display()))?;
    let spec = ProcessSpec::from_yaml(&yaml)
        .with_context(|| format!("failed to parse spec {}", args.spec.display()))?;

    let inputs: Value = match &args.input {
        Some(path) => {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read inputs {}", path.display()))?;
            serde_json::from_str(&raw)
                .with_context(|| format!("failed to parse inputs {}", path.display()))?
        }
        None => json!({}),
    };

    if let Some(backend) = args.backend {
        config.backends.default_backend = backend;
    }

    let definition = ProcessDefinition::from_spec(spec)?;
    let registry = Arc::new(BackendRegistry::new(config.backends.clone())?);

    if let Some(backend) = registry.create(&config.backends.default_backend) {
        if !backend.is_available().await.unwrap_or(false) {
            tracing::warn!(
                backend = backend.name(),
                "default backend looks unavailable; invocations may fail"
            );
        }
    }

    let runner = ProcessRunner::new(config, registry, DecisionSourceProvider::File);

    let spinner = if json {
        indicatif::ProgressBar::hidden()
    } else {
        create_spinner(format!("running {}", definition.id()))
    };
    let report = runner.run(&definition, inputs).await;
    spinner.finish_and_clear();

    println!("{}", serde_json::to_string_pretty(&report)?);

    if !report.success {
        // The report was delivered; the exit code still flags the failure
        // for scripting.
        std::process::exit(2);
    }
    Ok(())
}
