//! Command agent backend.
//!
//! Spawns a configured executable per invocation, writes the rendered prompt
//! to its stdin, and extracts the first JSON value from its stdout. This is
//! how an LLM CLI (or any scriptable agent) plugs in without foreman knowing
//! anything about its protocol beyond "text in, JSON somewhere in text out".

use async_trait::async_trait;
use serde_json::Value;
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::debug;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::config::CommandBackendConfig;
use crate::domain::ports::backend::{AgentBackend, InvocationRequest};
use crate::services::prompt::render_invocation;

use super::extract::{decode_output, extract_first_json};

/// Backend that shells out to a configured agent executable.
pub struct CommandBackend {
    config: CommandBackendConfig,
}

impl CommandBackend {
    pub fn new(config: CommandBackendConfig) -> Self {
        Self { config }
    }

    fn invocation_error(&self, reason: impl Into<String>, transient: bool) -> DomainError {
        DomainError::AgentInvocation {
            backend: "command".to_string(),
            reason: reason.into(),
            transient,
        }
    }
}

#[async_trait]
impl AgentBackend for CommandBackend {
    fn name(&self) -> &'static str {
        "command"
    }

    async fn is_available(&self) -> DomainResult<bool> {
        // A configured program that cannot even report a version is treated
        // as unavailable rather than an error.
        Ok(Command::new(&self.config.program)
            .arg("--version")
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await
            .map(|status| status.success())
            .unwrap_or(false))
    }

    async fn invoke(&self, request: &InvocationRequest) -> DomainResult<Value> {
        let prompt = render_invocation(request);

        let mut command = Command::new(&self.config.program);
        command
            .args(&self.config.args)
            .arg("--agent")
            .arg(&request.descriptor.agent.name)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        if let Some(dir) = &self.config.working_dir {
            command.current_dir(dir);
        }
        for (key, value) in &self.config.env {
            command.env(key, value);
        }

        debug!(
            program = %self.config.program,
            agent = %request.descriptor.agent.name,
            task = %request.descriptor.name,
            attempt = request.attempt,
            "spawning agent process"
        );

        let mut child = command
            .spawn()
            .map_err(|err| self.invocation_error(format!("failed to spawn: {err}"), true))?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| self.invocation_error("child stdin unavailable", false))?;
        stdin
            .write_all(prompt.as_bytes())
            .await
            .map_err(|err| self.invocation_error(format!("failed to write prompt: {err}"), true))?;
        drop(stdin);

        let output = child
            .wait_with_output()
            .await
            .map_err(|err| self.invocation_error(format!("failed to await process: {err}"), true))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(self.invocation_error(
                format!(
                    "agent process exited with {}: {}",
                    output.status,
                    stderr.trim()
                ),
                true,
            ));
        }

        let text = decode_output(&output.stdout);
        extract_first_json(&text).ok_or_else(|| {
            // A successful exit with no JSON anywhere is a protocol
            // violation by the agent, not a backend outage.
            self.invocation_error("no JSON value found in agent output", false)
        })
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
    use std::collections::HashMap;

    fn request() -> InvocationRequest {
        let factory = define_task("echo-task", |_args, _ctx| {
            TaskDescriptorShape::new()
                .agent(AgentSpec {
                    name: "echoer".to_string(),
                    skills: vec![],
                    prompt: PromptSpec {
                        task: "Echo".to_string(),
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
        InvocationRequest::new(descriptor, json!({"value": 7}))
    }

    fn shell_backend(script: &str) -> CommandBackend {
        CommandBackend::new(CommandBackendConfig {
            program: "sh".to_string(),
            args: vec!["-c".to_string(), script.to_string(), "sh".to_string()],
            working_dir: None,
            env: HashMap::new(),
        })
    }

    #[tokio::test]
    async fn test_extracts_json_from_process_output() {
        // The script ignores its stdin and --agent args and prints prose
        // with an embedded JSON object.
        let backend =
            shell_backend("cat > /dev/null; echo 'Result: {\"total\": 3, \"ok\": true}'");
        let value = backend.invoke(&request()).await.unwrap();
        assert_eq!(value, json!({"total": 3, "ok": true}));
    }

    #[tokio::test]
    async fn test_nonzero_exit_is_transient_failure() {
        let backend = shell_backend("cat > /dev/null; echo boom >&2; exit 3");
        let err = backend.invoke(&request()).await.unwrap_err();
        assert!(err.is_transient());
        assert!(err.to_string().contains("boom"));
    }

    #[tokio::test]
    async fn test_missing_json_is_permanent_failure() {
        let backend = shell_backend("cat > /dev/null; echo 'all done, nothing structured'");
        let err = backend.invoke(&request()).await.unwrap_err();
        assert!(!err.is_transient());
    }

    #[tokio::test]
    async fn test_unknown_program_is_transient_failure() {
        let backend = CommandBackend::new(CommandBackendConfig {
            program: "definitely-not-a-real-binary-7f3a".to_string(),
            args: vec![],
            working_dir: None,
            env: HashMap::new(),
        });
        let err = backend.invoke(&request()).await.unwrap_err();
        assert!(err.is_transient());
        assert!(!backend.is_available().await.unwrap());
    }
}
