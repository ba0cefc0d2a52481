//! Declarative process specifications.
//!
//! A `ProcessSpec` is the YAML-authored form of a process: an ordered list
//! of named phases, each either a task (agent + prompt + output schema) or a
//! breakpoint gate. Later phases thread earlier results forward through
//! `$inputs.` / `$results.` / `$decisions.` references inside their argument
//! templates, keeping the data flow explicit rather than hidden in shared
//! mutable state.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::descriptor::AgentSpec;
use crate::domain::models::schema::OutputSchema;

/// A whole declarative process definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessSpec {
    /// Process identifier, e.g. "air-permit-application".
    pub process: String,
    pub phases: Vec<PhaseSpec>,
}

impl ProcessSpec {
    /// Parse a YAML document.
    pub fn from_yaml(yaml: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(yaml)
    }

    /// Structural validation: at least one phase, unique phase names, and
    /// breakpoint `files` referencing phases defined earlier in the list.
    pub fn validate(&self) -> Result<(), String> {
        if self.process.trim().is_empty() {
            return Err("process id cannot be empty".to_string());
        }
        if self.phases.is_empty() {
            return Err("process must declare at least one phase".to_string());
        }

        let mut seen: HashSet<&str> = HashSet::new();
        for phase in &self.phases {
            if phase.name.trim().is_empty() {
                return Err("phase name cannot be empty".to_string());
            }
            if !seen.insert(phase.name.as_str()) {
                return Err(format!("duplicate phase name '{}'", phase.name));
            }
            if let PhaseKindSpec::Breakpoint(bp) = &phase.kind {
                for file_ref in &bp.files {
                    if !seen.contains(file_ref.as_str()) || file_ref == &phase.name {
                        return Err(format!(
                            "breakpoint '{}' references unknown or later phase '{}'",
                            phase.name, file_ref
                        ));
                    }
                }
            }
        }
        Ok(())
    }
}

/// One named phase of a process.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhaseSpec {
    pub name: String,
    #[serde(flatten)]
    pub kind: PhaseKindSpec,
}

/// What a phase does: delegate a task or gate on a human decision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhaseKindSpec {
    Task(TaskSpec),
    Breakpoint(BreakpointSpec),
}

/// Declarative task phase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub agent: AgentSpec,
    pub output_schema: OutputSchema,
    /// Argument template; `$`-references are resolved before execution.
    #[serde(default)]
    pub args: Value,
    #[serde(default)]
    pub labels: Vec<String>,
}

/// Declarative breakpoint phase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BreakpointSpec {
    pub title: String,
    pub question: String,
    /// Extra context template for the reviewer; `$`-references allowed.
    #[serde(default)]
    pub context: Value,
    /// Names of earlier task phases whose artifacts the reviewer should see.
    #[serde(default)]
    pub files: Vec<String>,
}

/// The values `$`-references resolve against at one point in a pipeline.
#[derive(Debug, Default)]
pub struct ReferenceEnv {
    pub inputs: Value,
    /// Results of completed task phases, keyed by phase name.
    pub results: serde_json::Map<String, Value>,
    /// Decisions of resolved breakpoints, keyed by phase name.
    pub decisions: serde_json::Map<String, Value>,
}

impl ReferenceEnv {
    pub fn new(inputs: Value) -> Self {
        Self {
            inputs,
            results: serde_json::Map::new(),
            decisions: serde_json::Map::new(),
        }
    }

    fn lookup(&self, reference: &str) -> Option<Value> {
        let (root, rest) = match reference.split_once('.') {
            Some((root, rest)) => (root, Some(rest)),
            None => (reference, None),
        };

        let base: Value = match root {
            "$inputs" => self.inputs.clone(),
            "$results" => Value::Object(self.results.clone()),
            "$decisions" => Value::Object(self.decisions.clone()),
            _ => return None,
        };

        let Some(path) = rest else { return Some(base) };
        let mut current = base;
        for segment in path.split('.') {
            current = current.get(segment)?.clone();
        }
        Some(current)
    }
}

/// Resolve every `$`-reference in a template against the environment.
///
/// Strings beginning with `$inputs.`, `$results.`, or `$decisions.` (or the
/// bare roots) are replaced by the referenced value; `$$` escapes a literal
/// leading dollar. Unresolvable references fail the phase rather than
/// silently passing a placeholder to an agent.
pub fn resolve_refs(template: &Value, env: &ReferenceEnv, phase: &str) -> DomainResult<Value> {
    match template {
        Value::String(s) => {
            if let Some(literal) = s.strip_prefix("$$") {
                return Ok(Value::String(format!("${literal}")));
            }
            if s.starts_with('$') {
                return env
                    .lookup(s)
                    .ok_or_else(|| DomainError::UnresolvedReference {
                        phase: phase.to_string(),
                        reference: s.clone(),
                    });
            }
            Ok(template.clone())
        }
        Value::Array(items) => {
            let resolved: DomainResult<Vec<Value>> = items
                .iter()
                .map(|item| resolve_refs(item, env, phase))
                .collect();
            Ok(Value::Array(resolved?))
        }
        Value::Object(map) => {
            let mut resolved = serde_json::Map::with_capacity(map.len());
            for (key, value) in map {
                resolved.insert(key.clone(), resolve_refs(value, env, phase)?);
            }
            Ok(Value::Object(resolved))
        }
        _ => Ok(template.clone()),
    }
}
