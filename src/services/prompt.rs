//! Agent prompt rendering.
//!
//! Backends that speak plain text (subprocesses, chat-style services) need
//! the structured `AgentSpec` flattened into a single prompt document. The
//! rendered form substitutes the task text and a pretty-printed JSON context
//! into a fixed scaffold; on validation retries the previous attempt's
//! violations are appended so the agent can self-correct.

use serde_json::Value;

use crate::domain::models::schema::SchemaViolations;
use crate::domain::ports::backend::InvocationRequest;

/// Render one invocation into a plain-text prompt.
pub fn render_invocation(request: &InvocationRequest) -> String {
    let agent = &request.descriptor.agent;
    let prompt = &agent.prompt;
    let mut out = String::new();

    if !prompt.role.is_empty() {
        out.push_str(&format!("You are {}.\n\n", prompt.role));
    }

    out.push_str("# Task\n\n");
    out.push_str(&prompt.task);
    out.push('\n');

    if !agent.skills.is_empty() {
        out.push_str(&format!("\nRelevant skills: {}\n", agent.skills.join(", ")));
    }

    out.push_str("\n# Context\n\n");
    out.push_str(&pretty_json(&prompt.context));
    out.push('\n');

    out.push_str("\n# Arguments\n\n");
    out.push_str(&pretty_json(&request.args));
    out.push('\n');

    if !prompt.instructions.is_empty() {
        out.push_str("\n# Instructions\n\n");
        for (index, instruction) in prompt.instructions.iter().enumerate() {
            out.push_str(&format!("{}. {}\n", index + 1, instruction));
        }
    }

    let format = if prompt.output_format.is_empty() {
        "json"
    } else {
        &prompt.output_format
    };
    out.push_str(&format!(
        "\n# Output format\n\nRespond with a single {format} value.\n"
    ));

    if !request.descriptor.output_schema.is_empty() {
        out.push_str("\nThe response must satisfy this schema:\n");
        out.push_str(&pretty_json(
            &serde_json::to_value(&request.descriptor.output_schema).unwrap_or(Value::Null),
        ));
        out.push('\n');
    }

    if let Some(feedback) = &request.feedback {
        out.push_str(&render_feedback(feedback));
    }

    out
}

fn render_feedback(violations: &SchemaViolations) -> String {
    let mut out = String::from(
        "\n# Correction required\n\nYour previous response failed validation:\n",
    );
    for violation in violations.iter() {
        out.push_str(&format!("- {violation}\n"));
    }
    out.push_str("Return a corrected response that fixes every issue above.\n");
    out
}

fn pretty_json(value: &Value) -> String {
    match value {
        Value::Null => "{}".to_string(),
        other => serde_json::to_string_pretty(other).unwrap_or_else(|_| other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::descriptor::{
        AgentSpec, EffectId, PromptSpec, TaskCtx, TaskDescriptorShape, define_task,
    };
    use crate::domain::models::schema::{OutputSchema, PropertyType, SchemaViolation};
    use serde_json::json;

    fn sample_request(feedback: Option<SchemaViolations>) -> InvocationRequest {
        let factory = define_task("inventory", |_args, _ctx| {
            TaskDescriptorShape::new()
                .title("Build emission inventory")
                .agent(AgentSpec {
                    name: "environmental-engineer".to_string(),
                    skills: vec!["dispersion-modeling".to_string()],
                    prompt: PromptSpec {
                        role: "a senior environmental engineer".to_string(),
                        task: "Quantify annual emissions per pollutant.".to_string(),
                        context: json!({"facility": "plant-7"}),
                        instructions: vec![
                            "Use the provided stack parameters.".to_string(),
                            "Report totals in tons per year.".to_string(),
                        ],
                        output_format: "json".to_string(),
                    },
                })
                .output_schema(
                    OutputSchema::new().required_property("total_tons", PropertyType::Number),
                )
        });
        let descriptor = factory
            .build(
                &json!({}),
                &TaskCtx {
                    effect_id: EffectId::new(),
                },
            )
            .unwrap();

        let mut request = InvocationRequest::new(descriptor, json!({"year": 2026}));
        if let Some(feedback) = feedback {
            request = request.with_feedback(feedback);
        }
        request
    }

    #[test]
    fn test_render_includes_all_sections() {
        let rendered = render_invocation(&sample_request(None));

        assert!(rendered.contains("You are a senior environmental engineer."));
        assert!(rendered.contains("# Task"));
        assert!(rendered.contains("Quantify annual emissions"));
        assert!(rendered.contains("Relevant skills: dispersion-modeling"));
        assert!(rendered.contains("\"facility\": \"plant-7\""));
        assert!(rendered.contains("\"year\": 2026"));
        assert!(rendered.contains("1. Use the provided stack parameters."));
        assert!(rendered.contains("2. Report totals in tons per year."));
        assert!(rendered.contains("single json value"));
        assert!(rendered.contains("total_tons"));
        assert!(!rendered.contains("Correction required"));
    }

    #[test]
    fn test_render_appends_feedback_on_retry() {
        let feedback = SchemaViolations(vec![SchemaViolation::TypeMismatch {
            field: "total_tons".to_string(),
            expected: "number".to_string(),
            actual: "string".to_string(),
        }]);
        let rendered = render_invocation(&sample_request(Some(feedback)));

        assert!(rendered.contains("# Correction required"));
        assert!(rendered.contains("field 'total_tons' expected number, got string"));
    }
}
