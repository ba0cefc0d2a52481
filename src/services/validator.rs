//! Schema validator.
//!
//! Validation is shallow by default, mirroring how process authors declare
//! schemas: required top-level keys plus per-property JSON types. Extra
//! properties always pass - schemas are descriptive, not closed. Every
//! violation is collected before returning so a retry can correct all of
//! them at once.

use serde_json::Value;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::schema::{
    OutputSchema, PropertyType, SchemaViolation, SchemaViolations,
};

/// Validate a payload against an output schema. No side effects.
pub fn validate(result: &Value, schema: &OutputSchema) -> DomainResult<()> {
    let mut violations = Vec::new();
    check_object(result, schema, "", &mut violations);

    if violations.is_empty() {
        Ok(())
    } else {
        Err(DomainError::SchemaValidation(SchemaViolations(violations)))
    }
}

fn check_object(
    value: &Value,
    schema: &OutputSchema,
    prefix: &str,
    violations: &mut Vec<SchemaViolation>,
) {
    let Some(map) = value.as_object() else {
        violations.push(SchemaViolation::TypeMismatch {
            field: if prefix.is_empty() {
                "$".to_string()
            } else {
                prefix.to_string()
            },
            expected: "object".to_string(),
            actual: json_type_name(value).to_string(),
        });
        return;
    };

    for required in &schema.required {
        if !map.contains_key(required) {
            violations.push(SchemaViolation::MissingField {
                field: join_path(prefix, required),
            });
        }
    }

    for (field, expected) in &schema.properties {
        // Absence of a non-required declared property is fine.
        if let Some(actual) = map.get(field) {
            check_property(actual, expected, &join_path(prefix, field), violations);
        }
    }
}

fn check_property(
    value: &Value,
    expected: &PropertyType,
    path: &str,
    violations: &mut Vec<SchemaViolation>,
) {
    let matches = match expected {
        PropertyType::String => value.is_string(),
        // Integers are numbers; the reverse is not true.
        PropertyType::Number => value.is_number(),
        PropertyType::Integer => value.is_i64() || value.is_u64(),
        PropertyType::Boolean => value.is_boolean(),
        PropertyType::Object { .. } => value.is_object(),
        PropertyType::Array { .. } => value.is_array(),
        PropertyType::Any => true,
    };

    if !matches {
        violations.push(SchemaViolation::TypeMismatch {
            field: path.to_string(),
            expected: expected.name().to_string(),
            actual: json_type_name(value).to_string(),
        });
        return;
    }

    // Deep validation only where the schema opted in.
    match expected {
        PropertyType::Object {
            schema: Some(nested),
        } => check_object(value, nested, path, violations),
        PropertyType::Array { items: Some(items) } => {
            if let Some(elements) = value.as_array() {
                for (index, element) in elements.iter().enumerate() {
                    check_property(element, items, &format!("{path}[{index}]"), violations);
                }
            }
        }
        _ => {}
    }
}

fn join_path(prefix: &str, field: &str) -> String {
    if prefix.is_empty() {
        field.to_string()
    } else {
        format!("{prefix}.{field}")
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
