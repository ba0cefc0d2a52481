//! Property tests for the schema validator.

use proptest::prelude::*;
use proptest::test_runner::TestCaseError;
use serde_json::{json, Map, Value};

use foreman::domain::errors::DomainError;
use foreman::domain::models::schema::{OutputSchema, PropertyType};
use foreman::services::validator::validate;

/// The fixed schema under test: three required fields of distinct types
/// plus one optional declared field.
fn schema() -> OutputSchema {
    OutputSchema::new()
        .required_property("name", PropertyType::String)
        .required_property("total", PropertyType::Number)
        .required_property("approved", PropertyType::Boolean)
        .property("tags", PropertyType::Array {
            items: Some(Box::new(PropertyType::String)),
        })
}

fn conforming_payload() -> impl Strategy<Value = Map<String, Value>> {
    (
        any::<String>(),
        any::<i64>(),
        any::<bool>(),
        prop::option::of(prop::collection::vec(any::<String>(), 0..4)),
        prop::option::of(any::<String>()),
    )
        .prop_map(|(name, total, approved, tags, extra)| {
            let mut map = Map::new();
            map.insert("name".to_string(), json!(name));
            map.insert("total".to_string(), json!(total));
            map.insert("approved".to_string(), json!(approved));
            if let Some(tags) = tags {
                map.insert("tags".to_string(), json!(tags));
            }
            if let Some(extra) = extra {
                // Undeclared extras must always pass.
                map.insert("undeclared_extra".to_string(), json!(extra));
            }
            map
        })
}

proptest! {
    /// Any payload with the required fields at the right types validates,
    /// regardless of extras.
    #[test]
    fn conforming_payloads_validate(payload in conforming_payload()) {
        prop_assert!(validate(&Value::Object(payload), &schema()).is_ok());
    }

    /// Removing any subset of required fields fails, and every removed
    /// field is named in the violations - not just the first.
    #[test]
    fn all_missing_fields_are_reported(
        payload in conforming_payload(),
        drop_name in any::<bool>(),
        drop_total in any::<bool>(),
        drop_approved in any::<bool>(),
    ) {
        prop_assume!(drop_name || drop_total || drop_approved);

        let mut payload = payload;
        let mut dropped = Vec::new();
        for (flag, field) in [
            (drop_name, "name"),
            (drop_total, "total"),
            (drop_approved, "approved"),
        ] {
            if flag {
                payload.remove(field);
                dropped.push(field);
            }
        }

        let err = validate(&Value::Object(payload), &schema()).unwrap_err();
        let DomainError::SchemaValidation(violations) = err else {
            return Err(TestCaseError::fail("expected SchemaValidation"));
        };
        for field in dropped {
            prop_assert!(violations.mentions(field), "missing report for {field}");
        }
    }

    /// A mistyped field is reported with its name even when other fields
    /// are fine.
    #[test]
    fn mistyped_field_is_reported(total in any::<String>()) {
        let payload = json!({
            "name": "x",
            "total": total,
            "approved": true,
        });

        let err = validate(&payload, &schema()).unwrap_err();
        let DomainError::SchemaValidation(violations) = err else {
            return Err(TestCaseError::fail("expected SchemaValidation"));
        };
        prop_assert!(violations.mentions("total"));
        prop_assert_eq!(violations.len(), 1);
    }
}
