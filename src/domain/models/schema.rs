//! Output schema model.
//!
//! Schemas here are deliberately shallow: the corpus of process definitions
//! declares expected top-level fields and their JSON types, never
//! `additionalProperties: false`. Unknown extras are always permitted.
//! Nested validation applies only where a nested schema is declared.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// JSON type expected for a declared property.
///
/// Serializes as a bare type name (`string`, `array`, ...) in the common
/// shallow case, or as `{type: object, schema: ...}` / `{type: array,
/// items: ...}` when nested validation is declared.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyType {
    String,
    Number,
    Integer,
    Boolean,
    /// Object; validates nested fields only when a nested schema is given.
    Object { schema: Option<Box<OutputSchema>> },
    /// Array; validates elements only when an item type is given.
    Array { items: Option<Box<PropertyType>> },
    /// Accept any JSON value.
    Any,
}

impl PropertyType {
    fn from_name(name: &str) -> Option<Self> {
        match name {
            "string" => Some(Self::String),
            "number" => Some(Self::Number),
            "integer" => Some(Self::Integer),
            "boolean" => Some(Self::Boolean),
            "object" => Some(Self::Object { schema: None }),
            "array" => Some(Self::Array { items: None }),
            "any" => Some(Self::Any),
            _ => None,
        }
    }

    /// Plain object with no nested schema.
    pub fn object() -> Self {
        Self::Object { schema: None }
    }

    /// Plain array with no item type.
    pub fn array() -> Self {
        Self::Array { items: None }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Number => "number",
            Self::Integer => "integer",
            Self::Boolean => "boolean",
            Self::Object { .. } => "object",
            Self::Array { .. } => "array",
            Self::Any => "any",
        }
    }
}

impl Serialize for PropertyType {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::SerializeMap;
        match self {
            Self::Object {
                schema: Some(schema),
            } => {
                let mut map = serializer.serialize_map(Some(2))?;
                map.serialize_entry("type", "object")?;
                map.serialize_entry("schema", schema)?;
                map.end()
            }
            Self::Array { items: Some(items) } => {
                let mut map = serializer.serialize_map(Some(2))?;
                map.serialize_entry("type", "array")?;
                map.serialize_entry("items", items)?;
                map.end()
            }
            other => serializer.serialize_str(other.name()),
        }
    }
}

impl<'de> Deserialize<'de> for PropertyType {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Name(String),
            Detailed {
                #[serde(rename = "type")]
                ty: String,
                #[serde(default)]
                schema: Option<Box<OutputSchema>>,
                #[serde(default)]
                items: Option<Box<PropertyType>>,
            },
        }

        match Repr::deserialize(deserializer)? {
            Repr::Name(name) => PropertyType::from_name(&name)
                .ok_or_else(|| serde::de::Error::custom(format!("unknown property type '{name}'"))),
            Repr::Detailed { ty, schema, items } => match ty.as_str() {
                "object" => Ok(PropertyType::Object { schema }),
                "array" => Ok(PropertyType::Array { items }),
                other => PropertyType::from_name(other).ok_or_else(|| {
                    serde::de::Error::custom(format!("unknown property type '{other}'"))
                }),
            },
        }
    }
}

/// Descriptive schema for a task's output payload.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OutputSchema {
    /// Top-level keys that must be present.
    #[serde(default)]
    pub required: Vec<String>,
    /// Declared property types. Properties not listed are unconstrained.
    #[serde(default)]
    pub properties: BTreeMap<String, PropertyType>,
}

impl OutputSchema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark a field as required.
    pub fn require(mut self, field: impl Into<String>) -> Self {
        let field = field.into();
        if !self.required.contains(&field) {
            self.required.push(field);
        }
        self
    }

    /// Declare a property's type.
    pub fn property(mut self, field: impl Into<String>, ty: PropertyType) -> Self {
        self.properties.insert(field.into(), ty);
        self
    }

    /// Declare a required property in one step.
    pub fn required_property(self, field: impl Into<String>, ty: PropertyType) -> Self {
        let field = field.into();
        self.property(field.clone(), ty).require(field)
    }

    pub fn is_empty(&self) -> bool {
        self.required.is_empty() && self.properties.is_empty()
    }
}

/// A single violation found while validating a payload against a schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SchemaViolation {
    /// A required field is absent.
    MissingField { field: String },
    /// A declared field is present with the wrong JSON type.
    TypeMismatch {
        field: String,
        expected: String,
        actual: String,
    },
}

impl fmt::Display for SchemaViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingField { field } => write!(f, "missing required field '{field}'"),
            Self::TypeMismatch {
                field,
                expected,
                actual,
            } => write!(f, "field '{field}' expected {expected}, got {actual}"),
        }
    }
}

impl SchemaViolation {
    /// Dotted path of the offending field.
    pub fn field(&self) -> &str {
        match self {
            Self::MissingField { field } | Self::TypeMismatch { field, .. } => field,
        }
    }
}

/// The complete set of violations from one validation pass.
///
/// Validation never stops at the first problem: the caller feeds the whole
/// set back to the agent so it can correct everything in one retry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SchemaViolations(pub Vec<SchemaViolation>);

impl SchemaViolations {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &SchemaViolation> {
        self.0.iter()
    }

    /// Whether any violation concerns the given field.
    pub fn mentions(&self, field: &str) -> bool {
        self.0.iter().any(|v| v.field() == field)
    }
}

impl fmt::Display for SchemaViolations {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.0.iter().map(ToString::to_string).collect();
        write!(f, "{}", parts.join("; "))
    }
}
