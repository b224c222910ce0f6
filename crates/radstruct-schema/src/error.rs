//! Error types for schema compilation and conformance

use serde_json::Value;
use thiserror::Error;

/// Template defects found during compilation
///
/// These never abort compilation; the affected field degrades to an optional
/// string and the defect is recorded on the compiled schema.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TemplateError {
    /// The template root is not a mapping of fields
    #[error("Template root must be a mapping of fields, found {found}")]
    RootNotObject {
        /// JSON type that was found
        found: String,
    },

    /// A node is neither a leaf nor a non-empty mapping
    #[error("Malformed template node at '{path}': found {found}")]
    MalformedNode {
        /// Path of the degraded field
        path: String,
        /// JSON type that was found
        found: String,
    },

    /// A leaf whose description is missing or not a string
    #[error("Leaf at '{path}' has no string description")]
    MissingDescription {
        /// Path of the leaf
        path: String,
    },
}

/// A provider payload that does not match the compiled schema
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Schema violation at '{path}': expected {expected}, found {found}")]
pub struct SchemaViolation {
    /// Path of the offending value
    pub path: String,
    /// What the schema allows there
    pub expected: &'static str,
    /// JSON type that was found
    pub found: String,
}

impl SchemaViolation {
    pub(crate) fn new(path: &str, expected: &'static str, found: &Value) -> Self {
        Self {
            path: path.to_string(),
            expected,
            found: json_type_name(found).to_string(),
        }
    }
}

/// Name of a JSON value's type, for error messages
pub(crate) fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(map) if map.is_empty() => "empty object",
        Value::Object(_) => "object",
    }
}
