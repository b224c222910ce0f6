//! Normalize provider payloads against a compiled schema

use crate::error::SchemaViolation;
use crate::schema::{CompiledSchema, FieldKind, SchemaObject};
use serde_json::{Map, Value};

impl CompiledSchema {
    /// Normalize a provider payload to the schema's exact shape.
    ///
    /// Unknown keys are dropped and missing fields become `null`, so the
    /// result always carries every field of the schema. Scalars must be
    /// strings or `null`; nested fields must be objects or `null`.
    pub fn conform(&self, payload: &Value) -> Result<Value, SchemaViolation> {
        conform_object(&self.root, payload)
    }
}

fn conform_object(object: &SchemaObject, value: &Value) -> Result<Value, SchemaViolation> {
    let map = value
        .as_object()
        .ok_or_else(|| SchemaViolation::new(&object.name, "an object", value))?;

    let mut conformed = Map::with_capacity(object.fields.len());
    for field in &object.fields {
        let raw = map.get(&field.name).unwrap_or(&Value::Null);

        let normalized = match (&field.kind, raw) {
            (_, Value::Null) => Value::Null,
            (FieldKind::Scalar { .. }, Value::String(text)) => Value::String(text.clone()),
            (FieldKind::Scalar { .. }, other) => {
                return Err(SchemaViolation::new(&field.path, "a string or null", other));
            }
            (FieldKind::Object(child), other) => conform_object(child, other)?,
        };

        conformed.insert(field.name.clone(), normalized);
    }

    Ok(Value::Object(conformed))
}
