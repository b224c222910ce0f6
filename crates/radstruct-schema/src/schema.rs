//! Compiled schema tree and its JSON Schema rendering

use crate::error::TemplateError;
use serde_json::{json, Map, Value};

/// Name of the root schema object; nested objects extend it by path
pub const ROOT_NAME: &str = "template";

/// Title of the rendered JSON Schema document
pub const SCHEMA_TITLE: &str = "RadiologyReport";

/// Typed, optional-everywhere extraction schema derived from a template
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledSchema {
    /// Root object
    pub root: SchemaObject,

    /// Degraded template nodes encountered while compiling
    pub diagnostics: Vec<TemplateError>,
}

/// A named object schema
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaObject {
    /// Path-based name (`template`, `template.lungs`, ...)
    pub name: String,

    /// Fields in authored order
    pub fields: Vec<SchemaField>,
}

/// A single optional field
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaField {
    /// Field name as authored
    pub name: String,

    /// Full dotted path from the root
    pub path: String,

    /// Scalar or nested object
    pub kind: FieldKind,
}

/// Shape of a field's value when present
#[derive(Debug, Clone, PartialEq)]
pub enum FieldKind {
    /// Optional string value
    Scalar {
        /// Description passed to the model
        description: Option<String>,
        /// Type label from the template (not enforced)
        declared_type: Option<String>,
    },

    /// Optional nested object
    Object(SchemaObject),
}

impl CompiledSchema {
    /// Whether the template compiled without degradation
    pub fn is_clean(&self) -> bool {
        self.diagnostics.is_empty()
    }

    /// Look up a field by its dotted path
    pub fn field(&self, path: &str) -> Option<&SchemaField> {
        fn walk<'a>(object: &'a SchemaObject, path: &str) -> Option<&'a SchemaField> {
            object.fields.iter().find_map(|field| {
                if field.path == path {
                    return Some(field);
                }
                match &field.kind {
                    FieldKind::Object(child) if path.starts_with(&format!("{}.", field.path)) => {
                        walk(child, path)
                    }
                    _ => None,
                }
            })
        }
        walk(&self.root, path)
    }

    /// Number of scalar fields at any depth
    pub fn leaf_count(&self) -> usize {
        fn count(object: &SchemaObject) -> usize {
            object
                .fields
                .iter()
                .map(|field| match &field.kind {
                    FieldKind::Scalar { .. } => 1,
                    FieldKind::Object(child) => count(child),
                })
                .sum()
        }
        count(&self.root)
    }

    /// Payload with every field set to `null`
    pub fn empty_payload(&self) -> Value {
        Value::Object(
            self.root
                .fields
                .iter()
                .map(|field| (field.name.clone(), Value::Null))
                .collect(),
        )
    }

    /// Render as a JSON Schema document.
    ///
    /// The same document serves as a tool `input_schema` and as a strict
    /// `json_schema` response format: every property is listed in `required`
    /// and nullable, extra properties are forbidden, and nested objects live
    /// under `$defs` keyed by their path name. Two objects whose paths render
    /// the same (`"a.b"` vs `a` holding `b`) get distinct keys with a numeric
    /// suffix, and `$ref` targets are escaped as JSON pointers.
    pub fn to_json_schema(&self) -> Value {
        let mut defs = Map::new();
        let mut document = object_schema(&self.root, &mut defs);
        if let Value::Object(map) = &mut document {
            map.insert("title".to_string(), Value::String(SCHEMA_TITLE.to_string()));
            if !defs.is_empty() {
                map.insert("$defs".to_string(), Value::Object(defs));
            }
        }
        document
    }
}

fn object_schema(object: &SchemaObject, defs: &mut Map<String, Value>) -> Value {
    let properties: Map<String, Value> = object
        .fields
        .iter()
        .map(|field| (field.name.clone(), field_schema(field, defs)))
        .collect();
    let required: Vec<Value> = object
        .fields
        .iter()
        .map(|field| Value::String(field.name.clone()))
        .collect();

    json!({
        "type": "object",
        "properties": properties,
        "required": required,
        "additionalProperties": false,
    })
}

fn field_schema(field: &SchemaField, defs: &mut Map<String, Value>) -> Value {
    match &field.kind {
        FieldKind::Scalar { description, .. } => {
            let mut schema = json!({ "type": ["string", "null"] });
            if let (Some(text), Value::Object(map)) = (description, &mut schema) {
                map.insert("description".to_string(), Value::String(text.clone()));
            }
            schema
        }
        FieldKind::Object(child) => {
            let key = define(child, defs);
            json!({
                "anyOf": [
                    { "$ref": format!("#/$defs/{}", pointer_escape(&key)) },
                    { "type": "null" }
                ]
            })
        }
    }
}

/// Render `object` into `defs` under a key no other object holds
fn define(object: &SchemaObject, defs: &mut Map<String, Value>) -> String {
    let mut key = object.name.clone();
    let mut suffix = 2;
    while defs.contains_key(&key) {
        key = format!("{}_{}", object.name, suffix);
        suffix += 1;
    }
    // Reserve before recursing so nested objects cannot take the key
    defs.insert(key.clone(), Value::Null);

    let mut schema = object_schema(object, defs);
    if let Value::Object(map) = &mut schema {
        map.insert("title".to_string(), Value::String(object.name.clone()));
    }
    defs.insert(key.clone(), schema);
    key
}

/// Escape one JSON pointer reference token (RFC 6901)
fn pointer_escape(token: &str) -> String {
    token.replace('~', "~0").replace('/', "~1")
}
