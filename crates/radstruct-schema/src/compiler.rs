//! Recursive descent from template AST to compiled schema

use crate::error::{json_type_name, TemplateError};
use crate::schema::{CompiledSchema, FieldKind, SchemaField, SchemaObject, ROOT_NAME};
use radstruct_domain::TemplateNode;

/// Compile a template structure into an extraction schema.
///
/// Pure and deterministic: equal structures always compile to equal schemas.
/// Never fails; defects are degraded and listed in `diagnostics`.
pub fn compile(structure: &TemplateNode) -> CompiledSchema {
    let mut diagnostics = Vec::new();

    let root = match structure {
        TemplateNode::Object(fields) => compile_object(ROOT_NAME, fields, &mut diagnostics),
        other => {
            diagnostics.push(TemplateError::RootNotObject {
                found: describe(other).to_string(),
            });
            SchemaObject {
                name: ROOT_NAME.to_string(),
                fields: Vec::new(),
            }
        }
    };

    CompiledSchema { root, diagnostics }
}

fn compile_object(
    path: &str,
    fields: &[(String, TemplateNode)],
    diagnostics: &mut Vec<TemplateError>,
) -> SchemaObject {
    SchemaObject {
        name: path.to_string(),
        fields: fields
            .iter()
            .map(|(name, node)| compile_field(path, name, node, diagnostics))
            .collect(),
    }
}

fn compile_field(
    parent: &str,
    name: &str,
    node: &TemplateNode,
    diagnostics: &mut Vec<TemplateError>,
) -> SchemaField {
    let path = format!("{}.{}", parent, name);

    let kind = match node {
        TemplateNode::Leaf {
            field_type,
            description,
            ..
        } => {
            if description.is_none() {
                diagnostics.push(TemplateError::MissingDescription { path: path.clone() });
            }
            FieldKind::Scalar {
                description: description.clone(),
                declared_type: field_type.clone(),
            }
        }
        TemplateNode::Object(children) => {
            FieldKind::Object(compile_object(&path, children, diagnostics))
        }
        TemplateNode::Malformed(_) => {
            diagnostics.push(TemplateError::MalformedNode {
                path: path.clone(),
                found: describe(node).to_string(),
            });
            FieldKind::Scalar {
                description: None,
                declared_type: None,
            }
        }
    };

    SchemaField {
        name: name.to_string(),
        path,
        kind,
    }
}

fn describe(node: &TemplateNode) -> &'static str {
    match node {
        TemplateNode::Leaf { .. } => "leaf",
        TemplateNode::Object(_) => "object",
        TemplateNode::Malformed(raw) => json_type_name(raw),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn compile_json(value: serde_json::Value) -> CompiledSchema {
        compile(&TemplateNode::from_value(&value))
    }

    #[test]
    fn test_single_leaf() {
        let schema = compile_json(json!({
            "finding": {"type": "string", "description": "primary finding"}
        }));

        assert!(schema.is_clean());
        assert_eq!(schema.root.name, "template");
        assert_eq!(schema.root.fields.len(), 1);

        let field = &schema.root.fields[0];
        assert_eq!(field.name, "finding");
        assert_eq!(field.path, "template.finding");
        assert_eq!(
            field.kind,
            FieldKind::Scalar {
                description: Some("primary finding".to_string()),
                declared_type: Some("string".to_string()),
            }
        );
    }

    #[test]
    fn test_nested_object() {
        let schema = compile_json(json!({
            "lungs": {"findings": {"type": "string", "description": "lung findings"}}
        }));

        let lungs = &schema.root.fields[0];
        assert_eq!(lungs.name, "lungs");
        let FieldKind::Object(child) = &lungs.kind else {
            panic!("lungs should compile to a nested object");
        };
        assert_eq!(child.name, "template.lungs");
        assert_eq!(child.fields.len(), 1);
        assert_eq!(child.fields[0].path, "template.lungs.findings");
    }

    #[test]
    fn test_declared_type_is_documentation_only() {
        let schema = compile_json(json!({
            "size_mm": {"type": "number", "description": "nodule size"},
            "present": {"type": "boolean", "description": "nodule present"}
        }));

        // Both compile to the same optional string shape
        let document = schema.to_json_schema();
        assert_eq!(document["properties"]["size_mm"]["type"], json!(["string", "null"]));
        assert_eq!(document["properties"]["present"]["type"], json!(["string", "null"]));
    }

    #[test]
    fn test_malformed_nodes_degrade() {
        let schema = compile_json(json!({
            "good": {"type": "string", "description": "fine"},
            "bare": "just a string",
            "empty": {},
            "list": [1, 2],
            "nested": {"oops": 3}
        }));

        assert_eq!(schema.root.fields.len(), 5);
        assert_eq!(schema.diagnostics.len(), 4);
        assert!(schema.diagnostics.contains(&TemplateError::MalformedNode {
            path: "template.bare".to_string(),
            found: "string".to_string(),
        }));
        assert!(schema.diagnostics.contains(&TemplateError::MalformedNode {
            path: "template.empty".to_string(),
            found: "empty object".to_string(),
        }));
        assert!(schema.diagnostics.contains(&TemplateError::MalformedNode {
            path: "template.nested.oops".to_string(),
            found: "number".to_string(),
        }));

        for name in ["bare", "empty", "list"] {
            let field = schema.root.fields.iter().find(|f| f.name == name).unwrap();
            assert_eq!(
                field.kind,
                FieldKind::Scalar { description: None, declared_type: None }
            );
        }
    }

    #[test]
    fn test_root_not_object() {
        let schema = compile_json(json!(["finding"]));
        assert!(schema.root.fields.is_empty());
        assert_eq!(
            schema.diagnostics,
            vec![TemplateError::RootNotObject { found: "array".to_string() }]
        );
    }

    #[test]
    fn test_leaf_without_string_description() {
        let schema = compile_json(json!({"size": {"type": "string", "description": null}}));
        assert_eq!(
            schema.diagnostics,
            vec![TemplateError::MissingDescription { path: "template.size".to_string() }]
        );
    }
}
