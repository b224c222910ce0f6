//! Template module - user-authored extraction templates
//!
//! A template structure is a recursive mapping. A node holding both `type`
//! and `description` keys is a leaf field; any other non-empty mapping is an
//! object of named child nodes. Everything else is kept as a malformed node so
//! that the schema compiler can degrade it instead of failing.

use crate::ids::TemplateId;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A parsed template structure node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "Value", into = "Value")]
pub enum TemplateNode {
    /// Terminal field to extract
    Leaf {
        /// Declared type label (documentation only)
        field_type: Option<String>,
        /// Human-readable description passed to the model
        description: Option<String>,
        /// The leaf mapping as authored, including any extra keys
        raw: Map<String, Value>,
    },

    /// Named child nodes, in authored order
    Object(Vec<(String, TemplateNode)>),

    /// Anything that is neither a leaf nor a non-empty mapping
    Malformed(Value),
}

impl TemplateNode {
    /// Key that marks a leaf's declared type
    pub const TYPE_KEY: &'static str = "type";

    /// Key that marks a leaf's description
    pub const DESCRIPTION_KEY: &'static str = "description";

    /// Parse a raw JSON value into a template node. Never fails.
    pub fn from_value(value: &Value) -> Self {
        let Some(map) = value.as_object() else {
            return TemplateNode::Malformed(value.clone());
        };

        if map.contains_key(Self::TYPE_KEY) && map.contains_key(Self::DESCRIPTION_KEY) {
            return TemplateNode::Leaf {
                field_type: map
                    .get(Self::TYPE_KEY)
                    .and_then(Value::as_str)
                    .map(str::to_string),
                description: map
                    .get(Self::DESCRIPTION_KEY)
                    .and_then(Value::as_str)
                    .map(str::to_string),
                raw: map.clone(),
            };
        }

        if map.is_empty() {
            return TemplateNode::Malformed(value.clone());
        }

        TemplateNode::Object(
            map.iter()
                .map(|(key, child)| (key.clone(), TemplateNode::from_value(child)))
                .collect(),
        )
    }

    /// Render the node back to its authored JSON shape
    pub fn to_value(&self) -> Value {
        match self {
            TemplateNode::Leaf { raw, .. } => Value::Object(raw.clone()),
            TemplateNode::Object(fields) => Value::Object(
                fields
                    .iter()
                    .map(|(key, child)| (key.clone(), child.to_value()))
                    .collect(),
            ),
            TemplateNode::Malformed(raw) => raw.clone(),
        }
    }

    /// Convenience constructor for a leaf
    pub fn leaf(field_type: impl Into<String>, description: impl Into<String>) -> Self {
        let field_type = field_type.into();
        let description = description.into();
        let mut raw = Map::new();
        raw.insert(Self::TYPE_KEY.to_string(), Value::String(field_type.clone()));
        raw.insert(Self::DESCRIPTION_KEY.to_string(), Value::String(description.clone()));
        TemplateNode::Leaf {
            field_type: Some(field_type),
            description: Some(description),
            raw,
        }
    }

    /// Whether this node is a leaf field
    pub fn is_leaf(&self) -> bool {
        matches!(self, TemplateNode::Leaf { .. })
    }

    /// Child fields of an object node
    pub fn fields(&self) -> Option<&[(String, TemplateNode)]> {
        match self {
            TemplateNode::Object(fields) => Some(fields),
            _ => None,
        }
    }

    /// Nesting depth; leaves and malformed nodes have depth 0
    pub fn depth(&self) -> usize {
        match self {
            TemplateNode::Object(fields) => {
                1 + fields.iter().map(|(_, child)| child.depth()).max().unwrap_or(0)
            }
            _ => 0,
        }
    }
}

impl From<Value> for TemplateNode {
    fn from(value: Value) -> Self {
        TemplateNode::from_value(&value)
    }
}

impl From<TemplateNode> for Value {
    fn from(node: TemplateNode) -> Self {
        node.to_value()
    }
}

/// A named extraction template
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Template {
    /// Unique identifier
    pub id: TemplateId,

    /// Display name
    pub name: String,

    /// Recursive field structure
    pub structure: TemplateNode,
}

impl Template {
    /// Create a template with a fresh identifier
    pub fn new(name: impl Into<String>, structure: TemplateNode) -> Self {
        Self {
            id: TemplateId::new(),
            name: name.into(),
            structure,
        }
    }
}
