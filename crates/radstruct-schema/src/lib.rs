//! Radstruct Schema Compiler
//!
//! Turns a nested extraction template into a strict, optional-everywhere
//! extraction schema.
//!
//! # Overview
//!
//! ```text
//! TemplateNode → compile() → CompiledSchema → { JSON Schema for providers,
//!                                               conform() for provider output }
//! ```
//!
//! - Every compiled field is optional: extraction may legitimately find
//!   nothing, and that is represented as `null`.
//! - Leaf `type` labels are documentation only; every leaf compiles to an
//!   optional string.
//! - Malformed template nodes never fail compilation. They degrade to an
//!   optional string and are reported as [`TemplateError`] diagnostics.
//! - Nested schemas are named by their path (`template.lungs.findings`), so
//!   compilation is deterministic and safe to cache by template id.
//!
//! # Example
//!
//! ```
//! use radstruct_domain::TemplateNode;
//! use radstruct_schema::compile;
//! use serde_json::json;
//!
//! let structure = TemplateNode::from_value(&json!({
//!     "lungs": {"findings": {"type": "string", "description": "lung findings"}}
//! }));
//!
//! let schema = compile(&structure);
//! let payload = schema.conform(&json!({})).unwrap();
//! assert_eq!(payload, json!({"lungs": null}));
//! ```

#![warn(missing_docs)]

mod cache;
mod compiler;
mod conform;
mod error;
mod schema;

pub use cache::SchemaCache;
pub use compiler::compile;
pub use error::{SchemaViolation, TemplateError};
pub use schema::{CompiledSchema, FieldKind, SchemaField, SchemaObject, ROOT_NAME, SCHEMA_TITLE};
