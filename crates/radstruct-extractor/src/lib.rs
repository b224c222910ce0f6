//! Radstruct Extractor
//!
//! Turns one free-text radiology report plus a template into structured
//! data, using whichever AI provider was resolved for the process.
//!
//! # Architecture
//!
//! ```text
//! Report text + Template → SchemaCache → PromptBuilder → Provider → ExtractionResult
//! ```
//!
//! The compiled schema is cached per template id, the prompt embeds the
//! verbatim report and the template structure, and the provider call is
//! bounded by a timeout. Every failure surfaces as one [`ExtractionError`].
//!
//! # Example Usage
//!
//! ```
//! use radstruct_domain::{Template, TemplateNode};
//! use radstruct_extractor::{Extractor, ExtractorConfig};
//! use radstruct_llm::MockProvider;
//! use serde_json::json;
//! use std::sync::Arc;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let template = Template::new(
//!     "Chest X-ray",
//!     TemplateNode::from_value(&json!({
//!         "finding": {"type": "string", "description": "primary finding"}
//!     })),
//! );
//! let provider = Arc::new(MockProvider::new(json!({"finding": null})));
//! let extractor = Extractor::new(provider, ExtractorConfig::default());
//!
//! let result = extractor
//!     .structure_report("No acute cardiopulmonary process.", &template)
//!     .await?;
//!
//! assert_eq!(result.structured_data, json!({"finding": null}));
//! assert_eq!(result.confidence_score.value(), 85);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

mod config;
mod error;
mod extractor;
mod prompt;

pub use config::ExtractorConfig;
pub use error::ExtractionError;
pub use extractor::Extractor;
pub use prompt::{PromptBuilder, INSTRUCTIONS, PROMPT_VERSION};
pub use radstruct_llm::ExtractionResult;
