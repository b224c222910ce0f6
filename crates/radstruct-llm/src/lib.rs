//! Radstruct LLM Provider Layer
//!
//! Interchangeable AI backends that populate a compiled extraction schema
//! from a prompt.
//!
//! # Architecture
//!
//! Every backend implements [`ExtractionProvider`]: it receives a prompt and
//! a [`CompiledSchema`], and returns schema-conformant data plus a confidence
//! score, or a [`ProviderError`]. No partial payload is ever returned.
//!
//! # Providers
//!
//! - [`AnthropicProvider`]: tool-call based; the schema is a forced tool's
//!   `input_schema` and the tool arguments are the result
//! - [`OpenAiProvider`]: structured decoding via a strict `json_schema`
//!   response format; [`OpenAiProvider::ollama`] reuses it for a local,
//!   unauthenticated OpenAI-compatible endpoint
//! - [`MockProvider`]: deterministic, network-free provider for testing
//!
//! [`ProviderSettings`] selects a backend once per process and
//! [`ResolvedProvider`] wraps the constructed client.
//!
//! # Examples
//!
//! ```
//! use radstruct_domain::TemplateNode;
//! use radstruct_llm::{ExtractionProvider, MockProvider};
//! use radstruct_schema::compile;
//! use serde_json::json;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let schema = compile(&TemplateNode::from_value(&json!({
//!     "finding": {"type": "string", "description": "primary finding"}
//! })));
//! let provider = MockProvider::new(json!({"finding": "clear lungs"}));
//!
//! let result = provider.extract("prompt", &schema, "mock-model").await.unwrap();
//! assert_eq!(result.structured_data, json!({"finding": "clear lungs"}));
//! assert_eq!(result.confidence_score.value(), 85);
//! # }
//! ```

#![warn(missing_docs)]

pub mod anthropic;
mod http;
pub mod mock;
pub mod openai;
pub mod resolved;
pub mod settings;

use radstruct_domain::ConfidenceScore;
use radstruct_schema::{CompiledSchema, SchemaViolation};
use serde_json::Value;
use std::future::Future;
use thiserror::Error;

pub use anthropic::AnthropicProvider;
pub use mock::MockProvider;
pub use openai::OpenAiProvider;
pub use resolved::ResolvedProvider;
pub use settings::{ConfigError, ProviderKind, ProviderSettings, DEFAULT_MODEL};

/// Confidence reported for every successful extraction.
///
/// Not derived from any model signal.
pub const DEFAULT_CONFIDENCE: u8 = 85;

/// Errors that can occur during provider calls
#[derive(Error, Debug)]
pub enum ProviderError {
    /// Network or transport failure
    #[error("Communication error: {0}")]
    Communication(String),

    /// Credentials rejected by the provider
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// Non-success HTTP status
    #[error("HTTP {status}: {body}")]
    Http {
        /// Status code
        status: u16,
        /// Response body (possibly truncated)
        body: String,
    },

    /// Rate limit exceeded
    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    /// Model not available
    #[error("Model not available: {0}")]
    ModelNotAvailable(String),

    /// Response body could not be decoded
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Provider answered without a tool invocation or parseable payload
    #[error("No structured data returned from {0}")]
    NoStructuredData(String),

    /// Payload does not match the compiled schema
    #[error("{0}")]
    SchemaViolation(#[from] SchemaViolation),

    /// Request exceeded its time budget
    #[error("Request timed out")]
    Timeout,
}

/// Schema-conformant data produced by a provider
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractionResult {
    /// Payload with every schema field present (possibly `null`)
    pub structured_data: Value,

    /// Extraction confidence (0-100)
    pub confidence_score: ConfidenceScore,
}

impl ExtractionResult {
    /// Conform a raw provider payload and attach the default confidence
    pub fn from_payload(schema: &CompiledSchema, payload: &Value) -> Result<Self, ProviderError> {
        Ok(Self {
            structured_data: schema.conform(payload)?,
            confidence_score: default_confidence(),
        })
    }
}

/// The default confidence as a checked score
pub fn default_confidence() -> ConfidenceScore {
    ConfidenceScore::new(DEFAULT_CONFIDENCE).unwrap_or_else(|_| unreachable!("85 is within 0..=100"))
}

/// Capability shared by every AI backend
///
/// Implementations are stateless with respect to individual calls and safe
/// to share across concurrent units of work.
pub trait ExtractionProvider: Send + Sync {
    /// Short backend name for logs
    fn name(&self) -> &'static str;

    /// Populate `schema` from `prompt` using `model`
    fn extract(
        &self,
        prompt: &str,
        schema: &CompiledSchema,
        model: &str,
    ) -> impl Future<Output = Result<ExtractionResult, ProviderError>> + Send;
}

#[cfg(test)]
mod tests {
    use super::*;
    use radstruct_domain::TemplateNode;
    use serde_json::json;

    #[test]
    fn test_from_payload_conforms() {
        let schema = radstruct_schema::compile(&TemplateNode::from_value(&json!({
            "finding": {"type": "string", "description": "primary finding"},
            "impression": {"type": "string", "description": "impression"}
        })));

        let result = ExtractionResult::from_payload(&schema, &json!({"finding": null})).unwrap();
        assert_eq!(result.structured_data, json!({"finding": null, "impression": null}));
        assert_eq!(result.confidence_score.value(), DEFAULT_CONFIDENCE);
    }

    #[test]
    fn test_from_payload_rejects_violation() {
        let schema = radstruct_schema::compile(&TemplateNode::from_value(&json!({
            "finding": {"type": "string", "description": "primary finding"}
        })));

        let err = ExtractionResult::from_payload(&schema, &json!({"finding": 4})).unwrap_err();
        assert!(matches!(err, ProviderError::SchemaViolation(_)));
        assert!(err.to_string().contains("template.finding"));
    }
}
