//! Anthropic Provider Implementation
//!
//! Tool-call based extraction against the Messages API. The compiled schema
//! is offered as the input schema of a single tool, the model is forced to
//! call it, and the tool arguments become the structured payload.
//!
//! # Examples
//!
//! ```no_run
//! use radstruct_llm::AnthropicProvider;
//! use std::time::Duration;
//!
//! let provider = AnthropicProvider::new("sk-ant-...", Duration::from_secs(60))
//!     .unwrap()
//!     .with_max_tokens(4000);
//! ```

use crate::http::{build_client, send_json};
use crate::{ExtractionProvider, ExtractionResult, ProviderError};
use radstruct_schema::CompiledSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

/// Default Anthropic API base URL
pub const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";

/// Messages API version header value
pub const API_VERSION: &str = "2023-06-01";

/// Name of the forced extraction tool
pub const TOOL_NAME: &str = "extract_radiology_data";

/// Description of the forced extraction tool
pub const TOOL_DESCRIPTION: &str =
    "Extract structured radiology report data according to the template";

/// Default response token budget
pub const DEFAULT_MAX_TOKENS: u32 = 2000;

/// Anthropic Messages API provider
pub struct AnthropicProvider {
    base_url: String,
    api_key: String,
    max_tokens: u32,
    client: reqwest::Client,
}

#[derive(Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    tools: Vec<ToolDefinition<'a>>,
    tool_choice: ToolChoice<'a>,
    messages: Vec<Message<'a>>,
}

#[derive(Serialize)]
struct ToolDefinition<'a> {
    name: &'a str,
    description: &'a str,
    input_schema: Value,
}

#[derive(Serialize)]
struct ToolChoice<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    name: &'a str,
}

#[derive(Serialize)]
struct Message<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
}

#[derive(Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentBlock {
    ToolUse { name: String, input: Value },
    #[serde(other)]
    Other,
}

impl AnthropicProvider {
    /// Create a provider against the public API
    pub fn new(api_key: impl Into<String>, timeout: Duration) -> Result<Self, ProviderError> {
        Ok(Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: api_key.into(),
            max_tokens: DEFAULT_MAX_TOKENS,
            client: build_client(timeout)?,
        })
    }

    /// Point the provider at a different base URL
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Set the response token budget
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    fn build_request<'a>(
        &self,
        prompt: &'a str,
        schema: &CompiledSchema,
        model: &'a str,
    ) -> MessagesRequest<'a> {
        MessagesRequest {
            model,
            max_tokens: self.max_tokens,
            tools: vec![ToolDefinition {
                name: TOOL_NAME,
                description: TOOL_DESCRIPTION,
                input_schema: schema.to_json_schema(),
            }],
            tool_choice: ToolChoice {
                kind: "tool",
                name: TOOL_NAME,
            },
            messages: vec![Message {
                role: "user",
                content: prompt,
            }],
        }
    }
}

/// Arguments of the extraction tool call, if the model made one
fn tool_payload(response: MessagesResponse) -> Result<Value, ProviderError> {
    response
        .content
        .into_iter()
        .find_map(|block| match block {
            ContentBlock::ToolUse { name, input } if name == TOOL_NAME => Some(input),
            _ => None,
        })
        .ok_or_else(|| ProviderError::NoStructuredData("Anthropic".to_string()))
}

impl ExtractionProvider for AnthropicProvider {
    fn name(&self) -> &'static str {
        "anthropic"
    }

    async fn extract(
        &self,
        prompt: &str,
        schema: &CompiledSchema,
        model: &str,
    ) -> Result<ExtractionResult, ProviderError> {
        let url = format!("{}/v1/messages", self.base_url);
        let body = self.build_request(prompt, schema, model);

        debug!(provider = "anthropic", model, "Sending tool-call extraction request");
        let request = self
            .client
            .post(&url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION)
            .json(&body);

        let response: MessagesResponse = send_json(request, model).await?;
        let payload = tool_payload(response)?;
        ExtractionResult::from_payload(schema, &payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use radstruct_domain::TemplateNode;
    use serde_json::json;

    fn schema() -> CompiledSchema {
        radstruct_schema::compile(&TemplateNode::from_value(&json!({
            "finding": {"type": "string", "description": "primary finding"}
        })))
    }

    fn provider() -> AnthropicProvider {
        AnthropicProvider::new("test-key", Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn test_request_forces_extraction_tool() {
        let provider = provider();
        let schema = schema();
        let body = serde_json::to_value(provider.build_request("report", &schema, "claude")).unwrap();

        assert_eq!(body["model"], "claude");
        assert_eq!(body["max_tokens"], DEFAULT_MAX_TOKENS);
        assert_eq!(body["tool_choice"], json!({"type": "tool", "name": TOOL_NAME}));
        assert_eq!(body["tools"][0]["name"], TOOL_NAME);
        assert_eq!(body["tools"][0]["input_schema"], schema.to_json_schema());
        assert_eq!(body["messages"], json!([{"role": "user", "content": "report"}]));
    }

    #[test]
    fn test_tool_payload_found() {
        let response: MessagesResponse = serde_json::from_value(json!({
            "content": [
                {"type": "text", "text": "Here you go"},
                {"type": "tool_use", "id": "t1", "name": TOOL_NAME, "input": {"finding": "clear"}}
            ]
        }))
        .unwrap();

        assert_eq!(tool_payload(response).unwrap(), json!({"finding": "clear"}));
    }

    #[test]
    fn test_text_only_reply_is_an_error() {
        let response: MessagesResponse = serde_json::from_value(json!({
            "content": [{"type": "text", "text": "I cannot do that"}]
        }))
        .unwrap();

        let err = tool_payload(response).unwrap_err();
        assert_eq!(err.to_string(), "No structured data returned from Anthropic");
    }

    #[test]
    fn test_with_base_url_trims_slash() {
        let provider = provider().with_base_url("http://localhost:8080/");
        assert_eq!(provider.base_url, "http://localhost:8080");
    }

    #[tokio::test]
    async fn test_unreachable_endpoint() {
        let provider = provider().with_base_url("http://127.0.0.1:9");
        let err = provider.extract("report", &schema(), "claude").await.unwrap_err();
        assert!(matches!(
            err,
            ProviderError::Communication(_) | ProviderError::Timeout
        ));
    }

    #[tokio::test]
    #[ignore] // Requires ANTHROPIC_API_KEY and network access
    async fn test_anthropic_extract_integration() {
        let key = std::env::var("ANTHROPIC_API_KEY").unwrap();
        let provider = AnthropicProvider::new(key, Duration::from_secs(60)).unwrap();
        let result = provider
            .extract(
                "Extract the finding. REPORT: No acute cardiopulmonary process.",
                &schema(),
                "claude-sonnet-4-20250514",
            )
            .await
            .unwrap();
        assert!(result.structured_data.get("finding").is_some());
    }
}
