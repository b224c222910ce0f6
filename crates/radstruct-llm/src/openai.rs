//! OpenAI-compatible Provider Implementation
//!
//! Structured decoding against the Chat Completions API: the compiled schema
//! is sent as a strict `json_schema` response format and the assistant
//! message content is parsed as the payload.
//!
//! The same client serves a local Ollama instance through its
//! OpenAI-compatible `/v1` endpoint.
//!
//! # Examples
//!
//! ```no_run
//! use radstruct_llm::OpenAiProvider;
//! use std::time::Duration;
//!
//! let hosted = OpenAiProvider::new("sk-...", Duration::from_secs(60)).unwrap();
//! let local = OpenAiProvider::ollama("http://localhost:11434", Duration::from_secs(60)).unwrap();
//! ```

use crate::http::{build_client, send_json};
use crate::{ExtractionProvider, ExtractionResult, ProviderError};
use radstruct_schema::{CompiledSchema, SCHEMA_TITLE};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

/// Default OpenAI API base URL
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Default local Ollama endpoint
pub const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";

/// Placeholder credential Ollama accepts
pub const OLLAMA_API_KEY: &str = "ollama";

/// Default sampling temperature
pub const DEFAULT_TEMPERATURE: f32 = 0.1;

/// System message sent ahead of every prompt
pub const SYSTEM_MESSAGE: &str =
    "You are a medical AI assistant specialized in structuring radiology reports.";

/// OpenAI Chat Completions provider (also used for Ollama)
pub struct OpenAiProvider {
    label: &'static str,
    base_url: String,
    api_key: String,
    temperature: f32,
    client: reqwest::Client,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    response_format: ResponseFormat,
    temperature: f32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
    json_schema: JsonSchemaFormat,
}

#[derive(Serialize)]
struct JsonSchemaFormat {
    name: &'static str,
    schema: Value,
    strict: bool,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: AssistantMessage,
}

#[derive(Deserialize)]
struct AssistantMessage {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    refusal: Option<String>,
}

impl OpenAiProvider {
    /// Create a provider against the public OpenAI API
    pub fn new(api_key: impl Into<String>, timeout: Duration) -> Result<Self, ProviderError> {
        Ok(Self {
            label: "openai",
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: api_key.into(),
            temperature: DEFAULT_TEMPERATURE,
            client: build_client(timeout)?,
        })
    }

    /// Create a provider against a local Ollama instance
    ///
    /// `base_url` is the Ollama root (e.g. `http://localhost:11434`); the
    /// OpenAI-compatible `/v1` suffix is appended.
    pub fn ollama(base_url: &str, timeout: Duration) -> Result<Self, ProviderError> {
        let root = base_url.trim_end_matches('/');
        Ok(Self {
            label: "ollama",
            base_url: format!("{}/v1", root),
            api_key: OLLAMA_API_KEY.to_string(),
            temperature: DEFAULT_TEMPERATURE,
            client: build_client(timeout)?,
        })
    }

    /// Point the provider at a different base URL
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Set the sampling temperature
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    fn build_request<'a>(
        &self,
        prompt: &'a str,
        schema: &CompiledSchema,
        model: &'a str,
    ) -> ChatRequest<'a> {
        ChatRequest {
            model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_MESSAGE,
                },
                ChatMessage {
                    role: "user",
                    content: prompt,
                },
            ],
            response_format: ResponseFormat {
                kind: "json_schema",
                json_schema: JsonSchemaFormat {
                    name: SCHEMA_TITLE,
                    schema: schema.to_json_schema(),
                    strict: true,
                },
            },
            temperature: self.temperature,
        }
    }

    fn message_payload(&self, response: ChatResponse) -> Result<Value, ProviderError> {
        let message = response
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message)
            .ok_or_else(|| ProviderError::NoStructuredData(self.label.to_string()))?;

        if let Some(refusal) = message.refusal.filter(|r| !r.trim().is_empty()) {
            return Err(ProviderError::NoStructuredData(format!(
                "{} (refused: {})",
                self.label, refusal
            )));
        }

        match message.content {
            Some(content) if !content.trim().is_empty() => parse_json_payload(&content),
            _ => Err(ProviderError::NoStructuredData(self.label.to_string())),
        }
    }
}

/// Parse message content as JSON, tolerating a markdown code fence
pub(crate) fn parse_json_payload(content: &str) -> Result<Value, ProviderError> {
    let json = strip_code_fence(content);
    serde_json::from_str(json)
        .map_err(|e| ProviderError::InvalidResponse(format!("Content is not valid JSON: {}", e)))
}

fn strip_code_fence(content: &str) -> &str {
    let trimmed = content.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };

    // Drop the language tag line, then the closing fence
    let body = rest.split_once('\n').map_or("", |(_, body)| body);
    body.trim_end().strip_suffix("```").unwrap_or(body).trim()
}

impl ExtractionProvider for OpenAiProvider {
    fn name(&self) -> &'static str {
        self.label
    }

    async fn extract(
        &self,
        prompt: &str,
        schema: &CompiledSchema,
        model: &str,
    ) -> Result<ExtractionResult, ProviderError> {
        let url = format!("{}/chat/completions", self.base_url);
        let body = self.build_request(prompt, schema, model);

        debug!(provider = self.label, model, "Sending structured decoding request");
        let request = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body);

        let response: ChatResponse = send_json(request, model).await?;
        let payload = self.message_payload(response)?;
        ExtractionResult::from_payload(schema, &payload)
    }
}
