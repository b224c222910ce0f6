//! Provider selection settings

use crate::anthropic;
use crate::openai;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

/// Default model name
pub const DEFAULT_MODEL: &str = "claude-sonnet-4-20250514";

/// Default provider HTTP timeout (seconds)
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 90;

/// Configuration errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Unrecognized provider name
    #[error("Invalid AI provider '{0}'. Must be one of: anthropic, openai, ollama")]
    InvalidProvider(String),

    /// Explicit provider without its credential
    #[error("AI provider '{provider}' requires {variable} to be set")]
    MissingCredential {
        /// Selected provider
        provider: ProviderKind,
        /// Environment variable / setting that is missing
        variable: &'static str,
    },

    /// Invalid value
    #[error("Invalid configuration: {0}")]
    Invalid(String),

    /// Configuration file could not be read or parsed
    #[error("Failed to load configuration: {0}")]
    Load(String),

    /// Provider client could not be constructed
    #[error("Failed to initialize provider: {0}")]
    Client(String),
}

/// Supported AI backends
///
/// Serialized lowercase; parsed case-insensitively from both config files
/// and the environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum ProviderKind {
    /// Anthropic tool-call extraction
    Anthropic,
    /// OpenAI structured decoding
    OpenAi,
    /// Local Ollama via its OpenAI-compatible endpoint
    Ollama,
}

impl ProviderKind {
    /// Lowercase name
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::Anthropic => "anthropic",
            ProviderKind::OpenAi => "openai",
            ProviderKind::Ollama => "ollama",
        }
    }

    /// Credential variable this provider needs, if any
    pub fn credential_variable(&self) -> Option<&'static str> {
        match self {
            ProviderKind::Anthropic => Some("ANTHROPIC_API_KEY"),
            ProviderKind::OpenAi => Some("OPENAI_API_KEY"),
            ProviderKind::Ollama => None,
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "anthropic" => Ok(ProviderKind::Anthropic),
            "openai" => Ok(ProviderKind::OpenAi),
            "ollama" => Ok(ProviderKind::Ollama),
            _ => Err(ConfigError::InvalidProvider(s.to_string())),
        }
    }
}

impl TryFrom<String> for ProviderKind {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Settings that select and configure the AI backend
#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderSettings {
    /// Explicit provider; auto-detected from credentials when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider: Option<ProviderKind>,

    /// Model identifier passed to the provider
    pub model_name: String,

    /// Ollama root URL
    pub ollama_base_url: String,

    /// Anthropic credential
    #[serde(skip_serializing_if = "Option::is_none")]
    pub anthropic_api_key: Option<String>,

    /// OpenAI credential
    #[serde(skip_serializing_if = "Option::is_none")]
    pub openai_api_key: Option<String>,

    /// Anthropic API base URL
    pub anthropic_base_url: String,

    /// OpenAI API base URL
    pub openai_base_url: String,

    /// HTTP timeout for a single provider request (seconds)
    pub request_timeout_secs: u64,

    /// Response token budget (Anthropic)
    pub max_tokens: u32,

    /// Sampling temperature (OpenAI/Ollama)
    pub temperature: f32,
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            provider: None,
            model_name: DEFAULT_MODEL.to_string(),
            ollama_base_url: openai::DEFAULT_OLLAMA_URL.to_string(),
            anthropic_api_key: None,
            openai_api_key: None,
            anthropic_base_url: anthropic::DEFAULT_BASE_URL.to_string(),
            openai_base_url: openai::DEFAULT_BASE_URL.to_string(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            max_tokens: anthropic::DEFAULT_MAX_TOKENS,
            temperature: openai::DEFAULT_TEMPERATURE,
        }
    }
}

impl fmt::Debug for ProviderSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let redact = |key: &Option<String>| key.as_ref().map(|_| "<redacted>");
        f.debug_struct("ProviderSettings")
            .field("provider", &self.provider)
            .field("model_name", &self.model_name)
            .field("ollama_base_url", &self.ollama_base_url)
            .field("anthropic_api_key", &redact(&self.anthropic_api_key))
            .field("openai_api_key", &redact(&self.openai_api_key))
            .field("anthropic_base_url", &self.anthropic_base_url)
            .field("openai_base_url", &self.openai_base_url)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("max_tokens", &self.max_tokens)
            .field("temperature", &self.temperature)
            .finish()
    }
}

impl ProviderSettings {
    /// Apply `AI_PROVIDER`, `AI_MODEL`, `ANTHROPIC_API_KEY`,
    /// `OPENAI_API_KEY` and `OLLAMA_BASE_URL` from the process environment
    pub fn apply_env(&mut self) -> Result<(), ConfigError> {
        self.apply_env_with(|name| std::env::var(name).ok())
    }

    /// Apply overrides from an arbitrary variable lookup
    ///
    /// Empty values are ignored.
    pub fn apply_env_with<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        if let Some(provider) = get("AI_PROVIDER") {
            self.provider = Some(provider.parse()?);
        }
        if let Some(model) = get("AI_MODEL") {
            self.model_name = model;
        }
        if let Some(key) = get("ANTHROPIC_API_KEY") {
            self.anthropic_api_key = Some(key);
        }
        if let Some(key) = get("OPENAI_API_KEY") {
            self.openai_api_key = Some(key);
        }
        if let Some(url) = get("OLLAMA_BASE_URL") {
            self.ollama_base_url = url;
        }
        Ok(())
    }

    /// Backend that will be used
    ///
    /// Explicit provider first, then whichever credential is present
    /// (Anthropic before OpenAI), then Ollama.
    pub fn resolve_kind(&self) -> ProviderKind {
        if let Some(kind) = self.provider {
            return kind;
        }
        if has_value(&self.anthropic_api_key) {
            ProviderKind::Anthropic
        } else if has_value(&self.openai_api_key) {
            ProviderKind::OpenAi
        } else {
            ProviderKind::Ollama
        }
    }

    /// Credential for the given provider, if it needs and has one
    pub fn credential(&self, kind: ProviderKind) -> Option<&str> {
        let key = match kind {
            ProviderKind::Anthropic => &self.anthropic_api_key,
            ProviderKind::OpenAi => &self.openai_api_key,
            ProviderKind::Ollama => return None,
        };
        key.as_deref().filter(|k| !k.trim().is_empty())
    }

    /// Get the request timeout as a Duration
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Validate the settings
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.model_name.trim().is_empty() {
            return Err(ConfigError::Invalid("model_name must not be empty".to_string()));
        }
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "request_timeout_secs must be greater than 0".to_string(),
            ));
        }
        if self.max_tokens == 0 {
            return Err(ConfigError::Invalid("max_tokens must be greater than 0".to_string()));
        }
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(ConfigError::Invalid(
                "temperature must be between 0.0 and 2.0".to_string(),
            ));
        }

        let kind = self.resolve_kind();
        match kind.credential_variable() {
            Some(variable) if self.credential(kind).is_none() => {
                Err(ConfigError::MissingCredential { provider: kind, variable })
            }
            _ => Ok(()),
        }
    }

    /// Load settings from TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        toml::from_str(toml_str).map_err(|e| ConfigError::Load(format!("Failed to parse TOML: {}", e)))
    }

    /// Serialize settings to TOML string
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self)
            .map_err(|e| ConfigError::Load(format!("Failed to serialize to TOML: {}", e)))
    }
}

fn has_value(key: &Option<String>) -> bool {
    key.as_deref().is_some_and(|k| !k.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_defaults() {
        let settings = ProviderSettings::default();
        assert_eq!(settings.model_name, "claude-sonnet-4-20250514");
        assert_eq!(settings.ollama_base_url, "http://localhost:11434");
        assert_eq!(settings.resolve_kind(), ProviderKind::Ollama);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_provider_kind_parse() {
        assert_eq!("Anthropic".parse::<ProviderKind>().unwrap(), ProviderKind::Anthropic);
        assert_eq!("OPENAI".parse::<ProviderKind>().unwrap(), ProviderKind::OpenAi);
        assert_eq!(" ollama ".parse::<ProviderKind>().unwrap(), ProviderKind::Ollama);

        let err = "gemini".parse::<ProviderKind>().unwrap_err();
        assert_eq!(err, ConfigError::InvalidProvider("gemini".to_string()));
    }

    #[test]
    fn test_precedence_anthropic_key_wins() {
        let mut settings = ProviderSettings::default();
        settings
            .apply_env_with(env(&[("ANTHROPIC_API_KEY", "a"), ("OPENAI_API_KEY", "o")]))
            .unwrap();
        assert_eq!(settings.resolve_kind(), ProviderKind::Anthropic);
    }

    #[test]
    fn test_precedence_openai_key() {
        let mut settings = ProviderSettings::default();
        settings.apply_env_with(env(&[("OPENAI_API_KEY", "o")])).unwrap();
        assert_eq!(settings.resolve_kind(), ProviderKind::OpenAi);
    }

    #[test]
    fn test_explicit_provider_beats_keys() {
        let mut settings = ProviderSettings::default();
        settings
            .apply_env_with(env(&[("AI_PROVIDER", "ollama"), ("ANTHROPIC_API_KEY", "a")]))
            .unwrap();
        assert_eq!(settings.resolve_kind(), ProviderKind::Ollama);
    }

    #[test]
    fn test_invalid_env_provider() {
        let mut settings = ProviderSettings::default();
        let err = settings
            .apply_env_with(env(&[("AI_PROVIDER", "bard")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidProvider(_)));
    }

    #[test]
    fn test_empty_env_values_are_ignored() {
        let mut settings = ProviderSettings::default();
        settings
            .apply_env_with(env(&[("AI_PROVIDER", ""), ("AI_MODEL", " ")]))
            .unwrap();
        assert_eq!(settings.provider, None);
        assert_eq!(settings.model_name, DEFAULT_MODEL);
    }

    #[test]
    fn test_explicit_provider_missing_credential() {
        let settings = ProviderSettings {
            provider: Some(ProviderKind::OpenAi),
            ..Default::default()
        };
        let err = settings.validate().unwrap_err();
        assert_eq!(
            err.to_string(),
            "AI provider 'openai' requires OPENAI_API_KEY to be set"
        );
    }

    #[test]
    fn test_invalid_values() {
        let mut settings = ProviderSettings::default();
        settings.request_timeout_secs = 0;
        assert!(settings.validate().is_err());

        let mut settings = ProviderSettings::default();
        settings.temperature = 3.5;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_debug_redacts_keys() {
        let settings = ProviderSettings {
            anthropic_api_key: Some("sk-ant-secret".to_string()),
            ..Default::default()
        };
        let rendered = format!("{:?}", settings);
        assert!(!rendered.contains("sk-ant-secret"));
        assert!(rendered.contains("<redacted>"));
    }

    #[test]
    fn test_toml_roundtrip() {
        let toml = r#"
            provider = "openai"
            model_name = "gpt-4o"
            openai_api_key = "sk-test"
        "#;
        let settings = ProviderSettings::from_toml(toml).unwrap();
        assert_eq!(settings.resolve_kind(), ProviderKind::OpenAi);
        assert_eq!(settings.request_timeout_secs, DEFAULT_REQUEST_TIMEOUT_SECS);

        let reparsed = ProviderSettings::from_toml(&settings.to_toml().unwrap()).unwrap();
        assert_eq!(reparsed, settings);
    }

    #[test]
    fn test_toml_provider_is_case_insensitive() {
        let settings = ProviderSettings::from_toml("provider = \"Anthropic\"").unwrap();
        assert_eq!(settings.provider, Some(ProviderKind::Anthropic));

        let settings = ProviderSettings::from_toml("provider = \"OLLAMA\"").unwrap();
        assert_eq!(settings.provider, Some(ProviderKind::Ollama));
        assert!(settings.to_toml().unwrap().contains("provider = \"ollama\""));
    }

    #[test]
    fn test_invalid_toml_provider() {
        assert!(ProviderSettings::from_toml("provider = \"bard\"").is_err());
    }
}
