//! The provider selected for this process

use crate::settings::{ConfigError, ProviderKind, ProviderSettings};
use crate::{AnthropicProvider, ExtractionProvider, ExtractionResult, OpenAiProvider, ProviderError};
use radstruct_schema::CompiledSchema;
use tracing::info;

/// A concrete backend chosen from [`ProviderSettings`]
///
/// Built once at startup and shared by every unit of work.
pub enum ResolvedProvider {
    /// Anthropic tool-call backend
    Anthropic(AnthropicProvider),
    /// OpenAI or Ollama structured decoding backend
    OpenAi(OpenAiProvider),
}

impl ResolvedProvider {
    /// Validate settings and construct the selected backend
    pub fn from_settings(settings: &ProviderSettings) -> Result<Self, ConfigError> {
        settings.validate()?;

        let kind = settings.resolve_kind();
        let timeout = settings.request_timeout();
        let missing = |variable| ConfigError::MissingCredential { provider: kind, variable };
        let client_error = |e: ProviderError| ConfigError::Client(e.to_string());

        let provider = match kind {
            ProviderKind::Anthropic => {
                let key = settings
                    .credential(kind)
                    .ok_or_else(|| missing("ANTHROPIC_API_KEY"))?;
                let provider = AnthropicProvider::new(key, timeout)
                    .map_err(client_error)?
                    .with_base_url(settings.anthropic_base_url.as_str())
                    .with_max_tokens(settings.max_tokens);
                ResolvedProvider::Anthropic(provider)
            }
            ProviderKind::OpenAi => {
                let key = settings
                    .credential(kind)
                    .ok_or_else(|| missing("OPENAI_API_KEY"))?;
                let provider = OpenAiProvider::new(key, timeout)
                    .map_err(client_error)?
                    .with_base_url(settings.openai_base_url.as_str())
                    .with_temperature(settings.temperature);
                ResolvedProvider::OpenAi(provider)
            }
            ProviderKind::Ollama => {
                let provider = OpenAiProvider::ollama(&settings.ollama_base_url, timeout)
                    .map_err(client_error)?
                    .with_temperature(settings.temperature);
                ResolvedProvider::OpenAi(provider)
            }
        };

        info!(
            provider = kind.as_str(),
            model = %settings.model_name,
            "Resolved AI provider"
        );
        Ok(provider)
    }

    /// Which backend this is
    pub fn kind(&self) -> ProviderKind {
        match self {
            ResolvedProvider::Anthropic(_) => ProviderKind::Anthropic,
            ResolvedProvider::OpenAi(p) if p.name() == "ollama" => ProviderKind::Ollama,
            ResolvedProvider::OpenAi(_) => ProviderKind::OpenAi,
        }
    }
}

impl ExtractionProvider for ResolvedProvider {
    fn name(&self) -> &'static str {
        match self {
            ResolvedProvider::Anthropic(p) => p.name(),
            ResolvedProvider::OpenAi(p) => p.name(),
        }
    }

    async fn extract(
        &self,
        prompt: &str,
        schema: &CompiledSchema,
        model: &str,
    ) -> Result<ExtractionResult, ProviderError> {
        match self {
            ResolvedProvider::Anthropic(p) => p.extract(prompt, schema, model).await,
            ResolvedProvider::OpenAi(p) => p.extract(prompt, schema, model).await,
        }
    }
}
