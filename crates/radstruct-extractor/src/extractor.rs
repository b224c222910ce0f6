//! Core Extractor implementation

use crate::config::ExtractorConfig;
use crate::error::ExtractionError;
use crate::prompt::PromptBuilder;
use radstruct_domain::Template;
use radstruct_llm::{ExtractionProvider, ExtractionResult, DEFAULT_MODEL};
use radstruct_schema::{CompiledSchema, SchemaCache};
use std::sync::Arc;
use std::time::Instant;
use tokio::time::timeout;
use tracing::{debug, info};

/// Structures individual reports against templates
///
/// Cheap to share: the provider and the schema cache are reference-counted,
/// so one extractor serves every concurrent unit of work.
pub struct Extractor<P: ExtractionProvider> {
    provider: Arc<P>,
    schemas: Arc<SchemaCache>,
    config: ExtractorConfig,
    model_name: String,
}

impl<P: ExtractionProvider> Extractor<P> {
    /// Create a new Extractor with an empty schema cache
    pub fn new(provider: Arc<P>, config: ExtractorConfig) -> Self {
        Self {
            provider,
            schemas: Arc::new(SchemaCache::new()),
            config,
            model_name: DEFAULT_MODEL.to_string(),
        }
    }

    /// Use a specific model name
    pub fn with_model_name(mut self, model_name: impl Into<String>) -> Self {
        self.model_name = model_name.into();
        self
    }

    /// Share an existing schema cache
    pub fn with_schema_cache(mut self, schemas: Arc<SchemaCache>) -> Self {
        self.schemas = schemas;
        self
    }

    /// The underlying provider
    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// The schema cache
    pub fn schema_cache(&self) -> &Arc<SchemaCache> {
        &self.schemas
    }

    /// Model name passed to the provider
    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    /// Active configuration
    pub fn config(&self) -> &ExtractorConfig {
        &self.config
    }

    /// Compiled schema for a template (cached by id)
    pub fn schema_for(&self, template: &Template) -> Arc<CompiledSchema> {
        self.schemas.get_or_compile(template)
    }

    /// Structure one report against a template
    ///
    /// Returns the provider's result unchanged; every failure is an
    /// [`ExtractionError`].
    pub async fn structure_report(
        &self,
        report_text: &str,
        template: &Template,
    ) -> Result<ExtractionResult, ExtractionError> {
        if report_text.trim().is_empty() {
            return Err(ExtractionError::EmptyText);
        }
        let length = report_text.chars().count();
        if length > self.config.max_text_length {
            return Err(ExtractionError::TextTooLong(length, self.config.max_text_length));
        }

        let start = Instant::now();
        let schema = self.schema_for(template);
        let prompt = PromptBuilder::new(report_text, &template.structure).build();

        debug!(
            template_id = %template.id,
            provider = self.provider.name(),
            prompt_len = prompt.len(),
            "Calling provider"
        );

        let result = timeout(
            self.config.extraction_timeout(),
            self.provider.extract(&prompt, &schema, &self.model_name),
        )
        .await
        .map_err(|_| ExtractionError::Timeout(self.config.extraction_timeout_secs))??;

        info!(
            template_id = %template.id,
            provider = self.provider.name(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Report structured"
        );
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use radstruct_domain::TemplateNode;
    use radstruct_llm::MockProvider;
    use serde_json::json;
    use std::time::Duration;

    fn template() -> Template {
        Template::new(
            "Chest X-ray",
            TemplateNode::from_value(&json!({
                "finding": {"type": "string", "description": "primary finding"}
            })),
        )
    }

    fn extractor(provider: MockProvider, config: ExtractorConfig) -> Extractor<MockProvider> {
        Extractor::new(Arc::new(provider), config).with_model_name("mock-model")
    }

    #[test]
    fn test_rejects_empty_text() {
        let provider = MockProvider::default();
        let extractor = extractor(provider.clone(), ExtractorConfig::default());

        let result = tokio_test::block_on(extractor.structure_report("   \n", &template()));
        assert!(matches!(result, Err(ExtractionError::EmptyText)));
        assert_eq!(provider.call_count(), 0);
    }

    #[tokio::test]
    async fn test_rejects_oversized_text() {
        let config = ExtractorConfig {
            max_text_length: 10,
            ..Default::default()
        };
        let extractor = extractor(MockProvider::default(), config);

        let err = extractor
            .structure_report("this report is far too long", &template())
            .await
            .unwrap_err();
        assert!(matches!(err, ExtractionError::TextTooLong(27, 10)));
    }

    #[tokio::test]
    async fn test_caches_schema_per_template() {
        let extractor = extractor(MockProvider::default(), ExtractorConfig::default());
        let template = template();

        extractor.structure_report("a", &template).await.unwrap();
        extractor.structure_report("b", &template).await.unwrap();
        assert_eq!(extractor.schema_cache().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_provider_timeout() {
        let provider = MockProvider::default().with_delay(Duration::from_secs(10));
        let config = ExtractorConfig {
            extraction_timeout_secs: 1,
            ..Default::default()
        };
        let extractor = extractor(provider, config);

        let err = extractor.structure_report("report", &template()).await.unwrap_err();
        assert!(matches!(err, ExtractionError::Timeout(1)));
    }

    #[tokio::test]
    async fn test_provider_error_is_wrapped() {
        let provider = MockProvider::default();
        provider.add_error("corrupted", "connection reset");
        let extractor = extractor(provider, ExtractorConfig::default());

        let err = extractor
            .structure_report("corrupted upload", &template())
            .await
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "AI processing failed: Communication error: connection reset"
        );
    }
}
