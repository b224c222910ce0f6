//! Deterministic mock provider for testing

use crate::{ExtractionProvider, ExtractionResult, ProviderError};
use radstruct_schema::CompiledSchema;
use serde_json::Value;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

#[derive(Debug, Clone)]
enum MockReply {
    Payload(Value),
    Error(String),
}

/// Mock provider for deterministic testing
///
/// Replies are matched by prompt substring in insertion order; prompts that
/// match nothing get the default payload. Every reply still goes through
/// schema conformance, so a scripted payload can trigger a schema violation.
/// Clones share scripted replies and the call counter.
///
/// # Examples
///
/// ```
/// use radstruct_llm::MockProvider;
/// use serde_json::json;
///
/// let provider = MockProvider::new(json!({"finding": "normal"}));
/// provider.add_error("corrupted", "upstream exploded");
/// assert_eq!(provider.call_count(), 0);
/// ```
#[derive(Debug, Clone)]
pub struct MockProvider {
    default_payload: Value,
    replies: Arc<Mutex<Vec<(String, MockReply)>>>,
    call_count: Arc<AtomicUsize>,
    delay: Option<Duration>,
}

impl MockProvider {
    /// Create a mock that answers every prompt with `payload`
    pub fn new(payload: Value) -> Self {
        Self {
            default_payload: payload,
            replies: Arc::new(Mutex::new(Vec::new())),
            call_count: Arc::new(AtomicUsize::new(0)),
            delay: None,
        }
    }

    /// Answer prompts containing `needle` with `payload`
    pub fn add_response(&self, needle: impl Into<String>, payload: Value) {
        self.push(needle.into(), MockReply::Payload(payload));
    }

    /// Fail prompts containing `needle` with a communication error
    pub fn add_error(&self, needle: impl Into<String>, message: impl Into<String>) {
        self.push(needle.into(), MockReply::Error(message.into()));
    }

    /// Sleep before answering (for timeout and concurrency tests)
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Number of extraction calls so far
    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }

    /// Reset the call counter
    pub fn reset_call_count(&self) {
        self.call_count.store(0, Ordering::SeqCst);
    }

    fn push(&self, needle: String, reply: MockReply) {
        self.replies
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((needle, reply));
    }

    fn reply_for(&self, prompt: &str) -> MockReply {
        self.replies
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .find(|(needle, _)| prompt.contains(needle.as_str()))
            .map(|(_, reply)| reply.clone())
            .unwrap_or_else(|| MockReply::Payload(self.default_payload.clone()))
    }
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new(Value::Object(Default::default()))
    }
}

impl ExtractionProvider for MockProvider {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn extract(
        &self,
        prompt: &str,
        schema: &CompiledSchema,
        _model: &str,
    ) -> Result<ExtractionResult, ProviderError> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        let reply = self.reply_for(prompt);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        match reply {
            MockReply::Payload(payload) => ExtractionResult::from_payload(schema, &payload),
            MockReply::Error(message) => Err(ProviderError::Communication(message)),
        }
    }
}
