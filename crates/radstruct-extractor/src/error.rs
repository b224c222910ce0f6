//! Error types for the Extractor

use radstruct_llm::ProviderError;
use thiserror::Error;

/// Errors that can occur while structuring one report
///
/// The lifecycle layer records these verbatim (via `Display`) as the
/// report's error message.
#[derive(Error, Debug)]
pub enum ExtractionError {
    /// Report text is empty or whitespace
    #[error("Report text is empty")]
    EmptyText,

    /// Report text exceeds maximum length
    #[error("Text too long: {0} chars (max: {1})")]
    TextTooLong(usize, usize),

    /// Provider call failed
    #[error("AI processing failed: {0}")]
    Provider(#[from] ProviderError),

    /// Provider call exceeded the extraction timeout
    #[error("AI processing failed: timed out after {0}s")]
    Timeout(u64),
}
