//! Report module - one free-text report and its extraction outcome
//!
//! Lifecycle: `pending → processing → {completed, failed}`. The terminal
//! states are mutually exclusive and no transition is reversible, except the
//! explicit operator retry that moves a failed report back to pending.

use crate::confidence::ConfidenceScore;
use crate::ids::{BatchId, ReportId, TemplateId};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Processing state of a single report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportStatus {
    /// Created, waiting for a unit of work
    Pending,

    /// Claimed by exactly one unit of work
    Processing,

    /// Structured data extracted
    Completed,

    /// Extraction failed; `error_message` explains why
    Failed,
}

impl ReportStatus {
    /// Get the status name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportStatus::Pending => "pending",
            ReportStatus::Processing => "processing",
            ReportStatus::Completed => "completed",
            ReportStatus::Failed => "failed",
        }
    }

    /// Parse a status from a string
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "pending" => Some(ReportStatus::Pending),
            "processing" => Some(ReportStatus::Processing),
            "completed" => Some(ReportStatus::Completed),
            "failed" => Some(ReportStatus::Failed),
            _ => None,
        }
    }

    /// Whether no further automatic transition can occur
    pub fn is_terminal(&self) -> bool {
        matches!(self, ReportStatus::Completed | ReportStatus::Failed)
    }
}

impl fmt::Display for ReportStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ReportStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("Invalid report status: {}", s))
    }
}

/// Rejected state transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionError {
    /// State the report was in
    pub from: ReportStatus,
    /// State that was requested
    pub to: ReportStatus,
}

impl fmt::Display for TransitionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Invalid report transition: {} -> {}", self.from, self.to)
    }
}

impl std::error::Error for TransitionError {}

/// Raw input for one report of a batch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportInput {
    /// Free-text report body
    pub text: String,

    /// Provenance label (e.g. `chest.json_report_3`)
    pub filename: String,
}

impl ReportInput {
    /// Create a report input
    pub fn new(text: impl Into<String>, filename: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            filename: filename.into(),
        }
    }
}

/// A report and its structuring outcome
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructuredReport {
    /// Unique identifier
    pub id: ReportId,

    /// Owning batch
    pub batch_id: BatchId,

    /// Template used for extraction (denormalized from the batch)
    pub template_id: TemplateId,

    /// Report text exactly as submitted
    pub original_text: String,

    /// Provenance label
    pub filename: String,

    /// Current lifecycle state
    pub status: ReportStatus,

    /// Extracted payload; `None` until completed
    pub structured_data: Option<Value>,

    /// Extraction confidence; `None` until completed
    pub confidence_score: Option<ConfidenceScore>,

    /// Failure cause; set only on failure
    pub error_message: Option<String>,
}

impl StructuredReport {
    /// Create a pending report
    pub fn new(batch_id: BatchId, template_id: TemplateId, input: ReportInput) -> Self {
        Self {
            id: ReportId::new(),
            batch_id,
            template_id,
            original_text: input.text,
            filename: input.filename,
            status: ReportStatus::Pending,
            structured_data: None,
            confidence_score: None,
            error_message: None,
        }
    }

    /// `pending → processing`
    pub fn claim(&mut self) -> Result<(), TransitionError> {
        self.require(ReportStatus::Pending, ReportStatus::Processing)?;
        self.status = ReportStatus::Processing;
        Ok(())
    }

    /// `processing → completed`, recording the payload and confidence
    pub fn complete(
        &mut self,
        structured_data: Value,
        confidence_score: ConfidenceScore,
    ) -> Result<(), TransitionError> {
        self.require(ReportStatus::Processing, ReportStatus::Completed)?;
        self.status = ReportStatus::Completed;
        self.structured_data = Some(structured_data);
        self.confidence_score = Some(confidence_score);
        Ok(())
    }

    /// `processing → failed`, recording only the error message
    pub fn fail(&mut self, error_message: impl Into<String>) -> Result<(), TransitionError> {
        self.require(ReportStatus::Processing, ReportStatus::Failed)?;
        self.status = ReportStatus::Failed;
        self.error_message = Some(error_message.into());
        Ok(())
    }

    /// `failed → pending`; only reachable through an explicit operator retry
    pub fn reset_for_retry(&mut self) -> Result<(), TransitionError> {
        self.require(ReportStatus::Failed, ReportStatus::Pending)?;
        self.status = ReportStatus::Pending;
        self.error_message = None;
        Ok(())
    }

    fn require(&self, expected: ReportStatus, to: ReportStatus) -> Result<(), TransitionError> {
        if self.status == expected {
            Ok(())
        } else {
            Err(TransitionError {
                from: self.status,
                to,
            })
        }
    }
}
