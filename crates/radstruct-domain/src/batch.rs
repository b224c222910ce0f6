//! Batch module - reports submitted together against one template
//!
//! A batch's status is never trusted as independently mutable state: it is
//! folded from the current report states against the `total_reports` count
//! fixed at creation.

use crate::ids::{BatchId, TemplateId};
use crate::report::{ReportStatus, StructuredReport};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Aggregate status of a batch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchStatus {
    /// No report has left `pending`
    Pending,
    /// Some reports are still pending or processing
    Processing,
    /// Every report completed
    Completed,
    /// All reports terminal, at least one completed and one failed
    PartiallyFailed,
    /// All reports terminal, none completed
    Failed,
}

impl BatchStatus {
    /// Get the status name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            BatchStatus::Pending => "pending",
            BatchStatus::Processing => "processing",
            BatchStatus::Completed => "completed",
            BatchStatus::PartiallyFailed => "partially_failed",
            BatchStatus::Failed => "failed",
        }
    }

    /// Whether every report of the batch has reached a terminal state
    pub fn is_finished(&self) -> bool {
        matches!(
            self,
            BatchStatus::Completed | BatchStatus::PartiallyFailed | BatchStatus::Failed
        )
    }

    /// Fold report counts into a batch status
    pub fn derive(progress: &BatchProgress) -> Self {
        if progress.total == 0 {
            return BatchStatus::Pending;
        }

        if progress.terminal() == progress.total {
            return match (progress.completed, progress.failed) {
                (_, 0) => BatchStatus::Completed,
                (0, _) => BatchStatus::Failed,
                _ => BatchStatus::PartiallyFailed,
            };
        }

        if progress.processing == 0 && progress.terminal() == 0 {
            BatchStatus::Pending
        } else {
            BatchStatus::Processing
        }
    }
}

impl fmt::Display for BatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-state report counts of a batch
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchProgress {
    /// `total_reports` fixed at batch creation
    pub total: usize,
    /// Reports not yet claimed
    pub pending: usize,
    /// Reports currently being processed
    pub processing: usize,
    /// Reports completed
    pub completed: usize,
    /// Reports failed
    pub failed: usize,
}

impl BatchProgress {
    /// Count report states against the batch's fixed total.
    ///
    /// `pending` is whatever remains of `total` once the other states are
    /// counted, so a missing report row reads as pending rather than shrinking
    /// the batch.
    pub fn tally(total_reports: usize, reports: &[StructuredReport]) -> Self {
        let mut progress = BatchProgress {
            total: total_reports,
            ..Default::default()
        };

        for report in reports {
            match report.status {
                ReportStatus::Pending => {}
                ReportStatus::Processing => progress.processing += 1,
                ReportStatus::Completed => progress.completed += 1,
                ReportStatus::Failed => progress.failed += 1,
            }
        }

        progress.pending = total_reports
            .saturating_sub(progress.processing + progress.completed + progress.failed);
        progress
    }

    /// Reports in a terminal state
    pub fn terminal(&self) -> usize {
        self.completed + self.failed
    }

    /// Derived batch status
    pub fn status(&self) -> BatchStatus {
        BatchStatus::derive(self)
    }
}

/// A batch of reports sharing one template
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportBatch {
    /// Unique identifier
    pub id: BatchId,

    /// Display name
    pub name: String,

    /// Template every report is structured against
    pub template_id: TemplateId,

    /// Number of reports at creation; never recomputed
    pub total_reports: usize,

    /// Last derived status
    pub status: BatchStatus,

    /// Creation time (seconds since Unix epoch)
    pub created_at: u64,
}

impl ReportBatch {
    /// Create a pending batch
    pub fn new(name: impl Into<String>, template_id: TemplateId, total_reports: usize) -> Self {
        Self {
            id: BatchId::new(),
            name: name.into(),
            template_id,
            total_reports,
            status: BatchStatus::Pending,
            created_at: crate::unix_now(),
        }
    }
}
