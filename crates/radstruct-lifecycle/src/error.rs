//! Error types for lifecycle operations

use radstruct_domain::{BatchId, ReportId, ReportStatus, TemplateId, TransitionError};
use thiserror::Error;

/// Errors that can occur during lifecycle operations
///
/// Extraction failures are not errors at this level: they are recorded on
/// the report. Only bookkeeping problems surface here.
#[derive(Error, Debug)]
pub enum LifecycleError {
    /// Template id not present in the store
    #[error("Template not found: {0}")]
    UnknownTemplate(TemplateId),

    /// Batch id not present in the store
    #[error("Batch not found: {0}")]
    UnknownBatch(BatchId),

    /// Report id not present in the store
    #[error("Report not found: {0}")]
    UnknownReport(ReportId),

    /// Batch submitted without reports
    #[error("No reports found")]
    EmptyBatch,

    /// Batch exceeds the configured size limit
    #[error("Batch too large: {0} reports (max: {1})")]
    BatchTooLarge(usize, usize),

    /// Retry requested for a report that has not failed
    #[error("Report {id} cannot be retried from status '{status}'")]
    NotRetryable {
        /// Report id
        id: ReportId,
        /// Its current status
        status: ReportStatus,
    },

    /// Illegal state transition
    #[error("Invalid transition: {0}")]
    Transition(#[from] TransitionError),

    /// Storage layer error
    #[error("Storage error: {0}")]
    Store(String),

    /// Dispatcher could not be started
    #[error("Worker error: {0}")]
    Worker(String),
}

/// Convert any store error into a `LifecycleError`
pub(crate) fn store_error<E: std::fmt::Display>(error: E) -> LifecycleError {
    LifecycleError::Store(error.to_string())
}
