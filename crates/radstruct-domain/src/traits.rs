//! Trait definitions for external collaborators
//!
//! These traits define the boundaries between the structuring core and the
//! infrastructure around it. Implementations live in other crates.

use crate::{
    BatchId, BatchProgress, BatchStatus, ReportBatch, ReportId, StructuredReport, Template,
    TemplateId,
};

/// Storage collaborator for templates, batches and reports
///
/// Implemented by the infrastructure layer (radstruct-store). Methods take
/// `&self` because units of work share one store concurrently.
pub trait ReportStore: Send + Sync {
    /// Error type for store operations
    type Error;

    /// Store or replace a template
    fn put_template(&self, template: Template) -> Result<(), Self::Error>;

    /// Get a template by ID
    fn get_template(&self, id: TemplateId) -> Result<Option<Template>, Self::Error>;

    /// Insert a new batch together with all of its pending reports
    fn insert_batch(
        &self,
        batch: ReportBatch,
        reports: Vec<StructuredReport>,
    ) -> Result<(), Self::Error>;

    /// Get a batch by ID
    fn get_batch(&self, id: BatchId) -> Result<Option<ReportBatch>, Self::Error>;

    /// List batches in creation order
    fn list_batches(&self, offset: usize, limit: usize) -> Result<Vec<ReportBatch>, Self::Error>;

    /// Persist a batch's derived status
    fn set_batch_status(&self, id: BatchId, status: BatchStatus) -> Result<(), Self::Error>;

    /// Recompute a batch's progress from its reports and persist the derived
    /// status.
    ///
    /// Returns `None` for an unknown batch. The default reads and writes in
    /// separate steps; stores shared between units of work should override it
    /// so the tally and the write happen under one lock, otherwise a stale
    /// tally can overwrite a newer status.
    fn sync_batch_status(&self, id: BatchId) -> Result<Option<BatchProgress>, Self::Error> {
        let Some(batch) = self.get_batch(id)? else {
            return Ok(None);
        };
        let reports = self.reports_for_batch(id)?;
        let progress = BatchProgress::tally(batch.total_reports, &reports);
        if progress.status() != batch.status {
            self.set_batch_status(id, progress.status())?;
        }
        Ok(Some(progress))
    }

    /// Get a report by ID
    fn get_report(&self, id: ReportId) -> Result<Option<StructuredReport>, Self::Error>;

    /// All reports belonging to a batch
    fn reports_for_batch(&self, id: BatchId) -> Result<Vec<StructuredReport>, Self::Error>;

    /// Atomically move a report from `pending` to `processing`.
    ///
    /// Returns the claimed report, or `None` when the report does not exist or
    /// is not pending.
    fn claim_report(&self, id: ReportId) -> Result<Option<StructuredReport>, Self::Error>;

    /// Write a terminal outcome for a report that is currently `processing`.
    ///
    /// Returns `false` (and writes nothing) if the stored report is not in
    /// `processing`.
    fn record_outcome(&self, report: &StructuredReport) -> Result<bool, Self::Error>;

    /// Atomically move a report from `failed` back to `pending`.
    ///
    /// Returns the reset report, or `None` when the report does not exist or
    /// has not failed.
    fn reset_report(&self, id: ReportId) -> Result<Option<StructuredReport>, Self::Error>;
}

/// Dispatch primitive that schedules "process report X" as an independent
/// unit of work
///
/// Implementations guarantee at most one active unit of work per report id
/// and make no promise about ordering across reports.
pub trait Dispatcher {
    /// Schedule processing of one report
    fn dispatch(&self, report_id: ReportId);
}
