//! Radstruct Storage Layer
//!
//! In-memory implementation of the [`ReportStore`] collaborator.
//!
//! All state sits behind one mutex, which makes `claim_report`,
//! `record_outcome` and `reset_report` atomic compare-and-set operations:
//! two units of work can never both claim the same report, and an outcome
//! is only written over a report that is still `processing`.
//! `sync_batch_status` tallies and writes under the same lock, so the stored
//! batch status always reflects the reports as of the latest sync.
//!
//! # Examples
//!
//! ```
//! use radstruct_domain::traits::ReportStore;
//! use radstruct_domain::{Template, TemplateNode};
//! use radstruct_store::MemoryStore;
//!
//! let store = MemoryStore::new();
//! let template = Template::new("Empty", TemplateNode::Object(Vec::new()));
//! store.put_template(template.clone()).unwrap();
//! assert_eq!(store.get_template(template.id).unwrap(), Some(template));
//! ```

#![warn(missing_docs)]

use radstruct_domain::traits::ReportStore;
use radstruct_domain::{
    BatchId, BatchProgress, BatchStatus, ReportBatch, ReportId, ReportStatus, StructuredReport, Template,
    TemplateId,
};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use thiserror::Error;
use tracing::debug;

/// Errors that can occur during storage operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// A record with this id already exists
    #[error("Duplicate id: {0}")]
    Duplicate(String),

    /// Referenced record does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Record cannot be written in its current shape
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// A writer panicked while holding the store lock
    #[error("Store lock poisoned")]
    LockPoisoned,
}

#[derive(Default)]
struct Inner {
    templates: HashMap<TemplateId, Template>,
    batches: HashMap<BatchId, ReportBatch>,
    batch_order: Vec<BatchId>,
    reports: HashMap<ReportId, StructuredReport>,
    batch_reports: HashMap<BatchId, Vec<ReportId>>,
}

/// Mutex-guarded in-memory store
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored reports across all batches
    pub fn report_count(&self) -> Result<usize, StoreError> {
        Ok(self.lock()?.reports.len())
    }

    fn lock(&self) -> Result<MutexGuard<'_, Inner>, StoreError> {
        self.inner.lock().map_err(|_| StoreError::LockPoisoned)
    }
}

impl ReportStore for MemoryStore {
    type Error = StoreError;

    fn put_template(&self, template: Template) -> Result<(), Self::Error> {
        debug!(template_id = %template.id, name = %template.name, "Storing template");
        self.lock()?.templates.insert(template.id, template);
        Ok(())
    }

    fn get_template(&self, id: TemplateId) -> Result<Option<Template>, Self::Error> {
        Ok(self.lock()?.templates.get(&id).cloned())
    }

    fn insert_batch(
        &self,
        batch: ReportBatch,
        reports: Vec<StructuredReport>,
    ) -> Result<(), Self::Error> {
        let mut inner = self.lock()?;

        if inner.batches.contains_key(&batch.id) {
            return Err(StoreError::Duplicate(batch.id.to_string()));
        }
        for report in &reports {
            if report.batch_id != batch.id {
                return Err(StoreError::InvalidData(format!(
                    "report {} belongs to batch {}, not {}",
                    report.id, report.batch_id, batch.id
                )));
            }
            if inner.reports.contains_key(&report.id) {
                return Err(StoreError::Duplicate(report.id.to_string()));
            }
        }

        let ids: Vec<ReportId> = reports.iter().map(|r| r.id).collect();
        for report in reports {
            inner.reports.insert(report.id, report);
        }
        inner.batch_reports.insert(batch.id, ids);
        inner.batch_order.push(batch.id);
        inner.batches.insert(batch.id, batch);
        Ok(())
    }

    fn get_batch(&self, id: BatchId) -> Result<Option<ReportBatch>, Self::Error> {
        Ok(self.lock()?.batches.get(&id).cloned())
    }

    fn list_batches(&self, offset: usize, limit: usize) -> Result<Vec<ReportBatch>, Self::Error> {
        let inner = self.lock()?;
        Ok(inner
            .batch_order
            .iter()
            .skip(offset)
            .take(limit)
            .filter_map(|id| inner.batches.get(id).cloned())
            .collect())
    }

    fn set_batch_status(&self, id: BatchId, status: BatchStatus) -> Result<(), Self::Error> {
        let mut inner = self.lock()?;
        let batch = inner
            .batches
            .get_mut(&id)
            .ok_or_else(|| StoreError::NotFound(format!("batch {}", id)))?;
        batch.status = status;
        Ok(())
    }

    fn sync_batch_status(&self, id: BatchId) -> Result<Option<BatchProgress>, Self::Error> {
        let mut inner = self.lock()?;
        let reports: Vec<StructuredReport> = inner
            .batch_reports
            .get(&id)
            .map(|ids| ids.iter().filter_map(|r| inner.reports.get(r).cloned()).collect())
            .unwrap_or_default();
        let Some(batch) = inner.batches.get_mut(&id) else {
            return Ok(None);
        };

        let progress = BatchProgress::tally(batch.total_reports, &reports);
        let status = progress.status();
        if status != batch.status {
            debug!(batch_id = %id, from = %batch.status, to = %status, "Batch status changed");
            batch.status = status;
        }
        Ok(Some(progress))
    }

    fn get_report(&self, id: ReportId) -> Result<Option<StructuredReport>, Self::Error> {
        Ok(self.lock()?.reports.get(&id).cloned())
    }

    fn reports_for_batch(&self, id: BatchId) -> Result<Vec<StructuredReport>, Self::Error> {
        let inner = self.lock()?;
        let Some(ids) = inner.batch_reports.get(&id) else {
            return Ok(Vec::new());
        };
        Ok(ids
            .iter()
            .filter_map(|report_id| inner.reports.get(report_id).cloned())
            .collect())
    }

    fn claim_report(&self, id: ReportId) -> Result<Option<StructuredReport>, Self::Error> {
        let mut inner = self.lock()?;
        Ok(inner
            .reports
            .get_mut(&id)
            .and_then(|report| report.claim().ok().map(|_| report.clone())))
    }

    fn record_outcome(&self, outcome: &StructuredReport) -> Result<bool, Self::Error> {
        if !outcome.status.is_terminal() {
            return Err(StoreError::InvalidData(format!(
                "report {} outcome must be terminal, got {}",
                outcome.id, outcome.status
            )));
        }

        let mut inner = self.lock()?;
        let stored = inner
            .reports
            .get_mut(&outcome.id)
            .ok_or_else(|| StoreError::NotFound(format!("report {}", outcome.id)))?;

        if stored.status != ReportStatus::Processing {
            return Ok(false);
        }

        // Only outcome fields change; text, label and ownership are immutable
        stored.status = outcome.status;
        stored.structured_data = outcome.structured_data.clone();
        stored.confidence_score = outcome.confidence_score;
        stored.error_message = outcome.error_message.clone();
        Ok(true)
    }

    fn reset_report(&self, id: ReportId) -> Result<Option<StructuredReport>, Self::Error> {
        let mut inner = self.lock()?;
        Ok(inner
            .reports
            .get_mut(&id)
            .and_then(|report| report.reset_for_retry().ok().map(|_| report.clone())))
    }
}
