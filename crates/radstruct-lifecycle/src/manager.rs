//! Report and batch lifecycle management

use crate::config::LifecycleConfig;
use crate::error::{store_error, LifecycleError};
use crate::metrics::LifecycleMetrics;
use radstruct_domain::traits::{Dispatcher, ReportStore};
use radstruct_domain::{
    BatchId, BatchProgress, BatchStatus, ReportBatch, ReportId, ReportInput, StructuredReport,
    Template, TemplateId,
};
use radstruct_extractor::Extractor;
use radstruct_llm::ExtractionProvider;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;
use tracing::{debug, error, info, warn};

/// Ids assigned to a newly created batch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchReceipt {
    /// The batch
    pub batch_id: BatchId,
    /// Its reports, in input order
    pub report_ids: Vec<ReportId>,
}

/// What one delivery of "process report X" did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessOutcome {
    /// Report unknown or not pending; nothing changed
    Skipped,
    /// Report reached `completed`
    Completed,
    /// Report reached `failed` with this message
    Failed(String),
}

/// Owns the report state machine and the derived batch status
///
/// Shared (`Arc`) between the caller that creates batches and the
/// dispatcher tasks that process reports.
pub struct LifecycleManager<S, P>
where
    S: ReportStore,
    P: ExtractionProvider,
{
    store: Arc<S>,
    extractor: Extractor<P>,
    config: LifecycleConfig,
    metrics: Mutex<LifecycleMetrics>,
}

impl<S, P> LifecycleManager<S, P>
where
    S: ReportStore,
    S::Error: std::fmt::Display,
    P: ExtractionProvider,
{
    /// Create a new manager
    pub fn new(store: Arc<S>, extractor: Extractor<P>, config: LifecycleConfig) -> Self {
        Self {
            store,
            extractor,
            config,
            metrics: Mutex::new(LifecycleMetrics::new()),
        }
    }

    /// The storage collaborator
    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// The extraction orchestrator
    pub fn extractor(&self) -> &Extractor<P> {
        &self.extractor
    }

    /// Active configuration
    pub fn config(&self) -> &LifecycleConfig {
        &self.config
    }

    /// Snapshot of the processing metrics
    pub fn metrics(&self) -> LifecycleMetrics {
        self.metrics.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    fn with_metrics(&self, update: impl FnOnce(&mut LifecycleMetrics)) {
        let mut metrics = self.metrics.lock().unwrap_or_else(PoisonError::into_inner);
        update(&mut *metrics);
    }

    /// Store a template so batches can reference it
    pub fn register_template(&self, template: Template) -> Result<TemplateId, LifecycleError> {
        let id = template.id;
        self.store.put_template(template).map_err(store_error)?;
        Ok(id)
    }

    /// Create a batch with one pending report per input
    pub fn create_batch(
        &self,
        name: impl Into<String>,
        template_id: TemplateId,
        inputs: Vec<ReportInput>,
    ) -> Result<BatchReceipt, LifecycleError> {
        if inputs.is_empty() {
            return Err(LifecycleError::EmptyBatch);
        }
        if inputs.len() > self.config.max_batch_size {
            return Err(LifecycleError::BatchTooLarge(
                inputs.len(),
                self.config.max_batch_size,
            ));
        }
        if self.store.get_template(template_id).map_err(store_error)?.is_none() {
            return Err(LifecycleError::UnknownTemplate(template_id));
        }

        let batch = ReportBatch::new(name, template_id, inputs.len());
        let reports: Vec<StructuredReport> = inputs
            .into_iter()
            .map(|input| StructuredReport::new(batch.id, template_id, input))
            .collect();

        let receipt = BatchReceipt {
            batch_id: batch.id,
            report_ids: reports.iter().map(|r| r.id).collect(),
        };

        info!(
            batch_id = %batch.id,
            template_id = %template_id,
            total_reports = batch.total_reports,
            "Batch created"
        );
        self.store.insert_batch(batch, reports).map_err(store_error)?;
        Ok(receipt)
    }

    /// Create a batch and dispatch every report
    pub fn submit_batch<D>(
        &self,
        name: impl Into<String>,
        template_id: TemplateId,
        inputs: Vec<ReportInput>,
        dispatcher: &D,
    ) -> Result<BatchReceipt, LifecycleError>
    where
        D: Dispatcher + ?Sized,
    {
        let receipt = self.create_batch(name, template_id, inputs)?;
        for id in &receipt.report_ids {
            dispatcher.dispatch(*id);
        }
        Ok(receipt)
    }

    /// Process one report: the single dispatch entry point
    ///
    /// Safe to deliver more than once; only the delivery that claims the
    /// pending report does any work. Extraction failures are recorded on
    /// the report, not returned.
    pub async fn process_report(&self, report_id: ReportId) -> Result<ProcessOutcome, LifecycleError> {
        let claimed = self.store.claim_report(report_id).map_err(store_error)?;
        let Some(mut report) = claimed else {
            debug!(report_id = %report_id, "Report not pending, skipping delivery");
            self.with_metrics(LifecycleMetrics::record_skipped);
            return Ok(ProcessOutcome::Skipped);
        };

        let start = Instant::now();
        let batch_id = report.batch_id;
        debug!(report_id = %report_id, batch_id = %batch_id, "Processing report");
        // The report is ours from here on: it must reach a terminal state
        self.refresh_batch_logged(batch_id);

        let extraction = match self.store.get_template(report.template_id) {
            Ok(Some(template)) => self
                .extractor
                .structure_report(&report.original_text, &template)
                .await
                .map_err(|e| e.to_string()),
            Ok(None) => Err(format!("Template not found: {}", report.template_id)),
            Err(e) => Err(format!("Template lookup failed: {}", e)),
        };

        let outcome = match extraction {
            Ok(result) => {
                report.complete(result.structured_data, result.confidence_score)?;
                ProcessOutcome::Completed
            }
            Err(message) => {
                warn!(
                    report_id = %report_id,
                    batch_id = %batch_id,
                    filename = %report.filename,
                    "Report failed: {}",
                    message
                );
                report.fail(message.clone())?;
                ProcessOutcome::Failed(message)
            }
        };

        if !self.store.record_outcome(&report).map_err(store_error)? {
            warn!(report_id = %report_id, "Report left processing concurrently, outcome discarded");
            return Ok(ProcessOutcome::Skipped);
        }

        let elapsed_ms = start.elapsed().as_millis() as u64;
        self.with_metrics(|m| match &outcome {
            ProcessOutcome::Completed => m.record_completed(elapsed_ms),
            _ => m.record_failed(elapsed_ms),
        });

        let status = self.refresh_batch_logged(batch_id);
        info!(
            report_id = %report_id,
            batch_id = %batch_id,
            provider = self.extractor.provider().name(),
            elapsed_ms,
            batch_status = ?status,
            "Report {}",
            report.status
        );
        Ok(outcome)
    }

    /// Per-status counts for a batch, recomputed from its reports
    ///
    /// The derived status is written back to the batch record in the same
    /// store operation as the tally.
    pub fn batch_progress(&self, batch_id: BatchId) -> Result<BatchProgress, LifecycleError> {
        self.store
            .sync_batch_status(batch_id)
            .map_err(store_error)?
            .ok_or(LifecycleError::UnknownBatch(batch_id))
    }

    /// Current derived status of a batch
    pub fn batch_status(&self, batch_id: BatchId) -> Result<BatchStatus, LifecycleError> {
        self.batch_progress(batch_id).map(|progress| progress.status())
    }

    /// Batch bookkeeping that must not abort a claimed report
    fn refresh_batch_logged(&self, batch_id: BatchId) -> Option<BatchStatus> {
        match self.batch_status(batch_id) {
            Ok(status) => Some(status),
            Err(e) => {
                error!(batch_id = %batch_id, "Batch status refresh failed: {}", e);
                None
            }
        }
    }

    /// Move a failed report back to pending and dispatch it again
    ///
    /// Only ever triggered by an operator; failures are never retried
    /// automatically.
    pub fn retry_report<D>(&self, report_id: ReportId, dispatcher: &D) -> Result<(), LifecycleError>
    where
        D: Dispatcher + ?Sized,
    {
        let Some(report) = self.store.reset_report(report_id).map_err(store_error)? else {
            return match self.store.get_report(report_id).map_err(store_error)? {
                Some(report) => Err(LifecycleError::NotRetryable {
                    id: report_id,
                    status: report.status,
                }),
                None => Err(LifecycleError::UnknownReport(report_id)),
            };
        };

        info!(report_id = %report_id, batch_id = %report.batch_id, "Retrying report");
        self.with_metrics(LifecycleMetrics::record_retry);
        self.batch_status(report.batch_id)?;
        dispatcher.dispatch(report_id);
        Ok(())
    }

    /// Get a batch by id, with its status synced to the current reports
    pub fn get_batch(&self, batch_id: BatchId) -> Result<ReportBatch, LifecycleError> {
        self.batch_progress(batch_id)?;
        self.store
            .get_batch(batch_id)
            .map_err(store_error)?
            .ok_or(LifecycleError::UnknownBatch(batch_id))
    }

    /// List batches in creation order
    pub fn list_batches(&self, offset: usize, limit: usize) -> Result<Vec<ReportBatch>, LifecycleError> {
        self.store.list_batches(offset, limit).map_err(store_error)
    }

    /// Get a report by id
    pub fn get_report(&self, report_id: ReportId) -> Result<StructuredReport, LifecycleError> {
        self.store
            .get_report(report_id)
            .map_err(store_error)?
            .ok_or(LifecycleError::UnknownReport(report_id))
    }

    /// All reports of a batch, in input order
    pub fn reports_for_batch(&self, batch_id: BatchId) -> Result<Vec<StructuredReport>, LifecycleError> {
        self.get_batch(batch_id)?;
        self.store.reports_for_batch(batch_id).map_err(store_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use radstruct_domain::{ReportStatus, TemplateNode};
    use radstruct_extractor::ExtractorConfig;
    use radstruct_llm::MockProvider;
    use radstruct_store::MemoryStore;
    use serde_json::json;
    use std::cell::RefCell;

    /// Records dispatches without running anything
    #[derive(Default)]
    struct RecordingDispatcher {
        dispatched: RefCell<Vec<ReportId>>,
    }

    impl Dispatcher for RecordingDispatcher {
        fn dispatch(&self, report_id: ReportId) {
            self.dispatched.borrow_mut().push(report_id);
        }
    }

    fn manager(provider: MockProvider) -> (LifecycleManager<MemoryStore, MockProvider>, TemplateId) {
        let extractor = Extractor::new(Arc::new(provider), ExtractorConfig::default());
        let manager = LifecycleManager::new(
            Arc::new(MemoryStore::new()),
            extractor,
            LifecycleConfig::default(),
        );
        let template_id = manager
            .register_template(Template::new(
                "Chest X-ray",
                TemplateNode::from_value(&json!({
                    "finding": {"type": "string", "description": "primary finding"}
                })),
            ))
            .unwrap();
        (manager, template_id)
    }

    fn inputs(texts: &[&str]) -> Vec<ReportInput> {
        texts
            .iter()
            .enumerate()
            .map(|(i, text)| ReportInput::new(*text, format!("upload.json_report_{}", i + 1)))
            .collect()
    }

    #[test]
    fn test_create_batch() {
        let (manager, template_id) = manager(MockProvider::default());
        let receipt = manager
            .create_batch("b", template_id, inputs(&["a", "b", "c"]))
            .unwrap();

        assert_eq!(receipt.report_ids.len(), 3);
        let batch = manager.get_batch(receipt.batch_id).unwrap();
        assert_eq!(batch.total_reports, 3);
        assert_eq!(batch.status, BatchStatus::Pending);

        let reports = manager.reports_for_batch(receipt.batch_id).unwrap();
        assert!(reports.iter().all(|r| r.status == ReportStatus::Pending));
        assert_eq!(reports[1].filename, "upload.json_report_2");
    }

    #[test]
    fn test_create_batch_rejects_empty_and_unknown_template() {
        let (manager, template_id) = manager(MockProvider::default());

        assert!(matches!(
            manager.create_batch("b", template_id, Vec::new()),
            Err(LifecycleError::EmptyBatch)
        ));
        assert!(matches!(
            manager.create_batch("b", TemplateId::new(), inputs(&["a"])),
            Err(LifecycleError::UnknownTemplate(_))
        ));
        assert!(manager.list_batches(0, 10).unwrap().is_empty());
    }

    #[test]
    fn test_create_batch_rejects_oversized() {
        let (mut manager, template_id) = manager(MockProvider::default());
        manager.config.max_batch_size = 2;
        assert!(matches!(
            manager.create_batch("b", template_id, inputs(&["a", "b", "c"])),
            Err(LifecycleError::BatchTooLarge(3, 2))
        ));
    }

    #[test]
    fn test_submit_dispatches_each_report_once() {
        let (manager, template_id) = manager(MockProvider::default());
        let dispatcher = RecordingDispatcher::default();

        let receipt = manager
            .submit_batch("b", template_id, inputs(&["a", "b"]), &dispatcher)
            .unwrap();
        assert_eq!(*dispatcher.dispatched.borrow(), receipt.report_ids);
    }

    #[tokio::test]
    async fn test_process_report_completes() {
        let (manager, template_id) = manager(MockProvider::new(json!({"finding": "clear"})));
        let receipt = manager.create_batch("b", template_id, inputs(&["clear lungs"])).unwrap();
        let id = receipt.report_ids[0];

        assert_eq!(manager.process_report(id).await.unwrap(), ProcessOutcome::Completed);

        let report = manager.get_report(id).unwrap();
        assert_eq!(report.status, ReportStatus::Completed);
        assert_eq!(report.structured_data, Some(json!({"finding": "clear"})));
        assert_eq!(report.confidence_score.map(|c| c.value()), Some(85));
        assert_eq!(report.error_message, None);
        assert_eq!(
            manager.get_batch(receipt.batch_id).unwrap().status,
            BatchStatus::Completed
        );
    }

    #[tokio::test]
    async fn test_process_report_records_failure() {
        let provider = MockProvider::default();
        provider.add_error("garbled", "upstream 500");
        let (manager, template_id) = manager(provider);
        let receipt = manager.create_batch("b", template_id, inputs(&["garbled"])).unwrap();
        let id = receipt.report_ids[0];

        let outcome = manager.process_report(id).await.unwrap();
        assert!(matches!(outcome, ProcessOutcome::Failed(ref msg) if msg.contains("upstream 500")));

        let report = manager.get_report(id).unwrap();
        assert_eq!(report.status, ReportStatus::Failed);
        assert_eq!(report.structured_data, None);
        assert_eq!(report.confidence_score, None);
        assert!(report.error_message.unwrap().starts_with("AI processing failed"));
        assert_eq!(manager.batch_status(receipt.batch_id).unwrap(), BatchStatus::Failed);
    }

    #[tokio::test]
    async fn test_redelivery_is_a_no_op() {
        let provider = MockProvider::default();
        let (manager, template_id) = manager(provider.clone());
        let receipt = manager.create_batch("b", template_id, inputs(&["a"])).unwrap();
        let id = receipt.report_ids[0];

        manager.process_report(id).await.unwrap();
        let before = manager.get_report(id).unwrap();

        assert_eq!(manager.process_report(id).await.unwrap(), ProcessOutcome::Skipped);
        assert_eq!(manager.get_report(id).unwrap(), before);
        assert_eq!(provider.call_count(), 1);
        assert_eq!(manager.metrics().skipped, 1);
    }

    #[tokio::test]
    async fn test_unknown_report_is_skipped() {
        let (manager, _) = manager(MockProvider::default());
        assert_eq!(
            manager.process_report(ReportId::new()).await.unwrap(),
            ProcessOutcome::Skipped
        );
    }

    #[tokio::test]
    async fn test_retry_failed_report() {
        let provider = MockProvider::default();
        provider.add_error("flaky", "timeout");
        let (manager, template_id) = manager(provider);
        let receipt = manager.create_batch("b", template_id, inputs(&["flaky"])).unwrap();
        let id = receipt.report_ids[0];
        manager.process_report(id).await.unwrap();

        let dispatcher = RecordingDispatcher::default();
        manager.retry_report(id, &dispatcher).unwrap();

        let report = manager.get_report(id).unwrap();
        assert_eq!(report.status, ReportStatus::Pending);
        assert_eq!(report.error_message, None);
        assert_eq!(*dispatcher.dispatched.borrow(), vec![id]);
        assert_eq!(manager.batch_status(receipt.batch_id).unwrap(), BatchStatus::Pending);
        assert_eq!(manager.metrics().retried, 1);
    }

    #[tokio::test]
    async fn test_retry_rejects_non_failed() {
        let (manager, template_id) = manager(MockProvider::default());
        let receipt = manager.create_batch("b", template_id, inputs(&["a"])).unwrap();
        let dispatcher = RecordingDispatcher::default();

        let err = manager.retry_report(receipt.report_ids[0], &dispatcher).unwrap_err();
        assert!(matches!(
            err,
            LifecycleError::NotRetryable { status: ReportStatus::Pending, .. }
        ));
        assert!(matches!(
            manager.retry_report(ReportId::new(), &dispatcher),
            Err(LifecycleError::UnknownReport(_))
        ));
        assert!(dispatcher.dispatched.borrow().is_empty());
    }

    #[test]
    fn test_unknown_batch() {
        let (manager, _) = manager(MockProvider::default());
        assert!(matches!(
            manager.batch_status(BatchId::new()),
            Err(LifecycleError::UnknownBatch(_))
        ));
    }
}
