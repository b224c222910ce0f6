//! Batch-level behavior across many reports

use proptest::prelude::*;
use radstruct_domain::traits::{Dispatcher, ReportStore};
use radstruct_domain::{BatchStatus, ReportInput, ReportStatus, Template, TemplateId, TemplateNode};
use radstruct_extractor::{Extractor, ExtractorConfig};
use radstruct_lifecycle::{LifecycleConfig, LifecycleManager, TokioDispatcher};
use radstruct_llm::MockProvider;
use radstruct_store::MemoryStore;
use serde_json::json;
use std::sync::Arc;

type Manager = LifecycleManager<MemoryStore, MockProvider>;

fn setup(provider: MockProvider) -> (Arc<Manager>, TemplateId) {
    let extractor = Extractor::new(Arc::new(provider), ExtractorConfig::default());
    let manager = Arc::new(LifecycleManager::new(
        Arc::new(MemoryStore::new()),
        extractor,
        LifecycleConfig::default(),
    ));
    let template_id = manager
        .register_template(Template::new(
            "Chest X-ray",
            TemplateNode::from_value(&json!({
                "finding": {"type": "string", "description": "primary finding"},
                "impression": {"type": "string", "description": "impression"}
            })),
        ))
        .unwrap();
    (manager, template_id)
}

fn inputs(texts: &[String]) -> Vec<ReportInput> {
    texts
        .iter()
        .enumerate()
        .map(|(i, text)| ReportInput::new(text.clone(), format!("reads.json_report_{}", i + 1)))
        .collect()
}

#[tokio::test]
async fn one_failure_does_not_affect_siblings() {
    let provider = MockProvider::new(json!({"finding": "clear", "impression": "normal"}));
    provider.add_error("CORRUPT", "provider returned garbage");
    let (manager, template_id) = setup(provider);
    let dispatcher = TokioDispatcher::new(Arc::clone(&manager)).unwrap();

    let texts = ["CORRUPT scan".to_string(), "clear lungs".to_string(), "normal heart".to_string()];
    let receipt = manager
        .submit_batch("mixed", template_id, inputs(&texts), &dispatcher)
        .unwrap();
    dispatcher.wait_idle().await;

    let reports = manager.reports_for_batch(receipt.batch_id).unwrap();
    let statuses: Vec<_> = reports.iter().map(|r| r.status).collect();
    assert_eq!(
        statuses,
        vec![ReportStatus::Failed, ReportStatus::Completed, ReportStatus::Completed]
    );
    assert!(reports[0]
        .error_message
        .as_deref()
        .unwrap()
        .contains("provider returned garbage"));
    assert_eq!(
        reports[1].structured_data,
        Some(json!({"finding": "clear", "impression": "normal"}))
    );

    let progress = manager.batch_progress(receipt.batch_id).unwrap();
    assert_eq!((progress.completed, progress.failed), (2, 1));
    assert_eq!(progress.status(), BatchStatus::PartiallyFailed);
    assert_eq!(
        manager.get_batch(receipt.batch_id).unwrap().status,
        BatchStatus::PartiallyFailed
    );

    let metrics = manager.metrics();
    assert_eq!((metrics.completed, metrics.failed), (2, 1));
}

#[tokio::test]
async fn retry_after_fix_completes_the_batch() {
    let provider = MockProvider::new(json!({"finding": "clear"}));
    provider.add_error("flaky", "connection reset");
    let (manager, template_id) = setup(provider);
    let dispatcher = TokioDispatcher::new(Arc::clone(&manager)).unwrap();

    let texts = ["flaky read".to_string(), "clear".to_string()];
    let receipt = manager
        .submit_batch("retry", template_id, inputs(&texts), &dispatcher)
        .unwrap();
    dispatcher.wait_idle().await;
    assert_eq!(
        manager.batch_status(receipt.batch_id).unwrap(),
        BatchStatus::PartiallyFailed
    );

    // Swap in a provider that succeeds, over the same store
    let fixed = MockProvider::new(json!({"finding": "recovered"}));
    let extractor = Extractor::new(Arc::new(fixed), ExtractorConfig::default());
    let recovered = Arc::new(LifecycleManager::new(
        Arc::clone(manager.store()),
        extractor,
        LifecycleConfig::default(),
    ));
    let retry_dispatcher = TokioDispatcher::new(Arc::clone(&recovered)).unwrap();

    recovered
        .retry_report(receipt.report_ids[0], &retry_dispatcher)
        .unwrap();
    retry_dispatcher.wait_idle().await;

    let report = recovered.get_report(receipt.report_ids[0]).unwrap();
    assert_eq!(report.status, ReportStatus::Completed);
    assert_eq!(
        report.structured_data,
        Some(json!({"finding": "recovered", "impression": null}))
    );
    assert_eq!(report.error_message, None);
    assert_eq!(
        recovered.batch_status(receipt.batch_id).unwrap(),
        BatchStatus::Completed
    );
}

#[tokio::test]
async fn redelivery_after_completion_changes_nothing() {
    let provider = MockProvider::new(json!({"finding": "clear"}));
    let (manager, template_id) = setup(provider.clone());
    let dispatcher = TokioDispatcher::new(Arc::clone(&manager)).unwrap();

    let receipt = manager
        .submit_batch("once", template_id, inputs(&["text".to_string()]), &dispatcher)
        .unwrap();
    dispatcher.wait_idle().await;
    let before = manager.get_report(receipt.report_ids[0]).unwrap();

    dispatcher.dispatch(receipt.report_ids[0]);
    dispatcher.wait_idle().await;

    assert_eq!(manager.get_report(receipt.report_ids[0]).unwrap(), before);
    assert_eq!(provider.call_count(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn stored_status_is_final_after_parallel_processing() {
    let (manager, template_id) = setup(MockProvider::new(json!({"finding": "clear"})));
    let dispatcher = TokioDispatcher::new(Arc::clone(&manager)).unwrap();

    let texts: Vec<String> = (0..40).map(|i| format!("report {}", i)).collect();
    let receipt = manager
        .submit_batch("parallel", template_id, inputs(&texts), &dispatcher)
        .unwrap();
    dispatcher.wait_idle().await;

    // Read the stored record directly, without a fresh sync
    let stored = manager.store().get_batch(receipt.batch_id).unwrap().unwrap();
    assert_eq!(stored.status, BatchStatus::Completed);
    assert_eq!(
        manager.list_batches(0, 10).unwrap()[0].status,
        BatchStatus::Completed
    );
}

#[tokio::test]
async fn status_moves_from_pending_through_processing() {
    let (manager, template_id) = setup(MockProvider::new(json!({})));
    let texts: Vec<String> = (0..3).map(|i| format!("report {}", i)).collect();
    let receipt = manager.create_batch("manual", template_id, inputs(&texts)).unwrap();

    assert_eq!(manager.batch_status(receipt.batch_id).unwrap(), BatchStatus::Pending);

    manager.process_report(receipt.report_ids[0]).await.unwrap();
    let progress = manager.batch_progress(receipt.batch_id).unwrap();
    assert_eq!((progress.pending, progress.completed), (2, 1));
    assert_eq!(progress.status(), BatchStatus::Processing);

    for id in &receipt.report_ids[1..] {
        manager.process_report(*id).await.unwrap();
    }
    assert_eq!(manager.batch_status(receipt.batch_id).unwrap(), BatchStatus::Completed);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    /// Counts always add up to total_reports and the status matches the fold
    #[test]
    fn progress_counts_sum_to_total(outcomes in prop::collection::vec(any::<bool>(), 1..12)) {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();

        runtime.block_on(async {
            let provider = MockProvider::new(json!({"finding": "ok"}));
            provider.add_error("FAIL", "scripted failure");
            let (manager, template_id) = setup(provider);

            let texts: Vec<String> = outcomes
                .iter()
                .enumerate()
                .map(|(i, ok)| if *ok { format!("ok {}", i) } else { format!("FAIL {}", i) })
                .collect();
            let receipt = manager.create_batch("prop", template_id, inputs(&texts)).unwrap();

            // Process a prefix only, so some reports stay pending
            let processed = outcomes.len() / 2 + 1;
            for id in &receipt.report_ids[..processed] {
                manager.process_report(*id).await.unwrap();

                let progress = manager.batch_progress(receipt.batch_id).unwrap();
                assert_eq!(
                    progress.pending + progress.processing + progress.completed + progress.failed,
                    outcomes.len()
                );
                assert_eq!(progress.total, outcomes.len());
            }

            let progress = manager.batch_progress(receipt.batch_id).unwrap();
            let ok = outcomes[..processed].iter().filter(|ok| **ok).count();
            assert_eq!(progress.completed, ok);
            assert_eq!(progress.failed, processed - ok);

            let expected = if processed < outcomes.len() {
                BatchStatus::Processing
            } else if ok == outcomes.len() {
                BatchStatus::Completed
            } else if ok == 0 {
                BatchStatus::Failed
            } else {
                BatchStatus::PartiallyFailed
            };
            assert_eq!(manager.batch_status(receipt.batch_id).unwrap(), expected);
        });
    }
}
