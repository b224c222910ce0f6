//! Run command implementation.

use crate::cli::RunArgs;
use crate::config::{Config, OutputFormat};
use crate::error::Result;
use crate::ingest::{load_reports, load_template};
use crate::output::Formatter;
use radstruct_domain::{BatchProgress, ReportBatch, ReportInput, StructuredReport, Template};
use radstruct_extractor::Extractor;
use radstruct_lifecycle::{LifecycleManager, LifecycleMetrics, TokioDispatcher};
use radstruct_llm::{ExtractionProvider, ResolvedProvider};
use radstruct_store::MemoryStore;
use std::sync::Arc;
use tracing::info;

/// Everything a finished batch run produced.
#[derive(Debug, Clone)]
pub struct BatchRun {
    /// Batch record with its final derived status
    pub batch: ReportBatch,
    /// Report counts by state
    pub progress: BatchProgress,
    /// Reports in submission order
    pub reports: Vec<StructuredReport>,
    /// Processing counters
    pub metrics: LifecycleMetrics,
}

/// Execute the run command.
pub async fn execute_run(args: RunArgs, config: &Config, formatter: &Formatter) -> Result<()> {
    let template = load_template(&args.template)?;
    let inputs = load_reports(&args.files)?;
    let provider = ResolvedProvider::from_settings(&config.provider)?;

    let run = run_batch(provider, config, template, &args.name, inputs, formatter).await?;

    println!("{}", formatter.format_reports(&run.reports)?);
    println!("{}", formatter.format_batch(&run.batch, &run.progress)?);
    if formatter.format() == OutputFormat::Table {
        println!("{}", run.metrics.summary());
    }
    if run.progress.failed > 0 {
        eprintln!(
            "{}",
            formatter.error(&format!("{} report(s) failed", run.progress.failed))
        );
    }
    Ok(())
}

/// Submit one batch through the lifecycle manager and wait for it to finish.
pub async fn run_batch<P>(
    provider: P,
    config: &Config,
    template: Template,
    name: &str,
    inputs: Vec<ReportInput>,
    formatter: &Formatter,
) -> Result<BatchRun>
where
    P: ExtractionProvider + 'static,
{
    let extractor = Extractor::new(Arc::new(provider), config.extractor.clone())
        .with_model_name(config.provider.model_name.clone());
    let manager = Arc::new(LifecycleManager::new(
        Arc::new(MemoryStore::new()),
        extractor,
        config.lifecycle.clone(),
    ));

    let schema = manager.extractor().schema_for(&template);
    for diagnostic in &schema.diagnostics {
        eprintln!("{}", formatter.warning(&diagnostic.to_string()));
    }

    let template_id = manager.register_template(template)?;
    let dispatcher = TokioDispatcher::new(Arc::clone(&manager))?;
    let receipt = manager.submit_batch(name, template_id, inputs, &dispatcher)?;
    eprintln!(
        "{}",
        formatter.info(&format!(
            "Processing {} report(s) with {}",
            receipt.report_ids.len(),
            manager.extractor().provider().name()
        ))
    );
    dispatcher.wait_idle().await;

    let progress = manager.batch_progress(receipt.batch_id)?;
    let batch = manager.get_batch(receipt.batch_id)?;
    let reports = manager.reports_for_batch(receipt.batch_id)?;
    info!(
        batch_id = %batch.id,
        status = %batch.status,
        completed = progress.completed,
        failed = progress.failed,
        "Batch finished"
    );

    Ok(BatchRun {
        batch,
        progress,
        reports,
        metrics: manager.metrics(),
    })
}
