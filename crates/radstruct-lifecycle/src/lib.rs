//! Radstruct Lifecycle
//!
//! Tracks every report from submission to a terminal state and keeps each
//! batch's status consistent with its reports.
//!
//! # Overview
//!
//! - **Report state machine**: `pending → processing → {completed, failed}`;
//!   `failed → pending` only through an explicit [`LifecycleManager::retry_report`]
//! - **Idempotent delivery**: [`LifecycleManager::process_report`] is a no-op
//!   for reports that are not pending, so duplicate dispatches are harmless
//! - **Failure isolation**: one report failing never affects its siblings
//! - **Derived batch status**: recomputed from live report states on every
//!   query and written back to the batch record
//! - **Dispatch**: [`TokioDispatcher`] runs one bounded Tokio task per report
//!
//! # Usage
//!
//! ```
//! use radstruct_domain::{BatchStatus, ReportInput, Template, TemplateNode};
//! use radstruct_extractor::{Extractor, ExtractorConfig};
//! use radstruct_lifecycle::{LifecycleConfig, LifecycleManager, TokioDispatcher};
//! use radstruct_llm::MockProvider;
//! use radstruct_store::MemoryStore;
//! use serde_json::json;
//! use std::sync::Arc;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let extractor = Extractor::new(
//!     Arc::new(MockProvider::new(json!({"finding": "clear"}))),
//!     ExtractorConfig::default(),
//! );
//! let manager = Arc::new(LifecycleManager::new(
//!     Arc::new(MemoryStore::new()),
//!     extractor,
//!     LifecycleConfig::default(),
//! ));
//! let template_id = manager.register_template(Template::new(
//!     "Chest X-ray",
//!     TemplateNode::from_value(&json!({
//!         "finding": {"type": "string", "description": "primary finding"}
//!     })),
//! ))?;
//!
//! let dispatcher = TokioDispatcher::new(Arc::clone(&manager))?;
//! let receipt = manager.submit_batch(
//!     "Morning reads",
//!     template_id,
//!     vec![ReportInput::new("Lungs are clear.", "reads.json_report_1")],
//!     &dispatcher,
//! )?;
//! dispatcher.wait_idle().await;
//!
//! assert_eq!(manager.batch_status(receipt.batch_id)?, BatchStatus::Completed);
//! println!("{}", manager.metrics().summary());
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

mod config;
mod dispatcher;
mod error;
mod manager;
mod metrics;

pub use config::LifecycleConfig;
pub use dispatcher::TokioDispatcher;
pub use error::LifecycleError;
pub use manager::{BatchReceipt, LifecycleManager, ProcessOutcome};
pub use metrics::LifecycleMetrics;
