//! Tokio-backed dispatcher: one task per report

use crate::error::LifecycleError;
use crate::manager::{LifecycleManager, ProcessOutcome};
use radstruct_domain::traits::{Dispatcher, ReportStore};
use radstruct_domain::ReportId;
use radstruct_llm::ExtractionProvider;
use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::runtime::Handle;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, error};

#[derive(Default)]
struct InFlight {
    active: HashSet<ReportId>,
    // Dispatched again while active; the active task runs once more
    requeued: HashSet<ReportId>,
}

/// Runs `process_report` for each dispatched id on the Tokio runtime
///
/// At most one task is active per report id and at most
/// `max_concurrency` reports are processed at once. Tasks still running
/// when the dispatcher is dropped are aborted; call
/// [`TokioDispatcher::wait_idle`] first.
///
/// # Examples
///
/// ```no_run
/// use radstruct_lifecycle::{LifecycleManager, TokioDispatcher};
/// # use radstruct_llm::MockProvider;
/// # use radstruct_store::MemoryStore;
/// # use std::sync::Arc;
/// # async fn example(manager: Arc<LifecycleManager<MemoryStore, MockProvider>>)
/// #     -> Result<(), Box<dyn std::error::Error>> {
/// let dispatcher = TokioDispatcher::new(Arc::clone(&manager))?;
/// // manager.submit_batch(name, template_id, inputs, &dispatcher)?;
/// dispatcher.wait_idle().await;
/// # Ok(())
/// # }
/// ```
pub struct TokioDispatcher<S, P>
where
    S: ReportStore,
    P: ExtractionProvider,
{
    manager: Arc<LifecycleManager<S, P>>,
    handle: Handle,
    tasks: Mutex<JoinSet<()>>,
    in_flight: Arc<Mutex<InFlight>>,
    permits: Arc<Semaphore>,
}

impl<S, P> TokioDispatcher<S, P>
where
    S: ReportStore + 'static,
    S::Error: std::fmt::Display,
    P: ExtractionProvider + 'static,
{
    /// Create a dispatcher on the current Tokio runtime
    pub fn new(manager: Arc<LifecycleManager<S, P>>) -> Result<Self, LifecycleError> {
        let handle = Handle::try_current()
            .map_err(|e| LifecycleError::Worker(format!("No Tokio runtime: {}", e)))?;
        let permits = Arc::new(Semaphore::new(manager.config().max_concurrency.max(1)));

        Ok(Self {
            manager,
            handle,
            tasks: Mutex::new(JoinSet::new()),
            in_flight: Arc::new(Mutex::new(InFlight::default())),
            permits,
        })
    }

    /// The manager this dispatcher drives
    pub fn manager(&self) -> &Arc<LifecycleManager<S, P>> {
        &self.manager
    }

    /// Number of reports with an active task
    pub fn in_flight(&self) -> usize {
        self.in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .active
            .len()
    }

    /// Wait until every dispatched task (including ones dispatched while
    /// waiting) has finished
    pub async fn wait_idle(&self) {
        loop {
            let mut running = std::mem::take(&mut *self.lock_tasks());
            if running.is_empty() {
                break;
            }
            while let Some(joined) = running.join_next().await {
                if let Err(e) = joined {
                    error!("Report task panicked or was cancelled: {}", e);
                }
            }
        }
    }

    fn lock_tasks(&self) -> std::sync::MutexGuard<'_, JoinSet<()>> {
        self.tasks.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<S, P> Dispatcher for TokioDispatcher<S, P>
where
    S: ReportStore + 'static,
    S::Error: std::fmt::Display + Send,
    P: ExtractionProvider + 'static,
{
    fn dispatch(&self, report_id: ReportId) {
        {
            let mut in_flight = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);
            if !in_flight.active.insert(report_id) {
                debug!(report_id = %report_id, "Report already in flight, requeueing");
                in_flight.requeued.insert(report_id);
                return;
            }
        }

        let manager = Arc::clone(&self.manager);
        let in_flight = Arc::clone(&self.in_flight);
        let permits = Arc::clone(&self.permits);

        self.lock_tasks().spawn_on(
            async move {
                loop {
                    match permits.acquire().await {
                        Ok(_permit) => match manager.process_report(report_id).await {
                            Ok(ProcessOutcome::Skipped) => {
                                debug!(report_id = %report_id, "Delivery skipped");
                            }
                            Ok(_) => {}
                            Err(e) => {
                                error!(report_id = %report_id, "Report processing failed: {}", e);
                            }
                        },
                        Err(e) => {
                            error!(report_id = %report_id, "Dispatcher closed: {}", e);
                        }
                    }

                    let mut state = in_flight.lock().unwrap_or_else(PoisonError::into_inner);
                    if !state.requeued.remove(&report_id) {
                        state.active.remove(&report_id);
                        break;
                    }
                }
            },
            &self.handle,
        );
    }
}
