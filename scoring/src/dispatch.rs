//! Dispatch engine: one calculation, two entry points.
//!
//! - `run_sync` runs the compute-and-persist step inline on the caller's task.
//! - `run_async` hands the very same step to a bounded pool of tokio tasks and
//!   returns a [`ScoreHandle`] immediately.
//!
//! Both paths go through the monitored service exactly once, so validation,
//! error wrapping and logging are identical.

use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::task::{Context, Poll};

use futures::FutureExt;
use tokio::sync::{Notify, Semaphore};
use tokio::task::JoinHandle;
use tracing::{Instrument, debug, error};

use crate::error::{CalculationFailed, FailureCause, translate};
use crate::model::{CalculationStage, DispatchMode, ScoreRequest, ScoreResult};
use crate::monitoring::{Interceptor, TimingPolicyBuilder};
use crate::service::{self, MonitoredScoreService, ScoreService, ScoreServiceImpl};
use crate::store::ResultStore;

pub const DEFAULT_WORKER_POOL_SIZE: usize = 4;

/// Awaitable result of an asynchronous calculation.
///
/// Dropping the handle does not cancel the calculation; it only gives up on
/// observing its outcome. Failures are still written to the log by the
/// interceptor, and worker panics by the worker itself.
#[must_use = "drop the handle explicitly to fire and forget"]
pub struct ScoreHandle {
    candidate_id: String,
    task: JoinHandle<Result<ScoreResult, CalculationFailed>>,
}

impl ScoreHandle {
    pub fn candidate_id(&self) -> &str {
        &self.candidate_id
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Future for ScoreHandle {
    type Output = Result<ScoreResult, CalculationFailed>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match Pin::new(&mut self.task).poll(cx) {
            Poll::Pending => Poll::Pending,
            Poll::Ready(Ok(outcome)) => Poll::Ready(outcome),
            Poll::Ready(Err(join_err)) => {
                error!(
                    candidate_id = %self.candidate_id,
                    error = %join_err,
                    "async score worker did not complete"
                );
                Poll::Ready(Err(translate(join_err)))
            }
        }
    }
}

/// Number of submitted async calculations that have not finished yet.
#[derive(Default)]
struct InFlight {
    count: AtomicUsize,
    idle: Notify,
}

impl InFlight {
    fn enter(self: &Arc<Self>) -> InFlightGuard {
        self.count.fetch_add(1, Ordering::SeqCst);
        InFlightGuard(Arc::clone(self))
    }

    async fn wait_idle(&self) {
        loop {
            let notified = self.idle.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            if self.count.load(Ordering::SeqCst) == 0 {
                return;
            }
            notified.await;
        }
    }
}

/// Decrements the in-flight count when the worker task ends, panics included.
struct InFlightGuard(Arc<InFlight>);

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        if self.0.count.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.0.idle.notify_waiters();
        }
    }
}

pub struct DispatchEngine {
    service: Arc<dyn ScoreService>,
    workers: Arc<Semaphore>,
    pool_size: usize,
    in_flight: Arc<InFlight>,
}

impl DispatchEngine {
    /// `service` should already be wrapped in [`MonitoredScoreService`];
    /// [`ScoringEngineBuilder`] does that.
    pub fn new(service: Arc<dyn ScoreService>, pool_size: usize) -> Self {
        let pool_size = pool_size.max(1);
        Self {
            service,
            workers: Arc::new(Semaphore::new(pool_size)),
            pool_size,
            in_flight: Arc::new(InFlight::default()),
        }
    }

    pub fn pool_size(&self) -> usize {
        self.pool_size
    }

    /// Async calculations submitted but not yet finished.
    pub fn in_flight(&self) -> usize {
        self.in_flight.count.load(Ordering::SeqCst)
    }

    /// Calculates and persists on the caller's task; returns once the result
    /// is stored.
    pub async fn run_sync(&self, request: &ScoreRequest) -> Result<ScoreResult, CalculationFailed> {
        debug!(
            candidate_id = %request.candidate_id,
            mode = %DispatchMode::Sync,
            stage = %CalculationStage::Received,
            "dispatching score calculation"
        );

        self.service
            .calculate_and_persist(request, DispatchMode::Sync)
            .await
    }

    /// Schedules the calculation on the worker pool and returns at once.
    ///
    /// Must be called from within a tokio runtime. The worker inherits the
    /// caller's span.
    pub fn run_async(&self, request: ScoreRequest) -> ScoreHandle {
        debug!(
            candidate_id = %request.candidate_id,
            mode = %DispatchMode::Async,
            stage = %CalculationStage::Received,
            in_flight = self.in_flight(),
            "scheduling score calculation"
        );

        let candidate_id = request.candidate_id.clone();
        let service = Arc::clone(&self.service);
        let workers = Arc::clone(&self.workers);
        let guard = self.in_flight.enter();

        let task = tokio::spawn(
            async move {
                let _guard = guard;
                let _permit = workers
                    .acquire_owned()
                    .await
                    .map_err(|_| translate(FailureCause::Worker("worker pool closed".into())))?;

                let call = service.calculate_and_persist(&request, DispatchMode::Async);
                match AssertUnwindSafe(call).catch_unwind().await {
                    Ok(outcome) => outcome,
                    Err(panic) => {
                        let reason = panic_message(&*panic);
                        error!(
                            candidate_id = %request.candidate_id,
                            stage = %CalculationStage::Failed,
                            reason = %reason,
                            "async score worker panicked"
                        );
                        Err(translate(FailureCause::Worker(reason)))
                    }
                }
            }
            .in_current_span(),
        );

        ScoreHandle { candidate_id, task }
    }

    /// Waits until every submitted async calculation has finished, awaited
    /// or not.
    pub async fn drain(&self) {
        self.in_flight.wait_idle().await;
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "worker panicked".to_string()
    }
}

/// Assembles store, service, monitoring decorator and dispatch engine.
pub struct ScoringEngineBuilder {
    store: Arc<dyn ResultStore>,
    timing: TimingPolicyBuilder,
    worker_pool_size: usize,
}

impl ScoringEngineBuilder {
    /// Starts with the service's own timing markers.
    pub fn new(store: Arc<dyn ResultStore>) -> Self {
        Self {
            store,
            timing: service::timing_markers(),
            worker_pool_size: DEFAULT_WORKER_POOL_SIZE,
        }
    }

    pub fn worker_pool_size(mut self, size: usize) -> Self {
        self.worker_pool_size = size;
        self
    }

    /// Replace or extend the timing markers before they are frozen.
    pub fn timing(mut self, f: impl FnOnce(TimingPolicyBuilder) -> TimingPolicyBuilder) -> Self {
        self.timing = f(self.timing);
        self
    }

    pub fn build(self) -> DispatchEngine {
        let interceptor = Interceptor::new(Arc::new(self.timing.build()));
        let service = MonitoredScoreService::new(ScoreServiceImpl::new(self.store), interceptor);

        DispatchEngine::new(Arc::new(service), self.worker_pool_size)
    }
}
