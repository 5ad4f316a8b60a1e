//! Service layer: the compute-and-persist step behind both dispatch paths.

mod monitored;

pub use monitored::MonitoredScoreService;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tracing::{debug, error, info};

use crate::calculator;
use crate::error::{CalculationFailed, translate};
use crate::model::{CalculationStage, DispatchMode, ScoreRequest, ScoreResult};
use crate::monitoring::{Component, Operation, TimingPolicy, TimingPolicyBuilder};
use crate::store::ResultStore;

pub static SCORE_SERVICE: Component = Component::new("ScoreService");

pub static CALCULATE_AND_PERSIST: Operation =
    Operation::new(&SCORE_SERVICE, "calculate_and_persist");

/// Timing markers of this service: the calculation step is monitored so the
/// real business latency is captured on both paths.
pub fn timing_markers() -> TimingPolicyBuilder {
    TimingPolicy::builder().monitor_operation(&CALCULATE_AND_PERSIST)
}

/// Operations exposed by the service layer. Every method is wrapped by
/// [`MonitoredScoreService`] when the engine is assembled.
#[async_trait]
pub trait ScoreService: Send + Sync {
    /// Validate, compute and persist one score.
    async fn calculate_and_persist(
        &self,
        request: &ScoreRequest,
        mode: DispatchMode,
    ) -> Result<ScoreResult, CalculationFailed>;
}

/// Default service: calculation core + result store.
pub struct ScoreServiceImpl<S: ResultStore + ?Sized> {
    store: Arc<S>,
}

impl<S: ResultStore + ?Sized> ScoreServiceImpl<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl<S: ResultStore + ?Sized> ScoreService for ScoreServiceImpl<S> {
    async fn calculate_and_persist(
        &self,
        request: &ScoreRequest,
        mode: DispatchMode,
    ) -> Result<ScoreResult, CalculationFailed> {
        let candidate_id = request.candidate_id.as_str();
        debug!(candidate_id, %mode, stage = %CalculationStage::Validating, "validating request");

        let counts = match calculator::validate(request) {
            Ok(counts) => counts,
            Err(v) => {
                debug!(candidate_id, stage = %CalculationStage::Failed, reason = %v, "validation failed");
                return Err(translate(v));
            }
        };

        debug!(candidate_id, stage = %CalculationStage::Computing, "computing score");
        let computed = calculator::score(candidate_id, counts, mode, Utc::now());

        debug!(
            candidate_id,
            score_value = computed.score_value,
            stage = %CalculationStage::Persisting,
            "persisting score"
        );

        let saved = match self.store.persist(computed).await {
            Ok(saved) => saved,
            Err(e) => {
                error!(
                    candidate_id,
                    stage = %CalculationStage::Failed,
                    error = ?e,
                    "unexpected error while calculating score"
                );
                return Err(translate(e));
            }
        };

        info!(
            candidate_id = %saved.candidate_id,
            value = saved.score_value,
            is_async = saved.async_calculation,
            stage = %CalculationStage::Completed,
            "score calculated"
        );
        Ok(saved)
    }
}
