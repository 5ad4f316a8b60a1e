use async_trait::async_trait;

use super::{CALCULATE_AND_PERSIST, ScoreService};
use crate::error::CalculationFailed;
use crate::model::{DispatchMode, ScoreRequest, ScoreResult};
use crate::monitoring::Interceptor;

/// Decorator that routes every [`ScoreService`] operation through the
/// [`Interceptor`]. Applied once when the engine is built; callers never
/// wrap individual calls themselves.
pub struct MonitoredScoreService<S: ScoreService> {
    inner: S,
    interceptor: Interceptor,
}

impl<S: ScoreService> MonitoredScoreService<S> {
    pub fn new(inner: S, interceptor: Interceptor) -> Self {
        Self { inner, interceptor }
    }
}

#[async_trait]
impl<S: ScoreService> ScoreService for MonitoredScoreService<S> {
    async fn calculate_and_persist(
        &self,
        request: &ScoreRequest,
        mode: DispatchMode,
    ) -> Result<ScoreResult, CalculationFailed> {
        let call = self.inner.calculate_and_persist(request, mode);
        let intercepted = self
            .interceptor
            .intercept(&CALCULATE_AND_PERSIST, &(request, mode), call);
        intercepted.await
    }
}
