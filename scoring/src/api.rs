//! Inbound facade used by transports (HTTP handlers, the CLI, ...).
//!
//! Checks payload constraints, then hands the request to the dispatch engine.

use std::sync::Arc;

use thiserror::Error;
use tracing::debug;

use crate::dispatch::DispatchEngine;
use crate::error::CalculationFailed;
use crate::model::{AckStatus, ScoreAck, ScoreRequest, ScoreResponse};

pub const ASYNC_ACCEPTED_MESSAGE: &str =
    "Score calculation has been scheduled for asynchronous processing.";

#[derive(Error, Debug)]
pub enum ApiError {
    /// Payload failed the transport-level constraints; nothing was dispatched.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error(transparent)]
    Calculation(#[from] CalculationFailed),
}

#[derive(Clone)]
pub struct ScoreApi {
    engine: Arc<DispatchEngine>,
}

impl ScoreApi {
    pub fn new(engine: Arc<DispatchEngine>) -> Self {
        Self { engine }
    }

    pub fn engine(&self) -> &Arc<DispatchEngine> {
        &self.engine
    }

    /// Calculates synchronously and returns the persisted score.
    pub async fn request_sync(&self, request: ScoreRequest) -> Result<ScoreResponse, ApiError> {
        check_payload(&request)?;
        debug!(
            candidate_id = %request.candidate_id,
            total_questions = ?request.total_questions,
            correct_answers = ?request.correct_answers,
            "received synchronous scoring request"
        );

        let score = self.engine.run_sync(&request).await?;
        Ok(ScoreResponse::from(score))
    }

    /// Schedules the calculation and acknowledges immediately. The handle is
    /// dropped: the outcome is only visible in the logs and the store.
    pub fn request_async(&self, request: ScoreRequest) -> Result<ScoreAck, ApiError> {
        check_payload(&request)?;
        debug!(
            candidate_id = %request.candidate_id,
            total_questions = ?request.total_questions,
            correct_answers = ?request.correct_answers,
            "received asynchronous scoring request"
        );

        let candidate_id = request.candidate_id.clone();
        drop(self.engine.run_async(request));

        Ok(ScoreAck {
            candidate_id,
            status: AckStatus::Accepted,
            message: ASYNC_ACCEPTED_MESSAGE.to_string(),
        })
    }
}

fn check_payload(request: &ScoreRequest) -> Result<(), ApiError> {
    if request.candidate_id.trim().is_empty() {
        return Err(ApiError::InvalidRequest("candidateId must not be blank".into()));
    }
    match request.total_questions {
        None => return Err(ApiError::InvalidRequest("totalQuestions must not be null".into())),
        Some(n) if n < 1 => {
            return Err(ApiError::InvalidRequest(
                "totalQuestions must be greater than or equal to 1".into(),
            ));
        }
        Some(_) => {}
    }
    match request.correct_answers {
        None => Err(ApiError::InvalidRequest("correctAnswers must not be null".into())),
        Some(n) if n < 0 => Err(ApiError::InvalidRequest(
            "correctAnswers must be greater than or equal to 0".into(),
        )),
        Some(_) => Ok(()),
    }
}
