use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifier assigned by the result store on persistence.
pub type ScoreId = i64;

/// Input of a single score calculation.
///
/// The counts are optional so that an incomplete payload reaches validation
/// instead of failing at deserialization time.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreRequest {
    pub candidate_id: String,
    pub total_questions: Option<i32>,
    pub correct_answers: Option<i32>,
}

impl ScoreRequest {
    pub fn new(candidate_id: impl Into<String>, total_questions: i32, correct_answers: i32) -> Self {
        Self {
            candidate_id: candidate_id.into(),
            total_questions: Some(total_questions),
            correct_answers: Some(correct_answers),
        }
    }
}

/// Which entry point produced a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchMode {
    Sync,
    Async,
}

impl DispatchMode {
    pub fn is_async(self) -> bool {
        matches!(self, DispatchMode::Async)
    }
}

impl fmt::Display for DispatchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DispatchMode::Sync => "sync",
            DispatchMode::Async => "async",
        };
        f.write_str(s)
    }
}

/// A computed score. `id` is `None` until the result store has persisted it;
/// the value is never mutated afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreResult {
    pub id: Option<ScoreId>,

    pub candidate_id: String,
    pub score_value: f64,
    pub total_questions: i32,
    pub correct_answers: i32,

    pub calculated_at: DateTime<Utc>,
    pub async_calculation: bool,
}

impl ScoreResult {
    pub fn is_persisted(&self) -> bool {
        self.id.is_some()
    }
}

/// Lifecycle of one invocation. There are no retry or partial states: any
/// failure moves straight to `Failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalculationStage {
    Received,
    Validating,
    Computing,
    Persisting,
    Completed,
    Failed,
}

impl CalculationStage {
    pub fn is_terminal(self) -> bool {
        matches!(self, CalculationStage::Completed | CalculationStage::Failed)
    }
}

impl fmt::Display for CalculationStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CalculationStage::Received => "RECEIVED",
            CalculationStage::Validating => "VALIDATING",
            CalculationStage::Computing => "COMPUTING",
            CalculationStage::Persisting => "PERSISTING",
            CalculationStage::Completed => "COMPLETED",
            CalculationStage::Failed => "FAILED",
        };
        f.write_str(s)
    }
}

/// Outbound representation of a persisted score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreResponse {
    pub id: Option<ScoreId>,
    pub candidate_id: String,
    pub score_value: f64,
    pub total_questions: i32,
    pub correct_answers: i32,
    pub calculated_at: DateTime<Utc>,
    pub async_calculation: bool,
}

impl From<ScoreResult> for ScoreResponse {
    fn from(r: ScoreResult) -> Self {
        Self {
            id: r.id,
            candidate_id: r.candidate_id,
            score_value: r.score_value,
            total_questions: r.total_questions,
            correct_answers: r.correct_answers,
            calculated_at: r.calculated_at,
            async_calculation: r.async_calculation,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AckStatus {
    Accepted,
}

/// Returned immediately when an asynchronous calculation is scheduled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreAck {
    pub candidate_id: String,
    pub status: AckStatus,
    pub message: String,
}
