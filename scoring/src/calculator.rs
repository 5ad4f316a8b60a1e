//! Validation and percentage computation.
//!
//! Pure functions only: nothing here touches the store or shared state, so
//! both dispatch paths can call into it concurrently.

use chrono::{DateTime, Utc};

use crate::error::ValidationError;
use crate::model::{DispatchMode, ScoreRequest, ScoreResult};

/// Counts that passed validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidatedCounts {
    pub total_questions: i32,
    pub correct_answers: i32,
}

pub fn validate(request: &ScoreRequest) -> Result<ValidatedCounts, ValidationError> {
    let (Some(total), Some(correct)) = (request.total_questions, request.correct_answers) else {
        return Err(ValidationError::MissingFields);
    };

    if correct > total {
        return Err(ValidationError::CorrectExceedsTotal);
    }
    if total <= 0 {
        return Err(ValidationError::NonPositiveTotal);
    }
    if correct < 0 {
        return Err(ValidationError::NegativeCorrect);
    }

    Ok(ValidatedCounts {
        total_questions: total,
        correct_answers: correct,
    })
}

/// Plain floating point percentage, not rounded.
pub fn percentage(total_questions: i32, correct_answers: i32) -> f64 {
    (correct_answers as f64 * 100.0) / total_questions as f64
}

/// Builds an unpersisted result from counts that already passed [`validate`].
pub fn score(
    candidate_id: &str,
    counts: ValidatedCounts,
    mode: DispatchMode,
    now: DateTime<Utc>,
) -> ScoreResult {
    ScoreResult {
        id: None,
        candidate_id: candidate_id.to_string(),
        score_value: percentage(counts.total_questions, counts.correct_answers),
        total_questions: counts.total_questions,
        correct_answers: counts.correct_answers,
        calculated_at: now,
        async_calculation: mode.is_async(),
    }
}

/// Validates the request and builds an unpersisted result.
pub fn compute(
    request: &ScoreRequest,
    mode: DispatchMode,
    now: DateTime<Utc>,
) -> Result<ScoreResult, ValidationError> {
    let counts = validate(request)?;
    Ok(score(&request.candidate_id, counts, mode, now))
}
