use thiserror::Error;

/// Bad input rejected by the calculation core.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("missing required fields")]
    MissingFields,

    #[error("correct exceeds total")]
    CorrectExceedsTotal,

    #[error("total must be positive")]
    NonPositiveTotal,

    #[error("correct must not be negative")]
    NegativeCorrect,
}

/// What actually went wrong underneath a [`CalculationFailed`].
#[derive(Error, Debug)]
pub enum FailureCause {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("result store failure: {0:#}")]
    Store(#[source] anyhow::Error),

    #[error("worker task failed: {0}")]
    Worker(String),
}

/// The single domain error surfaced by both dispatch paths.
///
/// Bad input and internal failures share this kind; callers that need to
/// tell them apart inspect [`CalculationFailed::cause`].
#[derive(Error, Debug)]
#[error("failed to calculate score: {cause}")]
pub struct CalculationFailed {
    #[source]
    cause: FailureCause,
}

impl CalculationFailed {
    pub fn cause(&self) -> &FailureCause {
        &self.cause
    }

    pub fn into_cause(self) -> FailureCause {
        self.cause
    }

    pub fn validation_error(&self) -> Option<&ValidationError> {
        match &self.cause {
            FailureCause::Validation(v) => Some(v),
            _ => None,
        }
    }

    pub fn is_validation(&self) -> bool {
        self.validation_error().is_some()
    }
}

/// Wraps any failure raised while computing or persisting into the domain
/// error, keeping the original cause.
pub fn translate(cause: impl Into<FailureCause>) -> CalculationFailed {
    CalculationFailed {
        cause: cause.into(),
    }
}

impl From<anyhow::Error> for FailureCause {
    fn from(e: anyhow::Error) -> Self {
        FailureCause::Store(e)
    }
}

impl From<tokio::task::JoinError> for FailureCause {
    fn from(e: tokio::task::JoinError) -> Self {
        if e.is_panic() {
            FailureCause::Worker("worker panicked".to_string())
        } else {
            FailureCause::Worker(e.to_string())
        }
    }
}
