pub mod api;
pub mod calculator;
pub mod dispatch;
pub mod error;
pub mod model;
pub mod monitoring;
pub mod service;
pub mod store;

pub use api::{ApiError, ScoreApi};
pub use dispatch::{DispatchEngine, ScoreHandle, ScoringEngineBuilder};
pub use error::{CalculationFailed, FailureCause, ValidationError};
pub use model::{DispatchMode, ScoreAck, ScoreRequest, ScoreResponse, ScoreResult};
