pub mod sqlite_store;

use crate::model::{ScoreId, ScoreResult};

/// Durable home of computed scores.
///
/// Implementations own their concurrency control; the core calls `persist`
/// from both dispatch paths at once.
#[async_trait::async_trait]
pub trait ResultStore: Send + Sync {
    /// Stores an unpersisted result and returns it with its assigned id.
    async fn persist(&self, result: ScoreResult) -> anyhow::Result<ScoreResult>;

    async fn find_by_id(&self, id: ScoreId) -> anyhow::Result<Option<ScoreResult>>;

    /// Every stored result for `candidate_id`, oldest first.
    async fn find_by_candidate(&self, candidate_id: &str) -> anyhow::Result<Vec<ScoreResult>>;

    async fn count(&self) -> anyhow::Result<u64>;
}
