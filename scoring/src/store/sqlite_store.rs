//! SQLiteResultStore
//! -----------------
//! SQLite-backed implementation of `ResultStore`. Every calculation appends
//! one row to `scores`; rows are never updated, so repeated calculations for
//! the same candidate produce independent records.
use anyhow::{Context, anyhow};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

use super::ResultStore;
use crate::model::{ScoreId, ScoreResult};

/// SQLite-based persistence backend for score results.
///
/// Provides:
///
///   - schema creation on startup
///   - append-only inserts with store-assigned ids (`persist`)
///   - lookups by id and by candidate
pub struct SQLiteResultStore {
    pool: SqlitePool,
}

impl SQLiteResultStore {
    /// Wrap an existing pool. The caller is responsible for the schema
    /// (see [`SQLiteResultStore::migrate`]).
    pub fn from_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Connect to `url` and ensure the schema exists.
    pub async fn new(url: &str) -> anyhow::Result<Self> {
        let pool = SqlitePool::connect(url)
            .await
            .with_context(|| format!("failed to open score database at {url}"))?;

        let store = Self { pool };
        store.migrate().await?;
        Ok(store)
    }

    /// Creates the `scores` table if it does not exist.
    pub async fn migrate(&self) -> anyhow::Result<()> {
        sqlx::query(
            r#"
CREATE TABLE IF NOT EXISTS scores (
  id INTEGER PRIMARY KEY AUTOINCREMENT,
  candidate_id TEXT NOT NULL,
  score_value REAL NOT NULL,
  total_questions INTEGER NOT NULL,
  correct_answers INTEGER NOT NULL,
  calculated_at TEXT NOT NULL,
  async_calculation INTEGER NOT NULL CHECK (async_calculation IN (0,1))
);
"#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_scores_candidate ON scores (candidate_id);")
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[async_trait]
impl ResultStore for SQLiteResultStore {
    async fn persist(&self, result: ScoreResult) -> anyhow::Result<ScoreResult> {
        if let Some(id) = result.id {
            return Err(anyhow!("score {id} is already persisted"));
        }

        let done = sqlx::query(
            r#"
INSERT INTO scores (
  candidate_id, score_value, total_questions, correct_answers,
  calculated_at, async_calculation
)
VALUES (?, ?, ?, ?, ?, ?);
"#,
        )
        .bind(&result.candidate_id)
        .bind(result.score_value)
        .bind(result.total_questions)
        .bind(result.correct_answers)
        .bind(result.calculated_at.to_rfc3339())
        .bind(result.async_calculation as i64)
        .execute(&self.pool)
        .await
        .context("failed to insert score")?;

        Ok(ScoreResult {
            id: Some(done.last_insert_rowid()),
            ..result
        })
    }

    async fn find_by_id(&self, id: ScoreId) -> anyhow::Result<Option<ScoreResult>> {
        let row = sqlx::query(
            r#"
SELECT id, candidate_id, score_value, total_questions, correct_answers,
       calculated_at, async_calculation
FROM scores
WHERE id = ?;
"#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(row_to_result).transpose()
    }

    async fn find_by_candidate(&self, candidate_id: &str) -> anyhow::Result<Vec<ScoreResult>> {
        let rows = sqlx::query(
            r#"
SELECT id, candidate_id, score_value, total_questions, correct_answers,
       calculated_at, async_calculation
FROM scores
WHERE candidate_id = ?
ORDER BY id;
"#,
        )
        .bind(candidate_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_result).collect()
    }

    async fn count(&self) -> anyhow::Result<u64> {
        let n: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM scores")
            .fetch_one(&self.pool)
            .await?;
        Ok(n as u64)
    }
}

/* =========================
Row mapping
========================= */

fn row_to_result(r: &SqliteRow) -> anyhow::Result<ScoreResult> {
    let calculated_at: String = r.get("calculated_at");
    let calculated_at = DateTime::parse_from_rfc3339(&calculated_at)
        .with_context(|| format!("invalid calculated_at '{calculated_at}'"))?
        .with_timezone(&Utc);

    let async_flag: i64 = r.get("async_calculation");

    Ok(ScoreResult {
        id: Some(r.get::<i64, _>("id")),
        candidate_id: r.get("candidate_id"),
        score_value: r.get("score_value"),
        total_questions: r.get("total_questions"),
        correct_answers: r.get("correct_answers"),
        calculated_at,
        async_calculation: async_flag == 1,
    })
}
