use chrono::Utc;
use sqlx::SqlitePool;
use sqlx::sqlite::SqlitePoolOptions;
use std::sync::Arc;
use uuid::Uuid;

use scoring::model::ScoreResult;
use scoring::store::ResultStore;
use scoring::store::sqlite_store::SQLiteResultStore;
use scoring::{ScoreRequest, ScoringEngineBuilder};

/// Isolated, uniquely named in-memory database per test. Shared cache lets
/// every pooled connection see the same tables.
async fn setup_store() -> SQLiteResultStore {
    let db_name = Uuid::new_v4().to_string();
    let url = format!("sqlite:file:{db_name}?mode=memory&cache=shared");

    let pool: SqlitePool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect(&url)
        .await
        .unwrap();

    let store = SQLiteResultStore::from_pool(pool);
    store.migrate().await.unwrap();
    store
}

fn unsaved(candidate: &str, total: i32, correct: i32, is_async: bool) -> ScoreResult {
    ScoreResult {
        id: None,
        candidate_id: candidate.into(),
        score_value: correct as f64 * 100.0 / total as f64,
        total_questions: total,
        correct_answers: correct,
        calculated_at: Utc::now(),
        async_calculation: is_async,
    }
}

#[tokio::test]
async fn persist_assigns_id_and_round_trips() -> anyhow::Result<()> {
    let store = setup_store().await;

    let saved = store.persist(unsaved("c1", 3, 1, true)).await?;
    let id = saved.id.expect("id assigned");

    let loaded = store.find_by_id(id).await?.expect("row exists");
    assert_eq!(loaded.candidate_id, "c1");
    assert_eq!(loaded.score_value, 100.0 / 3.0);
    assert_eq!(loaded.total_questions, 3);
    assert_eq!(loaded.correct_answers, 1);
    assert!(loaded.async_calculation);
    assert_eq!(
        loaded.calculated_at.timestamp_micros(),
        saved.calculated_at.timestamp_micros()
    );

    Ok(())
}

#[tokio::test]
async fn persist_rejects_already_persisted_results() -> anyhow::Result<()> {
    let store = setup_store().await;

    let saved = store.persist(unsaved("c1", 2, 2, false)).await?;
    assert!(store.persist(saved).await.is_err());
    assert_eq!(store.count().await?, 1);

    Ok(())
}

#[tokio::test]
async fn find_by_candidate_is_ordered_and_filtered() -> anyhow::Result<()> {
    let store = setup_store().await;

    let a = store.persist(unsaved("c1", 10, 1, false)).await?;
    store.persist(unsaved("c2", 10, 2, false)).await?;
    let b = store.persist(unsaved("c1", 10, 3, true)).await?;

    let rows = store.find_by_candidate("c1").await?;
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].id, a.id);
    assert_eq!(rows[1].id, b.id);

    assert!(store.find_by_candidate("nobody").await?.is_empty());
    assert_eq!(store.find_by_id(9_999).await?, None);
    assert_eq!(store.count().await?, 3);

    Ok(())
}

#[tokio::test]
async fn engine_persists_through_sqlite() -> anyhow::Result<()> {
    let store = Arc::new(setup_store().await);
    let engine = ScoringEngineBuilder::new(store.clone()).build();

    let sync = engine.run_sync(&ScoreRequest::new("c1", 10, 7)).await?;
    let asynchronous = engine.run_async(ScoreRequest::new("c1", 10, 7)).await?;
    let failed = engine.run_sync(&ScoreRequest::new("c3", 4, 9)).await;

    assert!(failed.is_err());
    assert_ne!(sync.id, asynchronous.id);

    let rows = store.find_by_candidate("c1").await?;
    assert_eq!(rows.len(), 2);
    assert!(!rows[0].async_calculation);
    assert!(rows[1].async_calculation);
    assert!(store.find_by_candidate("c3").await?.is_empty());

    Ok(())
}

#[tokio::test]
async fn new_creates_schema_on_fresh_database() -> anyhow::Result<()> {
    let url = format!("sqlite:file:{}?mode=memory&cache=shared", Uuid::new_v4());
    let store = SQLiteResultStore::new(&url).await?;

    assert_eq!(store.count().await?, 0);
    store.persist(unsaved("c9", 1, 0, false)).await?;
    assert_eq!(store.count().await?, 1);

    Ok(())
}
