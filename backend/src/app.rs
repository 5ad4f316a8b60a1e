use std::sync::Arc;

use anyhow::Context;
use tracing::{info, warn};

use scoring::store::ResultStore;
use scoring::store::sqlite_store::SQLiteResultStore;
use scoring::{ScoreApi, ScoreResponse, ScoringEngineBuilder};

use crate::cli::{Cli, Command};
use crate::config::AppConfig;

/// Opens the store and assembles the monitored engine behind the inbound API.
pub async fn init_api(cfg: &AppConfig) -> anyhow::Result<(ScoreApi, Arc<SQLiteResultStore>)> {
    let store = Arc::new(SQLiteResultStore::new(&cfg.database_url).await?);

    let engine = ScoringEngineBuilder::new(store.clone())
        .worker_pool_size(cfg.worker_pool_size)
        .build();

    info!(
        database_url = %cfg.database_url,
        worker_pool_size = engine.pool_size(),
        "scoring engine ready"
    );

    Ok((ScoreApi::new(Arc::new(engine)), store))
}

/// Executes one command and returns its JSON output.
pub async fn run(cli: Cli, mut cfg: AppConfig) -> anyhow::Result<String> {
    if let Some(url) = cli.database_url {
        cfg.database_url = url;
    }

    let (api, store) = init_api(&cfg).await?;

    let output = match cli.command {
        Command::Sync(args) => {
            let resp = api.request_sync(args.into()).await?;
            serde_json::to_string_pretty(&resp)?
        }

        Command::Async(args) => {
            let ack = api.request_async(args.into())?;

            tokio::select! {
                _ = api.engine().drain() => {}
                res = tokio::signal::ctrl_c() => {
                    res.context("failed to listen for shutdown signal")?;
                    warn!(
                        in_flight = api.engine().in_flight(),
                        "shutdown signal received; abandoning pending calculations"
                    );
                }
            }

            serde_json::to_string_pretty(&ack)?
        }

        Command::History { candidate_id } => {
            let rows: Vec<ScoreResponse> = store
                .find_by_candidate(&candidate_id)
                .await?
                .into_iter()
                .map(ScoreResponse::from)
                .collect();
            serde_json::to_string_pretty(&rows)?
        }
    };

    Ok(output)
}
