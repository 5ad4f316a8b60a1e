use clap::Parser;
use tracing::Instrument;

use common::logger::{TraceId, init_logger, root_span};
use scoring_backend::{app, cli::Cli, config::AppConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let cfg = AppConfig::from_env();

    init_logger("scoring-backend", cfg.log_format);
    cfg.log_warnings();
    tracing::info!("Starting scoring backend...");

    let trace_id = TraceId::new();
    let output = app::run(cli, cfg)
        .instrument(root_span("command", &trace_id))
        .await?;

    println!("{output}");
    Ok(())
}
