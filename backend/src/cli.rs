use clap::{Args, Parser, Subcommand};

use scoring::ScoreRequest;

#[derive(Debug, Parser)]
#[clap(name = "scoring-backend", version)]
pub struct Cli {
    /// Overrides DATABASE_URL
    #[clap(long)]
    pub database_url: Option<String>,

    #[clap(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Calculate on the calling task and print the persisted score
    Sync(ScoreArgs),

    /// Schedule the calculation on the worker pool, print the acknowledgement
    /// and wait for the pool to drain before exiting
    Async(ScoreArgs),

    /// Print every stored score of a candidate
    History {
        #[clap(long)]
        candidate_id: String,
    },
}

#[derive(Debug, Args)]
pub struct ScoreArgs {
    #[clap(long)]
    pub candidate_id: String,

    /// Number of questions in the test
    #[clap(long)]
    pub total: i32,

    /// Number of correctly answered questions
    #[clap(long)]
    pub correct: i32,
}

impl From<ScoreArgs> for ScoreRequest {
    fn from(a: ScoreArgs) -> Self {
        ScoreRequest::new(a.candidate_id, a.total, a.correct)
    }
}
