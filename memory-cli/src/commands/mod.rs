//! Dispatches parsed `Commands` to their implementations.

mod episode;
mod fact;
mod identity;
mod recall;
mod schedule;
mod task;

use anyhow::Result;

use crate::cli::Commands;
use crate::output::OutputFormat;
use crate::runtime::Runtime;

/// Run one parsed command to completion.
pub async fn dispatch(command: Commands, runtime: Runtime, format: OutputFormat) -> Result<()> {
    match command {
        Commands::Episode(cmd) => episode::run(cmd, runtime, format).await,
        Commands::Fact(cmd) => fact::run(cmd, runtime, format).await,
        Commands::Recall { query, limit } => recall::run(&query, limit, runtime, format).await,
        Commands::Schedule(cmd) => schedule::run(cmd, runtime, format).await,
        Commands::Task(cmd) => task::run(cmd, runtime, format).await,
        Commands::Identity(cmd) => identity::run(cmd, runtime, format).await,
    }
}
