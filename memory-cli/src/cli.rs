//! Top-level `clap` argument definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use uuid::Uuid;

use crate::output::OutputFormat;

#[derive(Debug, Parser)]
#[command(name = "memory-cli", about = "Hierarchical memory and task orchestrator runtime", version)]
pub struct Cli {
    /// Workspace directory holding the persistence store and identity
    /// documents. Defaults to the platform data directory.
    #[arg(long, global = true)]
    pub workspace: Option<PathBuf>,

    /// Path to an optional TOML config file. Defaults to the platform
    /// config directory.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Output rendering.
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Human)]
    pub format: OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Record and inspect conversational episodes.
    #[command(subcommand)]
    Episode(EpisodeCommand),

    /// Search and summarize extracted facts.
    #[command(subcommand)]
    Fact(FactCommand),

    /// Route a query through the Facts/Semantic recall engine.
    Recall {
        /// The query text.
        query: String,
        /// Maximum number of results.
        #[arg(long, default_value_t = 5)]
        limit: usize,
    },

    /// Parse and validate schedule expressions.
    #[command(subcommand)]
    Schedule(ScheduleCommand),

    /// Manage autonomous scheduled tasks.
    #[command(subcommand)]
    Task(TaskCommand),

    /// Inspect identity/profile/preferences documents.
    #[command(subcommand)]
    Identity(IdentityCommand),
}

#[derive(Debug, Subcommand)]
pub enum EpisodeCommand {
    /// Record one (user, agent) exchange through the full memory pipeline.
    Record {
        #[arg(long)]
        user: String,
        #[arg(long)]
        agent: String,
    },
    /// Render the layered context block that would be injected into the
    /// next prompt.
    Context {
        #[arg(long)]
        max_tokens: Option<usize>,
    },
}

#[derive(Debug, Subcommand)]
pub enum FactCommand {
    /// Substring-search facts by content, optionally filtered by type.
    Search {
        #[arg(long)]
        text: Option<String>,
        /// One of the closed fact type names (e.g. `appointment`, `code`).
        #[arg(long = "type")]
        fact_type: Option<String>,
        #[arg(long, default_value_t = 0.0)]
        min_importance: f32,
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },
    /// Aggregate counts and average importance across all stored facts.
    Stats,
}

#[derive(Debug, Subcommand)]
pub enum ScheduleCommand {
    /// Parse a schedule expression and print the canonical trigger plus the
    /// next fire time, without creating a task.
    Parse { expression: String },
}

#[derive(Debug, Subcommand)]
pub enum TaskCommand {
    /// Register a new scheduled task.
    Create {
        #[arg(long)]
        name: String,
        #[arg(long)]
        schedule: String,
        #[arg(long)]
        template: String,
        /// Repeated `key=value` template configuration pairs.
        #[arg(long = "config", value_parser = parse_key_val)]
        config: Vec<(String, String)>,
    },
    /// List every scheduled task, annotated with its next run time.
    List,
    /// Delete a task and every execution logged against it.
    Delete { id: Uuid },
    /// Run a task immediately, ignoring `next_run`.
    ForceRun { id: Uuid },
    /// Run one scheduler tick: execute every task that is currently due.
    Tick,
}

#[derive(Debug, Subcommand)]
pub enum IdentityCommand {
    /// Print a canonical identity document (`identity`, `user-profile`, or
    /// `preferences`).
    Show { kind: String },
}

fn parse_key_val(s: &str) -> Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got '{s}'"))?;
    Ok((key.to_string(), value.to_string()))
}
