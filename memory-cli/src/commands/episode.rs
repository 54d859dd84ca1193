use anyhow::Result;
use serde::Serialize;

use crate::cli::EpisodeCommand;
use crate::output::{Output, OutputFormat};
use crate::runtime::Runtime;

#[derive(Serialize)]
struct RecordResult {
    episode_id: uuid::Uuid,
}

impl Output for RecordResult {
    fn write_human<W: std::io::Write>(&self, mut writer: W) -> anyhow::Result<()> {
        writeln!(writer, "recorded episode {}", self.episode_id)?;
        Ok(())
    }
}

#[derive(Serialize)]
struct ContextResult {
    context: String,
}

impl Output for ContextResult {
    fn write_human<W: std::io::Write>(&self, mut writer: W) -> anyhow::Result<()> {
        writeln!(writer, "{}", self.context)?;
        Ok(())
    }
}

pub async fn run(command: EpisodeCommand, runtime: Runtime, format: OutputFormat) -> Result<()> {
    let manager = runtime.manager().await?;
    match command {
        EpisodeCommand::Record { user, agent } => {
            let episode_id = manager.record_exchange(&user, &agent).await?;
            format.print(&RecordResult { episode_id })?;
        }
        EpisodeCommand::Context { max_tokens } => {
            let context = manager.context_for_prompt(max_tokens).await?;
            format.print(&ContextResult { context })?;
        }
    }
    Ok(())
}
