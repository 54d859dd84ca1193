use anyhow::{anyhow, Result};
use chrono::Utc;
use memory_core::schedule;
use serde::Serialize;

use crate::cli::ScheduleCommand;
use crate::output::{Output, OutputFormat};
use crate::runtime::Runtime;

#[derive(Serialize)]
struct ParseResult {
    kind: &'static str,
    value: String,
    tz: String,
    next_run: chrono::DateTime<Utc>,
}

impl Output for ParseResult {
    fn write_human<W: std::io::Write>(&self, mut writer: W) -> anyhow::Result<()> {
        writeln!(writer, "kind: {}", self.kind)?;
        writeln!(writer, "value: {}", self.value)?;
        writeln!(writer, "tz: {}", self.tz)?;
        writeln!(writer, "next run: {}", self.next_run)?;
        Ok(())
    }
}

pub async fn run(command: ScheduleCommand, runtime: Runtime, format: OutputFormat) -> Result<()> {
    let ScheduleCommand::Parse { expression } = command;
    let trigger = schedule::parse(&expression, &runtime.config.timezone)
        .ok_or_else(|| anyhow!("'{expression}' is not a recognized schedule expression"))?;
    let next_run = schedule::next_fire(&trigger, Utc::now())?;
    format.print(&ParseResult {
        kind: match trigger.kind {
            memory_core::types::TriggerKind::Cron => "cron",
            memory_core::types::TriggerKind::Interval => "interval",
        },
        value: trigger.value,
        tz: trigger.tz,
        next_run,
    })?;
    Ok(())
}
