use std::collections::BTreeMap;

use anyhow::{anyhow, Result};
use chrono::Utc;
use memory_core::schedule;
use memory_core::storage::PersistenceStore;
use memory_core::types::ScheduledTask;
use serde::Serialize;
use uuid::Uuid;

use crate::cli::TaskCommand;
use crate::output::{Output, OutputFormat};
use crate::runtime::Runtime;

#[derive(Serialize)]
struct TaskView {
    id: Uuid,
    display_name: String,
    schedule_expression: String,
    template_name: String,
    enabled: bool,
    next_run: Option<chrono::DateTime<Utc>>,
    run_count: u64,
    success_count: u64,
    failure_count: u64,
}

impl From<&ScheduledTask> for TaskView {
    fn from(task: &ScheduledTask) -> Self {
        Self {
            id: task.id,
            display_name: task.display_name.clone(),
            schedule_expression: task.schedule_expression.clone(),
            template_name: task.template_name.clone(),
            enabled: task.enabled,
            next_run: task.next_run,
            run_count: task.run_count,
            success_count: task.success_count,
            failure_count: task.failure_count,
        }
    }
}

#[derive(Serialize)]
struct TaskList {
    tasks: Vec<TaskView>,
}

impl Output for TaskList {
    fn write_human<W: std::io::Write>(&self, mut writer: W) -> anyhow::Result<()> {
        if self.tasks.is_empty() {
            writeln!(writer, "no scheduled tasks")?;
            return Ok(());
        }
        for task in &self.tasks {
            writeln!(
                writer,
                "{} {:<20} {:<24} next={} runs={}/{}/{} enabled={}",
                task.id,
                task.display_name,
                task.schedule_expression,
                task.next_run.map(|t| t.to_rfc3339()).unwrap_or_else(|| "-".to_string()),
                task.success_count,
                task.failure_count,
                task.run_count,
                task.enabled,
            )?;
        }
        Ok(())
    }
}

impl Output for TaskView {
    fn write_human<W: std::io::Write>(&self, mut writer: W) -> anyhow::Result<()> {
        writeln!(writer, "created task {} ({})", self.id, self.display_name)?;
        Ok(())
    }
}

#[derive(Serialize)]
struct ExecutionView {
    success: bool,
    output: Option<String>,
    error_message: Option<String>,
}

impl Output for ExecutionView {
    fn write_human<W: std::io::Write>(&self, mut writer: W) -> anyhow::Result<()> {
        if self.success {
            writeln!(writer, "success: {}", self.output.as_deref().unwrap_or(""))?;
        } else {
            writeln!(writer, "failed: {}", self.error_message.as_deref().unwrap_or("unknown error"))?;
        }
        Ok(())
    }
}

#[derive(Serialize)]
struct DeleteResult {
    id: Uuid,
}

impl Output for DeleteResult {
    fn write_human<W: std::io::Write>(&self, mut writer: W) -> anyhow::Result<()> {
        writeln!(writer, "deleted task {} and its executions", self.id)?;
        Ok(())
    }
}

#[derive(Serialize)]
struct TickResult {
    executed: usize,
}

impl Output for TickResult {
    fn write_human<W: std::io::Write>(&self, mut writer: W) -> anyhow::Result<()> {
        writeln!(writer, "tick complete ({} due task(s) considered)", self.executed)?;
        Ok(())
    }
}

pub async fn run(command: TaskCommand, runtime: Runtime, format: OutputFormat) -> Result<()> {
    match command {
        TaskCommand::Create { name, schedule: expr, template, config } => {
            let trigger = schedule::parse(&expr, &runtime.config.timezone)
                .ok_or_else(|| anyhow!("'{expr}' is not a recognized schedule expression"))?;
            let next_run = schedule::next_fire(&trigger, Utc::now())?;
            let task = ScheduledTask {
                id: Uuid::new_v4(),
                display_name: name,
                schedule_expression: expr,
                template_name: template,
                template_config: config.into_iter().collect::<BTreeMap<_, _>>(),
                enabled: true,
                created_at: Utc::now(),
                last_run: None,
                next_run: Some(next_run),
                run_count: 0,
                success_count: 0,
                failure_count: 0,
            };
            runtime.persistence.put_scheduled_task(&task).await?;
            format.print(&TaskView::from(&task))?;
        }
        TaskCommand::List => {
            let mut tasks = runtime.persistence.list_scheduled_tasks().await?;
            tasks.sort_by_key(|t| t.created_at);
            let tasks = tasks.iter().map(TaskView::from).collect();
            format.print(&TaskList { tasks })?;
        }
        TaskCommand::Delete { id } => {
            runtime.persistence.delete_scheduled_task(id).await?;
            format.print(&DeleteResult { id })?;
        }
        TaskCommand::ForceRun { id } => {
            let (orchestrator, _manager) = runtime.orchestrator().await?;
            let execution = orchestrator.force_run(id).await?;
            format.print(&ExecutionView {
                success: execution.success,
                output: execution.output,
                error_message: execution.error_message,
            })?;
        }
        TaskCommand::Tick => {
            let (orchestrator, _manager) = runtime.orchestrator().await?;
            let due = runtime
                .persistence
                .list_scheduled_tasks()
                .await?
                .iter()
                .filter(|t| t.enabled && t.next_run.is_none_or(|n| n <= Utc::now()))
                .count();
            orchestrator.tick().await?;
            format.print(&TickResult { executed: due })?;
        }
    }
    Ok(())
}
