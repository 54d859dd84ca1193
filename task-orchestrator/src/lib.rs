//! Autonomous task scheduler (spec §4.J): a single tick-loop worker that
//! dispatches due [`memory_core::types::ScheduledTask`]s to named templates
//! and folds every result back into the memory system.
//!
//! This crate owns `ScheduledTask` state exclusively; every other component
//! only reads it through [`memory_core::storage::PersistenceStore`]. The
//! orchestrator is storage- and memory-manager-agnostic: it depends on
//! [`PersistenceStore`] for durability, [`TemplateRegistry`] for template
//! dispatch, and [`ExchangeSink`] to emit result memories, so it can be
//! wired against any concrete implementation of the three.

mod recovery;
mod registry;
mod sink;

pub use recovery::recover_interrupted;
pub use registry::{TemplateOutput, TemplateRegistry};
pub use sink::ExchangeSink;

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use memory_core::config::{Config, DEFAULT_SCHEDULER_BACKOFF_SECONDS};
use memory_core::error::{Error, Result, TemplateErrorKind};
use memory_core::schedule;
use memory_core::storage::PersistenceStore;
use memory_core::types::{ScheduledTask, TaskExecution};
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

/// The autonomous scheduler. Owns no state of its own beyond its
/// collaborators; all durable state lives in the persistence store.
pub struct Orchestrator {
    persistence: Arc<dyn PersistenceStore>,
    templates: Arc<dyn TemplateRegistry>,
    sink: Arc<dyn ExchangeSink>,
    config: Config,
}

impl Orchestrator {
    /// Wire up a new orchestrator. Does not start the tick loop; call
    /// [`Orchestrator::run`] for that.
    #[must_use]
    pub fn new(
        persistence: Arc<dyn PersistenceStore>,
        templates: Arc<dyn TemplateRegistry>,
        sink: Arc<dyn ExchangeSink>,
        config: Config,
    ) -> Self {
        Self {
            persistence,
            templates,
            sink,
            config,
        }
    }

    /// Run the tick loop until `shutdown` resolves. Recovers any
    /// crash-interrupted executions first (spec §4.J Recovery), then loops
    /// on `config.scheduler_tick_seconds`, backing off to
    /// `DEFAULT_SCHEDULER_BACKOFF_SECONDS` whenever a tick itself errors.
    #[instrument(skip_all)]
    pub async fn run(&self, mut shutdown: tokio::sync::oneshot::Receiver<()>) {
        if let Err(e) = recover_interrupted(self.persistence.as_ref()).await {
            error!(error = %e, "startup recovery of interrupted task executions failed");
        }

        let mut interval_secs = self.config.scheduler_tick_seconds;
        loop {
            let sleep = tokio::time::sleep(Duration::from_secs(interval_secs));
            tokio::select! {
                () = sleep => {}
                _ = &mut shutdown => {
                    info!("scheduler tick loop shutting down");
                    return;
                }
            }

            match self.tick().await {
                Ok(()) => interval_secs = self.config.scheduler_tick_seconds,
                Err(e) => {
                    error!(error = %e, "scheduler tick failed, backing off");
                    interval_secs = DEFAULT_SCHEDULER_BACKOFF_SECONDS;
                }
            }
        }
    }

    /// Run one tick: execute every enabled task whose `next_run` has
    /// arrived. Errors from individual task executions are caught and
    /// logged inside [`Self::execute_task`]; this only returns `Err` for a
    /// failure to even list tasks.
    #[instrument(skip(self))]
    pub async fn tick(&self) -> Result<()> {
        let now = Utc::now();
        let tasks = self.persistence.list_scheduled_tasks().await?;
        for task in tasks {
            if !task.enabled {
                continue;
            }
            let due = task.next_run.is_none_or(|next| next <= now);
            if due {
                self.execute_task(task).await;
            }
        }
        Ok(())
    }

    /// Force-run a task immediately regardless of `next_run`, still writing
    /// every record the normal path would (spec §4.J CLI-level operations).
    #[instrument(skip(self))]
    pub async fn force_run(&self, task_id: Uuid) -> Result<TaskExecution> {
        let task = self
            .persistence
            .get_scheduled_task(task_id)
            .await?
            .ok_or(Error::NotFound(task_id))?;
        Ok(self.execute_task(task).await)
    }

    /// Execute the contract in spec §4.J: start → invoke → finalize →
    /// recompute `next_run` → emit a memory record. Never propagates a
    /// template failure to the caller; the outcome is captured in the
    /// returned [`TaskExecution`].
    async fn execute_task(&self, mut task: ScheduledTask) -> TaskExecution {
        let started_at = Utc::now();
        let mut execution = TaskExecution::start(task.id);
        execution.started_at = started_at;
        task.run_count += 1;
        task.last_run = Some(started_at);

        if let Err(e) = self.persistence.put_task_execution(&execution).await {
            warn!(task_id = %task.id, error = %e, "failed to persist task execution start marker");
        }

        let timeout = Duration::from_secs(self.config.template_timeout_seconds);
        let invocation = tokio::time::timeout(
            timeout,
            self.templates.invoke(&task.template_name, &task.template_config),
        )
        .await;

        let (success, output, error_message) = match invocation {
            Ok(Ok(result)) => (true, result.output, None),
            Ok(Err(e)) => (false, None, Some(e.to_string())),
            Err(_) => (
                false,
                None,
                Some(
                    Error::template(TemplateErrorKind::Timeout, "template execution timed out")
                        .to_string(),
                ),
            ),
        };

        if success {
            task.success_count += 1;
        } else {
            task.failure_count += 1;
        }
        execution.complete(success, output.clone(), error_message.clone());

        task.next_run = schedule::parse(&task.schedule_expression, &self.config.timezone)
            .and_then(|trigger| schedule::next_fire(&trigger, Utc::now()).ok());

        if let Err(e) = self.persistence.put_task_execution(&execution).await {
            warn!(task_id = %task.id, error = %e, "failed to persist task execution result");
        }
        if let Err(e) = self.persistence.put_scheduled_task(&task).await {
            warn!(task_id = %task.id, error = %e, "failed to persist task statistics");
        }

        let agent_summary = match (&output, &error_message) {
            (Some(text), _) => text.clone(),
            (None, Some(err)) => format!("failed: {err}"),
            (None, None) => "completed with no output".to_string(),
        };
        let user_line = format!(
            "[AUTONOMOUS TASK: {}] {}",
            task.display_name, task.schedule_expression
        );
        if let Err(e) = self.sink.record_exchange(user_line, agent_summary).await {
            warn!(task_id = %task.id, error = %e, "failed to emit task result memory record");
        }

        execution
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use memory_core::storage::{FactQuery, FactStats};
    use memory_core::types::{
        ConversationSummary, Episode, Fact, ScheduledTask, SemanticRecord, Session, Summary,
    };
    use parking_lot::Mutex;
    use std::collections::BTreeMap;

    #[derive(Default)]
    struct InMemoryStore {
        tasks: Mutex<BTreeMap<Uuid, ScheduledTask>>,
        executions: Mutex<Vec<TaskExecution>>,
    }

    #[async_trait]
    impl PersistenceStore for InMemoryStore {
        async fn put_session(&self, _: &Session) -> Result<()> {
            Ok(())
        }
        async fn get_session(&self, _: Uuid) -> Result<Option<Session>> {
            Ok(None)
        }
        async fn put_episode(&self, _: &Episode) -> Result<()> {
            Ok(())
        }
        async fn get_episode(&self, _: Uuid) -> Result<Option<Episode>> {
            Ok(None)
        }
        async fn list_episodes_in_buffer(&self, _: Uuid) -> Result<Vec<Episode>> {
            Ok(vec![])
        }
        async fn put_summary(&self, _: &Summary) -> Result<()> {
            Ok(())
        }
        async fn list_summaries(&self, _: Uuid, _: usize) -> Result<Vec<Summary>> {
            Ok(vec![])
        }
        async fn put_conversation_summary(&self, _: &ConversationSummary) -> Result<()> {
            Ok(())
        }
        async fn get_latest_conversation_summary(&self) -> Result<Option<ConversationSummary>> {
            Ok(None)
        }
        async fn list_conversation_summaries(&self, _: usize) -> Result<Vec<ConversationSummary>> {
            Ok(vec![])
        }
        async fn insert_fact(&self, _: &Fact) -> Result<()> {
            Ok(())
        }
        async fn search_facts(&self, _: &FactQuery) -> Result<Vec<Fact>> {
            Ok(vec![])
        }
        async fn touch_fact(&self, _: Uuid) -> Result<()> {
            Ok(())
        }
        async fn fact_stats(&self) -> Result<FactStats> {
            Ok(FactStats::default())
        }
        async fn upsert_semantic_record(&self, _: &SemanticRecord) -> Result<()> {
            Ok(())
        }
        async fn list_semantic_records(&self) -> Result<Vec<SemanticRecord>> {
            Ok(vec![])
        }
        async fn delete_semantic_records(&self, _: &[Uuid]) -> Result<()> {
            Ok(())
        }
        async fn put_scheduled_task(&self, task: &ScheduledTask) -> Result<()> {
            self.tasks.lock().insert(task.id, task.clone());
            Ok(())
        }
        async fn get_scheduled_task(&self, id: Uuid) -> Result<Option<ScheduledTask>> {
            Ok(self.tasks.lock().get(&id).cloned())
        }
        async fn list_scheduled_tasks(&self) -> Result<Vec<ScheduledTask>> {
            Ok(self.tasks.lock().values().cloned().collect())
        }
        async fn delete_scheduled_task(&self, id: Uuid) -> Result<()> {
            self.tasks.lock().remove(&id);
            Ok(())
        }
        async fn put_task_execution(&self, execution: &TaskExecution) -> Result<()> {
            let mut executions = self.executions.lock();
            if let Some(existing) = executions.iter_mut().find(|e| e.id == execution.id) {
                *existing = execution.clone();
            } else {
                executions.push(execution.clone());
            }
            Ok(())
        }
        async fn list_task_executions(&self, task_id: Uuid, limit: usize) -> Result<Vec<TaskExecution>> {
            let mut v: Vec<_> = self
                .executions
                .lock()
                .iter()
                .filter(|e| e.task_id == task_id)
                .cloned()
                .collect();
            v.truncate(limit);
            Ok(v)
        }
        async fn list_incomplete_task_executions(&self) -> Result<Vec<TaskExecution>> {
            Ok(self
                .executions
                .lock()
                .iter()
                .filter(|e| e.completed_at.is_none())
                .cloned()
                .collect())
        }
    }

    struct EchoTemplates;

    #[async_trait]
    impl TemplateRegistry for EchoTemplates {
        async fn invoke(
            &self,
            name: &str,
            _config: &BTreeMap<String, String>,
        ) -> Result<TemplateOutput> {
            if name == "fail" {
                return Err(Error::template(TemplateErrorKind::ExecutionFailure, "boom"));
            }
            Ok(TemplateOutput {
                output: Some(format!("ran {name}")),
            })
        }
    }

    #[derive(Default)]
    struct RecordingSink {
        recorded: Mutex<Vec<(String, String)>>,
    }

    #[async_trait]
    impl ExchangeSink for RecordingSink {
        async fn record_exchange(&self, user_text: String, agent_text: String) -> Result<Uuid> {
            self.recorded.lock().push((user_text, agent_text));
            Ok(Uuid::new_v4())
        }
    }

    fn make_task(name: &str, template: &str) -> ScheduledTask {
        ScheduledTask {
            id: Uuid::new_v4(),
            display_name: name.to_string(),
            schedule_expression: "every 5 minutes".to_string(),
            template_name: template.to_string(),
            template_config: BTreeMap::new(),
            enabled: true,
            created_at: Utc::now(),
            last_run: None,
            next_run: None,
            run_count: 0,
            success_count: 0,
            failure_count: 0,
        }
    }

    #[tokio::test]
    async fn successful_task_updates_counts_and_emits_memory() {
        let store = Arc::new(InMemoryStore::default());
        let sink = Arc::new(RecordingSink::default());
        let orchestrator = Orchestrator::new(
            store.clone(),
            Arc::new(EchoTemplates),
            sink.clone(),
            Config::default(),
        );

        let task = make_task("digest", "digest");
        store.put_scheduled_task(&task).await.unwrap();
        orchestrator.force_run(task.id).await.unwrap();

        let updated = store.get_scheduled_task(task.id).await.unwrap().unwrap();
        assert_eq!(updated.run_count, 1);
        assert_eq!(updated.success_count, 1);
        assert_eq!(updated.failure_count, 0);
        assert!(updated.next_run.is_some());
        assert_eq!(sink.recorded.lock().len(), 1);
    }

    #[tokio::test]
    async fn failing_task_increments_failure_count_without_aborting() {
        let store = Arc::new(InMemoryStore::default());
        let sink = Arc::new(RecordingSink::default());
        let orchestrator = Orchestrator::new(
            store.clone(),
            Arc::new(EchoTemplates),
            sink,
            Config::default(),
        );

        let task = make_task("broken", "fail");
        store.put_scheduled_task(&task).await.unwrap();
        let execution = orchestrator.force_run(task.id).await.unwrap();

        assert!(!execution.success);
        assert!(execution.error_message.is_some());
        let updated = store.get_scheduled_task(task.id).await.unwrap().unwrap();
        assert_eq!(updated.failure_count, 1);
        assert!(updated.counts_consistent());
    }

    #[tokio::test]
    async fn tick_skips_disabled_and_not_yet_due_tasks() {
        let store = Arc::new(InMemoryStore::default());
        let sink = Arc::new(RecordingSink::default());
        let orchestrator = Orchestrator::new(
            store.clone(),
            Arc::new(EchoTemplates),
            sink.clone(),
            Config::default(),
        );

        let mut disabled = make_task("disabled", "digest");
        disabled.enabled = false;
        let mut not_due = make_task("later", "digest");
        not_due.next_run = Some(Utc::now() + chrono::Duration::hours(1));

        store.put_scheduled_task(&disabled).await.unwrap();
        store.put_scheduled_task(&not_due).await.unwrap();
        orchestrator.tick().await.unwrap();

        assert!(sink.recorded.lock().is_empty());
    }
}
