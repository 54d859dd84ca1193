//! Crash recovery for executions left open by a process that died mid-tick
//! (spec §4.J Recovery).

use memory_core::error::Result;
use memory_core::storage::PersistenceStore;
use tracing::{info, instrument, warn};

/// Mark every [`memory_core::types::TaskExecution`] row with no
/// `completed_at` as interrupted, and fix up the owning
/// [`memory_core::types::ScheduledTask`]'s failure count so
/// `counts_consistent()` holds again. Called once at orchestrator startup,
/// before the tick loop begins.
#[instrument(skip(persistence))]
pub async fn recover_interrupted(persistence: &dyn PersistenceStore) -> Result<()> {
    let incomplete = persistence.list_incomplete_task_executions().await?;
    if incomplete.is_empty() {
        return Ok(());
    }
    info!(count = incomplete.len(), "recovering interrupted task executions");

    for mut execution in incomplete {
        execution.complete(false, None, Some("interrupted".to_string()));
        persistence.put_task_execution(&execution).await?;

        match persistence.get_scheduled_task(execution.task_id).await? {
            Some(mut task) => {
                task.failure_count += 1;
                persistence.put_scheduled_task(&task).await?;
            }
            None => {
                warn!(
                    task_id = %execution.task_id,
                    "interrupted execution references a task that no longer exists"
                );
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use memory_storage_redb::RedbStore;
    use memory_core::types::{ScheduledTask, TaskExecution};
    use std::collections::BTreeMap;
    use chrono::Utc;
    use uuid::Uuid;

    #[tokio::test]
    async fn marks_incomplete_executions_interrupted_and_fixes_counts() {
        let dir = tempfile::tempdir().unwrap();
        let store = RedbStore::open(&dir.path().join("mem.redb")).await.unwrap();

        let task = ScheduledTask {
            id: Uuid::new_v4(),
            display_name: "t".to_string(),
            schedule_expression: "@daily".to_string(),
            template_name: "noop".to_string(),
            template_config: BTreeMap::new(),
            enabled: true,
            created_at: Utc::now(),
            last_run: Some(Utc::now()),
            next_run: None,
            run_count: 1,
            success_count: 0,
            failure_count: 0,
        };
        store.put_scheduled_task(&task).await.unwrap();

        let orphaned = TaskExecution::start(task.id);
        store.put_task_execution(&orphaned).await.unwrap();

        recover_interrupted(&store).await.unwrap();

        let executions = store.list_task_executions(task.id, 10).await.unwrap();
        assert_eq!(executions.len(), 1);
        assert!(!executions[0].success);
        assert_eq!(executions[0].error_message.as_deref(), Some("interrupted"));
        assert!(executions[0].completed_at.is_some());

        let updated = store.get_scheduled_task(task.id).await.unwrap().unwrap();
        assert_eq!(updated.failure_count, 1);
        assert!(updated.counts_consistent());

        assert!(store
            .list_incomplete_task_executions()
            .await
            .unwrap()
            .is_empty());
    }
}
