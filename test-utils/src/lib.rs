//! Shared fixtures and temp-workspace helpers for `memory-core`,
//! `memory-storage-redb`, and `task-orchestrator` tests.
//!
//! Provides deterministic builders for every record type in
//! [`memory_core::types`] plus a [`temp_workspace`] helper for isolating
//! filesystem-backed tests.

use std::collections::BTreeMap;

use chrono::Utc;
use memory_core::types::{
    Episode, Exchange, Fact, FactType, ScheduledTask, Session, TaskExecution,
};
use uuid::Uuid;

/// Create a fresh, isolated temp directory for workspace-rooted tests.
///
/// # Panics
///
/// Panics if a temp directory cannot be created (out of disk space or no
/// writable tmp location), which should never happen in CI.
#[must_use]
pub fn temp_workspace() -> tempfile::TempDir {
    tempfile::tempdir().expect("failed to create temp workspace")
}

/// Build a session with a fixed name, useful when tests need a stable id.
#[must_use]
pub fn make_session(name: &str) -> Session {
    Session::new(Some(name.to_string()))
}

/// Build an exchange with the given texts.
#[must_use]
pub fn make_exchange(user_text: &str, agent_text: &str) -> Exchange {
    Exchange {
        user_text: user_text.to_string(),
        agent_text: agent_text.to_string(),
    }
}

/// Build an episode belonging to `session_id` at `exchange_number`.
#[must_use]
pub fn make_episode(session_id: Uuid, exchange_number: u64, user_text: &str, agent_text: &str) -> Episode {
    let exchange = make_exchange(user_text, agent_text);
    Episode::new(session_id, exchange_number, &exchange, user_text.to_string(), 0.5)
}

/// Build a fact of `fact_type` with reasonable defaults, for tests that only
/// care about one or two fields.
#[must_use]
pub fn make_fact(fact_type: FactType, content: &str, session_id: Uuid, episode_id: Uuid) -> Fact {
    Fact {
        id: Uuid::new_v4(),
        fact_type,
        content: content.to_string(),
        context: content.to_string(),
        importance: 0.5,
        access_count: 0,
        timestamp: Utc::now(),
        last_accessed: None,
        session_id,
        episode_id,
        tags: Default::default(),
        metadata: BTreeMap::new(),
        fingerprint: format!("{:x}", md5_stub(content)),
    }
}

/// A deterministic, dependency-free stand-in hash used only to give test
/// facts distinct fingerprints; production code uses `sha2` (see
/// `memory-core`'s fact extractor).
fn md5_stub(content: &str) -> u64 {
    content.bytes().fold(0u64, |acc, b| acc.wrapping_mul(31).wrapping_add(b as u64))
}

/// Build an enabled scheduled task with no recorded runs yet.
#[must_use]
pub fn make_scheduled_task(display_name: &str, schedule_expression: &str, template_name: &str) -> ScheduledTask {
    ScheduledTask {
        id: Uuid::new_v4(),
        display_name: display_name.to_string(),
        schedule_expression: schedule_expression.to_string(),
        template_name: template_name.to_string(),
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

/// Build a completed task execution for `task_id`.
#[must_use]
pub fn make_task_execution(task_id: Uuid, success: bool) -> TaskExecution {
    let mut execution = TaskExecution::start(task_id);
    execution.complete(
        success,
        success.then(|| "ok".to_string()),
        (!success).then(|| "failed".to_string()),
    );
    execution
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn make_episode_carries_through_texts() {
        let session = make_session("test");
        let episode = make_episode(session.id, 0, "hello", "hi there");
        assert_eq!(episode.user_text, "hello");
        assert_eq!(episode.agent_text, "hi there");
        assert_eq!(episode.session_id, session.id);
    }

    #[test]
    fn make_scheduled_task_defaults_to_enabled_and_unrun() {
        let task = make_scheduled_task("digest", "@daily", "digest");
        assert!(task.enabled);
        assert_eq!(task.run_count, 0);
        assert!(task.next_run.is_none());
    }

    #[test]
    fn make_task_execution_reflects_outcome() {
        let id = Uuid::new_v4();
        let ok = make_task_execution(id, true);
        assert!(ok.success);
        assert!(ok.error_message.is_none());
        let failed = make_task_execution(id, false);
        assert!(!failed.success);
        assert!(failed.error_message.is_some());
    }
}
