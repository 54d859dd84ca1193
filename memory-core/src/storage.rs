//! The `PersistenceStore` contract (spec §4.A), storage-backend agnostic.
//!
//! `memory-core` depends only on this trait; `memory-storage-redb` is the
//! concrete embedded implementation. Every method is fallible and async so a
//! networked or WASM-hosted backend could implement the same trait without
//! changing a single caller.

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::Result;
use crate::types::{
    ConversationSummary, Episode, Fact, FactType, ScheduledTask, SemanticRecord, Session,
    Summary, TaskExecution,
};

/// A search request against the Facts Store.
#[derive(Debug, Clone, Default)]
pub struct FactQuery {
    /// Substring match against fact content (case-insensitive), if any.
    pub text: Option<String>,
    /// Restrict to a single fact type, if any.
    pub fact_type: Option<FactType>,
    /// Restrict to a single session, if any.
    pub session_id: Option<Uuid>,
    /// Only return facts with importance >= this threshold.
    pub min_importance: f32,
    /// Maximum rows returned, ranked by `(importance DESC, timestamp DESC)`.
    pub limit: usize,
}

/// Aggregate counts returned by [`PersistenceStore::fact_stats`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FactStats {
    /// Total number of facts stored.
    pub total: u64,
    /// Count broken down per fact type, in [`FactType::all`] order.
    pub by_type: Vec<(FactType, u64)>,
    /// Average importance across all facts, `0.0` if none exist.
    pub average_importance: f32,
}

/// Durable storage for every data-model type in [`crate::types`].
///
/// Implementors must make each individual method transactionally atomic but
/// need not provide cross-method transactions: callers compose multiple
/// calls and tolerate partial failure per the propagation policy in spec §7.
#[async_trait]
pub trait PersistenceStore: Send + Sync {
    /// Persist a session record. Idempotent on `session.id`.
    async fn put_session(&self, session: &Session) -> Result<()>;
    /// Fetch a session by id.
    async fn get_session(&self, id: Uuid) -> Result<Option<Session>>;

    /// Persist an episode, inserting or overwriting by `episode.id`.
    async fn put_episode(&self, episode: &Episode) -> Result<()>;
    /// Fetch an episode by id.
    async fn get_episode(&self, id: Uuid) -> Result<Option<Episode>>;
    /// List episodes still marked `in_buffer` for a session, oldest first.
    async fn list_episodes_in_buffer(&self, session_id: Uuid) -> Result<Vec<Episode>>;

    /// Persist a buffer/rolling summary.
    async fn put_summary(&self, summary: &Summary) -> Result<()>;
    /// List the most recent summaries for a session, newest first.
    async fn list_summaries(&self, session_id: Uuid, limit: usize) -> Result<Vec<Summary>>;

    /// Persist a rich end-of-session conversation summary.
    async fn put_conversation_summary(&self, summary: &ConversationSummary) -> Result<()>;
    /// Fetch the most recently created conversation summary, if any.
    async fn get_latest_conversation_summary(&self) -> Result<Option<ConversationSummary>>;
    /// List conversation summaries, newest first, up to `limit`.
    async fn list_conversation_summaries(&self, limit: usize) -> Result<Vec<ConversationSummary>>;

    /// Insert a fact. Always appends a new row: facts reinforce, they never
    /// overwrite (spec §4.C).
    async fn insert_fact(&self, fact: &Fact) -> Result<()>;
    /// Search facts, ranked `(importance DESC, timestamp DESC)`.
    async fn search_facts(&self, query: &FactQuery) -> Result<Vec<Fact>>;
    /// Record that a fact was returned by a search: bump `access_count` and
    /// set `last_accessed` to now.
    async fn touch_fact(&self, id: Uuid) -> Result<()>;
    /// Aggregate statistics across all stored facts.
    async fn fact_stats(&self) -> Result<FactStats>;

    /// Insert or reinforce a semantic record. If a record with the same
    /// `fingerprint` already exists, bump its `access_count`/timestamp
    /// instead of inserting a duplicate (spec §9 dedupe-with-reinforcement).
    async fn upsert_semantic_record(&self, record: &SemanticRecord) -> Result<()>;
    /// List every semantic record, for in-process similarity scoring.
    async fn list_semantic_records(&self) -> Result<Vec<SemanticRecord>>;
    /// Delete semantic records by id, used by `prune`.
    async fn delete_semantic_records(&self, ids: &[Uuid]) -> Result<()>;

    /// Persist a scheduled task, inserting or overwriting by `task.id`.
    async fn put_scheduled_task(&self, task: &ScheduledTask) -> Result<()>;
    /// Fetch a scheduled task by id.
    async fn get_scheduled_task(&self, id: Uuid) -> Result<Option<ScheduledTask>>;
    /// List every scheduled task, enabled and disabled alike.
    async fn list_scheduled_tasks(&self) -> Result<Vec<ScheduledTask>>;
    /// Delete a scheduled task and cascade-delete every execution logged
    /// against it.
    async fn delete_scheduled_task(&self, id: Uuid) -> Result<()>;

    /// Append (or overwrite, for completion updates) a task execution row.
    async fn put_task_execution(&self, execution: &TaskExecution) -> Result<()>;
    /// List executions for a task, newest first, up to `limit`.
    async fn list_task_executions(&self, task_id: Uuid, limit: usize) -> Result<Vec<TaskExecution>>;
    /// List every execution still missing `completed_at`, used at startup to
    /// mark crash-interrupted executions (spec §4.J, §8 property 7).
    async fn list_incomplete_task_executions(&self) -> Result<Vec<TaskExecution>>;
}
