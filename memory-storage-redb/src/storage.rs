//! The embedded `redb` implementation of [`memory_core::storage::PersistenceStore`].
//!
//! Every record type gets its own table (see [`crate::tables`]), keyed by
//! the record's UUID and holding a `postcard`-encoded value. Flexible
//! lookups (fact search, incomplete-execution scan) are full-table scans:
//! this backend targets a single-user, embedded-assistant workload where a
//! scan over a few thousand rows is cheaper to build and reason about than a
//! secondary index.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use memory_core::error::{Error, Result, StorageErrorKind};
use memory_core::storage::{FactQuery, FactStats, PersistenceStore};
use memory_core::types::{
    ConversationSummary, Episode, Fact, FactType, ScheduledTask, SemanticRecord, Session, Summary,
    TaskExecution,
};
use redb::{Database, ReadableTable};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::tables::{
    CONVERSATION_SUMMARIES_TABLE, EPISODES_TABLE, FACTS_TABLE, SCHEDULED_TASKS_TABLE,
    SEMANTIC_RECORDS_TABLE, SESSIONS_TABLE, SUMMARIES_TABLE, TASK_EXECUTIONS_TABLE,
};

/// Blocking redb operations run on `spawn_blocking` under this timeout, so a
/// wedged disk degrades to an error instead of hanging the caller forever.
const DB_OPERATION_TIMEOUT: Duration = Duration::from_secs(10);

/// Run a blocking redb closure off the async executor, bounded by
/// [`DB_OPERATION_TIMEOUT`].
async fn with_db_timeout<T, F>(op: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::time::timeout(DB_OPERATION_TIMEOUT, tokio::task::spawn_blocking(op))
        .await
        .map_err(|_| Error::storage(StorageErrorKind::Unavailable, "redb operation timed out"))?
        .map_err(|e| Error::storage(StorageErrorKind::Unavailable, format!("redb task join error: {e}")))?
}

fn encode<T: serde::Serialize>(value: &T) -> Result<Vec<u8>> {
    postcard::to_allocvec(value)
        .map_err(|e| Error::storage(StorageErrorKind::Corrupt, format!("encode failed: {e}")))
}

fn decode<T: serde::de::DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    postcard::from_bytes(bytes)
        .map_err(|e| Error::storage(StorageErrorKind::Corrupt, format!("decode failed: {e}")))
}

/// Embedded, single-file `redb` backend for [`PersistenceStore`].
pub struct RedbStore {
    db: Arc<Database>,
}

impl RedbStore {
    /// Open (creating if absent) the database file at `path` and initialize
    /// every table in a single write transaction.
    #[instrument(skip(path))]
    pub async fn open(path: &Path) -> Result<Self> {
        let path = path.to_path_buf();
        let db = with_db_timeout(move || {
            let db = Database::create(&path).map_err(|e| {
                Error::storage(
                    StorageErrorKind::Unavailable,
                    format!("failed to open redb database: {e}"),
                )
            })?;

            let write_txn = db.begin_write().map_err(storage_err)?;
            {
                write_txn.open_table(SESSIONS_TABLE).map_err(storage_err)?;
                write_txn.open_table(EPISODES_TABLE).map_err(storage_err)?;
                write_txn.open_table(SUMMARIES_TABLE).map_err(storage_err)?;
                write_txn
                    .open_table(CONVERSATION_SUMMARIES_TABLE)
                    .map_err(storage_err)?;
                write_txn.open_table(FACTS_TABLE).map_err(storage_err)?;
                write_txn
                    .open_table(SEMANTIC_RECORDS_TABLE)
                    .map_err(storage_err)?;
                write_txn
                    .open_table(SCHEDULED_TASKS_TABLE)
                    .map_err(storage_err)?;
                write_txn
                    .open_table(TASK_EXECUTIONS_TABLE)
                    .map_err(storage_err)?;
            }
            write_txn.commit().map_err(storage_err)?;

            Ok(db)
        })
        .await?;

        info!("redb database opened and tables initialized");
        Ok(Self { db: Arc::new(db) })
    }
}

fn storage_err<E: std::fmt::Display>(e: E) -> Error {
    Error::storage(StorageErrorKind::Unavailable, e.to_string())
}

macro_rules! put_by_id {
    ($fn_name:ident, $table:ident, $ty:ty, $id_field:ident) => {
        async fn $fn_name(&self, value: &$ty) -> Result<()> {
            let db = Arc::clone(&self.db);
            let key = value.$id_field.to_string();
            let bytes = encode(value)?;
            with_db_timeout(move || {
                let write_txn = db.begin_write().map_err(storage_err)?;
                {
                    let mut table = write_txn.open_table($table).map_err(storage_err)?;
                    table
                        .insert(key.as_str(), bytes.as_slice())
                        .map_err(storage_err)?;
                }
                write_txn.commit().map_err(storage_err)?;
                Ok(())
            })
            .await
        }
    };
}

macro_rules! get_by_id {
    ($fn_name:ident, $table:ident, $ty:ty) => {
        async fn $fn_name(&self, id: Uuid) -> Result<Option<$ty>> {
            let db = Arc::clone(&self.db);
            let key = id.to_string();
            with_db_timeout(move || {
                let read_txn = db.begin_read().map_err(storage_err)?;
                let table = read_txn.open_table($table).map_err(storage_err)?;
                match table.get(key.as_str()).map_err(storage_err)? {
                    Some(guard) => Ok(Some(decode(guard.value())?)),
                    None => Ok(None),
                }
            })
            .await
        }
    };
}

#[async_trait]
impl PersistenceStore for RedbStore {
    put_by_id!(put_session, SESSIONS_TABLE, Session, id);
    get_by_id!(get_session, SESSIONS_TABLE, Session);

    put_by_id!(put_episode, EPISODES_TABLE, Episode, id);
    get_by_id!(get_episode, EPISODES_TABLE, Episode);

    #[instrument(skip(self))]
    async fn list_episodes_in_buffer(&self, session_id: Uuid) -> Result<Vec<Episode>> {
        let db = Arc::clone(&self.db);
        with_db_timeout(move || {
            let read_txn = db.begin_read().map_err(storage_err)?;
            let table = read_txn.open_table(EPISODES_TABLE).map_err(storage_err)?;
            let mut episodes = Vec::new();
            for row in table.iter().map_err(storage_err)? {
                let (_, guard) = row.map_err(storage_err)?;
                let episode: Episode = decode(guard.value())?;
                if episode.session_id == session_id && episode.in_buffer {
                    episodes.push(episode);
                }
            }
            episodes.sort_by_key(|e| e.exchange_number);
            Ok(episodes)
        })
        .await
    }

    put_by_id!(put_summary, SUMMARIES_TABLE, Summary, id);

    #[instrument(skip(self))]
    async fn list_summaries(&self, session_id: Uuid, limit: usize) -> Result<Vec<Summary>> {
        let db = Arc::clone(&self.db);
        with_db_timeout(move || {
            let read_txn = db.begin_read().map_err(storage_err)?;
            let table = read_txn.open_table(SUMMARIES_TABLE).map_err(storage_err)?;
            let mut summaries = Vec::new();
            for row in table.iter().map_err(storage_err)? {
                let (_, guard) = row.map_err(storage_err)?;
                let summary: Summary = decode(guard.value())?;
                if summary.session_id == session_id {
                    summaries.push(summary);
                }
            }
            summaries.sort_by(|a, b| b.created_at.cmp(&a.created_at));
            summaries.truncate(limit);
            Ok(summaries)
        })
        .await
    }

    put_by_id!(
        put_conversation_summary,
        CONVERSATION_SUMMARIES_TABLE,
        ConversationSummary,
        id
    );

    #[instrument(skip(self))]
    async fn get_latest_conversation_summary(&self) -> Result<Option<ConversationSummary>> {
        let db = Arc::clone(&self.db);
        with_db_timeout(move || {
            let read_txn = db.begin_read().map_err(storage_err)?;
            let table = read_txn
                .open_table(CONVERSATION_SUMMARIES_TABLE)
                .map_err(storage_err)?;
            let mut latest: Option<ConversationSummary> = None;
            for row in table.iter().map_err(storage_err)? {
                let (_, guard) = row.map_err(storage_err)?;
                let summary: ConversationSummary = decode(guard.value())?;
                if latest
                    .as_ref()
                    .is_none_or(|l| summary.created_at > l.created_at)
                {
                    latest = Some(summary);
                }
            }
            Ok(latest)
        })
        .await
    }

    #[instrument(skip(self))]
    async fn list_conversation_summaries(&self, limit: usize) -> Result<Vec<ConversationSummary>> {
        let db = Arc::clone(&self.db);
        with_db_timeout(move || {
            let read_txn = db.begin_read().map_err(storage_err)?;
            let table = read_txn
                .open_table(CONVERSATION_SUMMARIES_TABLE)
                .map_err(storage_err)?;
            let mut summaries = Vec::new();
            for row in table.iter().map_err(storage_err)? {
                let (_, guard) = row.map_err(storage_err)?;
                summaries.push(decode::<ConversationSummary>(guard.value())?);
            }
            summaries.sort_by(|a, b| b.created_at.cmp(&a.created_at));
            summaries.truncate(limit);
            Ok(summaries)
        })
        .await
    }

    #[instrument(skip(self, fact))]
    async fn insert_fact(&self, fact: &Fact) -> Result<()> {
        let db = Arc::clone(&self.db);
        let key = fact.id.to_string();
        let bytes = encode(fact)?;
        let byte_size = bytes.len();
        if byte_size > 100_000 {
            warn!(fact_id = %fact.id, byte_size, "unusually large fact payload");
        }
        with_db_timeout(move || {
            let write_txn = db.begin_write().map_err(storage_err)?;
            {
                let mut table = write_txn.open_table(FACTS_TABLE).map_err(storage_err)?;
                table
                    .insert(key.as_str(), bytes.as_slice())
                    .map_err(storage_err)?;
            }
            write_txn.commit().map_err(storage_err)?;
            Ok(())
        })
        .await
    }

    #[instrument(skip(self, query))]
    async fn search_facts(&self, query: &FactQuery) -> Result<Vec<Fact>> {
        let db = Arc::clone(&self.db);
        let query = query.clone();
        with_db_timeout(move || {
            let read_txn = db.begin_read().map_err(storage_err)?;
            let table = read_txn.open_table(FACTS_TABLE).map_err(storage_err)?;
            let mut facts = Vec::new();
            for row in table.iter().map_err(storage_err)? {
                let (_, guard) = row.map_err(storage_err)?;
                let fact: Fact = decode(guard.value())?;
                if fact.importance < query.min_importance {
                    continue;
                }
                if let Some(ty) = query.fact_type {
                    if fact.fact_type != ty {
                        continue;
                    }
                }
                if let Some(session_id) = query.session_id {
                    if fact.session_id != session_id {
                        continue;
                    }
                }
                if let Some(text) = &query.text {
                    let needle = text.to_lowercase();
                    if !fact.content.to_lowercase().contains(&needle)
                        && !fact.context.to_lowercase().contains(&needle)
                    {
                        continue;
                    }
                }
                facts.push(fact);
            }
            facts.sort_by(|a, b| {
                b.importance
                    .partial_cmp(&a.importance)
                    .unwrap_or(std::cmp::Ordering::Equal)
                    .then_with(|| b.timestamp.cmp(&a.timestamp))
            });
            facts.truncate(query.limit);
            Ok(facts)
        })
        .await
    }

    #[instrument(skip(self))]
    async fn touch_fact(&self, id: Uuid) -> Result<()> {
        let db = Arc::clone(&self.db);
        let key = id.to_string();
        with_db_timeout(move || {
            let write_txn = db.begin_write().map_err(storage_err)?;
            {
                let mut table = write_txn.open_table(FACTS_TABLE).map_err(storage_err)?;
                let Some(existing) = table.get(key.as_str()).map_err(storage_err)? else {
                    return Ok(());
                };
                let mut fact: Fact = decode(existing.value())?;
                drop(existing);
                fact.access_count += 1;
                fact.last_accessed = Some(chrono::Utc::now());
                let bytes = encode(&fact)?;
                table
                    .insert(key.as_str(), bytes.as_slice())
                    .map_err(storage_err)?;
            }
            write_txn.commit().map_err(storage_err)?;
            Ok(())
        })
        .await
    }

    #[instrument(skip(self))]
    async fn fact_stats(&self) -> Result<FactStats> {
        let db = Arc::clone(&self.db);
        with_db_timeout(move || {
            let read_txn = db.begin_read().map_err(storage_err)?;
            let table = read_txn.open_table(FACTS_TABLE).map_err(storage_err)?;
            let mut total: u64 = 0;
            let mut importance_sum = 0.0f64;
            let mut by_type: Vec<(FactType, u64)> =
                FactType::all().iter().map(|t| (*t, 0u64)).collect();
            for row in table.iter().map_err(storage_err)? {
                let (_, guard) = row.map_err(storage_err)?;
                let fact: Fact = decode(guard.value())?;
                total += 1;
                importance_sum += f64::from(fact.importance);
                if let Some(entry) = by_type.iter_mut().find(|(t, _)| *t == fact.fact_type) {
                    entry.1 += 1;
                }
            }
            let average_importance = if total == 0 {
                0.0
            } else {
                (importance_sum / total as f64) as f32
            };
            Ok(FactStats {
                total,
                by_type,
                average_importance,
            })
        })
        .await
    }

    #[instrument(skip(self, record))]
    async fn upsert_semantic_record(&self, record: &SemanticRecord) -> Result<()> {
        let db = Arc::clone(&self.db);
        let record = record.clone();
        with_db_timeout(move || {
            let write_txn = db.begin_write().map_err(storage_err)?;
            {
                let mut table = write_txn
                    .open_table(SEMANTIC_RECORDS_TABLE)
                    .map_err(storage_err)?;

                let mut existing_key: Option<String> = None;
                for row in table.iter().map_err(storage_err)? {
                    let (key, guard) = row.map_err(storage_err)?;
                    let candidate: SemanticRecord = decode(guard.value())?;
                    if candidate.fingerprint == record.fingerprint {
                        existing_key = Some(key.value().to_string());
                        break;
                    }
                }

                if let Some(key) = existing_key {
                    let mut reinforced: SemanticRecord = {
                        let guard = table.get(key.as_str()).map_err(storage_err)?.ok_or_else(|| {
                            Error::storage(
                                StorageErrorKind::Conflict,
                                "semantic record vanished mid-transaction",
                            )
                        })?;
                        decode(guard.value())?
                    };
                    reinforced.access_count += 1;
                    reinforced.last_accessed = record.last_accessed;
                    reinforced.importance = reinforced.importance.max(record.importance);
                    let bytes = encode(&reinforced)?;
                    table
                        .insert(key.as_str(), bytes.as_slice())
                        .map_err(storage_err)?;
                } else {
                    let key = record.id.to_string();
                    let bytes = encode(&record)?;
                    table
                        .insert(key.as_str(), bytes.as_slice())
                        .map_err(storage_err)?;
                }
            }
            write_txn.commit().map_err(storage_err)?;
            Ok(())
        })
        .await
    }

    #[instrument(skip(self))]
    async fn list_semantic_records(&self) -> Result<Vec<SemanticRecord>> {
        let db = Arc::clone(&self.db);
        with_db_timeout(move || {
            let read_txn = db.begin_read().map_err(storage_err)?;
            let table = read_txn
                .open_table(SEMANTIC_RECORDS_TABLE)
                .map_err(storage_err)?;
            let mut records = Vec::new();
            for row in table.iter().map_err(storage_err)? {
                let (_, guard) = row.map_err(storage_err)?;
                records.push(decode::<SemanticRecord>(guard.value())?);
            }
            Ok(records)
        })
        .await
    }

    #[instrument(skip(self, ids))]
    async fn delete_semantic_records(&self, ids: &[Uuid]) -> Result<()> {
        let db = Arc::clone(&self.db);
        let keys: Vec<String> = ids.iter().map(Uuid::to_string).collect();
        with_db_timeout(move || {
            let write_txn = db.begin_write().map_err(storage_err)?;
            {
                let mut table = write_txn
                    .open_table(SEMANTIC_RECORDS_TABLE)
                    .map_err(storage_err)?;
                for key in &keys {
                    table.remove(key.as_str()).map_err(storage_err)?;
                }
            }
            write_txn.commit().map_err(storage_err)?;
            Ok(())
        })
        .await
    }

    put_by_id!(put_scheduled_task, SCHEDULED_TASKS_TABLE, ScheduledTask, id);
    get_by_id!(get_scheduled_task, SCHEDULED_TASKS_TABLE, ScheduledTask);

    #[instrument(skip(self))]
    async fn list_scheduled_tasks(&self) -> Result<Vec<ScheduledTask>> {
        let db = Arc::clone(&self.db);
        with_db_timeout(move || {
            let read_txn = db.begin_read().map_err(storage_err)?;
            let table = read_txn
                .open_table(SCHEDULED_TASKS_TABLE)
                .map_err(storage_err)?;
            let mut tasks = Vec::new();
            for row in table.iter().map_err(storage_err)? {
                let (_, guard) = row.map_err(storage_err)?;
                tasks.push(decode::<ScheduledTask>(guard.value())?);
            }
            tasks.sort_by(|a, b| a.created_at.cmp(&b.created_at));
            Ok(tasks)
        })
        .await
    }

    /// Deletes the task row and every [`TaskExecution`] logged against it
    /// (spec §4.J: `Deleted` cascades).
    #[instrument(skip(self))]
    async fn delete_scheduled_task(&self, id: Uuid) -> Result<()> {
        let db = Arc::clone(&self.db);
        let key = id.to_string();
        with_db_timeout(move || {
            let write_txn = db.begin_write().map_err(storage_err)?;
            {
                let mut tasks = write_txn
                    .open_table(SCHEDULED_TASKS_TABLE)
                    .map_err(storage_err)?;
                tasks.remove(key.as_str()).map_err(storage_err)?;
            }
            {
                let mut executions = write_txn
                    .open_table(TASK_EXECUTIONS_TABLE)
                    .map_err(storage_err)?;
                let stale: Vec<String> = executions
                    .iter()
                    .map_err(storage_err)?
                    .filter_map(|row| row.ok())
                    .filter_map(|(key, guard)| {
                        let execution: TaskExecution = decode(guard.value()).ok()?;
                        (execution.task_id == id).then(|| key.value().to_string())
                    })
                    .collect();
                for execution_key in stale {
                    executions.remove(execution_key.as_str()).map_err(storage_err)?;
                }
            }
            write_txn.commit().map_err(storage_err)?;
            Ok(())
        })
        .await
    }

    put_by_id!(put_task_execution, TASK_EXECUTIONS_TABLE, TaskExecution, id);

    #[instrument(skip(self))]
    async fn list_task_executions(&self, task_id: Uuid, limit: usize) -> Result<Vec<TaskExecution>> {
        let db = Arc::clone(&self.db);
        with_db_timeout(move || {
            let read_txn = db.begin_read().map_err(storage_err)?;
            let table = read_txn
                .open_table(TASK_EXECUTIONS_TABLE)
                .map_err(storage_err)?;
            let mut executions = Vec::new();
            for row in table.iter().map_err(storage_err)? {
                let (_, guard) = row.map_err(storage_err)?;
                let execution: TaskExecution = decode(guard.value())?;
                if execution.task_id == task_id {
                    executions.push(execution);
                }
            }
            executions.sort_by(|a, b| b.started_at.cmp(&a.started_at));
            executions.truncate(limit);
            Ok(executions)
        })
        .await
    }

    #[instrument(skip(self))]
    async fn list_incomplete_task_executions(&self) -> Result<Vec<TaskExecution>> {
        let db = Arc::clone(&self.db);
        with_db_timeout(move || {
            let read_txn = db.begin_read().map_err(storage_err)?;
            let table = read_txn
                .open_table(TASK_EXECUTIONS_TABLE)
                .map_err(storage_err)?;
            let mut executions = Vec::new();
            for row in table.iter().map_err(storage_err)? {
                let (_, guard) = row.map_err(storage_err)?;
                let execution: TaskExecution = decode(guard.value())?;
                if execution.completed_at.is_none() {
                    executions.push(execution);
                }
            }
            Ok(executions)
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use memory_core::types::{Exchange, Fact, FactType};
    use std::collections::{BTreeMap, BTreeSet};

    async fn open_temp() -> (tempfile::TempDir, RedbStore) {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = RedbStore::open(&dir.path().join("test.redb"))
            .await
            .expect("open store");
        (dir, store)
    }

    #[tokio::test]
    async fn session_round_trips() {
        let (_dir, store) = open_temp().await;
        let session = Session::new(Some("test".to_string()));
        store.put_session(&session).await.unwrap();
        let fetched = store.get_session(session.id).await.unwrap().unwrap();
        assert_eq!(fetched.id, session.id);
    }

    #[tokio::test]
    async fn episode_buffer_listing_filters_by_session_and_flag() {
        let (_dir, store) = open_temp().await;
        let session_id = Uuid::new_v4();
        let exchange = Exchange {
            user_text: "hi".to_string(),
            agent_text: "hello".to_string(),
        };
        let mut in_buffer = Episode::new(session_id, 0, &exchange, "s".to_string(), 0.5);
        let mut evicted = Episode::new(session_id, 1, &exchange, "s".to_string(), 0.5);
        evicted.in_buffer = false;
        let other_session = Episode::new(Uuid::new_v4(), 0, &exchange, "s".to_string(), 0.5);

        store.put_episode(&in_buffer).await.unwrap();
        store.put_episode(&evicted).await.unwrap();
        store.put_episode(&other_session).await.unwrap();

        let listed = store.list_episodes_in_buffer(session_id).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, in_buffer.id);

        in_buffer.in_buffer = false;
        store.put_episode(&in_buffer).await.unwrap();
        assert!(store
            .list_episodes_in_buffer(session_id)
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn fact_search_ranks_by_importance_then_recency() {
        let (_dir, store) = open_temp().await;
        let session_id = Uuid::new_v4();
        let low = Fact {
            id: Uuid::new_v4(),
            fact_type: FactType::Note,
            content: "low".to_string(),
            context: String::new(),
            importance: 0.2,
            access_count: 0,
            timestamp: chrono::Utc::now(),
            last_accessed: None,
            session_id,
            episode_id: Uuid::new_v4(),
            tags: BTreeSet::new(),
            metadata: BTreeMap::new(),
            fingerprint: "low".to_string(),
        };
        let mut high = low.clone();
        high.id = Uuid::new_v4();
        high.content = "high".to_string();
        high.importance = 0.9;
        high.fingerprint = "high".to_string();

        store.insert_fact(&low).await.unwrap();
        store.insert_fact(&high).await.unwrap();

        let results = store
            .search_facts(&FactQuery {
                limit: 10,
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(results[0].content, "high");
    }

    #[tokio::test]
    async fn touch_fact_bumps_access_count() {
        let (_dir, store) = open_temp().await;
        let fact = Fact {
            id: Uuid::new_v4(),
            fact_type: FactType::Task,
            content: "buy milk".to_string(),
            context: String::new(),
            importance: 0.5,
            access_count: 0,
            timestamp: chrono::Utc::now(),
            last_accessed: None,
            session_id: Uuid::new_v4(),
            episode_id: Uuid::new_v4(),
            tags: BTreeSet::new(),
            metadata: BTreeMap::new(),
            fingerprint: "buy milk".to_string(),
        };
        store.insert_fact(&fact).await.unwrap();
        store.touch_fact(fact.id).await.unwrap();
        let stats = store.fact_stats().await.unwrap();
        assert_eq!(stats.total, 1);

        let results = store
            .search_facts(&FactQuery {
                limit: 10,
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(results[0].access_count, 1);
        assert!(results[0].last_accessed.is_some());
    }

    #[tokio::test]
    async fn upsert_semantic_record_reinforces_on_matching_fingerprint() {
        let (_dir, store) = open_temp().await;
        let record = SemanticRecord {
            id: Uuid::new_v4(),
            content: "likes rust".to_string(),
            embedding: vec![0.1, 0.2, 0.3],
            importance: 0.4,
            created_at: chrono::Utc::now(),
            last_accessed: chrono::Utc::now(),
            access_count: 0,
            fingerprint: "likes-rust".to_string(),
            session_id: None,
        };
        store.upsert_semantic_record(&record).await.unwrap();

        let mut reinforcement = record.clone();
        reinforcement.id = Uuid::new_v4();
        reinforcement.access_count = 0;
        reinforcement.importance = 0.1;
        store.upsert_semantic_record(&reinforcement).await.unwrap();

        let all = store.list_semantic_records().await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].access_count, 1);
        assert_eq!(all[0].importance, 0.4);
    }

    #[tokio::test]
    async fn incomplete_task_executions_are_listed_for_crash_recovery() {
        let (_dir, store) = open_temp().await;
        let task_id = Uuid::new_v4();
        let running = TaskExecution::start(task_id);
        let mut completed = TaskExecution::start(task_id);
        completed.complete(true, Some("done".to_string()), None);

        store.put_task_execution(&running).await.unwrap();
        store.put_task_execution(&completed).await.unwrap();

        let incomplete = store.list_incomplete_task_executions().await.unwrap();
        assert_eq!(incomplete.len(), 1);
        assert_eq!(incomplete[0].id, running.id);
    }

    #[tokio::test]
    async fn scheduled_task_delete_removes_only_that_task() {
        let (_dir, store) = open_temp().await;
        let task = ScheduledTask {
            id: Uuid::new_v4(),
            display_name: "daily digest".to_string(),
            schedule_expression: "0 9 * * *".to_string(),
            template_name: "digest".to_string(),
            template_config: BTreeMap::new(),
            enabled: true,
            created_at: chrono::Utc::now(),
            last_run: None,
            next_run: None,
            run_count: 0,
            success_count: 0,
            failure_count: 0,
        };
        store.put_scheduled_task(&task).await.unwrap();
        let execution = TaskExecution::start(task.id);
        store.put_task_execution(&execution).await.unwrap();
        let other_task_id = Uuid::new_v4();
        let other_execution = TaskExecution::start(other_task_id);
        store.put_task_execution(&other_execution).await.unwrap();

        store.delete_scheduled_task(task.id).await.unwrap();

        assert!(store.get_scheduled_task(task.id).await.unwrap().is_none());
        assert!(store
            .list_task_executions(task.id, 10)
            .await
            .unwrap()
            .is_empty());
        assert_eq!(
            store.list_task_executions(other_task_id, 10).await.unwrap().len(),
            1
        );
    }
}
