//! Facts Store (spec §4.C): thin orchestration over [`PersistenceStore`].

use std::sync::Arc;

use tracing::{instrument, warn};
use uuid::Uuid;

use crate::error::Result;
use crate::storage::{FactQuery, FactStats, PersistenceStore};
use crate::types::Fact;

/// Perfect-recall store for extracted [`Fact`]s.
///
/// Reinforcement model: `store` always appends, never overwrites (spec §3
/// invariant: `(type, fingerprint)` need not be unique).
pub struct FactsStore {
    persistence: Arc<dyn PersistenceStore>,
}

impl FactsStore {
    /// Wrap a persistence backend.
    #[must_use]
    pub fn new(persistence: Arc<dyn PersistenceStore>) -> Self {
        Self { persistence }
    }

    /// Insert every fact in `facts`, tolerating individual failures. Returns
    /// the number actually persisted (spec §4.C, §7 `ExtractionError`).
    #[instrument(skip(self, facts))]
    pub async fn store(&self, facts: &[Fact]) -> Result<usize> {
        let mut stored = 0;
        for fact in facts {
            match self.persistence.insert_fact(fact).await {
                Ok(()) => stored += 1,
                Err(err) => {
                    warn!(fact_id = %fact.id, error = %err, "dropping fact that failed to persist");
                }
            }
        }
        Ok(stored)
    }

    /// Search facts, bumping access metadata on every hit (spec §4.C).
    #[instrument(skip(self, query))]
    pub async fn search(&self, query: &FactQuery) -> Result<Vec<Fact>> {
        let facts = self.persistence.search_facts(query).await?;
        for fact in &facts {
            if let Err(err) = self.persistence.touch_fact(fact.id).await {
                warn!(fact_id = %fact.id, error = %err, "failed to record fact access");
            }
        }
        Ok(facts)
    }

    /// Aggregate statistics across every stored fact.
    pub async fn stats(&self) -> Result<FactStats> {
        self.persistence.fact_stats().await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use parking_lot::Mutex;

    use super::*;
    use crate::error::Error;
    use crate::storage::PersistenceStore;
    use crate::types::{
        ConversationSummary, Episode, FactType, ScheduledTask, SemanticRecord, Session, Summary,
        TaskExecution,
    };

    #[derive(Default)]
    struct MemStore {
        facts: Mutex<Vec<Fact>>,
        touched: Mutex<Vec<Uuid>>,
        fail_on: Mutex<Option<Uuid>>,
    }

    #[async_trait]
    impl PersistenceStore for MemStore {
        async fn put_session(&self, _s: &Session) -> Result<()> {
            Ok(())
        }
        async fn get_session(&self, _id: Uuid) -> Result<Option<Session>> {
            Ok(None)
        }
        async fn put_episode(&self, _e: &Episode) -> Result<()> {
            Ok(())
        }
        async fn get_episode(&self, _id: Uuid) -> Result<Option<Episode>> {
            Ok(None)
        }
        async fn list_episodes_in_buffer(&self, _session_id: Uuid) -> Result<Vec<Episode>> {
            Ok(vec![])
        }
        async fn put_summary(&self, _s: &Summary) -> Result<()> {
            Ok(())
        }
        async fn list_summaries(&self, _session_id: Uuid, _limit: usize) -> Result<Vec<Summary>> {
            Ok(vec![])
        }
        async fn put_conversation_summary(&self, _s: &ConversationSummary) -> Result<()> {
            Ok(())
        }
        async fn get_latest_conversation_summary(&self) -> Result<Option<ConversationSummary>> {
            Ok(None)
        }
        async fn list_conversation_summaries(&self, _limit: usize) -> Result<Vec<ConversationSummary>> {
            Ok(vec![])
        }
        async fn insert_fact(&self, fact: &Fact) -> Result<()> {
            if self.fail_on.lock().as_ref() == Some(&fact.id) {
                return Err(Error::facts(
                    crate::error::FactsErrorKind::StorageFailure,
                    "injected failure",
                ));
            }
            self.facts.lock().push(fact.clone());
            Ok(())
        }
        async fn search_facts(&self, query: &FactQuery) -> Result<Vec<Fact>> {
            Ok(self
                .facts
                .lock()
                .iter()
                .filter(|f| query.fact_type.is_none_or(|t| t == f.fact_type))
                .cloned()
                .collect())
        }
        async fn touch_fact(&self, id: Uuid) -> Result<()> {
            self.touched.lock().push(id);
            Ok(())
        }
        async fn fact_stats(&self) -> Result<FactStats> {
            Ok(FactStats::default())
        }
        async fn upsert_semantic_record(&self, _r: &SemanticRecord) -> Result<()> {
            Ok(())
        }
        async fn list_semantic_records(&self) -> Result<Vec<SemanticRecord>> {
            Ok(vec![])
        }
        async fn delete_semantic_records(&self, _ids: &[Uuid]) -> Result<()> {
            Ok(())
        }
        async fn put_scheduled_task(&self, _t: &ScheduledTask) -> Result<()> {
            Ok(())
        }
        async fn get_scheduled_task(&self, _id: Uuid) -> Result<Option<ScheduledTask>> {
            Ok(None)
        }
        async fn list_scheduled_tasks(&self) -> Result<Vec<ScheduledTask>> {
            Ok(vec![])
        }
        async fn delete_scheduled_task(&self, _id: Uuid) -> Result<()> {
            Ok(())
        }
        async fn put_task_execution(&self, _e: &TaskExecution) -> Result<()> {
            Ok(())
        }
        async fn list_task_executions(&self, _task_id: Uuid, _limit: usize) -> Result<Vec<TaskExecution>> {
            Ok(vec![])
        }
        async fn list_incomplete_task_executions(&self) -> Result<Vec<TaskExecution>> {
            Ok(vec![])
        }
    }

    fn fact(fact_type: FactType) -> Fact {
        Fact {
            id: Uuid::new_v4(),
            fact_type,
            content: "call the dentist".to_string(),
            context: "call the dentist tomorrow".to_string(),
            importance: 0.8,
            access_count: 0,
            timestamp: chrono::Utc::now(),
            last_accessed: None,
            session_id: Uuid::new_v4(),
            episode_id: Uuid::new_v4(),
            tags: Default::default(),
            metadata: Default::default(),
            fingerprint: "abc".to_string(),
        }
    }

    #[tokio::test]
    async fn store_tolerates_individual_failures() {
        let backend = Arc::new(MemStore::default());
        let good = fact(FactType::Task);
        let bad = fact(FactType::Task);
        *backend.fail_on.lock() = Some(bad.id);
        let store = FactsStore::new(backend.clone());
        let stored = store.store(&[good, bad]).await.unwrap();
        assert_eq!(stored, 1);
    }

    #[tokio::test]
    async fn search_touches_every_hit() {
        let backend = Arc::new(MemStore::default());
        let f = fact(FactType::Task);
        let id = f.id;
        backend.facts.lock().push(f);
        let store = FactsStore::new(backend.clone());
        let results = store
            .search(&FactQuery {
                fact_type: Some(FactType::Task),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(backend.touched.lock().as_slice(), &[id]);
    }
}
