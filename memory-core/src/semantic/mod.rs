//! Semantic Store (spec §4.D): approximate recall over opaque text.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use tracing::instrument;
use uuid::Uuid;

use crate::error::Result;
use crate::storage::PersistenceStore;
use crate::types::SemanticRecord;

/// Fixed embedding dimensionality for the deterministic default embedder.
const EMBEDDING_DIM: usize = 64;

/// Produces a fixed-dimension embedding for a piece of text.
///
/// The only concrete implementation shipped here is
/// [`HashEmbedder`] (spec §9 open question, resolved in favor of the
/// deterministic hash-derived representation); a vendor embedding is
/// explicitly out of scope (spec §1 non-goals).
pub trait Embedder: Send + Sync {
    /// Compute an embedding vector for `text`.
    fn embed(&self, text: &str) -> Vec<f32>;
}

/// Deterministic hash-derived embedder: shingles the normalized text and
/// scatters each shingle's hash into a fixed-size vector, then L2-normalizes.
#[derive(Debug, Clone, Copy, Default)]
pub struct HashEmbedder;

impl Embedder for HashEmbedder {
    fn embed(&self, text: &str) -> Vec<f32> {
        let normalized = text.to_lowercase();
        let mut vector = vec![0.0f32; EMBEDDING_DIM];

        for token in normalized.split_whitespace() {
            let digest = Sha256::digest(token.as_bytes());
            for chunk in digest.chunks(4) {
                let mut bytes = [0u8; 4];
                bytes[..chunk.len()].copy_from_slice(chunk);
                let bucket = u32::from_le_bytes(bytes) as usize % EMBEDDING_DIM;
                let sign = if bytes[0] & 1 == 0 { 1.0 } else { -1.0 };
                vector[bucket] += sign;
            }
        }

        let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > f32::EPSILON {
            for v in &mut vector {
                *v /= norm;
            }
        }
        vector
    }
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|v| v * v).sum::<f32>().sqrt();
    let norm_b = b.iter().map(|v| v * v).sum::<f32>().sqrt();
    if norm_a <= f32::EPSILON || norm_b <= f32::EPSILON {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

fn recency_boost(age: chrono::Duration) -> f32 {
    if age <= chrono::Duration::hours(1) {
        1.5
    } else if age <= chrono::Duration::hours(24) {
        1.3
    } else if age <= chrono::Duration::weeks(1) {
        1.1
    } else {
        1.0
    }
}

/// One scored semantic search result.
#[derive(Debug, Clone)]
pub struct ScoredRecord {
    /// The underlying record.
    pub record: SemanticRecord,
    /// Final score = similarity × importance × recency boost.
    pub score: f32,
}

/// Approximate-recall store over opaque text records.
pub struct SemanticStore {
    persistence: Arc<dyn PersistenceStore>,
    embedder: Arc<dyn Embedder>,
}

impl SemanticStore {
    /// Build a semantic store with the default deterministic embedder.
    #[must_use]
    pub fn new(persistence: Arc<dyn PersistenceStore>) -> Self {
        Self::with_embedder(persistence, Arc::new(HashEmbedder))
    }

    /// Build a semantic store with a caller-supplied embedder.
    #[must_use]
    pub fn with_embedder(persistence: Arc<dyn PersistenceStore>, embedder: Arc<dyn Embedder>) -> Self {
        Self { persistence, embedder }
    }

    /// Store `text` with `importance`, deduping by content fingerprint: a
    /// repeat store bumps `access_count`/timestamp instead of inserting a
    /// new record (spec §9).
    #[instrument(skip(self, text))]
    pub async fn store(&self, text: &str, importance: f32, session_id: Option<Uuid>) -> Result<Uuid> {
        let fingerprint = crate::extraction::fingerprint(text);
        let existing = self
            .persistence
            .list_semantic_records()
            .await?
            .into_iter()
            .find(|r| r.fingerprint == fingerprint);

        let now = Utc::now();
        let record = if let Some(mut record) = existing {
            record.access_count += 1;
            record.last_accessed = now;
            record.importance = record.importance.max(importance.clamp(0.0, 1.0));
            record
        } else {
            SemanticRecord {
                id: Uuid::new_v4(),
                content: text.to_string(),
                embedding: self.embedder.embed(text),
                importance: importance.clamp(0.0, 1.0),
                created_at: now,
                last_accessed: now,
                access_count: 1,
                fingerprint,
                session_id,
            }
        };

        let id = record.id;
        self.persistence.upsert_semantic_record(&record).await?;
        Ok(id)
    }

    /// Retrieve up to `k` texts ranked by decreasing similarity score.
    #[instrument(skip(self, query))]
    pub async fn retrieve(&self, query: &str, k: usize) -> Result<Vec<ScoredRecord>> {
        let records = self.persistence.list_semantic_records().await?;
        if records.is_empty() {
            return Ok(vec![]);
        }

        let query_embedding = self.embedder.embed(query);
        let now = Utc::now();
        let mut scored: Vec<ScoredRecord> = records
            .into_iter()
            .map(|record| {
                let similarity = cosine_similarity(&query_embedding, &record.embedding);
                let age = now - record.last_accessed;
                let score = similarity * record.importance * recency_boost(age);
                ScoredRecord { record, score }
            })
            .collect();

        scored.sort_by(|a, b| b.score.total_cmp(&a.score));
        scored.truncate(k);
        Ok(scored)
    }

    /// Render the top-`k` matches as a single formatted context block.
    pub async fn get_context(&self, query: &str, k: usize) -> Result<String> {
        let hits = self.retrieve(query, k).await?;
        if hits.is_empty() {
            return Ok(String::new());
        }
        let mut out = String::from("[Semantic memory]\n");
        for hit in hits {
            out.push_str("- ");
            out.push_str(&hit.record.content);
            out.push('\n');
        }
        Ok(out)
    }

    /// Delete records that are simultaneously old, unimportant, and rarely
    /// accessed (spec §4.D cleanup).
    pub async fn prune(
        &self,
        older_than: chrono::Duration,
        min_importance: f32,
        min_access_count: u64,
    ) -> Result<usize> {
        let now = Utc::now();
        let records = self.persistence.list_semantic_records().await?;
        let stale: Vec<Uuid> = records
            .into_iter()
            .filter(|r| is_prunable(r, now, older_than, min_importance, min_access_count))
            .map(|r| r.id)
            .collect();
        let count = stale.len();
        if !stale.is_empty() {
            self.persistence.delete_semantic_records(&stale).await?;
        }
        Ok(count)
    }
}

fn is_prunable(
    record: &SemanticRecord,
    now: DateTime<Utc>,
    older_than: chrono::Duration,
    min_importance: f32,
    min_access_count: u64,
) -> bool {
    now - record.created_at > older_than
        && record.importance < min_importance
        && record.access_count < min_access_count
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_embedder_is_deterministic() {
        let embedder = HashEmbedder;
        assert_eq!(embedder.embed("hello world"), embedder.embed("hello world"));
    }

    #[test]
    fn identical_text_has_similarity_one() {
        let embedder = HashEmbedder;
        let vector = embedder.embed("find my appointment tomorrow");
        assert!((cosine_similarity(&vector, &vector) - 1.0).abs() < 1e-4);
    }

    #[test]
    fn recency_boost_decreases_with_age() {
        assert!(recency_boost(chrono::Duration::minutes(30)) > recency_boost(chrono::Duration::hours(12)));
        assert!(recency_boost(chrono::Duration::hours(12)) > recency_boost(chrono::Duration::days(3)));
        assert!(recency_boost(chrono::Duration::days(3)) > recency_boost(chrono::Duration::days(30)));
    }
}
