//! Hierarchical Memory Manager (spec §4.H): the orchestrator tying every
//! other component together.

mod context;
mod pressure;

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{instrument, warn};
use uuid::Uuid;

pub use context::{MemoryContext, NoPressure, PressureSource};
pub use pressure::{buffer_cap, summary_injection_cap};

use crate::config::Config;
use crate::error::Result;
use crate::extraction::FactExtractor;
use crate::facts::FactsStore;
use crate::identity::IdentityStore;
use crate::router::{QueryRouter, RouteResult};
use crate::semantic::SemanticStore;
use crate::storage::PersistenceStore;
use crate::summary::{build_conversation_summary, SummaryBuffer};
use crate::types::{Episode, Exchange, IdentityDocKind, Session};

const RECENT_SLICE_LEN: usize = 10;
const MID_SLICE_LEN: usize = 40;

/// Why this record is being carried into identity tracking (spec §4.H step
/// 9: "emit identity-node records tagged by detected action").
#[must_use]
fn classify_action(user_text: &str) -> &'static str {
    let lower = user_text.to_lowercase();
    if ["create", "write", "build", "generate", "draft"].iter().any(|kw| lower.contains(kw)) {
        "creation"
    } else if ["remember", "recall", "what did", "earlier"].iter().any(|kw| lower.contains(kw)) {
        "memory"
    } else if ["why", "analyze", "compare", "evaluate"].iter().any(|kw| lower.contains(kw)) {
        "analysis"
    } else {
        "general"
    }
}

fn compute_importance(user_text: &str) -> f32 {
    const INTERROGATIVE: &[&str] = &["who", "what", "when", "where", "why", "how"];
    const IMPERATIVE: &[&str] = &["please", "need to", "must", "should", "remember"];
    let lower = user_text.to_lowercase();
    let mut score: f32 = 0.3;
    if user_text.len() > 200 {
        score += 0.2;
    } else if user_text.len() > 80 {
        score += 0.1;
    }
    if INTERROGATIVE.iter().any(|w| lower.starts_with(w) || lower.contains(&format!(" {w} "))) {
        score += 0.2;
    }
    if IMPERATIVE.iter().any(|w| lower.contains(w)) {
        score += 0.2;
    }
    if user_text.contains('!') {
        score += 0.1;
    }
    score.clamp(0.0, 1.0)
}

fn derive_summary(user_text: &str) -> String {
    let trimmed = user_text.trim();
    let first_sentence = trimmed.split(['.', '\n']).next().unwrap_or(trimmed);
    let truncated: String = first_sentence.chars().take(120).collect();
    if truncated.is_empty() {
        "(empty exchange)".to_string()
    } else {
        truncated
    }
}

/// Orchestrates the Persistence Store, Fact Extractor, Facts Store, Semantic
/// Store, Query Router, Summary Buffer, and Identity Store (spec §4.H).
pub struct HierarchicalMemoryManager {
    config: Arc<Config>,
    persistence: Arc<dyn PersistenceStore>,
    session: Session,
    context: MemoryContext,
    buffer: Mutex<VecDeque<Episode>>,
    session_episodes: Mutex<Vec<Episode>>,
    next_exchange_number: AtomicU64,
    evicted_count: AtomicU64,
    extractor: FactExtractor,
    facts: Arc<FactsStore>,
    semantic: Arc<SemanticStore>,
    router: QueryRouter,
    summary_buffer: SummaryBuffer,
    identity: IdentityStore,
    summarizer_tx: tokio::sync::mpsc::Sender<SummarizationRequest>,
}

struct SummarizationRequest {
    session_id: Uuid,
    episodes: Vec<Episode>,
}

impl HierarchicalMemoryManager {
    /// Construct a manager for a fresh session, starting its background
    /// summarization worker.
    #[instrument(skip(persistence, pressure_source))]
    pub async fn new(
        config: Arc<Config>,
        persistence: Arc<dyn PersistenceStore>,
        pressure_source: Arc<dyn PressureSource>,
    ) -> Result<Self> {
        let session = Session::new(None);
        persistence.put_session(&session).await?;

        let facts = Arc::new(FactsStore::new(persistence.clone()));
        let semantic = Arc::new(SemanticStore::new(persistence.clone()));
        let router = QueryRouter::new(facts.clone(), semantic.clone());
        let summary_buffer = SummaryBuffer::new(persistence.clone(), config.max_summaries_in_memory);
        if config.load_session_summary_on_start {
            summary_buffer.load_from_storage().await?;
        }
        let identity = IdentityStore::new(config.workspace_path.clone(), config.conversation_memory_archive_max);
        identity.update_minimal(IdentityDocKind::Identity).await?;

        let (summarizer_tx, summarizer_rx) = tokio::sync::mpsc::channel(64);
        spawn_summarizer(persistence.clone(), summarizer_rx);

        Ok(Self {
            config,
            persistence,
            session,
            context: MemoryContext::new(pressure_source),
            buffer: Mutex::new(VecDeque::new()),
            session_episodes: Mutex::new(Vec::new()),
            next_exchange_number: AtomicU64::new(0),
            evicted_count: AtomicU64::new(0),
            extractor: FactExtractor::new(),
            facts,
            semantic,
            router,
            summary_buffer,
            identity,
            summarizer_tx,
        })
    }

    /// The session this manager is recording into.
    #[must_use]
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Record one exchange, running the full pipeline synchronously except
    /// for structured summarization, which is scheduled on the background
    /// Summarizer worker (spec §4.H `record_exchange`).
    #[instrument(skip(self, user_text, agent_text))]
    pub async fn record_exchange(&self, user_text: &str, agent_text: &str) -> Result<Uuid> {
        let exchange = Exchange {
            user_text: user_text.to_string(),
            agent_text: agent_text.to_string(),
        };
        let importance = compute_importance(user_text);
        let summary = derive_summary(user_text);
        let exchange_number = self.next_exchange_number.fetch_add(1, Ordering::SeqCst);

        let episode = Episode::new(self.session.id, exchange_number, &exchange, summary, importance);
        self.persistence.put_episode(&episode).await?;

        let cap = buffer_cap(self.context.current_pressure());
        let evicted = self.enforce_buffer_cap(cap).await?;

        {
            let mut buffer = self.buffer.lock();
            buffer.push_back(episode.clone());
        }
        self.session_episodes.lock().push(episode.clone());

        let facts = self.extractor.extract(&exchange, self.session.id, episode.id);
        self.facts.store(&facts).await?;
        self.semantic
            .store(&format!("{user_text}\n{agent_text}"), importance, Some(self.session.id))
            .await?;

        if importance > 0.6 {
            let action = classify_action(user_text);
            warn!(episode_id = %episode.id, action, "high-importance exchange tagged for identity tracking");
        }

        self.maybe_schedule_summarization(evicted).await;

        Ok(episode.id)
    }

    async fn enforce_buffer_cap(&self, cap: usize) -> Result<Vec<Episode>> {
        let mut evicted = Vec::new();
        let overflow = {
            let buffer = self.buffer.lock();
            buffer.len().saturating_sub(cap.saturating_sub(1))
        };
        for _ in 0..overflow {
            let popped = {
                let mut buffer = self.buffer.lock();
                buffer.pop_front()
            };
            let Some(mut episode) = popped else { break };
            episode.in_buffer = false;
            self.persistence.put_episode(&episode).await?;
            self.evicted_count.fetch_add(1, Ordering::SeqCst);
            evicted.push(episode);
        }
        Ok(evicted)
    }

    async fn maybe_schedule_summarization(&self, just_evicted: Vec<Episode>) {
        let exchange_count = self.next_exchange_number.load(Ordering::SeqCst);
        let buffer_len = self.buffer.lock().len();
        let pressure = self.context.current_pressure();

        let triggered = (exchange_count % 10 == 0 && buffer_len > 20)
            || (pressure >= 75.0 && buffer_len > 15)
            || buffer_len >= self.config.buffer_truncate_at;

        if !triggered {
            return;
        }

        let episodes = if just_evicted.is_empty() {
            self.session_episodes.lock().clone()
        } else {
            just_evicted
        };

        if episodes.is_empty() {
            return;
        }

        let request = SummarizationRequest {
            session_id: self.session.id,
            episodes,
        };
        if self.summarizer_tx.try_send(request).is_err() {
            warn!("summarizer queue full, dropping summarization request (durable episodes are unaffected)");
        }
    }

    /// Route a recall query through the Query Router (spec §4.H `recall`).
    pub async fn recall(&self, query: &str, limit: Option<usize>) -> Result<RouteResult> {
        self.router.route(query, limit.unwrap_or(5)).await
    }

    /// Render a layered, bounded context string for the next LLM turn (spec
    /// §4.H `context_for_prompt`).
    #[instrument(skip(self))]
    pub async fn context_for_prompt(&self, max_tokens: Option<usize>) -> Result<String> {
        let pressure = self.context.current_pressure();
        let token_budget = max_tokens.unwrap_or(self.config.working_memory_max_tokens);
        let mut out = String::new();

        let buffer: Vec<Episode> = self.buffer.lock().iter().cloned().collect();
        if buffer.is_empty() {
            let latest = self.persistence.get_latest_conversation_summary().await?;
            return Ok(match latest {
                Some(summary) => format!("[Session summary fallback]\n{}", summary.topic_preview),
                None => "[no context]".to_string(),
            });
        }

        let recent_start = buffer.len().saturating_sub(RECENT_SLICE_LEN);
        let recent = &buffer[recent_start..];
        let older = &buffer[..recent_start];
        let mid_start = older.len().saturating_sub(MID_SLICE_LEN);
        let mid = &older[mid_start..];

        let evicted = self.evicted_count.load(Ordering::SeqCst);
        if evicted > 0 {
            out.push_str(&format!(
                "[Earlier conversation: {evicted} exchanges compressed into semantic memory]\n"
            ));
        }

        for episode in mid {
            out.push_str(&format!("User: {}\nAgent: {}\n", episode.user_text, episode.agent_text));
        }
        for episode in recent {
            out.push_str(&format!("User: {}\nAgent: {}\n", episode.user_text, episode.agent_text));
        }

        if let Some(last_user) = recent.last().map(|e| e.user_text.clone()) {
            let semantic_context = self.semantic.get_context(&last_user, 5).await?;
            out.push_str(&semantic_context);
        }

        let summary_cap = summary_injection_cap(pressure).min(token_budget);
        out.push_str(&self.summary_buffer.render_context(summary_cap));

        for kind in [IdentityDocKind::Identity, IdentityDocKind::UserProfile, IdentityDocKind::Preferences] {
            let doc = self.identity.load(kind).await?;
            out.push_str(&format!("[{}]\n{}\n", kind.file_name(), doc.body));
        }

        Ok(out)
    }

    /// Flush the end-of-session summary, save the Identity Store, rotate
    /// conversation memories, and close persistence (spec §4.H
    /// `on_session_end`).
    #[instrument(skip(self))]
    pub async fn on_session_end(&self) -> Result<()> {
        let episodes = self.session_episodes.lock().clone();
        if let Some(summary) = build_conversation_summary(self.session.id, &episodes, true) {
            self.summary_buffer.push(summary).await?;
        }

        let new_traits = 0;
        let coherence_change = 0.0;
        let insight_count = episodes.iter().filter(|e| e.importance > 0.6).count();
        if IdentityStore::needs_full_update(new_traits, coherence_change, insight_count) {
            self.identity
                .update_full(IdentityDocKind::Identity, "Session concluded with notable insights.".to_string(), Default::default())
                .await?;
        } else {
            self.identity.update_minimal(IdentityDocKind::Identity).await?;
        }

        let memory_text = episodes
            .iter()
            .map(|e| format!("User: {}\nAgent: {}\n", e.user_text, e.agent_text))
            .collect::<String>();
        self.identity.write_conversation_memory(&memory_text).await?;

        Ok(())
    }
}

fn spawn_summarizer(
    persistence: Arc<dyn PersistenceStore>,
    mut rx: tokio::sync::mpsc::Receiver<SummarizationRequest>,
) {
    tokio::spawn(async move {
        while let Some(request) = rx.recv().await {
            if request.episodes.iter().all(|e| e.summarized) {
                continue;
            }
            let Some(summary) = build_buffer_summary(request.session_id, &request.episodes) else {
                continue;
            };
            if let Err(err) = persistence.put_summary(&summary).await {
                warn!(error = %err, "failed to persist buffer summary");
                continue;
            }
            for mut episode in request.episodes {
                episode.summarized = true;
                episode.compression_level = crate::types::CompressionLevel::Full;
                if let Err(err) = persistence.put_episode(&episode).await {
                    warn!(error = %err, "failed to mark episode as summarized");
                }
            }
        }
    });
}

fn build_buffer_summary(session_id: Uuid, episodes: &[Episode]) -> Option<crate::types::Summary> {
    if episodes.is_empty() {
        return None;
    }
    let content = episodes
        .iter()
        .map(|e| e.summary.clone())
        .collect::<Vec<_>>()
        .join("; ");
    let importance = episodes.iter().map(|e| e.importance).sum::<f32>() / episodes.len() as f32;
    Some(crate::types::Summary {
        id: Uuid::new_v4(),
        session_id,
        summary_type: crate::types::SummaryType::Buffer,
        content,
        source_episode_ids: episodes.iter().map(|e| e.id).collect(),
        importance,
        created_at: chrono::Utc::now(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn importance_rewards_length_and_questions() {
        let short = compute_importance("ok");
        let question = compute_importance("What time is the meeting tomorrow?");
        assert!(question > short);
    }

    #[test]
    fn derive_summary_truncates_first_sentence() {
        let summary = derive_summary("This is a long sentence. With a second one.");
        assert_eq!(summary, "This is a long sentence");
    }

    #[test]
    fn classify_action_detects_creation() {
        assert_eq!(classify_action("please create a new document"), "creation");
    }
}
