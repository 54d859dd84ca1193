//! Summary Buffer (spec §4.F): end-of-session summary generation plus the
//! in-memory FIFO of recently loaded summaries.

mod facets;

use std::collections::VecDeque;
use std::sync::Arc;

use chrono::Utc;
use parking_lot::Mutex;
use tracing::instrument;
use uuid::Uuid;

pub use facets::{extract_facets, identify_key_exchanges};

use crate::error::Result;
use crate::storage::PersistenceStore;
use crate::types::{ConversationSummary, Episode, ExchangeSnapshot};

/// Minimum number of exchanges before an unforced summary will generate.
const MIN_EXCHANGES_FOR_SUMMARY: usize = 1;

/// Build the rich, cross-session-continuity [`ConversationSummary`] for one
/// session's episodes (spec §4.F / §3).
///
/// Returns `None` if `force` is false and fewer than
/// [`MIN_EXCHANGES_FOR_SUMMARY`] episodes are supplied, or if `episodes` is
/// empty outright.
#[must_use]
pub fn build_conversation_summary(
    session_id: Uuid,
    episodes: &[Episode],
    force: bool,
) -> Option<ConversationSummary> {
    if episodes.is_empty() || (!force && episodes.len() < MIN_EXCHANGES_FOR_SUMMARY) {
        return None;
    }

    let first = episodes.first()?;
    let last = episodes.last()?;
    let facets = facets::extract_facets(episodes);
    let key_exchanges = facets::identify_key_exchanges(episodes);
    let topic_preview = facets.topics.first().cloned().unwrap_or_default();

    Some(ConversationSummary {
        id: Uuid::new_v4(),
        session_id,
        opening_exchange: ExchangeSnapshot {
            user_text: first.user_text.clone(),
            agent_text: first.agent_text.clone(),
        },
        closing_exchange: ExchangeSnapshot {
            user_text: last.user_text.clone(),
            agent_text: last.agent_text.clone(),
        },
        key_exchanges,
        facets,
        timestamp_start: first.created_at,
        timestamp_end: last.created_at,
        topic_preview,
        created_at: Utc::now(),
    })
}

/// In-memory FIFO of up to `N` recently loaded [`ConversationSummary`]
/// records, reloaded from durable storage at startup (spec §4.F).
pub struct SummaryBuffer {
    persistence: Arc<dyn PersistenceStore>,
    capacity: usize,
    summaries: Mutex<VecDeque<ConversationSummary>>,
}

impl SummaryBuffer {
    /// Build an empty buffer with the given in-memory capacity.
    #[must_use]
    pub fn new(persistence: Arc<dyn PersistenceStore>, capacity: usize) -> Self {
        Self {
            persistence,
            capacity,
            summaries: Mutex::new(VecDeque::new()),
        }
    }

    /// Load up to `capacity` most-recent summaries from durable storage.
    #[instrument(skip(self))]
    pub async fn load_from_storage(&self) -> Result<()> {
        let loaded = self.persistence.list_conversation_summaries(self.capacity).await?;
        let mut summaries = self.summaries.lock();
        summaries.clear();
        summaries.extend(loaded);
        Ok(())
    }

    /// Persist `summary` and push it to the front of the in-memory FIFO,
    /// evicting the oldest entry if over capacity.
    pub async fn push(&self, summary: ConversationSummary) -> Result<()> {
        self.persistence.put_conversation_summary(&summary).await?;
        let mut summaries = self.summaries.lock();
        summaries.push_front(summary);
        while summaries.len() > self.capacity {
            summaries.pop_back();
        }
        Ok(())
    }

    /// Current in-memory summaries, newest first.
    #[must_use]
    pub fn summaries(&self) -> Vec<ConversationSummary> {
        self.summaries.lock().iter().cloned().collect()
    }

    /// Render the loaded summaries into a single bounded text block, newest
    /// first, with explicit begin/end markers and per-summary sections
    /// (spec §4.F).
    #[must_use]
    pub fn render_context(&self, max_tokens: usize) -> String {
        let summaries = self.summaries.lock();
        if summaries.is_empty() {
            return String::new();
        }

        let mut out = String::from("[BEGIN PRIOR CONVERSATION SUMMARIES]\n");
        let mut budget = max_tokens;
        for summary in summaries.iter() {
            let section = render_summary_section(summary);
            let cost = section.split_whitespace().count();
            if cost > budget {
                break;
            }
            out.push_str(&section);
            budget -= cost;
        }
        out.push_str("[END PRIOR CONVERSATION SUMMARIES]\n");
        out
    }
}

fn render_summary_section(summary: &ConversationSummary) -> String {
    let mut section = String::new();
    section.push_str("--- FIRST EXCHANGE ---\n");
    section.push_str(&summary.opening_exchange.user_text);
    section.push('\n');
    section.push_str("--- KEY POINTS ---\n");
    for point in &summary.facets.key_points {
        section.push_str("* ");
        section.push_str(point);
        section.push('\n');
    }
    section.push_str("--- KEY EXCHANGES ---\n");
    for exchange in &summary.key_exchanges {
        section.push_str("* ");
        section.push_str(&exchange.reason);
        section.push('\n');
    }
    section.push_str("--- PROGRESS ---\n");
    for item in &summary.facets.progress_made {
        section.push_str("* ");
        section.push_str(item);
        section.push('\n');
    }
    section.push_str("--- INSIGHTS ---\n");
    for item in &summary.facets.insights {
        section.push_str("* ");
        section.push_str(item);
        section.push('\n');
    }
    section.push_str("--- UNFINISHED ---\n");
    for item in &summary.facets.unfinished_threads {
        section.push_str("* ");
        section.push_str(item);
        section.push('\n');
    }
    section
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Exchange;

    #[test]
    fn build_summary_preserves_opening_and_closing_verbatim() {
        let session_id = Uuid::new_v4();
        let episodes = vec![
            Episode::new(
                session_id,
                0,
                &Exchange {
                    user_text: "hello".to_string(),
                    agent_text: "hi there".to_string(),
                },
                String::new(),
                0.3,
            ),
            Episode::new(
                session_id,
                1,
                &Exchange {
                    user_text: "goodbye".to_string(),
                    agent_text: "see you".to_string(),
                },
                String::new(),
                0.3,
            ),
        ];
        let summary = build_conversation_summary(session_id, &episodes, true).unwrap();
        assert_eq!(summary.opening_exchange.user_text, "hello");
        assert_eq!(summary.closing_exchange.user_text, "goodbye");
    }

    #[test]
    fn empty_episodes_yield_no_summary() {
        assert!(build_conversation_summary(Uuid::new_v4(), &[], true).is_none());
    }
}
