//! Query Router (spec §4.E): decides perfect-recall vs. approximate recall.

use std::sync::Arc;

use tracing::instrument;

use crate::error::Result;
use crate::facts::FactsStore;
use crate::semantic::{ScoredRecord, SemanticStore};
use crate::storage::FactQuery;
use crate::types::FactType;

/// Keywords indicating a need for exact/temporal recall.
pub const EXACT_KEYWORDS: &[&str] = &[
    "who", "what", "when", "where", "which", "show me", "find", "specific", "precisely", "exact",
    "command", "code", "file", "that",
];

/// Keywords indicating the query concerns past events.
pub const TEMPORAL_KEYWORDS: &[&str] = &[
    "yesterday",
    "last week",
    "earlier",
    "ago",
    "recently",
    "just now",
    "before",
    "last time",
    "previous",
    "past",
];

/// Per-fact-type keyword dictionary used by [`detect_fact_type`].
pub const FACT_TYPE_KEYWORDS: &[(FactType, &[&str])] = &[
    (
        FactType::Appointment,
        &["meeting", "appointment", "call", "interview", "event", "conference", "scheduled"],
    ),
    (
        FactType::Contact,
        &["person", "people", "contact", "email address", "phone", "colleague", "friend"],
    ),
    (
        FactType::Preference,
        &["prefer", "like", "favorite", "want", "love", "hate", "dislike", "choice"],
    ),
    (
        FactType::Task,
        &["task", "todo", "action item", "reminder", "need to", "should", "must"],
    ),
    (
        FactType::Note,
        &["note", "remember", "important", "reminder", "don't forget", "fyi"],
    ),
    (
        FactType::Location,
        &["location", "place", "address", "venue", "where", "office", "restaurant"],
    ),
    (
        FactType::Communication,
        &["email", "message", "text", "chat", "conversation", "call", "discussed"],
    ),
    (
        FactType::ToolUse,
        &["created", "generated", "sent", "uploaded", "document", "image", "video"],
    ),
    (FactType::Command, &["command", "cmd", "shell", "bash"]),
    (FactType::Code, &["code", "function", "script", "snippet"]),
    (FactType::File, &["file", "path", "directory", "folder"]),
    (FactType::Url, &["url", "link", "website"]),
    (FactType::Error, &["error", "exception", "bug", "issue"]),
    (FactType::Config, &["config", "setting", "configuration"]),
];

/// Detect a fact type from query keywords, in dictionary declaration order.
#[must_use]
pub fn detect_fact_type(query_lower: &str) -> Option<FactType> {
    FACT_TYPE_KEYWORDS
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|kw| query_lower.contains(kw)))
        .map(|(fact_type, _)| *fact_type)
}

/// Whether `query` carries any exact-recall keyword.
#[must_use]
pub fn has_exact_keyword(query_lower: &str) -> bool {
    EXACT_KEYWORDS.iter().any(|kw| query_lower.contains(kw))
}

/// Whether `query` carries any temporal keyword.
#[must_use]
pub fn has_temporal_keyword(query_lower: &str) -> bool {
    TEMPORAL_KEYWORDS.iter().any(|kw| query_lower.contains(kw))
}

/// Confidence that `query` needs facts rather than semantic recall, in
/// `[0, 1]` (spec §4.E step 5): 0.4 exact + 0.3 fact-type + 0.3 temporal.
#[must_use]
pub fn confidence(query: &str) -> f32 {
    let lower = query.to_lowercase();
    let mut score = 0.0;
    if has_exact_keyword(&lower) {
        score += 0.4;
    }
    if detect_fact_type(&lower).is_some() {
        score += 0.3;
    }
    if has_temporal_keyword(&lower) {
        score += 0.3;
    }
    score.min(1.0)
}

/// Human-readable explanation of the routing decision for `query`.
#[must_use]
pub fn explain(query: &str) -> String {
    let lower = query.to_lowercase();
    if let Some(fact_type) = detect_fact_type(&lower) {
        return format!("routed to facts (detected type: {fact_type})");
    }
    let exact: Vec<_> = EXACT_KEYWORDS.iter().filter(|kw| lower.contains(*kw)).collect();
    if !exact.is_empty() {
        return format!(
            "routed to facts (exact keywords: {})",
            exact.iter().map(|s| s.to_string()).collect::<Vec<_>>().join(", ")
        );
    }
    let temporal: Vec<_> = TEMPORAL_KEYWORDS.iter().filter(|kw| lower.contains(*kw)).collect();
    if !temporal.is_empty() {
        return format!(
            "routed to facts (temporal keywords: {})",
            temporal.iter().map(|s| s.to_string()).collect::<Vec<_>>().join(", ")
        );
    }
    "routed to semantic search (no exact/temporal indicators)".to_string()
}

/// Where a recall query was ultimately served from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteSource {
    /// Served from the Facts Store.
    Facts,
    /// Served from the Semantic Store.
    Semantic,
}

/// The outcome of routing one recall query.
pub enum RouteResult {
    /// Facts Store results, optionally filtered by a detected type.
    Facts {
        /// The fact type detected from the query, if any.
        fact_type: Option<FactType>,
        /// Matching facts.
        results: Vec<crate::types::Fact>,
    },
    /// Semantic Store results.
    Semantic {
        /// Matching records, scored.
        results: Vec<ScoredRecord>,
    },
}

impl RouteResult {
    /// Which store this result came from.
    #[must_use]
    pub fn source(&self) -> RouteSource {
        match self {
            RouteResult::Facts { .. } => RouteSource::Facts,
            RouteResult::Semantic { .. } => RouteSource::Semantic,
        }
    }

    /// Number of results carried.
    #[must_use]
    pub fn count(&self) -> usize {
        match self {
            RouteResult::Facts { results, .. } => results.len(),
            RouteResult::Semantic { results } => results.len(),
        }
    }
}

/// Routes recall queries between the Facts Store and the Semantic Store.
pub struct QueryRouter {
    facts: Arc<FactsStore>,
    semantic: Arc<SemanticStore>,
}

impl QueryRouter {
    /// Build a router over the given stores.
    #[must_use]
    pub fn new(facts: Arc<FactsStore>, semantic: Arc<SemanticStore>) -> Self {
        Self { facts, semantic }
    }

    /// Route `query`, falling through to semantic recall when an
    /// exact/temporal/fact-type signal yields no facts (spec §4.E steps 1-4).
    #[instrument(skip(self, query))]
    pub async fn route(&self, query: &str, limit: usize) -> Result<RouteResult> {
        let lower = query.to_lowercase();
        let fact_type = detect_fact_type(&lower);
        let needs_exact = has_exact_keyword(&lower) || has_temporal_keyword(&lower) || fact_type.is_some();

        if needs_exact {
            let facts = self
                .facts
                .search(&FactQuery {
                    text: Some(query.to_string()),
                    fact_type,
                    limit,
                    ..Default::default()
                })
                .await?;
            if !facts.is_empty() {
                return Ok(RouteResult::Facts { fact_type, results: facts });
            }
        }

        let results = self.semantic.retrieve(query, limit).await?;
        Ok(RouteResult::Semantic { results })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn confidence_caps_at_one() {
        let score = confidence("yesterday who did I email about dinner");
        assert!(score >= 0.7);
        assert!(score <= 1.0);
    }

    #[test]
    fn detect_fact_type_finds_preference() {
        assert_eq!(
            detect_fact_type("what is my favorite color"),
            Some(FactType::Preference)
        );
    }

    #[test]
    fn explain_mentions_detected_type() {
        let text = explain("what meeting do I have tomorrow");
        assert!(text.contains("appointment"));
    }

    #[test]
    fn low_signal_query_has_low_confidence() {
        assert!(confidence("tell me something interesting") < 0.4);
    }
}
