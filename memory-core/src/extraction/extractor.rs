//! Deterministic, side-effect-free fact extraction (spec §4.B).

use std::collections::BTreeMap;

use sha2::{Digest, Sha256};
use tracing::instrument;
use uuid::Uuid;

use super::patterns::{
    base_weight, build_patterns, context_window, min_content_len, FactPattern, PatternScope,
    CRITICAL_KEYWORDS, TECH_TAGS, TEMPORAL_KEYWORDS,
};
use crate::types::{Exchange, Fact, FactType};

/// Extracts typed [`Fact`] candidates from `(user, agent)` exchanges.
///
/// Holds one compiled [`FactPattern`] per fact type, built once at
/// construction (teacher pattern: compiled regex cached on the struct).
pub struct FactExtractor {
    patterns: Vec<FactPattern>,
}

impl Default for FactExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl FactExtractor {
    /// Compile every recognition pattern.
    #[must_use]
    pub fn new() -> Self {
        Self {
            patterns: build_patterns(),
        }
    }

    /// Extract every fact candidate from an exchange, attributed to
    /// `session_id`/`episode_id`.
    ///
    /// Never panics on malformed input: a pattern that fails to match simply
    /// contributes no candidates. Empty exchanges yield an empty list.
    #[instrument(skip(self, exchange), fields(session_id = %session_id, episode_id = %episode_id))]
    #[must_use]
    pub fn extract(&self, exchange: &Exchange, session_id: Uuid, episode_id: Uuid) -> Vec<Fact> {
        let full_text = format!("{}\n{}", exchange.user_text, exchange.agent_text);
        let mut facts = Vec::new();

        for pattern in &self.patterns {
            let haystack: &str = match pattern.scope {
                PatternScope::User => &exchange.user_text,
                PatternScope::Agent => &exchange.agent_text,
                PatternScope::Full => &full_text,
            };

            for capture in pattern.regex.captures_iter(haystack) {
                let Some(matched) = capture
                    .get(pattern.capture_group)
                    .or_else(|| capture.get(0))
                else {
                    continue;
                };
                let content = matched.as_str().trim().to_string();
                if content.len() < min_content_len(pattern.fact_type) {
                    continue;
                }

                let window = context_window(pattern.fact_type);
                let context = context_around(haystack, matched.start(), matched.end(), window);
                let importance = score_importance(pattern.fact_type, &content);
                let mut metadata = BTreeMap::new();
                if pattern.fact_type == FactType::Code {
                    let language = capture
                        .get(1)
                        .map(|m| m.as_str())
                        .filter(|s| !s.is_empty())
                        .unwrap_or("unknown");
                    metadata.insert("language".to_string(), language.to_string());
                }

                facts.push(Fact {
                    id: Uuid::new_v4(),
                    fact_type: pattern.fact_type,
                    tags: generate_tags(pattern.fact_type, &content, &metadata),
                    content: content.clone(),
                    context,
                    importance,
                    access_count: 0,
                    timestamp: chrono::Utc::now(),
                    last_accessed: None,
                    session_id,
                    episode_id,
                    metadata,
                    fingerprint: fingerprint(&content),
                });
            }
        }

        facts
    }
}

fn context_around(text: &str, start: usize, end: usize, window: usize) -> String {
    let lo = nearest_char_boundary(text, start.saturating_sub(window), false);
    let hi = nearest_char_boundary(text, (end + window).min(text.len()), true);
    let mut context = text.get(lo..hi).unwrap_or(text).to_string();
    if context.len() > 500 {
        context.truncate(nearest_char_boundary(&context, 500, false));
        context.push_str("...");
    }
    context
}

fn nearest_char_boundary(text: &str, mut index: usize, forward: bool) -> usize {
    index = index.min(text.len());
    while index > 0 && index < text.len() && !text.is_char_boundary(index) {
        if forward {
            index += 1;
        } else {
            index -= 1;
        }
    }
    index
}

fn score_importance(fact_type: FactType, content: &str) -> f32 {
    let mut importance = base_weight(fact_type);
    let lowered = content.to_lowercase();

    if TEMPORAL_KEYWORDS.iter().any(|kw| lowered.contains(kw)) {
        importance = (importance + 0.2).min(1.0);
    }
    if CRITICAL_KEYWORDS.iter().any(|kw| lowered.contains(kw)) {
        importance = (importance + 0.1).min(1.0);
    }
    if content.contains('!') || (content.chars().any(char::is_alphabetic) && content == content.to_uppercase()) {
        importance = (importance + 0.1).min(1.0);
    }

    importance.clamp(0.0, 1.0)
}

fn generate_tags(
    fact_type: FactType,
    content: &str,
    metadata: &BTreeMap<String, String>,
) -> std::collections::BTreeSet<String> {
    let mut tags = std::collections::BTreeSet::new();
    tags.insert(fact_type.as_str().to_string());

    if fact_type == FactType::Code {
        if let Some(lang) = metadata.get("language") {
            tags.insert(lang.clone());
        }
    }

    let lowered = content.to_lowercase();
    for (tag, keywords) in TECH_TAGS {
        if keywords.iter().any(|kw| lowered.contains(kw)) {
            tags.insert((*tag).to_string());
        }
    }

    tags
}

/// Stable hash of normalized (lowercased, trimmed) content (spec §4.B step 6).
#[must_use]
pub fn fingerprint(content: &str) -> String {
    let normalized = content.trim().to_lowercase();
    let digest = Sha256::digest(normalized.as_bytes());
    format!("{digest:x}")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn exchange(user: &str, agent: &str) -> Exchange {
        Exchange {
            user_text: user.to_string(),
            agent_text: agent.to_string(),
        }
    }

    #[test]
    fn empty_exchange_yields_empty_list() {
        let extractor = FactExtractor::new();
        let facts = extractor.extract(&exchange("", ""), Uuid::new_v4(), Uuid::new_v4());
        assert!(facts.is_empty());
    }

    #[test]
    fn extracts_communication_fact_with_high_importance() {
        let extractor = FactExtractor::new();
        let facts = extractor.extract(
            &exchange(
                "Email mom@example.com about dinner at 7pm Friday",
                "Email sent successfully to mom@example.com",
            ),
            Uuid::new_v4(),
            Uuid::new_v4(),
        );
        let comms: Vec<_> = facts
            .iter()
            .filter(|f| f.fact_type == FactType::Communication)
            .collect();
        assert!(!comms.is_empty());
        assert!(comms.iter().any(|f| f.content.contains("mom@example.com")));
        assert!(comms.iter().all(|f| f.importance >= 0.8));
    }

    #[test]
    fn extraction_is_deterministic() {
        let extractor = FactExtractor::new();
        let ex = exchange("I need to call the dentist tomorrow, it's urgent!", "Noted.");
        let first = extractor.extract(&ex, Uuid::nil(), Uuid::nil());
        let second = extractor.extract(&ex, Uuid::nil(), Uuid::nil());
        let first_triples: Vec<_> = first
            .iter()
            .map(|f| (f.fact_type, f.fingerprint.clone(), f.importance))
            .collect();
        let second_triples: Vec<_> = second
            .iter()
            .map(|f| (f.fact_type, f.fingerprint.clone(), f.importance))
            .collect();
        assert_eq!(first_triples, second_triples);
    }

    #[test]
    fn code_block_captures_language_metadata() {
        let extractor = FactExtractor::new();
        let facts = extractor.extract(
            &exchange("", "```python\nprint('hi')\n```"),
            Uuid::new_v4(),
            Uuid::new_v4(),
        );
        let code = facts.iter().find(|f| f.fact_type == FactType::Code).unwrap();
        assert_eq!(code.metadata.get("language").map(String::as_str), Some("python"));
    }

    #[test]
    fn fingerprint_is_case_and_whitespace_insensitive() {
        assert_eq!(fingerprint("Hello World"), fingerprint("  hello world  "));
    }
}
