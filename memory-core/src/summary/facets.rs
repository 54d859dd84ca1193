//! The twelve deterministic, keyword-driven facet extractors (spec §3/§4.F),
//! grounded in the source's `ConversationSummaryBuffer` extraction helpers.

use crate::types::{ConversationFacets, Episode, ExchangeSnapshot, KeyExchange};

const IMPORTANCE_KEYWORDS: &[&str] = &[
    "breakthrough",
    "insight",
    "realize",
    "understand",
    "decision",
    "implement",
    "solution",
    "problem",
    "critical",
    "important",
    "remember",
    "recall",
    "discussed",
    "mentioned",
    "talked about",
    "plan",
    "next",
    "continue",
    "follow up",
];

/// Up to 10 exchanges preserved verbatim because they look especially
/// salient (spec §4.F, capped at `K = 10`).
#[must_use]
pub fn identify_key_exchanges(episodes: &[Episode]) -> Vec<KeyExchange> {
    let mut out = Vec::new();
    for episode in episodes {
        let user_lower = episode.user_text.to_lowercase();
        let agent_lower = episode.agent_text.to_lowercase();

        let reason = if IMPORTANCE_KEYWORDS
            .iter()
            .any(|kw| user_lower.contains(kw) || agent_lower.contains(kw))
        {
            Some("contains important keywords or breakthrough moment")
        } else if episode.user_text.len() > 200 || episode.agent_text.len() > 300 {
            Some("detailed exchange with substantial content")
        } else {
            None
        };

        if let Some(reason) = reason {
            out.push(KeyExchange {
                exchange: ExchangeSnapshot {
                    user_text: episode.user_text.clone(),
                    agent_text: episode.agent_text.clone(),
                },
                reason: reason.to_string(),
            });
        }
        if out.len() == 10 {
            break;
        }
    }
    out
}

fn truncated(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        text.to_string()
    } else {
        let prefix: String = text.chars().take(max).collect();
        format!("{prefix}...")
    }
}

fn key_points(episodes: &[Episode]) -> Vec<String> {
    const USER_CUES: &[&str] = &["let's", "we should", "i want to", "can we"];
    const AGENT_CUES: &[&str] = &["solution", "approach", "recommend", "suggest"];
    let mut points = Vec::new();
    for episode in episodes {
        if USER_CUES.iter().any(|c| episode.user_text.to_lowercase().contains(c)) {
            points.push(format!("User initiated: {}", truncated(&episode.user_text, 100)));
        }
        if AGENT_CUES.iter().any(|c| episode.agent_text.to_lowercase().contains(c)) {
            points.push(format!("Agent suggested: {}", truncated(&episode.agent_text, 100)));
        }
    }
    points.truncate(15);
    points
}

fn insights(episodes: &[Episode]) -> Vec<String> {
    const KEYWORDS: &[&str] = &["realize", "understand", "insight", "breakthrough", "aha", "makes sense"];
    let mut out = Vec::new();
    for episode in episodes {
        let user_lower = episode.user_text.to_lowercase();
        let agent_lower = episode.agent_text.to_lowercase();
        if let Some(kw) = KEYWORDS.iter().find(|k| user_lower.contains(**k) || agent_lower.contains(**k)) {
            if user_lower.contains(*kw) {
                out.push(format!("User insight: {}", truncated(&episode.user_text, 150)));
            } else {
                out.push(format!("Agent insight: {}", truncated(&episode.agent_text, 150)));
            }
        }
    }
    out.truncate(10);
    out
}

fn progress_made(episodes: &[Episode]) -> Vec<String> {
    const KEYWORDS: &[&str] = &["completed", "finished", "done", "achieved", "implemented", "solved", "fixed"];
    let mut out = Vec::new();
    for episode in episodes {
        let agent_lower = episode.agent_text.to_lowercase();
        if KEYWORDS.iter().any(|kw| agent_lower.contains(kw)) {
            out.push(format!("Progress made: {}", truncated(&episode.agent_text, 150)));
        }
    }
    out.truncate(10);
    out
}

fn topics(episodes: &[Episode]) -> Vec<String> {
    const COMMON_TOPICS: &[&str] = &[
        "memory system",
        "consciousness",
        "ai",
        "implementation",
        "architecture",
        "buffer",
        "summary",
        "persistence",
        "identity",
        "collaboration",
        "development",
        "testing",
        "debugging",
        "performance",
        "optimization",
    ];
    let all_text: String = episodes
        .iter()
        .map(|e| format!("{} {}", e.user_text, e.agent_text))
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase();
    let mut found: Vec<String> = COMMON_TOPICS
        .iter()
        .filter(|t| all_text.contains(**t))
        .map(|t| title_case(t))
        .collect();
    found.dedup();
    found.truncate(15);
    found
}

fn title_case(s: &str) -> String {
    s.split(' ')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn technical_solutions(episodes: &[Episode]) -> Vec<String> {
    const KEYWORDS: &[&str] = &["class", "function", "method", "implementation", "algorithm", "code", "api", "database"];
    let mut out = Vec::new();
    for episode in episodes {
        let agent_lower = episode.agent_text.to_lowercase();
        if KEYWORDS.iter().any(|kw| agent_lower.contains(kw)) {
            out.push(format!("Technical: {}", truncated(&episode.agent_text, 200)));
        }
    }
    out.truncate(8);
    out
}

fn decisions(episodes: &[Episode]) -> Vec<String> {
    const KEYWORDS: &[&str] = &["decided", "agree", "let's go with", "will implement", "choose", "selected"];
    let mut out = Vec::new();
    for episode in episodes {
        let user_lower = episode.user_text.to_lowercase();
        let agent_lower = episode.agent_text.to_lowercase();
        if let Some(kw) = KEYWORDS.iter().find(|k| user_lower.contains(**k) || agent_lower.contains(**k)) {
            let (source, text) = if user_lower.contains(*kw) {
                ("User", &episode.user_text)
            } else {
                ("Agent", &episode.agent_text)
            };
            out.push(format!("{source} decision: {}", truncated(text, 150)));
        }
    }
    out.truncate(8);
    out
}

fn unfinished_threads(episodes: &[Episode]) -> Vec<String> {
    const KEYWORDS: &[&str] = &["todo", "next", "later", "follow up", "continue", "remember to", "need to"];
    let mut out = Vec::new();
    for episode in episodes {
        let user_lower = episode.user_text.to_lowercase();
        let agent_lower = episode.agent_text.to_lowercase();
        if let Some(kw) = KEYWORDS.iter().find(|k| user_lower.contains(**k) || agent_lower.contains(**k)) {
            let (source, text) = if user_lower.contains(*kw) {
                ("User", &episode.user_text)
            } else {
                ("Agent", &episode.agent_text)
            };
            out.push(format!("{source} noted: {}", truncated(text, 150)));
        }
    }
    out.truncate(8);
    out
}

fn trust_indicators(episodes: &[Episode]) -> Vec<String> {
    const KEYWORDS: &[&str] = &["thank you", "appreciate", "helpful", "great", "perfect", "exactly", "trust"];
    let mut out = Vec::new();
    for episode in episodes {
        let user_lower = episode.user_text.to_lowercase();
        if KEYWORDS.iter().any(|kw| user_lower.contains(kw)) {
            out.push(format!("User expressed: {}", truncated(&episode.user_text, 100)));
        }
    }
    out.truncate(5);
    out
}

fn collaboration_patterns(episodes: &[Episode]) -> Vec<String> {
    const KEYWORDS: &[&str] = &["we", "together", "collaborate", "work on", "let's", "our"];
    let mut out = Vec::new();
    for episode in episodes {
        let user_lower = episode.user_text.to_lowercase();
        if KEYWORDS.iter().any(|kw| user_lower.contains(kw)) {
            out.push(format!("Collaborative: {}", truncated(&episode.user_text, 100)));
        }
    }
    out.truncate(5);
    out
}

fn communication_style(episodes: &[Episode]) -> String {
    if episodes.len() < 3 {
        return "Brief interaction".to_string();
    }
    let avg_len =
        episodes.iter().map(|e| e.user_text.len()).sum::<usize>() as f64 / episodes.len() as f64;
    if avg_len > 200.0 {
        "Detailed, thorough communication".to_string()
    } else if avg_len > 100.0 {
        "Moderate detail, conversational".to_string()
    } else {
        "Concise, direct communication".to_string()
    }
}

/// Run every facet extractor over `episodes` (spec §4.F).
#[must_use]
pub fn extract_facets(episodes: &[Episode]) -> ConversationFacets {
    ConversationFacets {
        key_points: key_points(episodes),
        insights: insights(episodes),
        progress_made: progress_made(episodes),
        topics: topics(episodes),
        decisions: decisions(episodes),
        unfinished_threads: unfinished_threads(episodes),
        technical_solutions: technical_solutions(episodes),
        trust_indicators: trust_indicators(episodes),
        collaboration_patterns: collaboration_patterns(episodes),
        communication_style: communication_style(episodes),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{CompressionLevel, Exchange};
    use uuid::Uuid;

    fn episode(n: u64, user: &str, agent: &str) -> Episode {
        Episode::new(
            Uuid::nil(),
            n,
            &Exchange {
                user_text: user.to_string(),
                agent_text: agent.to_string(),
            },
            String::new(),
            0.5,
        )
    }

    #[test]
    fn key_exchanges_caps_at_ten() {
        let episodes: Vec<_> = (0..20)
            .map(|n| episode(n, "this is critical", "ok"))
            .collect();
        assert_eq!(identify_key_exchanges(&episodes).len(), 10);
    }

    #[test]
    fn communication_style_scales_with_length() {
        let short: Vec<_> = (0..5).map(|n| episode(n, "hi", "hi")).collect();
        assert_eq!(communication_style(&short), "Concise, direct communication");
    }

    #[test]
    fn compression_level_default_is_none() {
        let e = episode(0, "a", "b");
        assert_eq!(e.compression_level, CompressionLevel::None);
    }
}
