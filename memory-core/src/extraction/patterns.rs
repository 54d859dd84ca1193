//! Per-[`FactType`] recognition patterns and scoring tables (spec §4.B).
//!
//! Regex shapes and the importance weight table are grounded in the
//! extraction patterns of the assistant this system was distilled from;
//! `routine`, `health`, `financial`, `recommendation`, and `config` have no
//! counterpart pattern there (that source only carried their weight in its
//! scoring table), so their patterns here are authored fresh in the same
//! style, documented in `DESIGN.md`.

use regex::Regex;

use crate::types::FactType;

/// Keywords that boost importance by +0.2 (urgency).
pub const TEMPORAL_KEYWORDS: &[&str] = &[
    "today",
    "tomorrow",
    "urgent",
    "asap",
    "now",
    "immediately",
    "deadline",
];

/// Keywords that boost importance by +0.1 (criticality).
pub const CRITICAL_KEYWORDS: &[&str] = &["critical", "important", "must", "required", "vital", "essential"];

/// Technology tag keywords, `(tag, trigger substrings)`.
pub const TECH_TAGS: &[(&str, &[&str])] = &[
    ("docker", &["docker", "container"]),
    ("python", &["python", "py", "pip"]),
    ("javascript", &["javascript", "js", "npm", "node"]),
    ("git", &["git", "commit", "push", "pull"]),
    ("database", &["database", "sql", "postgres", "sqlite"]),
];

/// The base importance weight for a fact type, before keyword adjustments
/// (spec §4.B step 2/3, values from the source's `type_weights` table).
#[must_use]
pub fn base_weight(fact_type: FactType) -> f32 {
    match fact_type {
        FactType::Appointment => 0.8,
        FactType::Contact => 0.7,
        FactType::Preference => 0.7,
        FactType::Task => 0.8,
        FactType::Note => 0.7,
        FactType::Location => 0.6,
        FactType::Recommendation => 0.7,
        FactType::Routine => 0.6,
        FactType::Health => 0.8,
        FactType::Financial => 0.8,
        FactType::Communication => 0.8,
        FactType::ToolUse => 0.7,
        FactType::Command => 0.3,
        FactType::Code => 0.4,
        FactType::File => 0.3,
        FactType::Url => 0.5,
        FactType::Error => 0.5,
        FactType::Config => 0.4,
    }
}

/// Minimum content length accepted for a fact of this type, filtering false
/// positives such as single-character paths (spec §4.B step 4).
#[must_use]
pub fn min_content_len(fact_type: FactType) -> usize {
    match fact_type {
        FactType::Contact => 2,
        FactType::Location => 3,
        FactType::Command => 3,
        FactType::Appointment
        | FactType::Task
        | FactType::Note
        | FactType::Preference
        | FactType::Communication
        | FactType::ToolUse
        | FactType::Error => 5,
        FactType::Url | FactType::File => 0,
        FactType::Code => 10,
        FactType::Routine | FactType::Health | FactType::Financial | FactType::Recommendation => 5,
        FactType::Config => 5,
    }
}

/// The context window radius (chars) used around a match for this type.
#[must_use]
pub const fn context_window(fact_type: FactType) -> usize {
    match fact_type {
        FactType::Url | FactType::File => 50,
        _ => 100,
    }
}

/// One compiled recognition pattern for a fact type. `capture_group` selects
/// which capture holds the candidate content; `0` means the whole match.
pub struct FactPattern {
    /// The fact type this pattern recognizes.
    pub fact_type: FactType,
    /// Compiled regex.
    pub regex: Regex,
    /// Capture group index holding the candidate text.
    pub capture_group: usize,
    /// Whether this pattern runs over `user`, `agent`, or both.
    pub scope: PatternScope,
}

/// Which half of an exchange a pattern is evaluated against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatternScope {
    /// Only the user's text.
    User,
    /// Only the agent's text.
    Agent,
    /// `user\nagent` concatenated.
    Full,
}

/// Build one compiled pattern per fact type in a fixed, deterministic order.
///
/// # Panics
///
/// Panics if a pattern literal fails to compile; these are fixed string
/// literals validated by the accompanying unit tests, so this cannot happen
/// at runtime with unmodified source.
#[must_use]
pub fn build_patterns() -> Vec<FactPattern> {
    vec![
        FactPattern {
            fact_type: FactType::Appointment,
            regex: Regex::new(
                r"(?i)(?:meeting|appointment|call|interview|event|conference)(?:\s+(?:with|at|on))?\s+(.+?)(?:[.,;\n]|$)",
            )
            .expect("valid regex"),
            capture_group: 1,
            scope: PatternScope::Full,
        },
        FactPattern {
            fact_type: FactType::Task,
            regex: Regex::new(
                r"(?i)(?:todo|task|need to|should|must|have to|remember to|action item|followup)\s+(.+?)(?:[.,;\n]|$)",
            )
            .expect("valid regex"),
            capture_group: 1,
            scope: PatternScope::User,
        },
        FactPattern {
            fact_type: FactType::Contact,
            regex: Regex::new(
                r"(?:email|call|contact|reach out to|talk to|meet with|spoke with)\s+([A-Z][a-z]+(?:\s+[A-Z][a-z]+)?)",
            )
            .expect("valid regex"),
            capture_group: 1,
            scope: PatternScope::Full,
        },
        FactPattern {
            fact_type: FactType::Note,
            regex: Regex::new(r"(?i)(?:note|remember|important|don't forget|fyi|heads up):\s*(.+?)(?:[.;\n]|$)")
                .expect("valid regex"),
            capture_group: 1,
            scope: PatternScope::Full,
        },
        FactPattern {
            fact_type: FactType::Location,
            regex: Regex::new(
                r"(?:at|in|near|on)\s+([A-Z][a-z]+(?:\s+[A-Z][a-z]+)*(?:\s+(?:Street|St|Avenue|Ave|Road|Rd|Boulevard|Blvd|Drive|Dr|Building|Office|Restaurant|Cafe|Hotel))?)",
            )
            .expect("valid regex"),
            capture_group: 1,
            scope: PatternScope::Full,
        },
        FactPattern {
            fact_type: FactType::Preference,
            regex: Regex::new(
                r"(?i)(?:i\s+)?(?:prefer|like|love|want|need|always|never|favorite|hate|dislike)\s+(.+?)(?:[.,;\n]|$)",
            )
            .expect("valid regex"),
            capture_group: 1,
            scope: PatternScope::User,
        },
        FactPattern {
            fact_type: FactType::Communication,
            regex: Regex::new(
                r"(?i)(?:email|message|text|chat|call)(?:ed|ing)?\s+(?:to\s+)?(.+?)(?:[.,;\n]|$)",
            )
            .expect("valid regex"),
            capture_group: 1,
            scope: PatternScope::Full,
        },
        FactPattern {
            fact_type: FactType::ToolUse,
            regex: Regex::new(
                r"(?i)(?:called|using|executed|created|generated|sent|uploaded)\s+(\w+)\s+(?:tool|document|email|image|video)",
            )
            .expect("valid regex"),
            capture_group: 0,
            scope: PatternScope::Agent,
        },
        FactPattern {
            fact_type: FactType::Url,
            regex: Regex::new(r#"https?://[^\s<>"{}|\\^`\[\]]+"#).expect("valid regex"),
            capture_group: 0,
            scope: PatternScope::Full,
        },
        FactPattern {
            fact_type: FactType::Command,
            regex: Regex::new(r"(?m)(?:^|\n)\$\s*(.+?)(?:\n|$)").expect("valid regex"),
            capture_group: 1,
            scope: PatternScope::Full,
        },
        FactPattern {
            fact_type: FactType::Code,
            regex: Regex::new(r"(?s)```(\w*)\n(.*?)```").expect("valid regex"),
            capture_group: 2,
            scope: PatternScope::Full,
        },
        FactPattern {
            fact_type: FactType::File,
            regex: Regex::new(r"(?:/[\w\-.]+)+(?:\.\w+)?").expect("valid regex"),
            capture_group: 0,
            scope: PatternScope::Full,
        },
        FactPattern {
            fact_type: FactType::Error,
            regex: Regex::new(r"(?i)(?:Error|Exception|Failed|WARNING):\s*(.+?)(?:\n|$)").expect("valid regex"),
            capture_group: 0,
            scope: PatternScope::Full,
        },
        FactPattern {
            fact_type: FactType::Recommendation,
            regex: Regex::new(r"(?i)(?:I\s+)?(?:recommend|suggest|you should try|consider)\s+(.+?)(?:[.,;\n]|$)")
                .expect("valid regex"),
            capture_group: 1,
            scope: PatternScope::Agent,
        },
        FactPattern {
            fact_type: FactType::Routine,
            regex: Regex::new(r"(?i)(?:every day|every morning|every night|each (?:day|morning|evening)|daily)\s+(?:i\s+)?(.+?)(?:[.,;\n]|$)")
                .expect("valid regex"),
            capture_group: 1,
            scope: PatternScope::User,
        },
        FactPattern {
            fact_type: FactType::Health,
            regex: Regex::new(r"(?i)(?:slept|workout|exercised|weigh(?:ed|s)|blood pressure|heart rate|ran|jogged)\s+(.+?)(?:[.,;\n]|$)")
                .expect("valid regex"),
            capture_group: 1,
            scope: PatternScope::Full,
        },
        FactPattern {
            fact_type: FactType::Financial,
            regex: Regex::new(r"(?i)(?:spent|paid|cost|budget|invoice|\$\s?\d)[^\n.;]{0,3}\s*(.+?)(?:[.,;\n]|$)")
                .expect("valid regex"),
            capture_group: 1,
            scope: PatternScope::Full,
        },
        FactPattern {
            fact_type: FactType::Config,
            regex: Regex::new(r"(?i)(?:set|config(?:ure)?|environment variable|env var)\s+([\w.\-]+\s*=\s*\S+)")
                .expect("valid regex"),
            capture_group: 1,
            scope: PatternScope::Full,
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_fact_type_has_a_pattern() {
        let patterns = build_patterns();
        for fact_type in FactType::all() {
            assert!(
                patterns.iter().any(|p| p.fact_type == *fact_type),
                "missing pattern for {fact_type:?}"
            );
        }
    }

    #[test]
    fn base_weight_matches_priority_ordering() {
        assert!(base_weight(FactType::Appointment) > base_weight(FactType::Command));
        assert!(base_weight(FactType::Health) > base_weight(FactType::File));
    }
}
