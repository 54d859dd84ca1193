//! Core data model shared by every component (spec §3).
//!
//! All timestamps are stored as UTC instants; local-zone scheduling is
//! layered on top by [`crate::schedule`]. All ids are opaque `Uuid`s, stable
//! across process restarts because they are generated once at insert time and
//! persisted verbatim.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One run of the assistant. Sessions never mutate after creation except for
/// the end-of-session summary, which lives in [`crate::types::Summary`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    /// Unique session id.
    pub id: Uuid,
    /// When this session was created.
    pub created_at: DateTime<Utc>,
    /// Optional human-assigned name.
    pub name: Option<String>,
}

impl Session {
    /// Start a new session.
    #[must_use]
    pub fn new(name: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            name,
        }
    }
}

/// How aggressively an episode has been folded into a summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum CompressionLevel {
    /// Stored verbatim, not yet touched by any summarizer.
    None = 0,
    /// Referenced by a buffer-level summary but the verbatim text is retained.
    Partial = 1,
    /// Folded into a rolling/session summary; verbatim text may be evicted
    /// from the in-memory buffer (durable copy is untouched).
    Full = 2,
}

/// A single (user, agent) exchange, the atomic unit the rest of the system
/// extracts facts from and summarizes over.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Exchange {
    /// What the user said.
    pub user_text: String,
    /// What the agent replied.
    pub agent_text: String,
}

/// A persisted record of one user/agent exchange (spec §3 `Episode`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Episode {
    /// Unique episode id.
    pub id: Uuid,
    /// Owning session.
    pub session_id: Uuid,
    /// Monotonic, gap-free position within the session, starting at 0.
    pub exchange_number: u64,
    /// When this exchange was recorded.
    pub created_at: DateTime<Utc>,
    /// Verbatim user text.
    pub user_text: String,
    /// Verbatim agent text.
    pub agent_text: String,
    /// Short derived sentence summarizing the exchange.
    pub summary: String,
    /// Importance in `[0, 1]`.
    pub importance: f32,
    /// Whether this episode still sits in the in-memory exchange buffer.
    pub in_buffer: bool,
    /// Whether a buffer/rolling summary has folded this episode in.
    pub summarized: bool,
    /// How far this episode has been compressed.
    pub compression_level: CompressionLevel,
    /// Whether the Fact Extractor has already processed this episode.
    pub facts_extracted: bool,
}

impl Episode {
    /// Construct a new, not-yet-summarized episode.
    #[must_use]
    pub fn new(
        session_id: Uuid,
        exchange_number: u64,
        exchange: &Exchange,
        summary: String,
        importance: f32,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            session_id,
            exchange_number,
            created_at: Utc::now(),
            user_text: exchange.user_text.clone(),
            agent_text: exchange.agent_text.clone(),
            summary,
            importance: importance.clamp(0.0, 1.0),
            in_buffer: true,
            summarized: false,
            compression_level: CompressionLevel::None,
            facts_extracted: false,
        }
    }

    /// View this episode as an [`Exchange`].
    #[must_use]
    pub fn as_exchange(&self) -> Exchange {
        Exchange {
            user_text: self.user_text.clone(),
            agent_text: self.agent_text.clone(),
        }
    }
}

/// The closed set of recallable fact kinds (spec §3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FactType {
    /// Meetings, calls, interviews, events.
    Appointment,
    /// People, email addresses, phone numbers, relationships.
    Contact,
    /// Personal preferences, likes, dislikes, choices.
    Preference,
    /// To-do items, action items, reminders.
    Task,
    /// Important information flagged to remember.
    Note,
    /// Places, addresses, venues, directions.
    Location,
    /// Emails, messages, calls: who, topic, outcome.
    Communication,
    /// Agent actions: documents created, emails sent, images generated.
    ToolUse,
    /// Shell commands and CLI operations.
    Command,
    /// Code snippets and scripts.
    Code,
    /// File paths and operations.
    File,
    /// URLs and web resources.
    Url,
    /// Errors and their solutions.
    Error,
    /// Configuration and settings.
    Config,
    /// Suggestions and advice given by the agent or others.
    Recommendation,
    /// Daily habits, recurring activities, patterns.
    Routine,
    /// Health-related information, metrics, activities.
    Health,
    /// Budget items, expenses, financial decisions.
    Financial,
}

impl FactType {
    /// All fact types, in a stable order used for stats breakdowns.
    #[must_use]
    pub const fn all() -> &'static [FactType] {
        &[
            FactType::Appointment,
            FactType::Contact,
            FactType::Preference,
            FactType::Task,
            FactType::Note,
            FactType::Location,
            FactType::Communication,
            FactType::ToolUse,
            FactType::Command,
            FactType::Code,
            FactType::File,
            FactType::Url,
            FactType::Error,
            FactType::Config,
            FactType::Recommendation,
            FactType::Routine,
            FactType::Health,
            FactType::Financial,
        ]
    }

    /// Parse a fact type from its lowercase snake_case name, as used in CLI
    /// filters and the query router's keyword dictionary.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        Self::all()
            .iter()
            .copied()
            .find(|t| t.as_str() == s.to_lowercase())
    }

    /// The canonical lowercase name of this fact type.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            FactType::Appointment => "appointment",
            FactType::Contact => "contact",
            FactType::Preference => "preference",
            FactType::Task => "task",
            FactType::Note => "note",
            FactType::Location => "location",
            FactType::Communication => "communication",
            FactType::ToolUse => "tool_use",
            FactType::Command => "command",
            FactType::Code => "code",
            FactType::File => "file",
            FactType::Url => "url",
            FactType::Error => "error",
            FactType::Config => "config",
            FactType::Recommendation => "recommendation",
            FactType::Routine => "routine",
            FactType::Health => "health",
            FactType::Financial => "financial",
        }
    }
}

impl std::fmt::Display for FactType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An atomically-recallable datum extracted from an episode (spec §3 `Fact`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fact {
    /// Unique fact id.
    pub id: Uuid,
    /// Closed fact type.
    pub fact_type: FactType,
    /// Normalized extracted content.
    pub content: String,
    /// Context window surrounding the extraction site.
    pub context: String,
    /// Importance in `[0, 1]`.
    pub importance: f32,
    /// Number of times this fact has been returned by a search.
    pub access_count: u64,
    /// When this fact was extracted.
    pub timestamp: DateTime<Utc>,
    /// Last time a search returned this fact.
    pub last_accessed: Option<DateTime<Utc>>,
    /// Owning session.
    pub session_id: Uuid,
    /// Source episode.
    pub episode_id: Uuid,
    /// Auto-generated tags (type + detected language/technology keywords).
    pub tags: BTreeSet<String>,
    /// Free-form per-type metadata (e.g. code block language).
    pub metadata: BTreeMap<String, String>,
    /// Stable hash of normalized lowercase content, used for reinforcement
    /// comparisons. Not a uniqueness constraint: repeated fingerprints are
    /// meaningful as reinforcement.
    pub fingerprint: String,
}

/// What granularity of compression a [`Summary`] represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SummaryType {
    /// Compresses a contiguous slice evicted from the exchange buffer.
    Buffer,
    /// The single end-of-session structured summary.
    Session,
    /// A periodic rolling compression independent of session boundaries.
    Rolling,
}

/// A structured compression of N consecutive exchanges (spec §3 `Summary`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    /// Unique summary id.
    pub id: Uuid,
    /// Owning session.
    pub session_id: Uuid,
    /// What kind of summary this is.
    pub summary_type: SummaryType,
    /// Long-form compressed text.
    pub content: String,
    /// Episode ids this summary was derived from, oldest first.
    pub source_episode_ids: Vec<Uuid>,
    /// Importance in `[0, 1]`.
    pub importance: f32,
    /// When this summary was generated.
    pub created_at: DateTime<Utc>,
}

/// A verbatim snapshot of one exchange, used by [`ConversationSummary`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExchangeSnapshot {
    /// Verbatim user text.
    pub user_text: String,
    /// Verbatim agent text.
    pub agent_text: String,
}

/// One of the up-to-`K` exchanges selected as especially salient.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyExchange {
    /// The exchange snapshot.
    pub exchange: ExchangeSnapshot,
    /// Why this exchange was selected (e.g. "importance keyword", "long").
    pub reason: String,
}

/// The twelve extracted facets of a rich conversation summary (spec §3/§4.F).
///
/// Ten are named content facets; `opening_exchange`/`closing_exchange` on
/// [`ConversationSummary`] are treated as the remaining two, matching the
/// "12 facets" figure in spec §4.F (the body of §3 lists ten by name).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConversationFacets {
    /// Bullet-style salient points.
    pub key_points: Vec<String>,
    /// Observations beyond the literal exchange content.
    pub insights: Vec<String>,
    /// Concrete progress markers ("implemented X", "fixed Y").
    pub progress_made: Vec<String>,
    /// Topics discussed, deduplicated.
    pub topics: Vec<String>,
    /// Decisions reached during the conversation.
    pub decisions: Vec<String>,
    /// Threads left open at session end.
    pub unfinished_threads: Vec<String>,
    /// Technical solutions proposed or applied.
    pub technical_solutions: Vec<String>,
    /// Signals of user trust/confidence in the agent.
    pub trust_indicators: Vec<String>,
    /// Recurring collaboration patterns observed.
    pub collaboration_patterns: Vec<String>,
    /// A short label describing the user's communication style.
    pub communication_style: String,
}

/// The rich, cross-session-continuity variant of a summary (spec §3).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationSummary {
    /// Unique id.
    pub id: Uuid,
    /// Owning session.
    pub session_id: Uuid,
    /// First exchange of the session, verbatim.
    pub opening_exchange: ExchangeSnapshot,
    /// Last exchange of the session, verbatim.
    pub closing_exchange: ExchangeSnapshot,
    /// Up to `K` heuristically-selected key exchanges, verbatim.
    pub key_exchanges: Vec<KeyExchange>,
    /// The ten deterministic facets.
    pub facets: ConversationFacets,
    /// Earliest exchange timestamp covered.
    pub timestamp_start: DateTime<Utc>,
    /// Latest exchange timestamp covered.
    pub timestamp_end: DateTime<Utc>,
    /// A short topic preview for index listings.
    pub topic_preview: String,
    /// When this summary was generated.
    pub created_at: DateTime<Utc>,
}

/// The three canonical identity documents plus the session-end memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdentityDocKind {
    /// System-owned identity parameters and learned patterns.
    Identity,
    /// Observations about the user.
    UserProfile,
    /// Adaptive settings.
    Preferences,
}

impl IdentityDocKind {
    /// The on-disk file name for this document.
    #[must_use]
    pub const fn file_name(self) -> &'static str {
        match self {
            IdentityDocKind::Identity => "IDENTITY",
            IdentityDocKind::UserProfile => "USER_PROFILE",
            IdentityDocKind::Preferences => "PREFERENCES",
        }
    }
}

/// A schedule canonicalized by [`crate::schedule`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trigger {
    /// Whether this is a cron expression or a fixed interval.
    pub kind: TriggerKind,
    /// The canonical cron string (5 or 6 fields) or interval descriptor.
    pub value: String,
    /// The IANA timezone this trigger is evaluated in.
    pub tz: String,
}

/// Discriminates between a cron-style and an interval-style trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerKind {
    /// A standard (possibly 6-field, seconds-extended) cron expression.
    Cron,
    /// A fixed `every N seconds|minutes|hours` interval, also cron-shaped.
    Interval,
}

/// A persistent, named, schedulable unit of work (spec §3 `ScheduledTask`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduledTask {
    /// Unique task id.
    pub id: Uuid,
    /// Human-facing name.
    pub display_name: String,
    /// The original schedule expression as supplied by the caller.
    pub schedule_expression: String,
    /// Name of the template to invoke on each fire.
    pub template_name: String,
    /// Opaque configuration passed to the template verbatim.
    pub template_config: BTreeMap<String, String>,
    /// Whether this task is eligible to fire.
    pub enabled: bool,
    /// When this task was created.
    pub created_at: DateTime<Utc>,
    /// When this task last started executing.
    pub last_run: Option<DateTime<Utc>>,
    /// When this task is next due to fire.
    pub next_run: Option<DateTime<Utc>>,
    /// Total number of executions started.
    pub run_count: u64,
    /// Number of executions that completed successfully.
    pub success_count: u64,
    /// Number of executions that failed.
    pub failure_count: u64,
}

impl ScheduledTask {
    /// `run_count` must always equal `success_count + failure_count`
    /// (spec §8 property 4).
    #[must_use]
    pub fn counts_consistent(&self) -> bool {
        self.run_count == self.success_count + self.failure_count
    }
}

/// An append-only log entry for one task firing (spec §3 `TaskExecution`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskExecution {
    /// Unique execution id.
    pub id: Uuid,
    /// The task this execution belongs to.
    pub task_id: Uuid,
    /// When execution began.
    pub started_at: DateTime<Utc>,
    /// When execution completed, `None` while still running or if the
    /// process crashed mid-execution.
    pub completed_at: Option<DateTime<Utc>>,
    /// Whether the template reported success.
    pub success: bool,
    /// Error detail if `success` is `false`.
    pub error_message: Option<String>,
    /// Verbatim template output, if any.
    pub output: Option<String>,
    /// Wall-clock duration once completed.
    pub duration_seconds: Option<f64>,
}

impl TaskExecution {
    /// Start a new, not-yet-completed execution record.
    #[must_use]
    pub fn start(task_id: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            task_id,
            started_at: Utc::now(),
            completed_at: None,
            success: false,
            error_message: None,
            output: None,
            duration_seconds: None,
        }
    }

    /// Finalize this execution with an outcome.
    pub fn complete(&mut self, success: bool, output: Option<String>, error: Option<String>) {
        let now = Utc::now();
        self.completed_at = Some(now);
        self.success = success;
        self.output = output;
        self.error_message = error;
        self.duration_seconds = Some((now - self.started_at).num_milliseconds() as f64 / 1000.0);
    }
}

/// A semantic-recall record: content plus its embedding (spec §3/§4.D).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SemanticRecord {
    /// Unique id.
    pub id: Uuid,
    /// The text this record indexes.
    pub content: String,
    /// Deterministic embedding vector.
    pub embedding: Vec<f32>,
    /// Importance in `[0, 1]`.
    pub importance: f32,
    /// When this record was created.
    pub created_at: DateTime<Utc>,
    /// Last time this record was touched by a store or recall.
    pub last_accessed: DateTime<Utc>,
    /// Number of times recalled.
    pub access_count: u64,
    /// Stable content fingerprint, used for dedupe-with-reinforcement.
    pub fingerprint: String,
    /// Owning session, if any.
    pub session_id: Option<Uuid>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fact_type_round_trips_through_str() {
        for ty in FactType::all() {
            assert_eq!(FactType::parse(ty.as_str()), Some(*ty));
        }
    }

    #[test]
    fn fact_type_all_has_eighteen_members() {
        assert_eq!(FactType::all().len(), 18);
    }

    #[test]
    fn episode_clamps_importance() {
        let session_id = Uuid::new_v4();
        let exchange = Exchange {
            user_text: "hi".to_string(),
            agent_text: "hello".to_string(),
        };
        let episode = Episode::new(session_id, 0, &exchange, "greeting".to_string(), 1.5);
        assert_eq!(episode.importance, 1.0);
    }

    #[test]
    fn task_execution_complete_sets_duration() {
        let mut execution = TaskExecution::start(Uuid::new_v4());
        execution.complete(true, Some("ok".to_string()), None);
        assert!(execution.completed_at.is_some());
        assert!(execution.duration_seconds.unwrap() >= 0.0);
    }

    #[test]
    fn scheduled_task_counts_consistent() {
        let mut task = ScheduledTask {
            id: Uuid::new_v4(),
            display_name: "t".to_string(),
            schedule_expression: "@daily".to_string(),
            template_name: "noop".to_string(),
            template_config: BTreeMap::new(),
            enabled: true,
            created_at: Utc::now(),
            last_run: None,
            next_run: None,
            run_count: 0,
            success_count: 0,
            failure_count: 0,
        };
        assert!(task.counts_consistent());
        task.run_count = 2;
        task.success_count = 1;
        task.failure_count = 1;
        assert!(task.counts_consistent());
        task.failure_count = 2;
        assert!(!task.counts_consistent());
    }
}
