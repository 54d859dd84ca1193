//! Runtime configuration (spec §6), built once at startup and shared by
//! reference across every component. Mirrors the teacher's
//! `MemoryConfig::from_env()` pattern: sane defaults, overridable by
//! environment variables, never re-read after startup.

use std::path::PathBuf;

use crate::error::{Error, Result};

/// Default tick interval for the task orchestrator.
pub const DEFAULT_SCHEDULER_TICK_SECONDS: u64 = 30;
/// Backoff interval used after a tick fails.
pub const DEFAULT_SCHEDULER_BACKOFF_SECONDS: u64 = 60;
/// Default per-template execution timeout.
pub const DEFAULT_TEMPLATE_TIMEOUT_SECONDS: u64 = 300;

/// Immutable runtime configuration, constructed once at process startup.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Root directory for all durable state (store file, identity documents).
    pub workspace_path: PathBuf,
    /// Steady-state exchange-buffer capacity (spec §5 pressure table default).
    pub buffer_size: usize,
    /// Hard cap at which a buffer-overflow summarization is forced regardless
    /// of pressure.
    pub buffer_truncate_at: usize,
    /// Number of episodes folded into one buffer-level summary.
    pub summary_buffer_size: usize,
    /// Maximum number of summaries retained in the in-memory FIFO.
    pub max_summaries_in_memory: usize,
    /// Whether to eagerly load the most recent session summary on startup.
    pub load_session_summary_on_start: bool,
    /// Soft token budget for `context_for_prompt` rendering.
    pub working_memory_max_tokens: usize,
    /// Task orchestrator tick interval, seconds.
    pub scheduler_tick_seconds: u64,
    /// Default per-template timeout, seconds.
    pub template_timeout_seconds: u64,
    /// Maximum number of archived conversation-memory documents retained.
    pub conversation_memory_archive_max: usize,
    /// IANA timezone name used to evaluate schedules and render local times.
    pub timezone: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            workspace_path: PathBuf::from("./memory-workspace"),
            buffer_size: 20,
            buffer_truncate_at: 30,
            summary_buffer_size: 10,
            max_summaries_in_memory: 50,
            load_session_summary_on_start: true,
            working_memory_max_tokens: 4000,
            scheduler_tick_seconds: DEFAULT_SCHEDULER_TICK_SECONDS,
            template_timeout_seconds: DEFAULT_TEMPLATE_TIMEOUT_SECONDS,
            conversation_memory_archive_max: 20,
            timezone: "UTC".to_string(),
        }
    }
}

impl Config {
    /// Build configuration from defaults overridden by environment variables.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] if an environment variable is set but
    /// cannot be parsed into the expected type.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(v) = std::env::var("MEMORY_WORKSPACE_PATH") {
            config.workspace_path = PathBuf::from(v);
        }
        if let Some(v) = parse_env("MEMORY_BUFFER_SIZE")? {
            config.buffer_size = v;
        }
        if let Some(v) = parse_env("MEMORY_BUFFER_TRUNCATE_AT")? {
            config.buffer_truncate_at = v;
        }
        if let Some(v) = parse_env("MEMORY_SUMMARY_BUFFER_SIZE")? {
            config.summary_buffer_size = v;
        }
        if let Some(v) = parse_env("MEMORY_MAX_SUMMARIES_IN_MEMORY")? {
            config.max_summaries_in_memory = v;
        }
        if let Some(v) = parse_env::<bool>("MEMORY_LOAD_SESSION_SUMMARY_ON_START")? {
            config.load_session_summary_on_start = v;
        }
        if let Some(v) = parse_env("MEMORY_WORKING_MEMORY_MAX_TOKENS")? {
            config.working_memory_max_tokens = v;
        }
        if let Some(v) = parse_env("MEMORY_SCHEDULER_TICK_SECONDS")? {
            config.scheduler_tick_seconds = v;
        }
        if let Some(v) = parse_env("MEMORY_TEMPLATE_TIMEOUT_SECONDS")? {
            config.template_timeout_seconds = v;
        }
        if let Some(v) = parse_env("MEMORY_CONVERSATION_ARCHIVE_MAX")? {
            config.conversation_memory_archive_max = v;
        }
        if let Ok(v) = std::env::var("MEMORY_TIMEZONE") {
            config.timezone = v;
        }

        config.validate()?;
        Ok(config)
    }

    /// Reject configurations that cannot yield a sensible runtime.
    fn validate(&self) -> Result<()> {
        if self.buffer_size == 0 {
            return Err(Error::Configuration(
                "buffer_size must be greater than zero".to_string(),
            ));
        }
        if self.buffer_truncate_at < self.buffer_size {
            return Err(Error::Configuration(
                "buffer_truncate_at must be >= buffer_size".to_string(),
            ));
        }
        if self.timezone.parse::<chrono_tz::Tz>().is_err() {
            return Err(Error::Configuration(format!(
                "unrecognized IANA timezone: {}",
                self.timezone
            )));
        }
        Ok(())
    }
}

fn parse_env<T>(key: &str) -> Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .parse::<T>()
            .map(Some)
            .map_err(|e| Error::Configuration(format!("{key}: {e}"))),
        Err(std::env::VarError::NotPresent) => Ok(None),
        Err(std::env::VarError::NotUnicode(_)) => Err(Error::Configuration(format!(
            "{key} is not valid unicode"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_validates() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn rejects_zero_buffer_size() {
        let mut config = Config::default();
        config.buffer_size = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_truncate_below_buffer_size() {
        let mut config = Config::default();
        config.buffer_truncate_at = config.buffer_size - 1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_unknown_timezone() {
        let mut config = Config::default();
        config.timezone = "Not/AZone".to_string();
        assert!(config.validate().is_err());
    }
}
