//! Builds the shared [`memory_core::config::Config`] used by every command.
//!
//! Precedence, highest first: `--workspace` / `--config` CLI flags, then an
//! optional TOML config file, then [`memory_core::config::Config::from_env`]'s
//! own defaults. The file is applied by setting environment variables the
//! core config layer already reads, so this module never constructs a
//! `Config` itself — it only arranges for `from_env` to see the right
//! values, matching the teacher's layered-overlay approach to configuration.

use std::path::{Path, PathBuf};

use anyhow::Context;
use memory_core::config::Config;
use serde::Deserialize;

/// Overlay loaded from an optional TOML file. Every field mirrors one of
/// [`Config`]'s overridable settings; absent fields leave the environment
/// (and therefore `Config::from_env`'s defaults) untouched.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileOverrides {
    workspace_path: Option<PathBuf>,
    buffer_size: Option<usize>,
    buffer_truncate_at: Option<usize>,
    summary_buffer_size: Option<usize>,
    max_summaries_in_memory: Option<usize>,
    load_session_summary_on_start: Option<bool>,
    working_memory_max_tokens: Option<usize>,
    scheduler_tick_seconds: Option<u64>,
    template_timeout_seconds: Option<u64>,
    conversation_memory_archive_max: Option<usize>,
    timezone: Option<String>,
}

/// Default location of the optional config file: `<platform config dir>/memory-cli/config.toml`.
fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("memory-cli").join("config.toml"))
}

/// Default workspace root when neither `--workspace` nor the config file set one.
fn default_workspace() -> PathBuf {
    dirs::data_dir()
        .map(|dir| dir.join("memory-cli"))
        .unwrap_or_else(|| PathBuf::from("./memory-workspace"))
}

/// Sets an environment variable for `Config::from_env` to pick up, unless
/// the process environment already defines it (a real env var always wins
/// over the config file).
///
/// # Safety
///
/// Runs single-threaded, early in `main`, before any other component reads
/// the environment, so there is no concurrent-access race.
fn set_env_if_absent(key: &str, value: &str) {
    if std::env::var_os(key).is_none() {
        unsafe {
            std::env::set_var(key, value);
        }
    }
}

fn apply_file_overrides(overrides: &FileOverrides) {
    if let Some(v) = &overrides.workspace_path {
        set_env_if_absent("MEMORY_WORKSPACE_PATH", &v.display().to_string());
    }
    if let Some(v) = overrides.buffer_size {
        set_env_if_absent("MEMORY_BUFFER_SIZE", &v.to_string());
    }
    if let Some(v) = overrides.buffer_truncate_at {
        set_env_if_absent("MEMORY_BUFFER_TRUNCATE_AT", &v.to_string());
    }
    if let Some(v) = overrides.summary_buffer_size {
        set_env_if_absent("MEMORY_SUMMARY_BUFFER_SIZE", &v.to_string());
    }
    if let Some(v) = overrides.max_summaries_in_memory {
        set_env_if_absent("MEMORY_MAX_SUMMARIES_IN_MEMORY", &v.to_string());
    }
    if let Some(v) = overrides.load_session_summary_on_start {
        set_env_if_absent("MEMORY_LOAD_SESSION_SUMMARY_ON_START", &v.to_string());
    }
    if let Some(v) = overrides.working_memory_max_tokens {
        set_env_if_absent("MEMORY_WORKING_MEMORY_MAX_TOKENS", &v.to_string());
    }
    if let Some(v) = overrides.scheduler_tick_seconds {
        set_env_if_absent("MEMORY_SCHEDULER_TICK_SECONDS", &v.to_string());
    }
    if let Some(v) = overrides.template_timeout_seconds {
        set_env_if_absent("MEMORY_TEMPLATE_TIMEOUT_SECONDS", &v.to_string());
    }
    if let Some(v) = overrides.conversation_memory_archive_max {
        set_env_if_absent("MEMORY_CONVERSATION_ARCHIVE_MAX", &v.to_string());
    }
    if let Some(v) = &overrides.timezone {
        set_env_if_absent("MEMORY_TIMEZONE", v);
    }
}

/// Build the runtime [`Config`] for this invocation.
///
/// `config_path` is the `--config` flag; when absent, [`default_config_path`]
/// is tried and silently skipped if nothing exists there. `workspace_override`
/// is the `--workspace` flag; when absent and the config file didn't set one
/// either, [`default_workspace`] is used.
pub fn load(config_path: Option<&Path>, workspace_override: Option<PathBuf>) -> anyhow::Result<Config> {
    let resolved_path = config_path.map(Path::to_path_buf).or_else(default_config_path);

    if let Some(path) = &resolved_path {
        if path.exists() || config_path.is_some() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("reading config file {}", path.display()))?;
            let overrides: FileOverrides = toml::from_str(&content)
                .with_context(|| format!("parsing config file {}", path.display()))?;
            apply_file_overrides(&overrides);
        }
    }

    let workspace = workspace_override.unwrap_or_else(default_workspace);
    set_env_if_absent("MEMORY_WORKSPACE_PATH", &workspace.display().to_string());
    // An explicit `--workspace` flag always wins, even over an already-set env var.
    if workspace_override.is_some() {
        unsafe {
            std::env::set_var("MEMORY_WORKSPACE_PATH", workspace.display().to_string());
        }
    }

    Config::from_env().context("building runtime configuration")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_clean_env<T>(f: impl FnOnce() -> T) -> T {
        for key in [
            "MEMORY_WORKSPACE_PATH",
            "MEMORY_BUFFER_SIZE",
            "MEMORY_BUFFER_TRUNCATE_AT",
            "MEMORY_SUMMARY_BUFFER_SIZE",
            "MEMORY_MAX_SUMMARIES_IN_MEMORY",
            "MEMORY_LOAD_SESSION_SUMMARY_ON_START",
            "MEMORY_WORKING_MEMORY_MAX_TOKENS",
            "MEMORY_SCHEDULER_TICK_SECONDS",
            "MEMORY_TEMPLATE_TIMEOUT_SECONDS",
            "MEMORY_CONVERSATION_ARCHIVE_MAX",
            "MEMORY_TIMEZONE",
        ] {
            unsafe {
                std::env::remove_var(key);
            }
        }
        f()
    }

    #[test]
    fn load_with_no_file_and_no_flags_uses_default_workspace() {
        with_clean_env(|| {
            let config = load(None, None).unwrap();
            assert_eq!(config.workspace_path, default_workspace());
        });
    }

    #[test]
    fn explicit_workspace_flag_overrides_default() {
        with_clean_env(|| {
            let custom = PathBuf::from("/tmp/some-custom-workspace");
            let config = load(None, Some(custom.clone())).unwrap();
            assert_eq!(config.workspace_path, custom);
        });
    }

    #[test]
    fn config_file_overrides_are_applied() {
        with_clean_env(|| {
            let dir = tempfile::tempdir().unwrap();
            let path = dir.path().join("config.toml");
            std::fs::write(&path, "buffer_size = 42\ntimezone = \"America/New_York\"\n").unwrap();

            let config = load(Some(&path), None).unwrap();
            assert_eq!(config.buffer_size, 42);
            assert_eq!(config.timezone, "America/New_York");
        });
    }

    #[test]
    fn missing_explicit_config_file_is_an_error() {
        with_clean_env(|| {
            let missing = PathBuf::from("/tmp/definitely-does-not-exist-memory-cli.toml");
            assert!(load(Some(&missing), None).is_err());
        });
    }
}
