//! Error taxonomy for the memory runtime.
//!
//! Kinds mirror the propagation policy in the specification: a single failing
//! fact, summary, template, or external adapter must never crash the process.
//! The only fatal errors are failure to open the workspace or to initialize the
//! persistence store at startup, and those are surfaced as plain [`Error::Storage`]
//! values that the binary entry point chooses to treat as fatal.

use uuid::Uuid;

/// Result type alias used throughout the memory runtime.
pub type Result<T> = std::result::Result<T, Error>;

/// Storage failure sub-kind, matching the Persistence Store contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum StorageErrorKind {
    /// The store could not be reached (I/O failure, lock contention).
    #[error("storage unavailable")]
    Unavailable,
    /// A concurrent writer conflicted with this transaction.
    #[error("storage conflict")]
    Conflict,
    /// On-disk state failed integrity checks.
    #[error("storage corrupt")]
    Corrupt,
    /// A schema migration could not complete.
    #[error("storage migration failed")]
    Migration,
}

/// Facts Store failure sub-kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum FactsErrorKind {
    /// An unrecognized fact type string was supplied to a filter.
    #[error("invalid fact type")]
    InvalidType,
    /// The underlying store rejected the write.
    #[error("facts storage failure")]
    StorageFailure,
}

/// Template/task execution failure sub-kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum TemplateErrorKind {
    /// No template is registered under the requested name.
    #[error("unknown template")]
    UnknownTemplate,
    /// The template raised an error while executing.
    #[error("template execution failed")]
    ExecutionFailure,
    /// The template did not complete within its timeout budget.
    #[error("template execution timed out")]
    Timeout,
}

/// Errors surfaced by the memory runtime.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Malformed schedule expression, invalid type filter, or other local
    /// input validation failure. No side effects are persisted.
    #[error("invalid input: {0}")]
    InputError(String),

    /// Durable store unavailable, conflicted, corrupt, or mid-migration.
    #[error("storage error: {kind} ({detail})")]
    Storage {
        /// The storage failure sub-kind.
        kind: StorageErrorKind,
        /// Human-readable detail for logs.
        detail: String,
    },

    /// A specific fact candidate failed to persist; other facts in the same
    /// batch proceed.
    #[error("fact extraction error: {0}")]
    Extraction(String),

    /// Facts Store-specific failure.
    #[error("facts error: {kind} ({detail})")]
    Facts {
        /// The facts failure sub-kind.
        kind: FactsErrorKind,
        /// Human-readable detail for logs.
        detail: String,
    },

    /// Task template failure, covering unknown templates, execution
    /// exceptions, and timeouts.
    #[error("template error: {kind} ({detail})")]
    Template {
        /// The template failure sub-kind.
        kind: TemplateErrorKind,
        /// Human-readable detail for logs.
        detail: String,
    },

    /// Recovery marker applied to a `TaskExecution` row left incomplete by a
    /// process crash.
    #[error("execution interrupted by restart")]
    Interrupted,

    /// The record referenced by this id does not exist.
    #[error("not found: {0}")]
    NotFound(Uuid),

    /// Serialization/deserialization failure.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO failure (workspace file operations).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid or unsupported configuration.
    #[error("configuration error: {0}")]
    Configuration(String),
}

impl Error {
    /// Construct a storage error.
    #[must_use]
    pub fn storage(kind: StorageErrorKind, detail: impl Into<String>) -> Self {
        Self::Storage {
            kind,
            detail: detail.into(),
        }
    }

    /// Construct a facts-store error.
    #[must_use]
    pub fn facts(kind: FactsErrorKind, detail: impl Into<String>) -> Self {
        Self::Facts {
            kind,
            detail: detail.into(),
        }
    }

    /// Construct a template error.
    #[must_use]
    pub fn template(kind: TemplateErrorKind, detail: impl Into<String>) -> Self {
        Self::Template {
            kind,
            detail: detail.into(),
        }
    }

    /// Whether retrying this operation with backoff is reasonable.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        match self {
            Error::Storage { kind, .. } => matches!(
                kind,
                StorageErrorKind::Unavailable | StorageErrorKind::Conflict
            ),
            Error::Template { kind, .. } => matches!(kind, TemplateErrorKind::Timeout),
            Error::Io(_) => true,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn storage_unavailable_is_recoverable() {
        let err = Error::storage(StorageErrorKind::Unavailable, "disk full");
        assert!(err.is_recoverable());
    }

    #[test]
    fn storage_corrupt_is_not_recoverable() {
        let err = Error::storage(StorageErrorKind::Corrupt, "checksum mismatch");
        assert!(!err.is_recoverable());
    }

    #[test]
    fn template_timeout_is_recoverable() {
        let err = Error::template(TemplateErrorKind::Timeout, "300s exceeded");
        assert!(err.is_recoverable());
    }

    #[test]
    fn unknown_template_is_not_recoverable() {
        let err = Error::template(TemplateErrorKind::UnknownTemplate, "foo");
        assert!(!err.is_recoverable());
    }
}
