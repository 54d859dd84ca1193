//! The external-collaborator seam for task execution (spec §6).
//!
//! `task-orchestrator` never knows what a template actually does; it only
//! knows how to invoke one by name and interpret the outcome.

use std::collections::BTreeMap;

use async_trait::async_trait;
use memory_core::error::Result;

/// What a template reported back after running.
#[derive(Debug, Clone, Default)]
pub struct TemplateOutput {
    /// Free-form output text, persisted verbatim on the `TaskExecution` row.
    pub output: Option<String>,
}

/// Looks up and invokes named templates. Implemented outside this crate by
/// whatever hosts the concrete task behaviors.
#[async_trait]
pub trait TemplateRegistry: Send + Sync {
    /// Invoke `name` with `config`, returning its output or a
    /// [`memory_core::error::Error::Template`] on failure.
    ///
    /// # Errors
    ///
    /// Returns `Error::Template { kind: UnknownTemplate, .. }` if no template
    /// is registered under `name`, or `ExecutionFailure` if the template
    /// itself raises an error.
    async fn invoke(
        &self,
        name: &str,
        config: &BTreeMap<String, String>,
    ) -> Result<TemplateOutput>;
}
