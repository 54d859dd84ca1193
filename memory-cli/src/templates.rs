//! The CLI's concrete implementations of `task-orchestrator`'s two
//! collaborator seams.
//!
//! Task templates are genuine external collaborators per spec §6 — this
//! binary only ships the trivial built-ins needed to exercise and
//! demonstrate the scheduler; a real deployment would register its own
//! [`TemplateRegistry`] (an email digest, a backup job, ...).

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use memory_core::error::{Error, Result, TemplateErrorKind};
use memory_core::manager::HierarchicalMemoryManager;
use task_orchestrator::{ExchangeSink, TemplateOutput, TemplateRegistry};
use uuid::Uuid;

/// A minimal built-in registry: `echo` returns its `message` config value
/// verbatim; `noop` always succeeds with no output; anything else is
/// `UnknownTemplate`.
#[derive(Default)]
pub struct BuiltinTemplateRegistry;

#[async_trait]
impl TemplateRegistry for BuiltinTemplateRegistry {
    async fn invoke(&self, name: &str, config: &BTreeMap<String, String>) -> Result<TemplateOutput> {
        match name {
            "echo" => Ok(TemplateOutput {
                output: config.get("message").cloned(),
            }),
            "noop" => Ok(TemplateOutput { output: None }),
            other => Err(Error::template(
                TemplateErrorKind::UnknownTemplate,
                format!("no template registered under '{other}'"),
            )),
        }
    }
}

/// Folds a task execution's result back into memory through a real
/// `HierarchicalMemoryManager`, per spec §4.J step 8.
pub struct ManagerExchangeSink {
    manager: Arc<HierarchicalMemoryManager>,
}

impl ManagerExchangeSink {
    #[must_use]
    pub fn new(manager: Arc<HierarchicalMemoryManager>) -> Self {
        Self { manager }
    }
}

#[async_trait]
impl ExchangeSink for ManagerExchangeSink {
    async fn record_exchange(&self, user_text: String, agent_text: String) -> Result<Uuid> {
        self.manager.record_exchange(&user_text, &agent_text).await
    }
}
