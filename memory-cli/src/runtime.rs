//! Wires a [`memory_core::config::Config`] to a concrete
//! [`memory_storage_redb::RedbStore`] and, on demand, a full
//! [`HierarchicalMemoryManager`] or [`task_orchestrator::Orchestrator`].
//!
//! Each CLI invocation is one process lifetime, so each run starts a fresh
//! [`memory_core::types::Session`] — matching spec §3's "created on process
//! start" session lifecycle.

use std::sync::Arc;

use anyhow::{Context, Result};
use memory_core::config::Config;
use memory_core::manager::{HierarchicalMemoryManager, NoPressure};
use memory_storage_redb::RedbStore;
use task_orchestrator::Orchestrator;

use crate::templates::{BuiltinTemplateRegistry, ManagerExchangeSink};

/// Everything a command needs: configuration plus an opened store.
pub struct Runtime {
    pub config: Arc<Config>,
    pub persistence: Arc<RedbStore>,
}

impl Runtime {
    /// Open the workspace named by `config`, creating it if absent.
    pub async fn open(config: Config) -> Result<Self> {
        std::fs::create_dir_all(&config.workspace_path).with_context(|| {
            format!("creating workspace directory {}", config.workspace_path.display())
        })?;
        let db_path = config.workspace_path.join("memory.db");
        let persistence = RedbStore::open(&db_path)
            .await
            .with_context(|| format!("opening persistence store at {}", db_path.display()))?;
        Ok(Self {
            config: Arc::new(config),
            persistence: Arc::new(persistence),
        })
    }

    /// Build a fresh `HierarchicalMemoryManager` bound to this run's store.
    pub async fn manager(&self) -> Result<Arc<HierarchicalMemoryManager>> {
        let manager = HierarchicalMemoryManager::new(
            self.config.clone(),
            self.persistence.clone(),
            Arc::new(NoPressure),
        )
        .await
        .context("initializing hierarchical memory manager")?;
        Ok(Arc::new(manager))
    }

    /// Build an orchestrator wired to this run's store, the built-in
    /// template registry, and a memory sink that records task results back
    /// through a fresh manager.
    pub async fn orchestrator(&self) -> Result<(Orchestrator, Arc<HierarchicalMemoryManager>)> {
        let manager = self.manager().await?;
        let orchestrator = Orchestrator::new(
            self.persistence.clone(),
            Arc::new(BuiltinTemplateRegistry::default()),
            Arc::new(ManagerExchangeSink::new(manager.clone())),
            (*self.config).clone(),
        );
        Ok((orchestrator, manager))
    }
}
