//! Hierarchical memory, fact extraction, and query routing core for an
//! autonomous assistant runtime.
//!
//! `memory-core` is storage-agnostic: it depends only on the
//! [`storage::PersistenceStore`] trait. `memory-storage-redb` supplies the
//! concrete embedded backend; `memory-cli` and `task-orchestrator` are the
//! process-level consumers.
//!
//! The [`manager::HierarchicalMemoryManager`] is the entry point most callers
//! want: it wires together fact extraction, the Facts Store, the Semantic
//! Store, the Query Router, the Summary Buffer, and the Identity Store behind
//! four operations (`record_exchange`, `recall`, `context_for_prompt`,
//! `on_session_end`).

pub mod config;
pub mod error;
pub mod extraction;
pub mod facts;
pub mod identity;
pub mod manager;
pub mod router;
pub mod schedule;
pub mod semantic;
pub mod storage;
pub mod summary;
pub mod types;

pub use config::Config;
pub use error::{Error, Result};
pub use manager::HierarchicalMemoryManager;
pub use storage::PersistenceStore;
