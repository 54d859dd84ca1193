//! Decouples `task-orchestrator` from `memory_core::manager`'s concrete
//! manager type (spec §4.J step 8) while still letting every firing leave a
//! memory trace.

use async_trait::async_trait;
use memory_core::error::Result;
use uuid::Uuid;

/// Records a (user, agent) exchange into whatever memory system is wired up.
#[async_trait]
pub trait ExchangeSink: Send + Sync {
    /// Persist one exchange, returning the id it was stored under.
    async fn record_exchange(&self, user_text: String, agent_text: String) -> Result<Uuid>;
}
