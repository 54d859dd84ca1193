//! redb table definitions for every record type in [`memory_core::types`].
//!
//! Every table is keyed by the record's UUID (stringified) and stores a
//! `postcard`-encoded value. Flexible queries (fact search, incomplete task
//! lookups) are implemented as full-table scans: at the single-user,
//! embedded-assistant scale this system targets, a scan is simpler and no
//! slower in practice than maintaining secondary indexes.

use redb::TableDefinition;

pub(crate) const SESSIONS_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("sessions");
pub(crate) const EPISODES_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("episodes");
pub(crate) const SUMMARIES_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("summaries");
pub(crate) const CONVERSATION_SUMMARIES_TABLE: TableDefinition<&str, &[u8]> =
    TableDefinition::new("conversation_summaries");
pub(crate) const FACTS_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("facts");
pub(crate) const SEMANTIC_RECORDS_TABLE: TableDefinition<&str, &[u8]> =
    TableDefinition::new("semantic_records");
pub(crate) const SCHEDULED_TASKS_TABLE: TableDefinition<&str, &[u8]> =
    TableDefinition::new("scheduled_tasks");
pub(crate) const TASK_EXECUTIONS_TABLE: TableDefinition<&str, &[u8]> =
    TableDefinition::new("task_executions");

/// Current on-disk schema version, bumped whenever a table's value encoding
/// changes shape.
pub(crate) const SCHEMA_VERSION: &str = "1.0.0";
