//! # Memory Storage - redb
//!
//! Embedded `redb` implementation of [`memory_core::storage::PersistenceStore`].
//!
//! This crate provides:
//! - Single-file, zero-server embedded storage via `redb`
//! - `postcard`-encoded values for every record type in [`memory_core::types`]
//! - Async wrappers (`spawn_blocking` + timeout) around synchronous redb calls
//!
//! ## Example
//!
//! ```no_run
//! use memory_storage_redb::RedbStore;
//! use std::path::Path;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let store = RedbStore::open(Path::new("./memory.redb")).await?;
//! # Ok(())
//! # }
//! ```

mod storage;
mod tables;

pub use storage::RedbStore;
