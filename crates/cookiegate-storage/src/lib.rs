//! CookieGate Storage Layer
//!
//! Key-value persistence for the consent record, behind [`PersistentKv`]:
//! - [`Database`]: SQLite, survives restarts, keeps a consent audit trail
//! - [`MemoryKv`]: process-local, with an optional quota

mod database;
mod error;
mod kv;
mod memory;
mod migrations;

pub use database::{Database, HistoryRow};
pub use error::StorageError;
pub use kv::PersistentKv;
pub use memory::MemoryKv;

pub type Result<T> = std::result::Result<T, StorageError>;
