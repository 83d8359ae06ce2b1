//! Persistence for users, tasks and the current session.
//!
//! A [`Store`] holds raw JSON strings by key. A [`Repository`] layers typed
//! access on top and validates every record it reads against a JSON Schema.

mod repository;
mod schema;
mod store;

pub use repository::{Repository, DEFAULT_KEY_PREFIX, LEGACY_TASKS_KEY, REJECTED_SUFFIX};
pub use schema::{validate_record, RecordKind, SchemaError};
pub use store::{FileStore, MemoryStore, Store};

use thiserror::Error;

/// Errors from the storage layer.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Storage I/O failed: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to encode value: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Invalid storage key: {0:?}")]
    InvalidKey(String),
}
