//! Error types for storage and persistence.
//!
//! Store mutations never surface these to their callers: persistence failures
//! are logged and suppressed. They are returned only from storage setup,
//! explicit slot access and shutdown.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    /// The slot could not be read, or its content did not parse.
    #[error("failed to read slot '{slot}': {reason}")]
    PersistenceRead { slot: String, reason: String },

    /// Writing a snapshot to the slot failed.
    #[error("failed to write slot '{slot}': {reason}")]
    PersistenceWrite { slot: String, reason: String },

    #[error("LMDB error: {0}")]
    Lmdb(#[from] lmdb::Error),

    #[error("JSON serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Another handle in this process already holds the LMDB directory.
    #[error("database at {0} is already open")]
    AlreadyOpen(String),

    /// The storage backend was already closed.
    #[error("storage is closed")]
    Closed,
}

impl StoreError {
    pub fn read(slot: &str, reason: impl ToString) -> Self {
        StoreError::PersistenceRead {
            slot: slot.to_string(),
            reason: reason.to_string(),
        }
    }

    pub fn write(slot: &str, reason: impl ToString) -> Self {
        StoreError::PersistenceWrite {
            slot: slot.to_string(),
            reason: reason.to_string(),
        }
    }
}
