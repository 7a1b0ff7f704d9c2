//! Error types for the synchronization layer.

use thiserror::Error;

/// Errors that can occur while talking to the replicated store.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SyncError {
    #[error("Store connection closed")]
    Disconnected,

    #[error("No seat assigned to this replica")]
    NoSeat,

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for SyncError {
    fn from(err: serde_json::Error) -> Self {
        SyncError::Serialization(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, SyncError>;
