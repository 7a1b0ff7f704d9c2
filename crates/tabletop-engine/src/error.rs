//! Error types for the engine.

use tabletop_core::TopologyError;
use tabletop_sync::SyncError;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    #[error("Topology error: {0}")]
    Topology(#[from] TopologyError),

    #[error("Sync error: {0}")]
    Sync(#[from] SyncError),

    #[error("This replica has no seat")]
    NoSeat,
}

pub type Result<T> = std::result::Result<T, EngineError>;
