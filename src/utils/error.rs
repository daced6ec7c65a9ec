//! Error types shared across the `playsync` modules.

use thiserror::Error;

/// Failures surfaced by the sync layer's fallible operations.
///
/// Transport-level problems are deliberately absent here: a failed publish or
/// subscribe on the live backend is logged and absorbed at the boundary where
/// it occurs, never raised to callers.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("storage error: {0}")]
    Storage(#[from] sled::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
