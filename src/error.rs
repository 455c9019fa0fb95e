//! Error types for xue
//!
//! Centralized error handling using thiserror.

use std::path::PathBuf;

use thiserror::Error;

/// All error types that can occur in the player core
#[derive(Debug, Error)]
pub enum XueError {
    /// Container file or its metadata entry is absent
    #[error("Not found: {0}")]
    NotFound(PathBuf),

    /// Container or metadata could not be parsed
    #[error("Corrupt learning object {path}: {reason}")]
    Corrupt { path: PathBuf, reason: String },

    /// Named asset is not present in the container
    #[error("Asset '{asset}' missing from {path}")]
    AssetMissing { path: PathBuf, asset: String },

    /// Selection over an empty collection
    #[error("Collection is empty")]
    EmptyCollection,

    /// Audio backend failure
    #[error("Playback device error: {0}")]
    PlaybackDevice(String),

    /// The session task panicked or was cancelled
    #[error("Session task failed: {0}")]
    Session(#[from] tokio::task::JoinError),

    /// Settings could not be persisted or validated
    #[error("Settings error: {0}")]
    Settings(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl XueError {
    pub(crate) fn corrupt(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Self::Corrupt {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    /// True for the expected-absent asset case, which is a control-flow signal rather than a failure
    pub fn is_asset_missing(&self) -> bool {
        matches!(self, Self::AssetMissing { .. })
    }
}

/// Result type alias for xue operations
pub type Result<T> = std::result::Result<T, XueError>;
