//! Error types for trialtree storage, session and configuration code.
//!
//! The classifier, aggregator and projector never fail: missing data is
//! reported structurally as `loading`. Only the storage collaborator, the
//! mutation helpers and configuration loading return these errors.

use std::io;
use thiserror::Error;

/// Trialtree error type
#[derive(Error, Debug)]
pub enum TrialTreeError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Walk error: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("Background task failed: {0}")]
    Join(#[from] tokio::task::JoinError),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Object not found: {0}")]
    NotFound(String),

    #[error("Invalid key '{key}': {reason}")]
    InvalidKey { key: String, reason: String },

    #[error("Unsupported marker file '{0}' (expected .c3d, .trc or .mot)")]
    UnsupportedMarkerFile(String),

    #[error("Storage error: {0}")]
    Storage(String),
}

impl TrialTreeError {
    pub fn invalid_key(key: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidKey {
            key: key.into(),
            reason: reason.into(),
        }
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, TrialTreeError>;
