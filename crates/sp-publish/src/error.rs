//! Error types for publishing operations.

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur during publishing and rollback.
#[derive(Error, Debug)]
pub enum PublishError {
    /// I/O error with the offending path
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// JSON serialization/deserialization error
    #[error("failed to parse JSON at {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Swap source does not exist (nothing to publish or restore)
    #[error("source directory does not exist: {0}")]
    SourceMissing(PathBuf),

    /// Swap target is not a named directory
    #[error("target path has no directory name: {0}")]
    InvalidTarget(PathBuf),

    /// No backup matches the requested timestamp
    #[error("no backup found for timestamp: {timestamp}")]
    BackupNotFound { timestamp: String },

    /// Staging failed validation; nothing was mutated
    #[error("staging data failed validation ({} issue(s))", issues.len())]
    StagingNotReady { issues: Vec<String> },

    /// Another publish or rollback holds the advisory lock
    #[error("another publish or rollback is in progress (lock file: {0})")]
    LockHeld(PathBuf),
}

impl PublishError {
    pub(crate) fn io(path: &Path, source: std::io::Error) -> Self {
        PublishError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Result type alias for publishing operations.
pub type Result<T> = std::result::Result<T, PublishError>;
