//! The error taxonomy for sync operations
//!
//! Every variant is terminal for the command that raised it: the engine
//! does not attempt partial recovery mid-walk, and a failure during
//! recursion unwinds with the on-disk sync state untouched.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised by sync commands and the reconciliation engine
#[derive(Debug, Error)]
pub enum SyncError {
    /// No sync-state file found in the working directory or any ancestor
    /// within the configured search bound
    #[error("not a stratus sync root (no sync state found here or in any parent directory)")]
    NotInitialized,

    /// `init` invoked where a sync-state file already exists
    #[error("sync state already exists at {0}")]
    AlreadyInitialized(PathBuf),

    /// A sync-state file was found but could not be parsed
    #[error("corrupt sync state at {path}: {reason}")]
    CorruptState { path: PathBuf, reason: String },

    /// A caller-supplied value was rejected (e.g. a negative depth)
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A remote id did not resolve to any item
    #[error("remote item not found: {0}")]
    RemoteNotFound(String),

    /// An operation expecting a folder resolved to a file
    #[error("remote item is not a folder: {0}")]
    NotAFolder(String),

    /// An operation expecting a file resolved to a folder
    #[error("remote item is not a file: {0}")]
    NotAFile(String),

    /// A local filesystem read or write failed
    #[error("failed to access {path}: {source}")]
    Persistence {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A remote create/update/trash/move call failed
    #[error("remote operation failed: {0}")]
    RemoteOperationFailed(String),
}

impl SyncError {
    /// Wraps an I/O error with the path it occurred on
    pub fn persistence(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        SyncError::Persistence {
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = SyncError::RemoteNotFound("f123".to_string());
        assert_eq!(err.to_string(), "remote item not found: f123");

        let err = SyncError::InvalidArgument("depth must be non-negative".to_string());
        assert_eq!(err.to_string(), "invalid argument: depth must be non-negative");

        let err = SyncError::CorruptState {
            path: PathBuf::from("/tmp/.stratus.json"),
            reason: "expected object".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "corrupt sync state at /tmp/.stratus.json: expected object"
        );
    }

    #[test]
    fn test_persistence_preserves_source() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err = SyncError::persistence("/data/file", io);
        assert!(err.to_string().contains("/data/file"));
        assert!(std::error::Error::source(&err).is_some());
    }
}
