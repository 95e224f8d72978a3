//! Exit codes for the publishing CLI.
//!
//! Exit codes communicate operation outcome without requiring output
//! parsing. They are a stable contract for the flow orchestration
//! layer; changes require a major version bump.
//!
//! Ranges:
//! - 0-9: operational outcomes
//! - 10-19: user/environment errors (recoverable by user action)
//! - 20-29: internal errors (bugs, should be reported)

use sp_publish::PublishError;

/// Exit codes for publishing operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    /// Success
    Ok = 0,

    /// Staging failed validation; nothing was published
    StagingRejected = 1,

    /// Invalid arguments or configuration
    ArgsError = 10,

    /// Permission denied on the filesystem
    PermissionError = 12,

    /// Another publish or rollback holds the lock
    LockError = 14,

    /// Internal error (filesystem failure mid-operation)
    Internal = 20,
}

impl ExitCode {
    /// Map a publishing error to its exit code.
    pub fn from_publish_error(err: &PublishError) -> Self {
        match err {
            PublishError::StagingNotReady { .. } => ExitCode::StagingRejected,
            PublishError::LockHeld(_) => ExitCode::LockError,
            PublishError::BackupNotFound { .. } | PublishError::InvalidTarget(_) => {
                ExitCode::ArgsError
            }
            PublishError::SourceMissing(_) => ExitCode::StagingRejected,
            PublishError::Io { source, .. }
                if source.kind() == std::io::ErrorKind::PermissionDenied =>
            {
                ExitCode::PermissionError
            }
            PublishError::Io { .. } | PublishError::Json { .. } => ExitCode::Internal,
        }
    }
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> Self {
        code as i32
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn lock_contention_maps_to_lock_error() {
        let err = PublishError::LockHeld(PathBuf::from(".publish.lock"));
        assert_eq!(ExitCode::from_publish_error(&err), ExitCode::LockError);
    }

    #[test]
    fn rejected_staging_maps_to_code_one() {
        let err = PublishError::StagingNotReady { issues: vec![] };
        assert_eq!(
            ExitCode::from_publish_error(&err),
            ExitCode::StagingRejected
        );
        assert_eq!(i32::from(ExitCode::StagingRejected), 1);
    }

    #[test]
    fn permission_denied_is_distinguished() {
        let err = PublishError::Io {
            path: PathBuf::from("cleaned_stable"),
            source: std::io::Error::from(std::io::ErrorKind::PermissionDenied),
        };
        assert_eq!(
            ExitCode::from_publish_error(&err),
            ExitCode::PermissionError
        );
    }
}
