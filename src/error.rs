//! Domain-specific error types for TuxSync.
//!
//! Each component returns its own typed error built with [`thiserror`].
//! Orchestrators aggregate them into [`Error`], and command handlers at the
//! CLI boundary convert that to [`anyhow::Error`] with the `?` operator.
//!
//! # Error hierarchy
//!
//! ```text
//! Error
//! ├── Scan(ScanError)              package manager detection and queries
//! ├── Profile(ProfileError)        profile document encode/decode
//! ├── Storage(StorageError)        gist / custom server persistence
//! ├── Executor(ExecutorError)      external package executor
//! ├── Filesystem(FilesystemError)  shell config reads and writes
//! ├── InvalidInput(String)         rejected identifiers, URLs, flags
//! └── Cancelled(String)            the user declined a confirmation
//! ```

use std::path::PathBuf;

use thiserror::Error;

use crate::scanner::PackageManager;

/// Top-level error for backup and restore runs.
#[derive(Error, Debug)]
pub enum Error {
    /// Package scanning failed.
    #[error(transparent)]
    Scan(#[from] ScanError),

    /// The profile document could not be encoded or decoded.
    #[error(transparent)]
    Profile(#[from] ProfileError),

    /// The storage backend failed.
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// The external package executor could not be used.
    #[error(transparent)]
    Executor(#[from] ExecutorError),

    /// A local file operation failed.
    #[error(transparent)]
    Filesystem(#[from] FilesystemError),

    /// User-supplied input was rejected before any work started.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The user declined to continue.
    #[error("Cancelled: {0}")]
    Cancelled(String),
}

/// Coarse classification of every failure TuxSync can report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The package manager was found but its query failed.
    ScanFailure,
    /// No supported package manager is present.
    UnknownPackageManager,
    /// The profile document could not be encoded or decoded.
    SerializationFailure,
    /// The requested backup does not exist.
    NotFound,
    /// Any other storage backend failure.
    StorageError,
    /// The package executor could not be obtained or launched.
    ExecutorFailure,
    /// A local file could not be read or written.
    FilesystemError,
    /// Rejected user input.
    InvalidInput,
    /// Declined by the user.
    Cancelled,
}

impl Error {
    /// Classify this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Scan(e) => e.kind(),
            Self::Profile(_) => ErrorKind::SerializationFailure,
            Self::Storage(e) => e.kind(),
            Self::Executor(_) => ErrorKind::ExecutorFailure,
            Self::Filesystem(_) => ErrorKind::FilesystemError,
            Self::InvalidInput(_) => ErrorKind::InvalidInput,
            Self::Cancelled(_) => ErrorKind::Cancelled,
        }
    }
}

/// Errors raised while detecting the package manager or listing packages.
#[derive(Error, Debug)]
pub enum ScanError {
    /// None of apt, dnf or pacman is available.
    #[error("No supported package manager found (looked for apt, dnf, pacman)")]
    UnknownPackageManager,

    /// The package manager was detected but listing its packages failed.
    #[error("Failed to list {manager} packages: {reason}")]
    QueryFailed {
        /// The detected manager.
        manager: PackageManager,
        /// Why the query failed.
        reason: String,
    },
}

impl ScanError {
    /// Classify this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::UnknownPackageManager => ErrorKind::UnknownPackageManager,
            Self::QueryFailed { .. } => ErrorKind::ScanFailure,
        }
    }
}

/// Errors raised while encoding or decoding a profile document.
#[derive(Error, Debug)]
pub enum ProfileError {
    /// The document declares a schema version this build cannot read.
    #[error("Unsupported profile version '{found}' (supported: {supported})")]
    UnsupportedVersion {
        /// Version string found in the document.
        found: String,
        /// Comma-separated list of readable versions.
        supported: String,
    },

    /// The document is not valid YAML or misses required fields.
    #[error("Malformed profile document: {0}")]
    Malformed(String),

    /// The document says a shell config was saved but none was stored.
    #[error("Profile declares a shell config but the backup has none")]
    MissingShellConfig,

    /// The profile could not be encoded.
    #[error("Failed to encode profile: {0}")]
    Encode(String),
}

/// Errors raised by storage backends.
#[derive(Error, Debug)]
pub enum StorageError {
    /// No backup exists under the given identifier.
    #[error("Backup '{id}' not found")]
    NotFound {
        /// The identifier that was looked up.
        id: String,
    },

    /// The backend requires credentials that are not available.
    #[error("Not authenticated: {0}")]
    NotAuthenticated(String),

    /// The request could not be completed.
    #[error("Storage request failed: {0}")]
    Transport(String),

    /// The backend answered with something unexpected.
    #[error("Unexpected storage response: {0}")]
    InvalidResponse(String),

    /// The backend does not support this operation.
    #[error("{0}")]
    Unsupported(String),
}

impl StorageError {
    /// Classify this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound { .. } => ErrorKind::NotFound,
            _ => ErrorKind::StorageError,
        }
    }
}

/// Errors raised when the package executor cannot be used at all.
#[derive(Error, Debug)]
pub enum ExecutorError {
    /// The executor is not installed and could not be fetched.
    #[error("{program} is not available: {reason}")]
    Unavailable {
        /// Program name.
        program: String,
        /// Why it could not be obtained.
        reason: String,
    },

    /// The executor exists but could not be started.
    #[error("Failed to launch {program}: {reason}")]
    Launch {
        /// Program name or path.
        program: String,
        /// Spawn error.
        reason: String,
    },
}

/// Errors raised by local file operations.
#[derive(Error, Debug)]
pub enum FilesystemError {
    /// A file could not be read.
    #[error("Failed to read {}: {source}", path.display())]
    Read {
        /// File path.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// A file could not be written.
    #[error("Failed to write {}: {source}", path.display())]
    Write {
        /// File path.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// An existing file could not be moved aside before overwriting.
    #[error("Failed to back up {} to {}: {source}", path.display(), backup.display())]
    Backup {
        /// The file being replaced.
        path: PathBuf,
        /// Where the copy was meant to go.
        backup: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
}

#[cfg(test)]
#[allow(clippy::expect_used)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn unknown_manager_and_query_failure_are_distinct_kinds() {
        let unknown = ScanError::UnknownPackageManager;
        let failed = ScanError::QueryFailed {
            manager: PackageManager::Apt,
            reason: "exit 100".to_string(),
        };
        assert_eq!(unknown.kind(), ErrorKind::UnknownPackageManager);
        assert_eq!(failed.kind(), ErrorKind::ScanFailure);
    }

    #[test]
    fn query_failed_display_names_manager() {
        let e = ScanError::QueryFailed {
            manager: PackageManager::Dnf,
            reason: "repo metadata unavailable".to_string(),
        };
        assert_eq!(
            e.to_string(),
            "Failed to list dnf packages: repo metadata unavailable"
        );
    }

    #[test]
    fn unsupported_version_display() {
        let e = ProfileError::UnsupportedVersion {
            found: "99.0".to_string(),
            supported: "1.0".to_string(),
        };
        assert_eq!(
            e.to_string(),
            "Unsupported profile version '99.0' (supported: 1.0)"
        );
    }

    #[test]
    fn not_found_is_distinct_from_other_storage_errors() {
        let missing = StorageError::NotFound {
            id: "abc12345".to_string(),
        };
        assert_eq!(missing.kind(), ErrorKind::NotFound);
        assert_eq!(missing.to_string(), "Backup 'abc12345' not found");

        for e in [
            StorageError::NotAuthenticated("gh auth login".to_string()),
            StorageError::Transport("connection refused".to_string()),
            StorageError::InvalidResponse("no id".to_string()),
            StorageError::Unsupported("listing".to_string()),
        ] {
            assert_eq!(e.kind(), ErrorKind::StorageError, "{e}");
        }
    }

    #[test]
    fn aggregate_kind_follows_source() {
        let e: Error = StorageError::NotFound {
            id: "x".repeat(8),
        }
        .into();
        assert_eq!(e.kind(), ErrorKind::NotFound);

        let e: Error = ProfileError::MissingShellConfig.into();
        assert_eq!(e.kind(), ErrorKind::SerializationFailure);

        let e: Error = ExecutorError::Unavailable {
            program: "tuxmate".to_string(),
            reason: "download failed".to_string(),
        }
        .into();
        assert_eq!(e.kind(), ErrorKind::ExecutorFailure);

        let e: Error = ScanError::UnknownPackageManager.into();
        assert_eq!(e.kind(), ErrorKind::UnknownPackageManager);
    }

    #[test]
    fn transparent_variants_keep_inner_message() {
        let e: Error = ScanError::UnknownPackageManager.into();
        assert_eq!(
            e.to_string(),
            "No supported package manager found (looked for apt, dnf, pacman)"
        );
    }

    #[test]
    fn filesystem_error_display_and_source() {
        use std::error::Error as _;
        let e = FilesystemError::Backup {
            path: PathBuf::from("/home/u/.bashrc"),
            backup: PathBuf::from("/home/u/.bashrc.backup_20240101_000000"),
            source: io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        };
        assert_eq!(
            e.to_string(),
            "Failed to back up /home/u/.bashrc to /home/u/.bashrc.backup_20240101_000000: denied"
        );
        assert!(e.source().is_some());
    }

    #[test]
    fn errors_are_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Error>();
        assert_send_sync::<ScanError>();
        assert_send_sync::<ProfileError>();
        assert_send_sync::<StorageError>();
        assert_send_sync::<ExecutorError>();
        assert_send_sync::<FilesystemError>();
    }

    #[test]
    fn converts_into_anyhow() {
        let e: Error = Error::Cancelled("restore declined".to_string());
        let any: anyhow::Error = e.into();
        let back = any.downcast_ref::<Error>().expect("downcast");
        assert_eq!(back.kind(), ErrorKind::Cancelled);
    }
}
