//! Driver error types

use semvault_core::VersionError;
use thiserror::Error;

/// Result type alias using DriverError
pub type Result<T> = std::result::Result<T, DriverError>;

/// Errors surfaced by version-source drivers.
///
/// `Conflict` is the one retryable variant: it means the backend detected a
/// concurrent writer between our read and our write, and the optimistic
/// retry loop may re-read and try again. Everything else is fatal.
#[derive(Debug, Error)]
pub enum DriverError {
    /// Invalid or incomplete source configuration
    #[error("invalid source configuration: {0}")]
    Config(String),

    /// Stored content or a request parameter failed to parse as a version
    #[error(transparent)]
    Version(#[from] VersionError),

    /// The backend rejected the write because its state changed since our
    /// last read
    #[error("conflicting update: {0}")]
    Conflict(String),

    /// Backend storage failure (auth, network, corrupt state)
    #[error("storage error: {0}")]
    Storage(String),

    /// A git command exited unsuccessfully
    #[error("git {command} failed: {detail}")]
    Git { command: String, detail: String },

    /// HTTP transport failure
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl DriverError {
    /// Whether the optimistic retry loop may retry after this error
    pub fn is_conflict(&self) -> bool {
        matches!(self, DriverError::Conflict(_))
    }
}
