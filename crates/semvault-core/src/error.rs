//! Error types for the versioning core

use thiserror::Error;

/// Result type alias using VersionError
pub type Result<T> = std::result::Result<T, VersionError>;

/// Version-related errors
#[derive(Debug, Error)]
pub enum VersionError {
    /// Failed to parse a version string
    #[error("failed to parse version '{0}': {1}")]
    ParseFailed(String, String),

    /// Invalid bump type requested
    #[error("invalid bump type: {0}")]
    InvalidBumpType(String),
}
