//! Semvault drivers - version source backends
//!
//! Each driver stores exactly one current version record somewhere durable
//! and exposes it through the [`VersionSource`] capability trait. The
//! [`from_source`] factory validates the request's source configuration and
//! constructs the selected backend before any I/O happens.

pub mod blob;
pub mod error;
pub mod git;
pub mod s3;
pub mod traits;

mod retry;

pub use blob::BlobDriver;
pub use error::{DriverError, Result};
pub use git::{GitFileDriver, GitTagDriver};
pub use s3::S3Driver;
pub use traits::VersionSource;

use semvault_core::models::Source;

/// Construct the backend selected by `source.driver`.
///
/// An empty discriminator selects the object-store driver, matching the
/// protocol's historical default. Configuration problems (unknown driver,
/// missing fields, unparseable initial version) surface here, before any
/// network or filesystem access.
pub async fn from_source(source: &Source) -> Result<Box<dyn VersionSource>> {
    match source.driver.as_str() {
        "" | "s3" => Ok(Box::new(S3Driver::from_source(source).await?)),
        "git" => Ok(Box::new(GitFileDriver::from_source(source)?)),
        "git_tag" => Ok(Box::new(GitTagDriver::from_source(source)?)),
        "blob" => Ok(Box::new(BlobDriver::from_source(source)?)),
        other => Err(DriverError::Config(format!("unknown driver: {other}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unknown_driver_is_a_config_error() {
        let source = Source {
            driver: "carrier-pigeon".to_string(),
            ..Source::default()
        };
        let err = from_source(&source).await.unwrap_err();
        assert!(matches!(err, DriverError::Config(_)));
        assert!(err.to_string().contains("carrier-pigeon"));
    }

    #[tokio::test]
    async fn empty_driver_selects_object_store() {
        let source = Source {
            bucket: "releases".to_string(),
            key: "app/version".to_string(),
            access_key_id: "AKIA".to_string(),
            secret_access_key: "secret".to_string(),
            ..Source::default()
        };
        let driver = from_source(&source).await.unwrap();
        assert_eq!(driver.name(), "s3");
    }

    #[tokio::test]
    async fn git_driver_selected_and_validated() {
        let source = Source {
            driver: "git".to_string(),
            uri: "https://example.com/acme/versions.git".to_string(),
            branch: "main".to_string(),
            file: "version".to_string(),
            ..Source::default()
        };
        let driver = from_source(&source).await.unwrap();
        assert_eq!(driver.name(), "git");
    }

    #[tokio::test]
    async fn invalid_initial_version_is_rejected_at_construction() {
        let source = Source {
            driver: "git".to_string(),
            uri: "https://example.com/acme/versions.git".to_string(),
            branch: "main".to_string(),
            file: "version".to_string(),
            initial_version: "not-semver".to_string(),
            ..Source::default()
        };
        assert!(from_source(&source).await.is_err());
    }
}
