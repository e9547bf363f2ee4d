//! Object-store driver backed by S3-compatible storage
//!
//! The version lives as the plain-text body of a single object. S3 offers no
//! native compare-and-swap for this shape, so writes are last-write-wins and
//! `bump` is a single read-apply-put with no retry loop.

use aws_sdk_s3::config::{Credentials, Region};
use aws_sdk_s3::types::ServerSideEncryption;
use aws_sdk_s3::Client;
use semvault_core::models::Source;
use semvault_core::{Bump, Version};
use tracing::{debug, instrument};
use url::Url;

use crate::error::{DriverError, Result};
use crate::traits::{versions_to_report, CursorPolicy, VersionSource};

const DEFAULT_REGION: &str = "us-east-1";

#[derive(Debug)]
pub struct S3Driver {
    client: Client,
    bucket: String,
    key: String,
    server_side_encryption: Option<ServerSideEncryption>,
    initial: Version,
}

impl S3Driver {
    pub async fn from_source(source: &Source) -> Result<Self> {
        if source.bucket.is_empty() {
            return Err(DriverError::Config("bucket must be specified".to_string()));
        }
        if source.key.is_empty() {
            return Err(DriverError::Config("key must be specified".to_string()));
        }

        let region = if source.region_name.is_empty() {
            DEFAULT_REGION.to_string()
        } else {
            source.region_name.clone()
        };

        let mut builder = if source.access_key_id.is_empty() {
            // No static keys configured: fall back to the default provider
            // chain (environment, instance profile, ...).
            let sdk_config =
                aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
            aws_sdk_s3::config::Builder::from(&sdk_config)
        } else {
            let session_token = if source.session_token.is_empty() {
                None
            } else {
                Some(source.session_token.clone())
            };
            let credentials = Credentials::new(
                &source.access_key_id,
                &source.secret_access_key,
                session_token,
                None,
                "semvault",
            );
            aws_sdk_s3::Config::builder().credentials_provider(credentials)
        };

        builder = builder
            .region(Region::new(region))
            .force_path_style(true);

        if !source.endpoint.is_empty() {
            builder = builder.endpoint_url(normalize_endpoint(
                &source.endpoint,
                source.disable_ssl,
            )?);
        }

        let server_side_encryption = if source.server_side_encryption.is_empty() {
            None
        } else {
            Some(ServerSideEncryption::from(
                source.server_side_encryption.as_str(),
            ))
        };

        Ok(Self {
            client: Client::from_conf(builder.build()),
            bucket: source.bucket.clone(),
            key: source.key.clone(),
            server_side_encryption,
            initial: source.initial_version()?,
        })
    }

    /// Read the stored version, `None` when the object does not exist.
    async fn read_version(&self) -> Result<Option<Version>> {
        let response = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(&self.key)
            .send()
            .await;

        match response {
            Ok(output) => {
                let body = output
                    .body
                    .collect()
                    .await
                    .map_err(|e| DriverError::Storage(e.to_string()))?
                    .into_bytes();
                let text = String::from_utf8_lossy(&body);
                let version = Version::parse(text.trim())?;
                Ok(Some(version))
            }
            Err(err) => {
                let not_found = err
                    .as_service_error()
                    .map(|e| e.is_no_such_key())
                    .unwrap_or(false);
                if not_found {
                    Ok(None)
                } else {
                    Err(DriverError::Storage(err.to_string()))
                }
            }
        }
    }

    #[instrument(skip(self, new), fields(bucket = %self.bucket, key = %self.key))]
    async fn write_version(&self, new: &Version) -> Result<()> {
        let mut request = self
            .client
            .put_object()
            .bucket(&self.bucket)
            .key(&self.key)
            .content_type("text/plain")
            .body(new.to_string().into_bytes().into());

        if let Some(sse) = &self.server_side_encryption {
            request = request.server_side_encryption(sse.clone());
        }

        request
            .send()
            .await
            .map_err(|e| DriverError::Storage(e.to_string()))?;

        debug!(version = %new, "stored version object");
        Ok(())
    }
}

#[async_trait::async_trait]
impl VersionSource for S3Driver {
    fn name(&self) -> &'static str {
        "s3"
    }

    /// Cursor policy: when a version is stored it is returned
    /// unconditionally, cursor or not. (Historical behavior, preserved.)
    async fn check(&mut self, cursor: Option<&Version>) -> Result<Vec<Version>> {
        let current = self.read_version().await?;
        Ok(versions_to_report(
            current,
            cursor,
            &self.initial,
            CursorPolicy::Ignore,
        ))
    }

    async fn set(&mut self, new: &Version) -> Result<()> {
        self.write_version(new).await
    }

    async fn bump(&mut self, bump: &Bump) -> Result<Version> {
        let current = self
            .read_version()
            .await?
            .unwrap_or_else(|| self.initial.clone());
        let next = bump.apply(&current);
        self.write_version(&next).await?;
        Ok(next)
    }
}

/// Accept bare hostnames as endpoints, defaulting the scheme from
/// `disable_ssl`.
fn normalize_endpoint(endpoint: &str, disable_ssl: bool) -> Result<String> {
    if endpoint.contains("://") {
        Url::parse(endpoint)
            .map_err(|e| DriverError::Config(format!("invalid endpoint '{endpoint}': {e}")))?;
        Ok(endpoint.to_string())
    } else {
        let scheme = if disable_ssl { "http" } else { "https" };
        let full = format!("{scheme}://{endpoint}");
        Url::parse(&full)
            .map_err(|e| DriverError::Config(format!("invalid endpoint '{endpoint}': {e}")))?;
        Ok(full)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_with_scheme_is_kept() {
        assert_eq!(
            normalize_endpoint("http://minio:9000", false).unwrap(),
            "http://minio:9000"
        );
    }

    #[test]
    fn bare_hostname_gains_https() {
        assert_eq!(
            normalize_endpoint("storage.example.com", false).unwrap(),
            "https://storage.example.com"
        );
    }

    #[test]
    fn disable_ssl_picks_http() {
        assert_eq!(
            normalize_endpoint("storage.example.com", true).unwrap(),
            "http://storage.example.com"
        );
    }

    #[test]
    fn invalid_endpoint_is_a_config_error() {
        assert!(matches!(
            normalize_endpoint("http://[broken", false),
            Err(DriverError::Config(_))
        ));
    }

    #[tokio::test]
    async fn missing_bucket_rejected_before_io() {
        let source = Source {
            driver: "s3".to_string(),
            key: "version".to_string(),
            ..Source::default()
        };
        let err = S3Driver::from_source(&source).await.unwrap_err();
        assert!(matches!(err, DriverError::Config(_)));
    }
}
