//! Generic blob-store driver
//!
//! Speaks plain HTTP object semantics against `<url>/<container>/<item>`:
//! GET to read, PUT to write. The store's ETag doubles as the optimistic
//! token - bump writes are conditional (`If-Match`, or `If-None-Match: *`
//! when nothing was stored) and a 412 response is the conflict signal that
//! feeds the retry loop.

use reqwest::header::{HeaderValue, ETAG, IF_MATCH, IF_NONE_MATCH};
use reqwest::{Client, StatusCode};
use semvault_core::models::Source;
use semvault_core::{Bump, Version};
use tracing::{debug, instrument};

use crate::error::{DriverError, Result};
use crate::retry::{bump_with_retry, OptimisticStore};
use crate::traits::{versions_to_report, CursorPolicy, VersionSource};

#[derive(Debug)]
pub struct BlobDriver {
    client: Client,
    object_url: String,
    auth: Auth,
    initial: Version,
    /// What the last read observed, guarding the next conditional write
    precondition: Precondition,
}

#[derive(Debug)]
enum Auth {
    None,
    Bearer(String),
    Basic { username: String, password: String },
}

/// Write guard derived from the last read.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Precondition {
    /// No blob stored: the write must create, not overwrite
    Absent,
    /// Blob stored under this ETag: the write must replace exactly it
    Tag(String),
    /// Blob stored but the store sent no ETag, so a conditional write has
    /// nothing to match against
    Missing,
}

impl Precondition {
    fn guard(&self, request: reqwest::RequestBuilder) -> Result<reqwest::RequestBuilder> {
        match self {
            Precondition::Absent => Ok(request.header(IF_NONE_MATCH, "*")),
            Precondition::Tag(etag) => {
                let value = HeaderValue::from_str(etag).map_err(|_| {
                    DriverError::Storage(format!("unusable etag from store: {etag:?}"))
                })?;
                Ok(request.header(IF_MATCH, value))
            }
            Precondition::Missing => Err(DriverError::Storage(
                "store returned no etag, cannot guard against concurrent writers".to_string(),
            )),
        }
    }
}

impl BlobDriver {
    pub fn from_source(source: &Source) -> Result<Self> {
        if source.url.is_empty() {
            return Err(DriverError::Config("url must be specified".to_string()));
        }
        if source.container.is_empty() {
            return Err(DriverError::Config(
                "container must be specified".to_string(),
            ));
        }
        if source.item_name.is_empty() {
            return Err(DriverError::Config(
                "item_name must be specified".to_string(),
            ));
        }

        let base = url::Url::parse(&source.url)
            .map_err(|e| DriverError::Config(format!("invalid url '{}': {e}", source.url)))?;
        let object_url = format!(
            "{}/{}/{}",
            base.as_str().trim_end_matches('/'),
            source.container,
            source.item_name
        );

        let auth = if !source.api_token.is_empty() {
            Auth::Bearer(source.api_token.clone())
        } else if !source.username.is_empty() {
            Auth::Basic {
                username: source.username.clone(),
                password: source.password.clone(),
            }
        } else {
            Auth::None
        };

        let client = Client::builder()
            .danger_accept_invalid_certs(source.skip_ssl_verification)
            .build()?;

        Ok(Self {
            client,
            object_url,
            auth,
            initial: source.initial_version()?,
            precondition: Precondition::Absent,
        })
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.auth {
            Auth::None => request,
            Auth::Bearer(token) => request.bearer_auth(token),
            Auth::Basic { username, password } => request.basic_auth(username, Some(password)),
        }
    }

    /// Read the stored version, recording the ETag for conditional writes.
    /// 404 means no version has been stored yet.
    async fn read_version(&mut self) -> Result<Option<Version>> {
        let response = self
            .authorize(self.client.get(&self.object_url))
            .send()
            .await?;

        match response.status() {
            StatusCode::NOT_FOUND => {
                self.precondition = Precondition::Absent;
                Ok(None)
            }
            status if status.is_success() => {
                self.precondition = response
                    .headers()
                    .get(ETAG)
                    .and_then(|v| v.to_str().ok())
                    .map(|etag| Precondition::Tag(etag.to_string()))
                    .unwrap_or(Precondition::Missing);
                let body = response.text().await?;
                let version = Version::parse(body.trim())?;
                Ok(Some(version))
            }
            status => Err(DriverError::Storage(format!(
                "GET {} returned {status}",
                self.object_url
            ))),
        }
    }

    #[instrument(skip(self, version), fields(url = %self.object_url))]
    async fn write_version(&self, version: &Version, conditional: bool) -> Result<()> {
        let mut request = self
            .authorize(self.client.put(&self.object_url))
            .header(reqwest::header::CONTENT_TYPE, "text/plain")
            .body(version.to_string());

        if conditional {
            request = self.precondition.guard(request)?;
        }

        let response = request.send().await?;
        match response.status() {
            StatusCode::PRECONDITION_FAILED => Err(DriverError::Conflict(format!(
                "blob at {} changed since it was read",
                self.object_url
            ))),
            status if status.is_success() => {
                debug!(version = %version, "stored version blob");
                Ok(())
            }
            status => Err(DriverError::Storage(format!(
                "PUT {} returned {status}",
                self.object_url
            ))),
        }
    }
}

#[async_trait::async_trait]
impl OptimisticStore for BlobDriver {
    async fn load(&mut self) -> Result<Option<Version>> {
        self.read_version().await
    }

    async fn store(&mut self, version: &Version) -> Result<()> {
        self.write_version(version, true).await
    }
}

#[async_trait::async_trait]
impl VersionSource for BlobDriver {
    fn name(&self) -> &'static str {
        "blob"
    }

    /// Cursor policy: an existing version is reported iff it is at least the
    /// cursor.
    async fn check(&mut self, cursor: Option<&Version>) -> Result<Vec<Version>> {
        let current = self.read_version().await?;
        Ok(versions_to_report(
            current,
            cursor,
            &self.initial,
            CursorPolicy::AtLeast,
        ))
    }

    async fn set(&mut self, new: &Version) -> Result<()> {
        // Direct overwrite: no precondition.
        self.write_version(new, false).await
    }

    async fn bump(&mut self, bump: &Bump) -> Result<Version> {
        let initial = self.initial.clone();
        bump_with_retry(self, &initial, bump).await
    }
}
