//! Protocol envelope types
//!
//! JSON request/response shapes for the `check`, `in`, and `out` entry
//! points. Every field the caller may omit carries `#[serde(default)]` so a
//! minimal request decodes cleanly; validation of the decoded values happens
//! in the driver factory and the adapters, not here.

use serde::{Deserialize, Serialize};

use crate::error::VersionError;
use crate::version::Version;

/// A version as it travels on the wire
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionRef {
    #[serde(default)]
    pub number: String,
}

impl VersionRef {
    pub fn new(version: &Version) -> Self {
        Self {
            number: version.to_string(),
        }
    }

    /// Parse the carried number, treating an empty string as absent.
    pub fn parse(&self) -> Result<Option<Version>, VersionError> {
        if self.number.is_empty() {
            Ok(None)
        } else {
            Version::parse(&self.number).map(Some)
        }
    }
}

/// Source-of-truth configuration.
///
/// A flat union of every backend's fields; `driver` selects which subset is
/// meaningful. The drivers crate validates the selected subset at
/// construction time.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Source {
    /// Backend selector: "" or "s3", "git", "git_tag", "blob"
    pub driver: String,
    /// Version reported before any version has been stored (default 0.0.0)
    pub initial_version: String,

    // Object store (s3)
    pub bucket: String,
    pub key: String,
    pub access_key_id: String,
    pub secret_access_key: String,
    pub session_token: String,
    pub region_name: String,
    pub endpoint: String,
    pub disable_ssl: bool,
    pub server_side_encryption: String,

    // Git (shared by the file and tag drivers)
    pub uri: String,
    pub branch: String,
    pub file: String,
    pub private_key: String,
    pub username: String,
    pub password: String,
    pub git_user: String,
    pub depth: Option<u32>,
    pub commit_message: String,
    pub tag_prefix: String,

    // Generic blob store
    pub url: String,
    pub container: String,
    pub item_name: String,
    pub api_token: String,

    pub skip_ssl_verification: bool,
}

impl Source {
    /// The configured initial-version fallback, defaulting to 0.0.0.
    pub fn initial_version(&self) -> Result<Version, VersionError> {
        if self.initial_version.is_empty() {
            Ok(Version::default())
        } else {
            Version::parse(&self.initial_version)
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CheckRequest {
    pub source: Source,
    pub version: VersionRef,
}

pub type CheckResponse = Vec<VersionRef>;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct InParams {
    pub bump: String,
    pub pre: String,
    pub pre_without_version: bool,
    pub build: String,
    pub build_without_version: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct InRequest {
    pub source: Source,
    pub version: VersionRef,
    pub params: InParams,
}

#[derive(Debug, Clone, Serialize)]
pub struct InResponse {
    pub version: VersionRef,
    pub metadata: Vec<MetadataField>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct OutParams {
    /// Path (relative to the sources directory) of a file holding the
    /// literal version to persist; mutually exclusive with the bump fields
    pub file: String,
    pub bump: String,
    /// Side file whose trimmed contents override `bump`
    pub bump_file: String,
    pub pre: String,
    /// Side file whose trimmed contents override `pre`
    pub pre_file: String,
    pub pre_without_version: bool,
    pub build: String,
    pub build_without_version: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct OutRequest {
    pub source: Source,
    pub params: OutParams,
}

#[derive(Debug, Clone, Serialize)]
pub struct OutResponse {
    pub version: VersionRef,
    pub metadata: Vec<MetadataField>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MetadataField {
    pub name: String,
    pub value: String,
}

impl InResponse {
    /// The standard response shape shared by `in` and `out`: the resulting
    /// version plus a `number` metadata field.
    pub fn for_version(version: &Version) -> Self {
        Self {
            version: VersionRef::new(version),
            metadata: vec![MetadataField {
                name: "number".to_string(),
                value: version.to_string(),
            }],
        }
    }
}

impl OutResponse {
    pub fn for_version(version: &Version) -> Self {
        Self {
            version: VersionRef::new(version),
            metadata: vec![MetadataField {
                name: "number".to_string(),
                value: version.to_string(),
            }],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_check_request_decodes() {
        let request: CheckRequest =
            serde_json::from_str(r#"{"source": {"bucket": "b", "key": "k"}}"#).unwrap();
        assert_eq!(request.source.driver, "");
        assert_eq!(request.source.bucket, "b");
        assert!(request.version.parse().unwrap().is_none());
    }

    #[test]
    fn cursor_parses_when_present() {
        let request: CheckRequest =
            serde_json::from_str(r#"{"source": {}, "version": {"number": "1.2.3"}}"#).unwrap();
        let cursor = request.version.parse().unwrap().unwrap();
        assert_eq!(cursor.to_string(), "1.2.3");
    }

    #[test]
    fn malformed_cursor_is_an_error() {
        let request: CheckRequest =
            serde_json::from_str(r#"{"source": {}, "version": {"number": "bogus"}}"#).unwrap();
        assert!(request.version.parse().is_err());
    }

    #[test]
    fn initial_version_defaults_to_zero() {
        let source = Source::default();
        assert_eq!(source.initial_version().unwrap().to_string(), "0.0.0");
    }

    #[test]
    fn initial_version_parses_when_configured() {
        let source = Source {
            initial_version: "1.0.0-rc.1".to_string(),
            ..Source::default()
        };
        assert_eq!(source.initial_version().unwrap().to_string(), "1.0.0-rc.1");
    }

    #[test]
    fn invalid_initial_version_is_an_error() {
        let source = Source {
            initial_version: "one point oh".to_string(),
            ..Source::default()
        };
        assert!(source.initial_version().is_err());
    }

    #[test]
    fn in_request_decodes_params() {
        let raw = r#"{
            "source": {"driver": "git", "uri": "git@example.com:a/b", "branch": "main", "file": "version"},
            "version": {"number": "1.2.3"},
            "params": {"bump": "minor", "pre": "rc"}
        }"#;
        let request: InRequest = serde_json::from_str(raw).unwrap();
        assert_eq!(request.params.bump, "minor");
        assert_eq!(request.params.pre, "rc");
        assert!(!request.params.pre_without_version);
    }

    #[test]
    fn response_shape_matches_protocol() {
        let version = Version::parse("1.3.0").unwrap();
        let encoded = serde_json::to_string(&OutResponse::for_version(&version)).unwrap();
        assert_eq!(
            encoded,
            r#"{"version":{"number":"1.3.0"},"metadata":[{"name":"number","value":"1.3.0"}]}"#
        );
    }
}
