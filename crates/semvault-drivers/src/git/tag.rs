//! Git driver: version stored as the newest matching tag

use semvault_core::models::Source;
use semvault_core::{Bump, Version};
use tracing::{debug, instrument};

use crate::error::{DriverError, Result};
use crate::git::{classify_push, workspace::combined_output, GitWorkspace, PushOutcome};
use crate::retry::{bump_with_retry, set_with_retry, OptimisticStore};
use crate::traits::{versions_to_report, CursorPolicy, VersionSource};

const DEFAULT_PREFIX: &str = "v";

#[derive(Debug)]
pub struct GitTagDriver {
    workspace: GitWorkspace,
    prefix: String,
    initial: Version,
}

impl GitTagDriver {
    pub fn from_source(source: &Source) -> Result<Self> {
        let prefix = if source.tag_prefix.is_empty() {
            DEFAULT_PREFIX.to_string()
        } else {
            source.tag_prefix.clone()
        };

        Ok(Self {
            workspace: GitWorkspace::from_source(source, true)?,
            prefix,
            initial: source.initial_version()?,
        })
    }

    /// Read the version from the most recently tagged `<prefix>*` tag. No
    /// matching tag means no version has been stored yet; a matching tag
    /// that does not parse is an error.
    async fn read_version(&self) -> Result<Option<Version>> {
        let output = self
            .workspace
            .run(&[
                "tag".to_string(),
                "--sort=-taggerdate".to_string(),
                "-l".to_string(),
                format!("{}*", self.prefix),
            ])
            .await?;
        if !output.status.success() {
            return Err(DriverError::Git {
                command: "tag".to_string(),
                detail: combined_output(&output),
            });
        }

        let listing = String::from_utf8_lossy(&output.stdout);
        let newest = match listing.lines().next().map(str::trim) {
            Some(tag) if !tag.is_empty() => tag.to_string(),
            _ => return Ok(None),
        };

        let stripped = newest.strip_prefix(&self.prefix).ok_or_else(|| {
            DriverError::Storage(format!(
                "tag '{newest}' does not carry prefix '{}'",
                self.prefix
            ))
        })?;

        Ok(Some(Version::parse(stripped)?))
    }

    /// Resolve the commit the new tag should point at: the freshly fetched
    /// remote head.
    async fn remote_head(&self) -> Result<String> {
        let output = self
            .workspace
            .run(&[
                "ls-remote".to_string(),
                "origin".to_string(),
                "HEAD".to_string(),
            ])
            .await?;
        if !output.status.success() {
            return Err(DriverError::Git {
                command: "ls-remote".to_string(),
                detail: combined_output(&output),
            });
        }

        let listing = String::from_utf8_lossy(&output.stdout);
        listing
            .split_whitespace()
            .next()
            .map(str::to_string)
            .ok_or_else(|| DriverError::Storage("remote has no HEAD to tag".to_string()))
    }

    /// Annotate the remote head with `<prefix><version>` and push the tag.
    /// An already-taken tag name on the remote is replaced (forced
    /// re-pointing of a version is the documented `set` semantics); a
    /// rejected push is the conflict signal.
    #[instrument(skip(self, version), fields(prefix = %self.prefix))]
    async fn write_version(&self, version: &Version) -> Result<()> {
        let tag = format!("{}{version}", self.prefix);
        let head = self.remote_head().await?;

        let annotation = format!(
            "Pipeline: {}\nJob: {}\nBuild: {}",
            std::env::var("BUILD_PIPELINE_NAME").unwrap_or_default(),
            std::env::var("BUILD_JOB_NAME").unwrap_or_default(),
            std::env::var("BUILD_NAME").unwrap_or_default(),
        );

        let tag_cmd = self
            .workspace
            .run_as_committer(&[
                "tag".to_string(),
                "--force".to_string(),
                "--annotate".to_string(),
                "--message".to_string(),
                annotation,
                tag.clone(),
                head,
            ])
            .await?;
        if !tag_cmd.status.success() {
            return Err(DriverError::Git {
                command: "tag".to_string(),
                detail: combined_output(&tag_cmd),
            });
        }

        if self.remote_tag_exists(&tag).await? {
            let delete = self
                .workspace
                .run(&[
                    "push".to_string(),
                    "origin".to_string(),
                    format!(":refs/tags/{tag}"),
                ])
                .await?;
            if !delete.status.success() {
                return Err(DriverError::Git {
                    command: "push".to_string(),
                    detail: combined_output(&delete),
                });
            }
        }

        let push = self
            .workspace
            .run(&["push".to_string(), "origin".to_string(), tag.clone()])
            .await?;
        match classify_push(&combined_output(&push), push.status.success()) {
            PushOutcome::Success | PushOutcome::NothingToCommit => {
                debug!(%tag, "pushed version tag");
                Ok(())
            }
            PushOutcome::Conflict => Err(DriverError::Conflict(format!(
                "push of tag '{tag}' rejected, remote advanced"
            ))),
            PushOutcome::Fatal(detail) => Err(DriverError::Git {
                command: "push".to_string(),
                detail,
            }),
        }
    }

    async fn remote_tag_exists(&self, tag: &str) -> Result<bool> {
        let output = self
            .workspace
            .run(&[
                "ls-remote".to_string(),
                "origin".to_string(),
                format!("refs/tags/{tag}"),
            ])
            .await?;
        if !output.status.success() {
            return Err(DriverError::Git {
                command: "ls-remote".to_string(),
                detail: combined_output(&output),
            });
        }
        Ok(String::from_utf8_lossy(&output.stdout).contains(tag))
    }
}

#[async_trait::async_trait]
impl OptimisticStore for GitTagDriver {
    async fn load(&mut self) -> Result<Option<Version>> {
        self.workspace.refresh().await?;
        self.read_version().await
    }

    async fn store(&mut self, version: &Version) -> Result<()> {
        self.write_version(version).await
    }
}

#[async_trait::async_trait]
impl VersionSource for GitTagDriver {
    fn name(&self) -> &'static str {
        "git_tag"
    }

    /// Cursor policy: an existing version is reported iff it is at least the
    /// cursor.
    async fn check(&mut self, cursor: Option<&Version>) -> Result<Vec<Version>> {
        self.workspace.refresh().await?;

        let current = self.read_version().await?;
        Ok(versions_to_report(
            current,
            cursor,
            &self.initial,
            CursorPolicy::AtLeast,
        ))
    }

    async fn set(&mut self, new: &Version) -> Result<()> {
        set_with_retry(self, new).await
    }

    async fn bump(&mut self, bump: &Bump) -> Result<Version> {
        let initial = self.initial.clone();
        bump_with_retry(self, &initial, bump).await
    }
}
