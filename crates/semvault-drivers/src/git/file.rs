//! Git driver: version stored as a file on a branch

use semvault_core::models::Source;
use semvault_core::{Bump, Version};
use tracing::{debug, instrument};

use crate::error::{DriverError, Result};
use crate::git::{classify_commit, classify_push, workspace::combined_output, GitWorkspace, PushOutcome};
use crate::retry::{bump_with_retry, set_with_retry, OptimisticStore};
use crate::traits::{versions_to_report, CursorPolicy, VersionSource};

#[derive(Debug)]
pub struct GitFileDriver {
    workspace: GitWorkspace,
    branch: String,
    file: String,
    commit_message: Option<String>,
    initial: Version,
}

impl GitFileDriver {
    pub fn from_source(source: &Source) -> Result<Self> {
        if source.branch.is_empty() {
            return Err(DriverError::Config("branch must be specified".to_string()));
        }
        if source.file.is_empty() {
            return Err(DriverError::Config("file must be specified".to_string()));
        }

        Ok(Self {
            workspace: GitWorkspace::from_source(source, false)?,
            branch: source.branch.clone(),
            file: source.file.clone(),
            commit_message: if source.commit_message.is_empty() {
                None
            } else {
                Some(source.commit_message.clone())
            },
            initial: source.initial_version()?,
        })
    }

    /// Read the version from the tracked file. A missing file means no
    /// version has been stored yet; unreadable or unparseable content is an
    /// error. Only the first whitespace-delimited token counts, so a
    /// trailing newline is fine.
    fn read_version(&self) -> Result<Option<Version>> {
        let path = self.workspace.path().join(&self.file);
        let raw = match std::fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };

        let token = raw
            .split_whitespace()
            .next()
            .ok_or_else(|| DriverError::Storage(format!("version file '{}' is empty", self.file)))?;

        Ok(Some(Version::parse(token)?))
    }

    fn commit_message_for(&self, version: &Version) -> String {
        match &self.commit_message {
            Some(template) => template
                .replace("%version%", &version.to_string())
                .replace("%file%", &self.file),
            None => format!("bump to {version}"),
        }
    }

    /// Write the file, commit, and push. A rejected push is the conflict
    /// signal; a no-op commit (file already holds this version) succeeds
    /// without pushing.
    #[instrument(skip(self, version), fields(file = %self.file, branch = %self.branch))]
    async fn write_version(&self, version: &Version) -> Result<()> {
        let path = self.workspace.path().join(&self.file);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, format!("{version}\n")).await?;

        let add = self
            .workspace
            .run(&["add".to_string(), self.file.clone()])
            .await?;
        if !add.status.success() {
            return Err(DriverError::Git {
                command: "add".to_string(),
                detail: combined_output(&add),
            });
        }

        let commit = self
            .workspace
            .run_as_committer(&[
                "commit".to_string(),
                "-m".to_string(),
                self.commit_message_for(version),
            ])
            .await?;
        match classify_commit(&combined_output(&commit), commit.status.success()) {
            PushOutcome::NothingToCommit => {
                debug!(version = %version, "file already at version, nothing to push");
                return Ok(());
            }
            PushOutcome::Fatal(detail) => {
                return Err(DriverError::Git {
                    command: "commit".to_string(),
                    detail,
                });
            }
            _ => {}
        }

        let push = self
            .workspace
            .run(&[
                "push".to_string(),
                "origin".to_string(),
                format!("HEAD:{}", self.branch),
            ])
            .await?;
        match classify_push(&combined_output(&push), push.status.success()) {
            PushOutcome::Success | PushOutcome::NothingToCommit => {
                debug!(version = %version, "pushed version file");
                Ok(())
            }
            PushOutcome::Conflict => Err(DriverError::Conflict(format!(
                "push to '{}' rejected, remote advanced",
                self.branch
            ))),
            PushOutcome::Fatal(detail) => Err(DriverError::Git {
                command: "push".to_string(),
                detail,
            }),
        }
    }
}

#[async_trait::async_trait]
impl OptimisticStore for GitFileDriver {
    async fn load(&mut self) -> Result<Option<Version>> {
        self.workspace.refresh().await?;
        self.read_version()
    }

    async fn store(&mut self, version: &Version) -> Result<()> {
        self.write_version(version).await
    }
}

#[async_trait::async_trait]
impl VersionSource for GitFileDriver {
    fn name(&self) -> &'static str {
        "git"
    }

    /// Cursor policy: an existing version is reported iff it is at least the
    /// cursor.
    async fn check(&mut self, cursor: Option<&Version>) -> Result<Vec<Version>> {
        self.workspace.refresh().await?;

        let current = self.read_version()?;
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
