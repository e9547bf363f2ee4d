//! `out` - persist a new version to the source of truth
//!
//! Two modes: a literal version read from a file in the build's sources
//! (direct `set`), or a declarative bump applied to whatever the backend
//! currently holds (`bump`, with the backend's optimistic retry).

use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use clap::Args;
use semvault_core::models::{OutParams, OutRequest, OutResponse};
use semvault_core::{Bump, Version};
use tracing::info;

use super::{read_request, write_response};

#[derive(Debug, Args)]
pub struct PutCommand {
    /// Directory holding the build's input artifacts
    pub sources: PathBuf,
}

impl PutCommand {
    pub async fn execute(&self) -> anyhow::Result<()> {
        let request: OutRequest = read_request()?;

        let mut source = semvault_drivers::from_source(&request.source)
            .await
            .context("constructing version source")?;

        let written = match plan(&request.params, &self.sources)? {
            Plan::Set(version) => {
                source
                    .set(&version)
                    .await
                    .context("setting version")?;
                version
            }
            Plan::Bump(bump) => source.bump(&bump).await.context("bumping version")?,
        };

        info!(driver = source.name(), version = %written, "persisted version");
        write_response(&OutResponse::for_version(&written))
    }
}

/// What `out` was asked to do.
#[derive(Debug)]
enum Plan {
    Set(Version),
    Bump(Bump),
}

fn plan(params: &OutParams, sources: &Path) -> anyhow::Result<Plan> {
    if !params.file.is_empty() {
        let path = sources.join(&params.file);
        let raw = std::fs::read_to_string(&path).context("reading version file")?;
        let version = Version::parse(raw.trim()).context("parsing version file")?;
        return Ok(Plan::Set(version));
    }

    let bump_kind = resolve_param(&params.bump, &params.bump_file, sources)
        .context("reading bump file")?;
    let pre_label =
        resolve_param(&params.pre, &params.pre_file, sources).context("reading pre file")?;

    if bump_kind.is_empty() && pre_label.is_empty() && params.build.is_empty() {
        bail!("no version bumping params provided");
    }

    let bump = Bump::from_params(
        &bump_kind,
        &pre_label,
        params.pre_without_version,
        &params.build,
        params.build_without_version,
    )
    .context("building version bump")?;

    Ok(Plan::Bump(bump))
}

/// A side file's trimmed contents override the inline parameter.
fn resolve_param(inline: &str, file: &str, sources: &Path) -> anyhow::Result<String> {
    if file.is_empty() {
        return Ok(inline.to_string());
    }
    let raw = std::fs::read_to_string(sources.join(file))?;
    Ok(raw.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(file: &str, bump: &str, pre: &str) -> OutParams {
        OutParams {
            file: file.to_string(),
            bump: bump.to_string(),
            pre: pre.to_string(),
            ..OutParams::default()
        }
    }

    #[test]
    fn literal_file_plans_a_set() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("version"), "1.4.0\n").unwrap();

        match plan(&params("version", "", ""), dir.path()).unwrap() {
            Plan::Set(version) => assert_eq!(version.to_string(), "1.4.0"),
            other => panic!("expected a set plan, got {other:?}"),
        }
    }

    #[test]
    fn malformed_literal_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("version"), "one point four\n").unwrap();
        assert!(plan(&params("version", "", ""), dir.path()).is_err());
    }

    #[test]
    fn missing_literal_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(plan(&params("version", "", ""), dir.path()).is_err());
    }

    #[test]
    fn bump_params_plan_a_bump() {
        let dir = tempfile::tempdir().unwrap();
        let plan = plan(&params("", "minor", "rc"), dir.path()).unwrap();
        match plan {
            Plan::Bump(bump) => {
                let base = Version::parse("1.2.3").unwrap();
                assert_eq!(bump.apply(&base).to_string(), "1.3.0-rc.1");
            }
            other => panic!("expected a bump plan, got {other:?}"),
        }
    }

    #[test]
    fn side_files_override_inline_params() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("bump"), "major\n").unwrap();
        std::fs::write(dir.path().join("pre"), "beta\n").unwrap();

        let mut p = params("", "patch", "rc");
        p.bump_file = "bump".to_string();
        p.pre_file = "pre".to_string();

        match plan(&p, dir.path()).unwrap() {
            Plan::Bump(bump) => {
                let base = Version::parse("1.2.3").unwrap();
                assert_eq!(bump.apply(&base).to_string(), "2.0.0-beta.1");
            }
            other => panic!("expected a bump plan, got {other:?}"),
        }
    }

    #[test]
    fn no_params_at_all_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = plan(&params("", "", ""), dir.path()).unwrap_err();
        assert!(err.to_string().contains("no version bumping params"));
    }

    #[test]
    fn build_param_alone_is_enough() {
        let dir = tempfile::tempdir().unwrap();
        let mut p = params("", "", "");
        p.build = "nightly".to_string();

        match plan(&p, dir.path()).unwrap() {
            Plan::Bump(bump) => {
                let base = Version::parse("1.2.3").unwrap();
                assert_eq!(bump.apply(&base).to_string(), "1.2.3+nightly.1");
            }
            other => panic!("expected a bump plan, got {other:?}"),
        }
    }
}
