//! `check` - report versions newer than the caller's cursor

use anyhow::Context;
use clap::Args;
use semvault_core::models::{CheckRequest, CheckResponse, VersionRef};
use tracing::debug;

use super::{read_request, write_response};

#[derive(Debug, Args)]
pub struct CheckCommand {}

impl CheckCommand {
    pub async fn execute(&self) -> anyhow::Result<()> {
        let request: CheckRequest = read_request()?;

        let cursor = request
            .version
            .parse()
            .context("parsing semantic version in request")?;

        let mut source = semvault_drivers::from_source(&request.source)
            .await
            .context("constructing version source")?;

        debug!(driver = source.name(), "checking for new versions");
        let versions = source
            .check(cursor.as_ref())
            .await
            .context("checking for new versions")?;

        let response: CheckResponse = versions.iter().map(VersionRef::new).collect();
        write_response(&response)
    }
}
