//! `in` - materialize a version into the destination directory
//!
//! Applies the requested bump locally, without touching the backend: the
//! caller gets to see what a bump would produce, and downstream tasks read
//! the result from the `number`/`version` files.

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Args;
use semvault_core::models::{InRequest, InResponse};
use semvault_core::{Bump, Version};

use super::{read_request, write_response};

#[derive(Debug, Args)]
pub struct GetCommand {
    /// Directory the version files are written into
    pub destination: PathBuf,
}

impl GetCommand {
    pub async fn execute(&self) -> anyhow::Result<()> {
        let request: InRequest = read_request()?;
        let response = materialize(&request, &self.destination)?;
        write_response(&response)
    }
}

/// The filenames the resulting version is written to.
const OUTPUT_FILES: [&str; 2] = ["number", "version"];

fn materialize(request: &InRequest, destination: &Path) -> anyhow::Result<InResponse> {
    std::fs::create_dir_all(destination).context("creating destination")?;

    // An absent input version falls back to the source's initial version;
    // the backend is never consulted here.
    let version: Version = match request
        .version
        .parse()
        .context("parsing semantic version in request")?
    {
        Some(version) => version,
        None => request
            .source
            .initial_version()
            .context("parsing initial version")?,
    };

    let bump = Bump::from_params(
        &request.params.bump,
        &request.params.pre,
        request.params.pre_without_version,
        &request.params.build,
        request.params.build_without_version,
    )
    .context("building version bump")?;

    let result = bump.apply(&version);

    for name in OUTPUT_FILES {
        std::fs::write(destination.join(name), result.to_string())
            .with_context(|| format!("writing {name} file"))?;
    }

    Ok(InResponse::for_version(&result))
}
