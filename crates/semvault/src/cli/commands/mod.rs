//! Protocol adapter commands

mod check;
mod get;
mod put;

pub use check::CheckCommand;
pub use get::GetCommand;
pub use put::PutCommand;

use anyhow::Context;
use serde::de::DeserializeOwned;

/// Decode the JSON request from stdin.
fn read_request<T: DeserializeOwned>() -> anyhow::Result<T> {
    serde_json::from_reader(std::io::stdin().lock()).context("reading request")
}

/// Encode the JSON response to stdout.
fn write_response<T: serde::Serialize>(response: &T) -> anyhow::Result<()> {
    let stdout = std::io::stdout().lock();
    serde_json::to_writer(stdout, response).context("writing response")?;
    println!();
    Ok(())
}
