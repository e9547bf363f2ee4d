//! Semvault core - version value, bump algebra, and protocol models
//!
//! This crate holds everything a backend driver or protocol adapter needs to
//! reason about versions: the [`Version`](version::Version) value itself, the
//! pure [`Bump`](bump::Bump) transformations applied to it, and the serde
//! types for the JSON request/response envelope.

pub mod bump;
pub mod error;
pub mod models;
pub mod version;

pub use bump::Bump;
pub use error::{Result, VersionError};
pub use version::Version;
