//! The version-source capability trait

use semvault_core::{Bump, Version};

use crate::error::Result;

/// A durable location storing exactly one current version record.
///
/// A source is constructed per invocation and driven by a single caller, so
/// operations take `&mut self`; any working state (a cloned repository, a
/// cached ETag) lives inside the driver instance, never in process globals.
#[async_trait::async_trait]
pub trait VersionSource: Send + std::fmt::Debug {
    /// Driver name, for logging
    fn name(&self) -> &'static str;

    /// Read the current version and compare it against the caller's cursor.
    ///
    /// Returns zero or one versions: the current (or initial) version when
    /// there is something new to report, empty otherwise. When no version
    /// has been stored yet this reports the initial version - but only to a
    /// caller without a cursor; a caller that already knows a version has
    /// nothing new to learn from an empty source.
    ///
    /// The comparison policy for an existing stored version is
    /// driver-specific and documented on each driver.
    async fn check(&mut self, cursor: Option<&Version>) -> Result<Vec<Version>>;

    /// Write `new` to the backend, overwriting whatever is stored.
    async fn set(&mut self, new: &Version) -> Result<()>;

    /// Read-modify-write: apply `bump` to the current version (or the
    /// initial version if none is stored) and persist the result, retrying
    /// on concurrent-writer conflicts where the backend can detect them.
    /// Returns the version that was written.
    async fn bump(&mut self, bump: &Bump) -> Result<Version>;
}

/// How a driver compares an existing stored version against the caller's
/// cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CursorPolicy {
    /// Report the stored version unconditionally. Historical object-store
    /// behavior, preserved.
    Ignore,
    /// Report the stored version iff it is at least the cursor.
    AtLeast,
}

/// Shared `check` outcome: zero or one versions.
///
/// A stored version is filtered through `policy`; when nothing is stored the
/// initial version is reported, but only to a caller without a cursor - a
/// caller that already knows a version has nothing new to learn from an
/// empty source.
pub(crate) fn versions_to_report(
    current: Option<Version>,
    cursor: Option<&Version>,
    initial: &Version,
    policy: CursorPolicy,
) -> Vec<Version> {
    match current {
        Some(current) => match (policy, cursor) {
            (CursorPolicy::AtLeast, Some(cursor)) if !current.gte(cursor) => Vec::new(),
            _ => vec![current],
        },
        None if cursor.is_none() => vec![initial.clone()],
        None => Vec::new(),
    }
}
