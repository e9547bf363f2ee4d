//! Git-backed drivers
//!
//! Two drivers share one workspace abstraction: `git` stores the version as
//! a file on a branch, `git_tag` stores it as the newest matching tag. Both
//! rely on the remote's push acceptance as their conflict detector, so both
//! run their writes through the bounded optimistic retry loop.

mod file;
mod tag;
mod workspace;

pub use file::GitFileDriver;
pub use tag::GitTagDriver;
pub(crate) use workspace::GitWorkspace;

/// Classified outcome of a commit or push.
///
/// Git reports these conditions only through its textual output, so
/// classification is substring matching - an acknowledged approximation of
/// tool output that may drift across git versions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum PushOutcome {
    /// The write landed on the remote
    Success,
    /// The working tree already matched the version being written
    NothingToCommit,
    /// The remote advanced since our fetch; safe to re-read and retry
    Conflict,
    /// Anything else: auth failures, broken refs, network errors
    Fatal(String),
}

const NOTHING_TO_COMMIT: &str = "nothing to commit";
const PUSH_REJECTED: &str = "[rejected]";
const PUSH_REMOTE_REJECTED: &str = "[remote rejected]";
const PUSH_UP_TO_DATE: &str = "Everything up-to-date";

/// Classify `git commit` output.
pub(crate) fn classify_commit(output: &str, success: bool) -> PushOutcome {
    if output.contains(NOTHING_TO_COMMIT) {
        PushOutcome::NothingToCommit
    } else if success {
        PushOutcome::Success
    } else {
        PushOutcome::Fatal(output.to_string())
    }
}

/// Classify `git push` output. "Everything up-to-date" counts as a conflict:
/// it means our commit never made it into the ref we pushed, which only
/// happens when the remote moved under us.
pub(crate) fn classify_push(output: &str, success: bool) -> PushOutcome {
    if output.contains(PUSH_REJECTED)
        || output.contains(PUSH_REMOTE_REJECTED)
        || output.contains(PUSH_UP_TO_DATE)
    {
        PushOutcome::Conflict
    } else if success {
        PushOutcome::Success
    } else {
        PushOutcome::Fatal(output.to_string())
    }
}
