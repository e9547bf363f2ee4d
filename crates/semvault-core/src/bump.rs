//! Bump algebra - pure transformations on a version value
//!
//! A [`Bump`] maps one [`Version`] to another. Application is total and
//! deterministic: labels are carried as opaque text, and a bump never fails,
//! so callers are free to apply one speculatively (the `in` adapter does
//! exactly that, without touching the backend).

use crate::error::VersionError;
use crate::version::Version;

/// A versioning policy decision, applied with [`Bump::apply`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Bump {
    /// Leave the version unchanged
    Identity,
    /// Increment major, zero minor/patch, clear prerelease
    Major,
    /// Increment minor, zero patch, clear prerelease
    Minor,
    /// Increment patch, clear prerelease
    Patch,
    /// Clear prerelease only, promoting a prerelease to its final release
    Final,
    /// Advance or reset the prerelease sequence for `label`
    Pre { label: String, without_version: bool },
    /// Advance or reset the build-metadata sequence for `label`
    Build { label: String, without_version: bool },
    /// Apply `inner` only when the version is not already a prerelease,
    /// then advance/reset the prerelease sequence for `label`
    ConditionalPre { inner: Box<Bump>, label: String },
    /// Apply each bump in order, each consuming the previous output
    Multi(Vec<Bump>),
}

impl Bump {
    /// Apply this bump to a version, producing the next version.
    pub fn apply(&self, v: &Version) -> Version {
        match self {
            Bump::Identity => v.clone(),
            Bump::Major => {
                let mut next = v.clone();
                next.major += 1;
                next.minor = 0;
                next.patch = 0;
                next.pre.clear();
                next
            }
            Bump::Minor => {
                let mut next = v.clone();
                next.minor += 1;
                next.patch = 0;
                next.pre.clear();
                next
            }
            Bump::Patch => {
                let mut next = v.clone();
                next.patch += 1;
                next.pre.clear();
                next
            }
            Bump::Final => {
                let mut next = v.clone();
                next.pre.clear();
                next
            }
            Bump::Pre {
                label,
                without_version,
            } => {
                let mut next = v.clone();
                next.pre = advance(&v.pre, label, *without_version);
                next
            }
            Bump::Build {
                label,
                without_version,
            } => {
                let mut next = v.clone();
                next.build = advance(&v.build, label, *without_version);
                next
            }
            Bump::ConditionalPre { inner, label } => {
                let mut next = if v.pre.is_empty() {
                    inner.apply(v)
                } else {
                    v.clone()
                };
                next.pre = advance(&next.pre, label, false);
                next
            }
            Bump::Multi(bumps) => bumps.iter().fold(v.clone(), |acc, b| b.apply(&acc)),
        }
    }

    /// Build a bump from the declarative request parameters.
    ///
    /// The ordering is load-bearing: the numeric bump always runs before the
    /// prerelease and build bumps, so those see the already-bumped version
    /// when deciding whether to reset or advance their counter.
    pub fn from_params(
        bump: &str,
        pre: &str,
        pre_without_version: bool,
        build: &str,
        build_without_version: bool,
    ) -> Result<Bump, VersionError> {
        let mut bumps = Vec::new();

        match bump {
            "" => {}
            "major" => bumps.push(Bump::Major),
            "minor" => bumps.push(Bump::Minor),
            "patch" => bumps.push(Bump::Patch),
            "final" => bumps.push(Bump::Final),
            other => return Err(VersionError::InvalidBumpType(other.to_string())),
        }

        if !pre.is_empty() {
            bumps.push(Bump::Pre {
                label: pre.to_string(),
                without_version: pre_without_version,
            });
        }

        if !build.is_empty() {
            bumps.push(Bump::Build {
                label: build.to_string(),
                without_version: build_without_version,
            });
        }

        if bumps.is_empty() {
            Ok(Bump::Identity)
        } else {
            Ok(Bump::Multi(bumps))
        }
    }

    /// Whether applying this bump can never change a version
    pub fn is_identity(&self) -> bool {
        match self {
            Bump::Identity => true,
            Bump::Multi(bumps) => bumps.iter().all(Bump::is_identity),
            _ => false,
        }
    }
}

/// Advance or reset an identifier sequence for `label`.
///
/// With `without_version` the sequence collapses to the bare label. Otherwise
/// a sequence already leading with `label` has its trailing counter
/// incremented - a missing or non-numeric counter restarts at 1 - and any
/// other sequence resets to `[label, 1]`.
fn advance(seq: &[String], label: &str, without_version: bool) -> Vec<String> {
    if without_version {
        return vec![label.to_string()];
    }

    let counter = if seq.first().map(String::as_str) == Some(label) {
        seq.get(1)
            .and_then(|s| s.parse::<u64>().ok())
            .map(|n| n + 1)
            .unwrap_or(1)
    } else {
        1
    };

    vec![label.to_string(), counter.to_string()]
}
