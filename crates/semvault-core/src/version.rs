//! Semantic version value
//!
//! Validation and grammar come from the `semver` crate; the value itself
//! keeps prerelease and build metadata as identifier sequences so bump
//! transformations can manipulate individual identifiers, and so labels
//! introduced by a bump are carried as opaque text.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use crate::error::VersionError;

/// An immutable semantic version value.
///
/// `PartialEq` is exact (build metadata included) and is meant for
/// round-trip equality. Precedence comparisons use [`Version::precedence`],
/// which excludes build metadata per the SemVer specification; `Ord` is
/// deliberately not implemented so the two notions cannot be confused.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Version {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
    /// Prerelease identifiers, empty for a final release
    pub pre: Vec<String>,
    /// Build metadata identifiers, informational only
    pub build: Vec<String>,
}

impl Version {
    /// Create a final release version
    pub fn new(major: u64, minor: u64, patch: u64) -> Self {
        Self {
            major,
            minor,
            patch,
            pre: Vec::new(),
            build: Vec::new(),
        }
    }

    /// Parse a version string, validating it against the SemVer grammar
    pub fn parse(input: &str) -> Result<Self, VersionError> {
        let parsed = semver::Version::parse(input)
            .map_err(|e| VersionError::ParseFailed(input.to_string(), e.to_string()))?;

        Ok(Self {
            major: parsed.major,
            minor: parsed.minor,
            patch: parsed.patch,
            pre: split_identifiers(parsed.pre.as_str()),
            build: split_identifiers(parsed.build.as_str()),
        })
    }

    /// Whether this version carries prerelease identifiers
    pub fn is_prerelease(&self) -> bool {
        !self.pre.is_empty()
    }

    /// SemVer precedence: (major, minor, patch), then prerelease rules.
    /// Build metadata never participates.
    pub fn precedence(&self, other: &Self) -> Ordering {
        (self.major, self.minor, self.patch)
            .cmp(&(other.major, other.minor, other.patch))
            .then_with(|| pre_cmp(&self.pre, &other.pre))
    }

    /// `self` takes precedence over `other`
    pub fn gt(&self, other: &Self) -> bool {
        self.precedence(other) == Ordering::Greater
    }

    /// `self` is at least `other` by precedence
    pub fn gte(&self, other: &Self) -> bool {
        self.precedence(other) != Ordering::Less
    }
}

fn split_identifiers(raw: &str) -> Vec<String> {
    if raw.is_empty() {
        Vec::new()
    } else {
        raw.split('.').map(str::to_string).collect()
    }
}

/// Compare two prerelease sequences. An empty sequence (final release) takes
/// precedence over any non-empty one; otherwise identifiers compare
/// element-wise with numeric identifiers ordered below alphanumeric ones.
fn pre_cmp(a: &[String], b: &[String]) -> Ordering {
    match (a.is_empty(), b.is_empty()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => {
            for (x, y) in a.iter().zip(b.iter()) {
                let ord = identifier_cmp(x, y);
                if ord != Ordering::Equal {
                    return ord;
                }
            }
            a.len().cmp(&b.len())
        }
    }
}

fn identifier_cmp(a: &str, b: &str) -> Ordering {
    match (a.parse::<u64>(), b.parse::<u64>()) {
        (Ok(x), Ok(y)) => x.cmp(&y),
        (Ok(_), Err(_)) => Ordering::Less,
        (Err(_), Ok(_)) => Ordering::Greater,
        (Err(_), Err(_)) => a.cmp(b),
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)?;
        if !self.pre.is_empty() {
            write!(f, "-{}", self.pre.join("."))?;
        }
        if !self.build.is_empty() {
            write!(f, "+{}", self.build.join("."))?;
        }
        Ok(())
    }
}

impl FromStr for Version {
    type Err = VersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Version::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_plain() {
        let v = Version::parse("1.2.3").unwrap();
        assert_eq!(v.major, 1);
        assert_eq!(v.minor, 2);
        assert_eq!(v.patch, 3);
        assert!(v.pre.is_empty());
        assert!(v.build.is_empty());
    }

    #[test]
    fn parse_prerelease_and_build() {
        let v = Version::parse("1.2.3-rc.1+build.42").unwrap();
        assert_eq!(v.pre, vec!["rc", "1"]);
        assert_eq!(v.build, vec!["build", "42"]);
    }

    #[test]
    fn parse_rejects_garbage() {
        assert!(Version::parse("not-a-version").is_err());
        assert!(Version::parse("1.2").is_err());
        assert!(Version::parse("v1.2.3").is_err());
        assert!(Version::parse("").is_err());
    }

    #[test]
    fn display_round_trips() {
        for s in ["0.0.0", "1.2.3", "1.2.3-rc.1", "1.2.3-rc.1+sha.deadbeef"] {
            assert_eq!(Version::parse(s).unwrap().to_string(), s);
        }
    }

    #[test]
    fn final_release_outranks_prerelease() {
        let release = Version::parse("1.2.3").unwrap();
        let rc = Version::parse("1.2.3-rc.1").unwrap();
        assert!(release.gt(&rc));
        assert!(rc.gte(&rc));
        assert!(!rc.gt(&rc));
    }

    #[test]
    fn prerelease_counters_compare_numerically() {
        let two = Version::parse("1.0.0-rc.2").unwrap();
        let ten = Version::parse("1.0.0-rc.10").unwrap();
        assert!(ten.gt(&two));
    }

    #[test]
    fn numeric_identifiers_sort_below_alphanumeric() {
        let numeric = Version::parse("1.0.0-1").unwrap();
        let alpha = Version::parse("1.0.0-alpha").unwrap();
        assert!(alpha.gt(&numeric));
    }

    #[test]
    fn longer_prerelease_outranks_prefix() {
        let short = Version::parse("1.0.0-alpha").unwrap();
        let long = Version::parse("1.0.0-alpha.1").unwrap();
        assert!(long.gt(&short));
    }

    #[test]
    fn build_metadata_excluded_from_precedence() {
        let a = Version::parse("1.2.3+one").unwrap();
        let b = Version::parse("1.2.3+two").unwrap();
        assert_eq!(a.precedence(&b), Ordering::Equal);
        assert!(a.gte(&b));
        assert_ne!(a, b);
    }

    #[test]
    fn default_is_zero() {
        assert_eq!(Version::default(), Version::new(0, 0, 0));
        assert_eq!(Version::default().to_string(), "0.0.0");
    }
}
