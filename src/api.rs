//! Platform API versions
//!
//! The platform and the lifecycle negotiate a `major.minor` contract
//! version. Several behaviors of the analyze phase depend on which
//! version was negotiated, so the version is parsed once up front and
//! compared through [`PlatformApi`] rather than by string inspection.

use std::fmt;

use semver::Version;

use crate::error::{CairnError, CairnResult};

/// A negotiated platform API version
///
/// Versions are written `"<major>.<minor>"` (an optional leading `v`
/// is tolerated). Ordering is numeric per component, so `"0.10"` is
/// newer than `"0.9"`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PlatformApi(Version);

impl PlatformApi {
    /// Platform API versions this crate understands, oldest first
    pub const SUPPORTED: &'static [&'static str] = &["0.3", "0.4", "0.5", "0.6", "0.7", "0.8", "0.9"];

    /// Parse a version string of the form `"<major>"` or `"<major>.<minor>"`
    pub fn parse(value: &str) -> CairnResult<Self> {
        let invalid = |reason: &str| CairnError::InvalidPlatformApi {
            value: value.to_string(),
            reason: reason.to_string(),
        };

        let trimmed = value.trim();
        let trimmed = trimmed.strip_prefix('v').unwrap_or(trimmed);
        if trimmed.is_empty() {
            return Err(invalid("empty version"));
        }

        // Patch components are not part of the contract format.
        let normalized = match trimmed.matches('.').count() {
            0 => format!("{trimmed}.0.0"),
            1 => format!("{trimmed}.0"),
            _ => return Err(invalid("expected <major>.<minor>")),
        };

        let version = Version::parse(&normalized).map_err(|err| invalid(&err.to_string()))?;
        Ok(Self(version))
    }

    pub fn major(&self) -> u64 {
        self.0.major
    }

    pub fn minor(&self) -> u64 {
        self.0.minor
    }

    /// True when this version predates `major.minor`
    pub fn less_than(&self, major: u64, minor: u64) -> bool {
        self.0 < Version::new(major, minor, 0)
    }
}

impl fmt::Display for PlatformApi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.0.major, self.0.minor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_major_minor() {
        let api = PlatformApi::parse("0.7").unwrap();
        assert_eq!(api.major(), 0);
        assert_eq!(api.minor(), 7);
        assert_eq!(api.to_string(), "0.7");
    }

    #[test]
    fn parses_bare_major_and_v_prefix() {
        assert_eq!(PlatformApi::parse("2").unwrap().to_string(), "2.0");
        assert_eq!(PlatformApi::parse("v0.9").unwrap(), PlatformApi::parse("0.9").unwrap());
    }

    #[test]
    fn rejects_malformed_versions() {
        assert!(PlatformApi::parse("").is_err());
        assert!(PlatformApi::parse("nope").is_err());
        assert!(PlatformApi::parse("0.7.1").is_err());
    }

    #[test]
    fn orders_numerically_not_lexically() {
        let old = PlatformApi::parse("0.9").unwrap();
        let new = PlatformApi::parse("0.10").unwrap();
        assert!(old < new);
        assert!(old.less_than(0, 10));
        assert!(!new.less_than(0, 10));
    }

    #[test]
    fn supported_versions_all_parse() {
        for value in PlatformApi::SUPPORTED {
            assert!(PlatformApi::parse(value).is_ok(), "{value} should parse");
        }
    }
}
