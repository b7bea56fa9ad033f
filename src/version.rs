//! Four-component version numbers.
//!
//! Library file versions and manifest API versions are dotted numbers with
//! two to four components (`major.minor[.build[.revision]]`). Omitted
//! components sort below an explicit zero, so `1.2` < `1.2.0`.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// A dotted version number with up to four components.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Version {
    pub major: u32,
    pub minor: u32,
    pub build: Option<u32>,
    pub revision: Option<u32>,
}

impl Version {
    /// The zero version (`0.0`), used in place of an unknown version.
    pub const ZERO: Version = Version::new(0, 0);

    /// Create a two-component version.
    pub const fn new(major: u32, minor: u32) -> Self {
        Self {
            major,
            minor,
            build: None,
            revision: None,
        }
    }

    /// Create a full four-component version.
    pub const fn full(major: u32, minor: u32, build: u32, revision: u32) -> Self {
        Self {
            major,
            minor,
            build: Some(build),
            revision: Some(revision),
        }
    }

    /// Parse a version string, returning `None` when it is not a plain
    /// dotted number with two to four components.
    pub fn parse(s: &str) -> Option<Self> {
        let parts: Vec<&str> = s.trim().split('.').collect();
        if parts.len() < 2 || parts.len() > 4 {
            return None;
        }

        let mut nums = Vec::with_capacity(parts.len());
        for part in parts {
            let part = part.trim();
            if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
                return None;
            }
            nums.push(part.parse::<u32>().ok()?);
        }

        Some(Self {
            major: nums[0],
            minor: nums[1],
            build: nums.get(2).copied(),
            revision: nums.get(3).copied(),
        })
    }

    /// Parse an optional version string.
    pub fn parse_opt(s: Option<&str>) -> Option<Self> {
        s.and_then(Self::parse)
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        self.major
            .cmp(&other.major)
            .then(self.minor.cmp(&other.minor))
            .then(self.build.cmp(&other.build))
            .then(self.revision.cmp(&other.revision))
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)?;
        if let Some(build) = self.build {
            write!(f, ".{}", build)?;
            if let Some(revision) = self.revision {
                write!(f, ".{}", revision)?;
            }
        }
        Ok(())
    }
}

impl FromStr for Version {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("invalid version: {}", s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_two_to_four_components() {
        assert_eq!(Version::parse("1.2"), Some(Version::new(1, 2)));
        assert_eq!(
            Version::parse("1.2.3"),
            Some(Version {
                major: 1,
                minor: 2,
                build: Some(3),
                revision: None
            })
        );
        assert_eq!(Version::parse("1.2.3.4"), Some(Version::full(1, 2, 3, 4)));
    }

    #[test]
    fn rejects_malformed_strings() {
        assert_eq!(Version::parse(""), None);
        assert_eq!(Version::parse("1"), None);
        assert_eq!(Version::parse("1.2.3.4.5"), None);
        assert_eq!(Version::parse("1.x"), None);
        assert_eq!(Version::parse("1..2"), None);
        assert_eq!(Version::parse("-1.2"), None);
        assert_eq!(Version::parse("1.2.3 (build)"), None);
    }

    #[test]
    fn trims_surrounding_whitespace() {
        assert_eq!(Version::parse("  1.0.0.0 "), Some(Version::full(1, 0, 0, 0)));
    }

    #[test]
    fn ordering_is_component_wise() {
        assert!(Version::full(1, 2, 2, 0) > Version::full(1, 2, 1, 0));
        assert!(Version::full(1, 2, 3, 0) > Version::full(1, 2, 2, 0));
        assert!(Version::full(2, 0, 0, 0) > Version::full(1, 99, 99, 99));
    }

    #[test]
    fn omitted_components_sort_below_zero() {
        let short = Version::parse("1.2").unwrap();
        let long = Version::parse("1.2.0").unwrap();
        assert!(short < long);
    }

    #[test]
    fn zero_is_lowest_real_version() {
        assert!(Version::ZERO < Version::parse("0.0.1").unwrap());
        assert!(Version::ZERO < Version::full(1, 1, 0, 0));
    }

    #[test]
    fn display_preserves_component_count() {
        assert_eq!(Version::parse("1.3.204").unwrap().to_string(), "1.3.204");
        assert_eq!(Version::full(1, 2, 2, 0).to_string(), "1.2.2.0");
        assert_eq!(Version::new(0, 0).to_string(), "0.0");
    }

    #[test]
    fn from_str_reports_invalid_input() {
        assert!("abc".parse::<Version>().is_err());
        assert_eq!("1.2".parse::<Version>(), Ok(Version::new(1, 2)));
    }
}
