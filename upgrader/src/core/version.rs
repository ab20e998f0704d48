//! Installed product versions and manifest version ranges.
//!
//! A manifest carries its range bounds as raw attribute strings; parsing to a
//! typed [`VersionRange`] happens at selection time so a malformed range skips
//! only its own module instead of aborting the run.

use std::fmt;

use thiserror::Error;

/// An installed product version: `major.minor.micro` plus a build number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Version {
    pub major: i32,
    pub minor: i32,
    pub micro: i32,
    pub build: i32,
}

impl Version {
    pub fn new(major: i32, minor: i32, micro: i32, build: i32) -> Self {
        Self {
            major,
            minor,
            micro,
            build,
        }
    }

    /// Parse a release string (`major.minor` or `major.minor.micro`) and a
    /// build number into a [`Version`]. A missing micro defaults to 0.
    pub fn parse(release: &str, build: i32) -> Result<Self, VersionParseError> {
        let mut parts = release.trim().split('.');
        let major = parse_part(release, parts.next())?;
        let minor = parse_part(release, parts.next())?;
        let micro = match parts.next() {
            Some(part) => parse_part(release, Some(part))?,
            None => 0,
        };
        if parts.next().is_some() {
            return Err(VersionParseError::Malformed {
                value: release.to_string(),
            });
        }
        Ok(Self::new(major, minor, micro, build))
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{}.{}/{}",
            self.major, self.minor, self.micro, self.build
        )
    }
}

fn parse_part(release: &str, part: Option<&str>) -> Result<i32, VersionParseError> {
    let part = part.ok_or_else(|| VersionParseError::Malformed {
        value: release.to_string(),
    })?;
    part.trim()
        .parse()
        .map_err(|_| VersionParseError::Malformed {
            value: release.to_string(),
        })
}

/// A module's applicable version range, fully parsed.
///
/// `-1` on any `to_*` field means unbounded on that component.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VersionRange {
    pub from_major: i32,
    pub from_minor: i32,
    pub from_micro: i32,
    pub from_build: i32,
    pub to_major: i32,
    pub to_minor: i32,
    pub to_micro: i32,
    pub to_build: i32,
}

/// Range bounds exactly as declared in the manifest, before parsing.
///
/// `major` and `minor` are required; `micro` is a wildcard when absent
/// (0 as a lower bound, -1 as an upper bound); `build` defaults to -1.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawVersionRange {
    pub from_major: Option<String>,
    pub from_minor: Option<String>,
    pub from_micro: Option<String>,
    pub from_build: Option<String>,
    pub to_major: Option<String>,
    pub to_minor: Option<String>,
    pub to_micro: Option<String>,
    pub to_build: Option<String>,
}

impl VersionRange {
    /// Parse raw manifest bounds into a typed range.
    ///
    /// The caller (the module selector) decides the skip-with-log policy on
    /// failure; nothing here logs or aborts.
    pub fn parse(raw: &RawVersionRange) -> Result<Self, VersionParseError> {
        Ok(Self {
            from_major: required(&raw.from_major, "from", "major")?,
            from_minor: required(&raw.from_minor, "from", "minor")?,
            from_micro: optional(&raw.from_micro, "from", "micro", 0)?,
            from_build: optional(&raw.from_build, "from", "build", -1)?,
            to_major: required(&raw.to_major, "to", "major")?,
            to_minor: required(&raw.to_minor, "to", "minor")?,
            to_micro: optional(&raw.to_micro, "to", "micro", -1)?,
            to_build: optional(&raw.to_build, "to", "build", -1)?,
        })
    }
}

fn required(
    value: &Option<String>,
    bound: &'static str,
    field: &'static str,
) -> Result<i32, VersionParseError> {
    let value = value
        .as_deref()
        .ok_or(VersionParseError::Missing { bound, field })?;
    parse_field(value, bound, field)
}

fn optional(
    value: &Option<String>,
    bound: &'static str,
    field: &'static str,
    default: i32,
) -> Result<i32, VersionParseError> {
    match value.as_deref() {
        Some(value) => parse_field(value, bound, field),
        None => Ok(default),
    }
}

fn parse_field(value: &str, bound: &'static str, field: &'static str) -> Result<i32, VersionParseError> {
    value
        .trim()
        .parse()
        .map_err(|_| VersionParseError::Invalid {
            bound,
            field,
            value: value.to_string(),
        })
}

/// Typed failure for version and range parsing.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum VersionParseError {
    #[error("malformed version '{value}'")]
    Malformed { value: String },
    #[error("missing {field} on <{bound}>")]
    Missing {
        bound: &'static str,
        field: &'static str,
    },
    #[error("invalid {field} '{value}' on <{bound}>")]
    Invalid {
        bound: &'static str,
        field: &'static str,
        value: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(from: [&str; 4], to: [&str; 4]) -> RawVersionRange {
        let field = |value: &str| {
            if value.is_empty() {
                None
            } else {
                Some(value.to_string())
            }
        };
        RawVersionRange {
            from_major: field(from[0]),
            from_minor: field(from[1]),
            from_micro: field(from[2]),
            from_build: field(from[3]),
            to_major: field(to[0]),
            to_minor: field(to[1]),
            to_micro: field(to[2]),
            to_build: field(to[3]),
        }
    }

    #[test]
    fn parses_full_version() {
        let version = Version::parse("5.3.2", 100).expect("parse");
        assert_eq!(version, Version::new(5, 3, 2, 100));
    }

    #[test]
    fn missing_micro_defaults_to_zero() {
        let version = Version::parse("6.0", 1).expect("parse");
        assert_eq!(version, Version::new(6, 0, 0, 1));
    }

    #[test]
    fn rejects_extra_components() {
        let err = Version::parse("6.0.1.2", 1).expect_err("too many parts");
        assert!(err.to_string().contains("malformed"));
    }

    #[test]
    fn rejects_non_numeric_release() {
        assert!(Version::parse("6.x", 1).is_err());
        assert!(Version::parse("", 1).is_err());
    }

    #[test]
    fn range_defaults_micro_and_build() {
        let range =
            VersionRange::parse(&raw(["5", "0", "", ""], ["6", "0", "", ""])).expect("parse");
        assert_eq!(range.from_micro, 0);
        assert_eq!(range.from_build, -1);
        assert_eq!(range.to_micro, -1);
        assert_eq!(range.to_build, -1);
    }

    #[test]
    fn range_requires_major_and_minor() {
        let err = VersionRange::parse(&raw(["5", "", "", ""], ["6", "0", "", ""]))
            .expect_err("missing minor");
        assert_eq!(
            err,
            VersionParseError::Missing {
                bound: "from",
                field: "minor"
            }
        );
    }

    #[test]
    fn range_rejects_non_numeric_bound() {
        let err = VersionRange::parse(&raw(["5", "0", "", ""], ["six", "0", "", ""]))
            .expect_err("bad major");
        assert!(err.to_string().contains("invalid major 'six'"));
    }
}
