use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// Prefixes stripped before validation, in order. Mirror listings and
/// interpreter banners wrap the bare triple in these.
const IGNORED_PREFIXES: [&str; 4] = ["v", "version", "python/", "Python "];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PythonVersion {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

impl PythonVersion {
    #[must_use]
    pub const fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }
}

impl Ord for PythonVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        self.major
            .cmp(&other.major)
            .then(self.minor.cmp(&other.minor))
            .then(self.patch.cmp(&other.patch))
    }
}

impl PartialOrd for PythonVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for PythonVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VersionParseError {
    #[error("version must be in X.Y.Z format, got: {input}")]
    InvalidFormat { input: String },
}

impl VersionParseError {
    fn invalid(input: &str) -> Self {
        Self::InvalidFormat {
            input: input.to_string(),
        }
    }
}

impl FromStr for PythonVersion {
    type Err = VersionParseError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let mut s = raw;
        for prefix in IGNORED_PREFIXES {
            s = s.strip_prefix(prefix).unwrap_or(s);
        }
        let s = s.trim();

        let mut parts = s.split('.');
        let (Some(major), Some(minor), Some(patch), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(VersionParseError::invalid(raw));
        };

        let component = |text: &str| -> Result<u32, VersionParseError> {
            if text.is_empty() || !text.bytes().all(|b| b.is_ascii_digit()) {
                return Err(VersionParseError::invalid(raw));
            }
            text.parse().map_err(|_| VersionParseError::invalid(raw))
        };

        Ok(PythonVersion::new(
            component(major)?,
            component(minor)?,
            component(patch)?,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_bare_triple() {
        let v: PythonVersion = "3.6.8".parse().unwrap();
        assert_eq!(v, PythonVersion::new(3, 6, 8));
    }

    #[test]
    fn parses_v_prefix() {
        let v: PythonVersion = "v3.6.8".parse().unwrap();
        assert_eq!(v, PythonVersion::new(3, 6, 8));
    }

    #[test]
    fn parses_directory_prefix() {
        let v: PythonVersion = "python/3.6.8".parse().unwrap();
        assert_eq!(v, PythonVersion::new(3, 6, 8));
    }

    #[test]
    fn parses_interpreter_banner() {
        let v: PythonVersion = "Python 2.7.16".parse().unwrap();
        assert_eq!(v, PythonVersion::new(2, 7, 16));
    }

    #[test]
    fn parses_surrounding_whitespace() {
        let v: PythonVersion = "Python 3.6.8\n".parse().unwrap();
        assert_eq!(v, PythonVersion::new(3, 6, 8));
    }

    #[test]
    fn rejects_missing_component() {
        assert!("3.6".parse::<PythonVersion>().is_err());
    }

    #[test]
    fn rejects_extra_component() {
        assert!("3.6.8.1".parse::<PythonVersion>().is_err());
    }

    #[test]
    fn rejects_non_numeric_component() {
        assert!("3.x".parse::<PythonVersion>().is_err());
        assert!("3.6.x".parse::<PythonVersion>().is_err());
    }

    #[test]
    fn rejects_surrounding_text() {
        assert!("release-3.6.8".parse::<PythonVersion>().is_err());
        assert!("3.6.8-rc1".parse::<PythonVersion>().is_err());
    }

    #[test]
    fn no_partial_version_matching() {
        assert!("3".parse::<PythonVersion>().is_err());
        assert!("3.".parse::<PythonVersion>().is_err());
        assert!("..".parse::<PythonVersion>().is_err());
    }

    #[test]
    fn ordering_is_numeric_not_lexicographic() {
        let small: PythonVersion = "1.2.3".parse().unwrap();
        let large: PythonVersion = "1.10.0".parse().unwrap();
        assert!(small < large);
    }

    #[test]
    fn ordering_by_component() {
        let a = PythonVersion::new(2, 7, 16);
        let b = PythonVersion::new(3, 0, 0);
        let c = PythonVersion::new(3, 0, 1);
        assert!(a < b);
        assert!(b < c);
    }

    #[test]
    fn display_is_bare_triple() {
        assert_eq!(PythonVersion::new(3, 6, 8).to_string(), "3.6.8");
    }

    #[test]
    fn display_round_trips_through_parse() {
        let v = PythonVersion::new(3, 10, 2);
        assert_eq!(v.to_string().parse::<PythonVersion>().unwrap(), v);
    }
}
