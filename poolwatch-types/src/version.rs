//! Record format versions.

use std::fmt;
use std::str::FromStr;

use crate::SCHEMA_VERSION;

/// Format version stamped on snapshots and on every persisted point line.
///
/// Serializes as `"major.minor"`. Readers accept any minor version of their
/// own major and skip everything else.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(into = "String", try_from = "String"))]
pub struct SchemaVersion {
    pub major: u32,
    pub minor: u32,
}

impl SchemaVersion {
    pub const fn new(major: u32, minor: u32) -> Self {
        Self { major, minor }
    }

    /// The version this build writes.
    pub const fn current() -> Self {
        Self::new(SCHEMA_VERSION, 0)
    }

    /// Whether this build can read records of this version.
    pub fn is_compatible(&self) -> bool {
        self.major == SCHEMA_VERSION
    }
}

impl Default for SchemaVersion {
    fn default() -> Self {
        Self::current()
    }
}

impl fmt::Display for SchemaVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

impl FromStr for SchemaVersion {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (major, minor) = s.split_once('.').unwrap_or((s, "0"));
        let parse = |part: &str| {
            part.trim()
                .parse::<u32>()
                .map_err(|_| format!("invalid schema version {:?}", s))
        };
        Ok(Self::new(parse(major)?, parse(minor)?))
    }
}

impl From<SchemaVersion> for String {
    fn from(version: SchemaVersion) -> Self {
        version.to_string()
    }
}

impl TryFrom<String> for SchemaVersion {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compatibility_follows_major() {
        assert!(SchemaVersion::current().is_compatible());
        assert!(SchemaVersion::new(SCHEMA_VERSION, 7).is_compatible());
        assert!(!SchemaVersion::new(SCHEMA_VERSION + 1, 0).is_compatible());
    }

    #[test]
    fn parses_dotted_and_bare_major() {
        assert_eq!("1.4".parse::<SchemaVersion>(), Ok(SchemaVersion::new(1, 4)));
        assert_eq!("2".parse::<SchemaVersion>(), Ok(SchemaVersion::new(2, 0)));
        assert!("one".parse::<SchemaVersion>().is_err());
        assert_eq!(SchemaVersion::new(1, 2).to_string(), "1.2");
    }

    #[cfg(feature = "serde")]
    #[test]
    fn serializes_as_string() {
        let json = serde_json::to_string(&SchemaVersion::new(1, 3)).unwrap();
        assert_eq!(json, "\"1.3\"");
        let back: SchemaVersion = serde_json::from_str("\"1.3\"").unwrap();
        assert_eq!(back, SchemaVersion::new(1, 3));
    }
}
