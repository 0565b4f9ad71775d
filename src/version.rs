//! Schema versioning utilities
//!
//! Versions are dotted-numeric strings ("1", "1.2", "4.1.1"). They are
//! ordered segment by segment as integers, with missing trailing segments
//! read as `0`, so "1" and "1.0" are the same version.

use std::cmp::Ordering;
use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{RegistryError, Result};

fn version_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^\d+(\.\d+)*$").expect("version pattern is valid"))
}

/// A dotted-numeric schema version
#[derive(Debug, Clone)]
pub struct SchemaVersion {
    /// The version exactly as submitted (used in schema ids)
    raw: String,
    /// Parsed numeric segments
    segments: Vec<u64>,
}

impl SchemaVersion {
    /// Parse a version string, rejecting anything that is not dotted-numeric
    pub fn parse(version_str: &str) -> Result<Self> {
        if !version_pattern().is_match(version_str) {
            return Err(RegistryError::InvalidVersion {
                version: version_str.to_string(),
            });
        }

        let segments = version_str
            .split('.')
            .map(|segment| segment.parse::<u64>())
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|_| RegistryError::InvalidVersion {
                version: version_str.to_string(),
            })?;

        Ok(Self {
            raw: version_str.to_string(),
            segments,
        })
    }

    /// Get the version string as submitted
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Get the numeric segments
    pub fn segments(&self) -> &[u64] {
        &self.segments
    }

    /// Check whether this version is strictly greater than another
    pub fn is_greater_than(&self, other: &SchemaVersion) -> bool {
        self.cmp(other) == Ordering::Greater
    }
}

/// Return the greatest version, or `None` for an empty input.
///
/// Among equal versions ("1" and "1.0") the last one wins.
pub fn latest<'a, I>(versions: I) -> Option<&'a SchemaVersion>
where
    I: IntoIterator<Item = &'a SchemaVersion>,
{
    versions.into_iter().max()
}

impl fmt::Display for SchemaVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl PartialEq for SchemaVersion {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for SchemaVersion {}

impl PartialOrd for SchemaVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for SchemaVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        let len = self.segments.len().max(other.segments.len());
        (0..len)
            .map(|i| {
                let left = self.segments.get(i).copied().unwrap_or(0);
                let right = other.segments.get(i).copied().unwrap_or(0);
                left.cmp(&right)
            })
            .find(|ordering| *ordering != Ordering::Equal)
            .unwrap_or(Ordering::Equal)
    }
}

impl std::str::FromStr for SchemaVersion {
    type Err = RegistryError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl Serialize for SchemaVersion {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.raw)
    }
}

impl<'de> Deserialize<'de> for SchemaVersion {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}
