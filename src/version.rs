//! Encoded artifact format versioning

use semver::Version;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Format version written by this crate
pub const CURRENT_FORMAT: &str = "1.0.0";

/// Version of the encoded artifact envelope
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FormatVersion {
    pub version: Version,
}

impl FormatVersion {
    pub fn new(version: Version) -> Self {
        Self { version }
    }

    /// The format this crate writes
    pub fn current() -> Self {
        Self::new(Version::new(1, 0, 0))
    }

    /// Create from a version string, with or without a leading `v`
    pub fn parse(version_str: &str) -> Result<Self, semver::Error> {
        let version_str = version_str.strip_prefix('v').unwrap_or(version_str);
        Ok(Self::new(Version::parse(version_str)?))
    }

    /// Artifacts are readable when the major versions agree
    pub fn is_readable_by(&self, reader: &FormatVersion) -> bool {
        self.version.major == reader.version.major
    }
}

impl Default for FormatVersion {
    fn default() -> Self {
        Self::current()
    }
}

impl fmt::Display for FormatVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.version)
    }
}
