//! Checksums and content-derived identifiers

use sha2::{Digest, Sha256};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Prefix shared by model stream identifiers
pub const STREAM_ID_PREFIX: &str = "kjzl6hvfrbw6c";

/// SHA256 checksum of artifact content
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Checksum(String);

impl Checksum {
    /// Compute checksum from raw bytes
    pub fn from_bytes(data: &[u8]) -> Self {
        let hash = Sha256::digest(data);
        Self(format!("{:x}", hash))
    }

    /// Compute checksum from a string
    pub fn from_text(content: &str) -> Self {
        Self::from_bytes(content.as_bytes())
    }

    /// Compute checksum from a serializable value (compact JSON)
    pub fn from_json<T: Serialize>(value: &T) -> serde_json::Result<Self> {
        let canonical = serde_json::to_string(value)?;
        Ok(Self::from_text(&canonical))
    }

    /// Get the hex string representation
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Verify that a serializable value matches this checksum
    pub fn verify_json<T: Serialize>(&self, value: &T) -> bool {
        Self::from_json(value).map(|c| c == *self).unwrap_or(false)
    }
}

impl fmt::Display for Checksum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for Checksum {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Deterministic stream identifier for a model, derived from its name and the
/// resolved text of its definition.
pub fn model_stream_id(name: &str, definition: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(name.as_bytes());
    hasher.update([0u8]);
    hasher.update(definition.as_bytes());
    let digest = format!("{:x}", hasher.finalize());
    format!("{}{}", STREAM_ID_PREFIX, &digest[..50])
}
