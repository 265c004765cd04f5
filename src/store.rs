//! Artifact Store
//!
//! Writes compiled artifacts to the composites directory, one file per model,
//! wrapped in a versioned and checksummed envelope, and reads them back.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::checksum::Checksum;
use crate::compiler::CompiledArtifact;
use crate::error::{ComposeError, Result};
use crate::version::FormatVersion;

/// File name of the merged index inside the composites directory
pub const INDEX_FILE: &str = "index.json";

/// Whether a model's artifact file would collide with the merged index.
/// Compared case-insensitively for case-folding file systems.
pub fn is_reserved_model_name(model: &str) -> bool {
    INDEX_FILE
        .strip_suffix(".json")
        .is_some_and(|stem| stem.eq_ignore_ascii_case(model))
}

/// On-disk envelope around a compiled artifact
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EncodedArtifact {
    pub format: FormatVersion,
    pub compiled_at: DateTime<Utc>,
    /// SHA256 of the compact JSON of `artifact`
    pub checksum: Checksum,
    pub artifact: CompiledArtifact,
}

impl EncodedArtifact {
    pub fn new(artifact: CompiledArtifact) -> Result<Self> {
        let checksum = Checksum::from_json(&artifact)?;
        Ok(Self {
            format: FormatVersion::current(),
            compiled_at: Utc::now(),
            checksum,
            artifact,
        })
    }

    pub fn verify_checksum(&self) -> bool {
        self.checksum.verify_json(&self.artifact)
    }
}

/// Directory holding one encoded artifact per model
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    root: PathBuf,
}

impl ArtifactStore {
    /// Open the store, creating the directory if needed
    pub fn open(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path an artifact for `model` is written to
    pub fn path_for(&self, model: &str) -> PathBuf {
        self.root.join(format!("{}.json", model))
    }

    pub fn index_path(&self) -> PathBuf {
        self.root.join(INDEX_FILE)
    }

    /// Write an artifact, returning its location
    pub fn write(&self, artifact: &CompiledArtifact) -> Result<PathBuf> {
        let path = self.path_for(&artifact.name);
        if is_reserved_model_name(&artifact.name) {
            return Err(ComposeError::Artifact {
                path,
                message: "model name collides with the merged index".to_string(),
            });
        }
        let encoded = EncodedArtifact::new(artifact.clone())?;
        fs::write(&path, serde_json::to_string_pretty(&encoded)?)?;
        info!(model = %artifact.name, path = %path.display(), "wrote composite");
        Ok(path)
    }
}

/// Read an encoded artifact, checking its format and checksum
pub fn read_artifact(path: impl AsRef<Path>) -> Result<CompiledArtifact> {
    let path = path.as_ref();
    let content = fs::read_to_string(path)?;
    let encoded: EncodedArtifact = serde_json::from_str(&content)?;

    let reader = FormatVersion::current();
    if !encoded.format.is_readable_by(&reader) {
        return Err(ComposeError::Artifact {
            path: path.to_path_buf(),
            message: format!("format {} cannot be read by {}", encoded.format, reader),
        });
    }
    if !encoded.verify_checksum() {
        return Err(ComposeError::Artifact {
            path: path.to_path_buf(),
            message: "checksum mismatch".to_string(),
        });
    }

    Ok(encoded.artifact)
}
