//! Code Generation
//!
//! Projects the merged definition and relation graph into source files for
//! consumers of the deployed models.
//!
//! Emitters:
//! - `prisma`: relational mirror schema from the [`RelationGraph`](crate::relations::RelationGraph)
//! - `mutations`: create/update mutation documents per model
//! - `client`: typed client services rendered from embedded templates
//!
//! Emitters are pure: they return [`GeneratedFile`]s or strings and never
//! touch the filesystem. [`write_files`] does the writing.

pub mod client;
pub mod mutations;
pub mod prisma;

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::Result;

/// A generated file, relative to its output directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedFile {
    pub path: PathBuf,
    pub content: String,
}

impl GeneratedFile {
    pub fn new(path: impl Into<PathBuf>, content: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            content: content.into(),
        }
    }
}

/// Write generated files under `root`, creating directories as needed
pub fn write_files(root: &Path, files: &[GeneratedFile]) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(root)?;
    let mut written = Vec::with_capacity(files.len());
    for file in files {
        let path = root.join(&file.path);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, &file.content)?;
        debug!(path = %path.display(), "wrote generated file");
        written.push(path);
    }
    Ok(written)
}

/// `PostComment` → `postComment`
pub fn lower_first(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}
