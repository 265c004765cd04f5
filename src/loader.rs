//! Schema file discovery

use std::path::Path;

use tracing::{debug, info};
use walkdir::WalkDir;

use crate::error::Result;
use crate::schema::SchemaFile;

/// Extensions read when none are configured
pub const DEFAULT_EXTENSIONS: &[&str] = &["graphql", "gql"];

/// Read every schema file directly inside `dir`, sorted by file name.
///
/// Subdirectories are not descended into. Files whose extension is not in
/// `extensions` are skipped.
pub fn discover_schema_files(dir: &Path, extensions: &[String]) -> Result<Vec<SchemaFile>> {
    let mut files = Vec::new();
    for entry in WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
    {
        let entry = entry.map_err(std::io::Error::from)?;
        let path = entry.path();
        if !entry.file_type().is_file() {
            continue;
        }
        let matches = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| extensions.iter().any(|e| e == ext))
            .unwrap_or(false);
        if !matches {
            debug!(path = %path.display(), "skipping non-schema file");
            continue;
        }
        files.push(SchemaFile::read(path)?);
    }
    info!(dir = %dir.display(), files = files.len(), "discovered schema files");
    Ok(files)
}
