//! Merge & Runtime Projection
//!
//! Combines individually compiled artifacts into one [`MergedDefinition`] and
//! projects it into the runtime files consumers load: the merged index, a
//! runtime definition module and a schema description.

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::compiler::{CompiledArtifact, FieldMeta, ModelDefinition, RelationSource, ViewKind};
use crate::error::{ComposeError, Result};
use crate::store::read_artifact;

/// Union of every compiled model, keyed by model name
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergedDefinition {
    pub models: BTreeMap<String, ModelDefinition>,
}

impl MergedDefinition {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one artifact; a second claim on a model name is a consistency error
    pub fn insert(&mut self, artifact: &CompiledArtifact) -> Result<()> {
        if self.models.contains_key(&artifact.name) {
            return Err(ComposeError::MergeConflict {
                model: artifact.name.clone(),
            });
        }
        self.models.insert(
            artifact.name.clone(),
            ModelDefinition {
                id: artifact.id.clone(),
                fields: artifact.fields.clone(),
            },
        );
        Ok(())
    }

    /// Reverse lookup from stream id to model name
    pub fn model_name_for_id(&self, id: &str) -> Option<&str> {
        self.models
            .iter()
            .find(|(_, model)| model.id == id)
            .map(|(name, _)| name.as_str())
    }

    pub fn model_names(&self) -> impl Iterator<Item = &str> {
        self.models.keys().map(|k| k.as_str())
    }
}

/// Merge artifacts in order
pub fn merge<'a>(artifacts: impl IntoIterator<Item = &'a CompiledArtifact>) -> Result<MergedDefinition> {
    let mut merged = MergedDefinition::new();
    for artifact in artifacts {
        merged.insert(artifact)?;
    }
    info!(models = merged.models.len(), "combined composites");
    Ok(merged)
}

/// Merge encoded artifacts previously written to disk
pub fn merge_artifact_files(paths: &[PathBuf]) -> Result<MergedDefinition> {
    let artifacts = paths
        .iter()
        .map(read_artifact)
        .collect::<Result<Vec<_>>>()?;
    merge(&artifacts)
}

/// Load a merged index written by [`write_index`]
pub fn read_index(path: impl AsRef<Path>) -> Result<MergedDefinition> {
    let content = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

/// Write the merged index as JSON
pub fn write_index(definition: &MergedDefinition, path: &Path) -> Result<()> {
    fs::write(path, serde_json::to_string_pretty(definition)?)?;
    info!(path = %path.display(), "wrote merged index");
    Ok(())
}

/// Render the runtime definition module
pub fn render_runtime_module(definition: &MergedDefinition) -> Result<String> {
    let json = serde_json::to_string_pretty(definition)?;
    Ok(format!(
        "// This is an auto-generated file, do not edit manually\nexport const definition = {}\n",
        json
    ))
}

/// Render a schema description of the merged models
pub fn render_schema_description(definition: &MergedDefinition) -> String {
    let mut out = String::new();
    for (name, model) in &definition.models {
        let _ = writeln!(out, "# id: {}", model.id);
        let _ = writeln!(out, "type {} {{", name);
        let _ = writeln!(out, "  id: ID!");
        for (field, meta) in &model.fields {
            let _ = writeln!(out, "  {}: {}{}", field, meta.type_name, view_annotation(meta, definition));
        }
        let _ = writeln!(out, "}}\n");
    }
    out
}

fn view_annotation(meta: &FieldMeta, definition: &MergedDefinition) -> String {
    match (meta.view_type, &meta.relation) {
        (Some(ViewKind::Relation), Some(relation)) => {
            let target = definition
                .model_name_for_id(&relation.model)
                .unwrap_or(relation.model.as_str());
            let source = match relation.source {
                RelationSource::Document => "document",
                RelationSource::QueryConnection => "queryConnection",
                RelationSource::QueryCount => "queryCount",
                RelationSource::Other => "other",
            };
            format!(" # {} relation to {} via {}", source, target, relation.property)
        }
        (Some(ViewKind::DocumentAccount), _) => " # document account".to_string(),
        (Some(ViewKind::DocumentVersion), _) => " # document version".to_string(),
        _ => String::new(),
    }
}

/// Write the runtime definition module and schema description
pub fn write_runtime(definition: &MergedDefinition, module_path: &Path, schema_path: &Path) -> Result<()> {
    fs::write(module_path, render_runtime_module(definition)?)?;
    fs::write(schema_path, render_schema_description(definition))?;
    info!(
        module = %module_path.display(),
        schema = %schema_path.display(),
        "wrote runtime definition"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::{FieldKind, RelationDescriptor};
    use crate::store::ArtifactStore;

    fn artifact(name: &str, id: &str) -> CompiledArtifact {
        let mut fields = BTreeMap::new();
        fields.insert(
            "title".to_string(),
            FieldMeta {
                kind: FieldKind::Scalar,
                type_name: "String!".to_string(),
                required: true,
                view_type: None,
                relation: None,
            },
        );
        CompiledArtifact {
            name: name.to_string(),
            id: id.to_string(),
            fields,
            indexed: false,
        }
    }

    #[test]
    fn test_merge_keys_by_name() {
        let merged = merge(&[artifact("Post", "kjz-post"), artifact("Author", "kjz-author")]).unwrap();
        assert_eq!(merged.model_names().collect::<Vec<_>>(), vec!["Author", "Post"]);
        assert_eq!(merged.model_name_for_id("kjz-post"), Some("Post"));
        assert_eq!(merged.model_name_for_id("kjz-missing"), None);
    }

    #[test]
    fn test_merge_conflict() {
        let result = merge(&[artifact("Post", "kjz-1"), artifact("Post", "kjz-2")]);
        assert!(matches!(
            result,
            Err(ComposeError::MergeConflict { model }) if model == "Post"
        ));
    }

    #[test]
    fn test_merge_from_disk_and_index_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::open(dir.path()).unwrap();
        let paths = vec![
            store.write(&artifact("Post", "kjz-post")).unwrap(),
            store.write(&artifact("Author", "kjz-author")).unwrap(),
        ];
        let merged = merge_artifact_files(&paths).unwrap();
        write_index(&merged, &store.index_path()).unwrap();
        assert_eq!(read_index(store.index_path()).unwrap(), merged);
    }

    #[test]
    fn test_runtime_module_exports_definition() {
        let merged = merge(&[artifact("Post", "kjz-post")]).unwrap();
        let module = render_runtime_module(&merged).unwrap();
        assert!(module.starts_with("// This is an auto-generated file"));
        assert!(module.contains("export const definition = {"));
        assert!(module.contains("\"kjz-post\""));
    }

    #[test]
    fn test_schema_description_annotates_relations() {
        let mut post = artifact("Post", "kjz-post");
        post.fields.insert(
            "author".to_string(),
            FieldMeta {
                kind: FieldKind::View,
                type_name: "Author".to_string(),
                required: false,
                view_type: Some(ViewKind::Relation),
                relation: Some(RelationDescriptor {
                    source: RelationSource::Document,
                    model: "kjz-author".to_string(),
                    property: "authorID".to_string(),
                }),
            },
        );
        let merged = merge(&[artifact("Author", "kjz-author"), post]).unwrap();
        let schema = render_schema_description(&merged);
        assert!(schema.contains("type Post {"));
        assert!(schema.contains("  author: Author # document relation to Author via authorID"));
        assert!(schema.contains("  title: String!"));
    }
}
