//! Artifact Registry
//!
//! Append-only, insertion-ordered record of every model compiled during a
//! build. Placeholder resolution reads identifiers from here, so at any point
//! it holds exactly the models compiled so far.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::compiler::CompiledArtifact;
use crate::error::{ComposeError, Result};

/// A compiled artifact and where it came from
#[derive(Debug, Clone)]
pub struct RegisteredArtifact {
    pub artifact: CompiledArtifact,
    /// Schema file that declared the model
    pub source: PathBuf,
    /// Where the encoded artifact was written, if it was persisted
    pub location: Option<PathBuf>,
}

/// Registry of compiled artifacts keyed by model name
#[derive(Debug, Clone, Default)]
pub struct ArtifactRegistry {
    entries: Vec<RegisteredArtifact>,
    by_name: HashMap<String, usize>,
}

impl ArtifactRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a compiled artifact.
    ///
    /// A model name is written at most once; a second registration is a
    /// duplicate-model error and leaves the registry untouched.
    pub fn register(&mut self, artifact: CompiledArtifact, source: PathBuf) -> Result<()> {
        self.register_at(artifact, source, None)
    }

    /// Register an artifact that was persisted at `location`
    pub fn register_at(
        &mut self,
        artifact: CompiledArtifact,
        source: PathBuf,
        location: Option<PathBuf>,
    ) -> Result<()> {
        if let Some(first) = self.source_of(&artifact.name) {
            return Err(ComposeError::DuplicateModel {
                model: artifact.name,
                first: first.to_path_buf(),
                second: source,
            });
        }
        self.by_name.insert(artifact.name.clone(), self.entries.len());
        self.entries.push(RegisteredArtifact {
            artifact,
            source,
            location,
        });
        Ok(())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&CompiledArtifact> {
        self.by_name.get(name).map(|&i| &self.entries[i].artifact)
    }

    /// Stable identifier of a compiled model
    pub fn id_of(&self, name: &str) -> Option<&str> {
        self.get(name).map(|a| a.id.as_str())
    }

    /// Schema file a model was declared in
    pub fn source_of(&self, name: &str) -> Option<&Path> {
        self.by_name
            .get(name)
            .map(|&i| self.entries[i].source.as_path())
    }

    /// Model names in compilation order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.artifact.name.as_str())
    }

    /// Artifacts in compilation order
    pub fn artifacts(&self) -> impl Iterator<Item = &CompiledArtifact> {
        self.entries.iter().map(|e| &e.artifact)
    }

    pub fn entries(&self) -> &[RegisteredArtifact] {
        &self.entries
    }

    /// Persisted artifact locations in compilation order
    pub fn locations(&self) -> Vec<PathBuf> {
        self.entries
            .iter()
            .filter_map(|e| e.location.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn artifact(name: &str, id: &str) -> CompiledArtifact {
        CompiledArtifact {
            name: name.to_string(),
            id: id.to_string(),
            fields: BTreeMap::new(),
            indexed: false,
        }
    }

    #[test]
    fn test_create_registry() {
        let registry = ArtifactRegistry::new();
        assert!(registry.is_empty());
        assert_eq!(registry.id_of("Post"), None);
    }

    #[test]
    fn test_register_preserves_order() {
        let mut registry = ArtifactRegistry::new();
        registry.register(artifact("Post", "kjz-1"), "b.graphql".into()).unwrap();
        registry.register(artifact("Author", "kjz-2"), "a.graphql".into()).unwrap();

        let names: Vec<_> = registry.names().collect();
        assert_eq!(names, vec!["Post", "Author"]);
        assert_eq!(registry.id_of("Author"), Some("kjz-2"));
        assert_eq!(registry.source_of("Post"), Some(Path::new("b.graphql")));
    }

    #[test]
    fn test_immutability() {
        let mut registry = ArtifactRegistry::new();
        registry.register(artifact("Post", "kjz-1"), "a.graphql".into()).unwrap();

        let result = registry.register(artifact("Post", "kjz-2"), "b.graphql".into());
        match result {
            Err(ComposeError::DuplicateModel { model, first, second }) => {
                assert_eq!(model, "Post");
                assert_eq!(first, PathBuf::from("a.graphql"));
                assert_eq!(second, PathBuf::from("b.graphql"));
            }
            other => panic!("Expected duplicate model, got {:?}", other),
        }
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.id_of("Post"), Some("kjz-1"));
    }

    #[test]
    fn test_locations_only_lists_persisted() {
        let mut registry = ArtifactRegistry::new();
        registry
            .register_at(artifact("A", "1"), "a.graphql".into(), Some("out/A.json".into()))
            .unwrap();
        registry.register(artifact("B", "2"), "a.graphql".into()).unwrap();
        assert_eq!(registry.locations(), vec![PathBuf::from("out/A.json")]);
    }
}
