//! Embed Collector
//!
//! Separates shared embeddable types from deployable models in a schema file.
//! Embeds accumulate across the whole build in an [`EmbedSet`] because later
//! files may rely on embeds declared earlier.

use std::collections::HashSet;

use tracing::debug;

use crate::error::{ComposeError, Result};
use crate::parser::{parse_document, Document};
use crate::schema::{EmbedFragment, ModelDraft, SchemaFile, TypeDefinition};

/// Result of scanning one schema file
#[derive(Debug, Clone)]
pub struct FileScan {
    pub document: Document,
    /// Models in declaration order
    pub models: Vec<ModelDraft>,
    /// Directive-less object types in declaration order
    pub embeds: Vec<EmbedFragment>,
}

impl FileScan {
    /// Names of every top-level definition in the file
    pub fn declared_names(&self) -> HashSet<&str> {
        self.document.definitions.iter().map(|d| d.name()).collect()
    }

    pub fn model_names(&self) -> Vec<&str> {
        self.models.iter().map(|m| m.name.as_str()).collect()
    }
}

/// Parse a file and classify its object types
pub fn scan_file(file: &SchemaFile) -> Result<FileScan> {
    let document = parse_document(&file.content).map_err(|e| ComposeError::Parse {
        file: file.path.clone(),
        message: e.to_string(),
    })?;

    let mut models = Vec::new();
    let mut embeds = Vec::new();
    for object in document.object_types() {
        match TypeDefinition::classify(object, file) {
            Some(TypeDefinition::Embed(embed)) => embeds.push(embed),
            Some(TypeDefinition::Model(model)) => models.push(model),
            None => debug!(
                file = %file.display_name(),
                type_name = %object.name,
                "skipping type with foreign directives"
            ),
        }
    }

    Ok(FileScan {
        document,
        models,
        embeds,
    })
}

/// Build-wide, ordered accumulator of embed fragments
#[derive(Debug, Clone, Default)]
pub struct EmbedSet {
    fragments: Vec<EmbedFragment>,
}

impl EmbedSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a file's embeds. Re-declaring an embed with identical text is a
    /// no-op; re-declaring it with different text is an error.
    pub fn absorb(&mut self, embeds: &[EmbedFragment]) -> Result<()> {
        for embed in embeds {
            match self.get(&embed.name) {
                Some(existing) if existing.text == embed.text => continue,
                Some(_) => {
                    return Err(ComposeError::EmbedConflict {
                        name: embed.name.clone(),
                        file: embed.origin.clone(),
                    })
                }
                None => {
                    debug!(name = %embed.name, "collected embed");
                    self.fragments.push(embed.clone());
                }
            }
        }
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&EmbedFragment> {
        self.fragments.iter().find(|f| f.name == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &EmbedFragment> {
        self.fragments.iter()
    }

    pub fn len(&self) -> usize {
        self.fragments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }

    /// Embed text to prepend to a file, skipping names the file declares itself
    pub fn prelude(&self, declared: &HashSet<&str>) -> String {
        self.fragments
            .iter()
            .filter(|f| !declared.contains(f.name.as_str()))
            .map(|f| f.text.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Scan a file, fold its embeds into the accumulator and return its models
pub fn collect(file: &SchemaFile, embeds: &mut EmbedSet) -> Result<Vec<ModelDraft>> {
    let scan = scan_file(file)?;
    embeds.absorb(&scan.embeds)?;
    Ok(scan.models)
}
