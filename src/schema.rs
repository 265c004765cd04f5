//! Schema files and the type definitions extracted from them

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::parser::{ObjectType, Span};

/// Directive marking an object type as a deployable model
pub const MODEL_DIRECTIVE: &str = "createModel";

/// A schema source file. Immutable once read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaFile {
    /// Path identifying the file
    pub path: PathBuf,
    /// Raw schema source text
    pub content: String,
}

impl SchemaFile {
    /// Create a schema file from in-memory content
    pub fn new(path: impl Into<PathBuf>, content: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            content: content.into(),
        }
    }

    /// Read a schema file from disk
    pub fn read(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;
        Ok(Self::new(path, content))
    }

    /// File name for log output
    pub fn display_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string())
    }
}

/// Classification of an object type found in a schema file
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeDefinition {
    /// Shared type without directives, inlined ahead of every later model
    Embed(EmbedFragment),
    /// Deployable model carrying the model-creation directive
    Model(ModelDraft),
}

impl TypeDefinition {
    /// Classify an object type. Types whose directives are neither empty nor
    /// led by the model-creation directive (e.g. `@loadModel` stubs) are not
    /// collected.
    pub fn classify(object: &ObjectType, file: &SchemaFile) -> Option<Self> {
        let directives = object.directive_names();
        match directives.first() {
            None => Some(TypeDefinition::Embed(EmbedFragment {
                name: object.name.clone(),
                text: object.span.slice(&file.content).to_string(),
                origin: file.path.clone(),
            })),
            Some(&MODEL_DIRECTIVE) => Some(TypeDefinition::Model(ModelDraft {
                name: object.name.clone(),
                directives: directives.iter().map(|d| d.to_string()).collect(),
                span: object.span,
            })),
            Some(_) => None,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            TypeDefinition::Embed(embed) => &embed.name,
            TypeDefinition::Model(model) => &model.name,
        }
    }
}

/// Verbatim source of a directive-less object type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmbedFragment {
    pub name: String,
    /// Exact source slice, from the start to the end of the definition
    pub text: String,
    /// File the fragment was declared in
    pub origin: PathBuf,
}

/// A model awaiting compilation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelDraft {
    pub name: String,
    /// Directive names in source order; the first is always the model directive
    pub directives: Vec<String>,
    pub span: Span,
}
