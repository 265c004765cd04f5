//! Composite Compiler Adapter
//!
//! Boundary to the service that turns self-contained, reference-resolved schema
//! text into addressable composites. The pipeline only depends on the
//! [`CompositeCompiler`] trait; [`LocalCompiler`] is the offline implementation.

pub mod local;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::merge::MergedDefinition;
use crate::parser::SyntaxError;

pub use local::LocalCompiler;

/// Errors raised by a compiler implementation
#[derive(Error, Debug)]
pub enum CompilerError {
    #[error("Invalid schema: {0}")]
    Syntax(#[from] SyntaxError),

    #[error("Type {0} is defined more than once")]
    DuplicateType(String),

    #[error("Field {model}.{field} points at {target}, which is not a model")]
    UnresolvedModel {
        model: String,
        field: String,
        target: String,
    },

    #[error("Field {model}.{field} has unknown type {type_name}")]
    UnknownType {
        model: String,
        field: String,
        type_name: String,
    },

    #[error("Directive @{directive} on {model}.{field} is missing argument {argument}")]
    MissingArgument {
        model: String,
        field: String,
        directive: String,
        argument: String,
    },

    #[error("Composite does not define model {0}")]
    ModelNotFound(String),

    #[error("Compiler rejected the schema: {0}")]
    Rejected(String),
}

/// Where a relation view reads its related documents from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RelationSource {
    /// Single document linked through a stream-id property on this model
    Document,
    /// List of documents on another model pointing back at this one
    QueryConnection,
    /// Count of documents on another model pointing back at this one
    QueryCount,
    #[serde(other)]
    Other,
}

/// Relationship metadata on a compiled relation view
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationDescriptor {
    pub source: RelationSource,
    /// Stable identifier of the related model
    pub model: String,
    /// Property holding the link, used to pair both sides of a relation
    pub property: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FieldKind {
    Scalar,
    Reference,
    List,
    View,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ViewKind {
    DocumentAccount,
    DocumentVersion,
    Relation,
}

/// Compiled metadata for one field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldMeta {
    #[serde(rename = "type")]
    pub kind: FieldKind,
    /// Schema type as written, e.g. `[String!]`
    pub type_name: String,
    #[serde(default)]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub view_type: Option<ViewKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relation: Option<RelationDescriptor>,
}

impl FieldMeta {
    pub fn is_relation_view(&self) -> bool {
        self.kind == FieldKind::View && self.view_type == Some(ViewKind::Relation)
    }
}

/// A model inside a composite
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelDefinition {
    pub id: String,
    pub fields: BTreeMap<String, FieldMeta>,
}

/// Raw compiler output; may define several models
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Composite {
    pub models: BTreeMap<String, ModelDefinition>,
    #[serde(default)]
    pub aliases: BTreeMap<String, String>,
    #[serde(default)]
    pub indexed: bool,
}

impl Composite {
    /// Attach a human-readable alias to the model of that name and project the
    /// composite down to it.
    pub fn into_artifact(mut self, name: &str) -> Result<CompiledArtifact, CompilerError> {
        let model = self
            .models
            .remove(name)
            .ok_or_else(|| CompilerError::ModelNotFound(name.to_string()))?;
        self.aliases.insert(name.to_string(), model.id.clone());
        Ok(CompiledArtifact {
            name: name.to_string(),
            id: model.id,
            fields: model.fields,
            indexed: self.indexed,
        })
    }
}

/// One compiled model, registered under its name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompiledArtifact {
    pub name: String,
    /// Stable identifier placeholders resolve to
    pub id: String,
    pub fields: BTreeMap<String, FieldMeta>,
    #[serde(default)]
    pub indexed: bool,
}

/// Contract of the external compilation service
pub trait CompositeCompiler {
    /// Compile self-contained schema text
    fn compile(&self, schema: &str, index: bool) -> Result<Composite, CompilerError>;

    /// Alias the model called `name` and return it as an artifact
    fn set_alias(&self, composite: Composite, name: &str) -> Result<CompiledArtifact, CompilerError> {
        composite.into_artifact(name)
    }

    /// Begin indexing every model of a merged definition
    fn start_indexing(&self, definition: &MergedDefinition) -> Result<(), CompilerError>;
}

impl<C: CompositeCompiler + ?Sized> CompositeCompiler for &C {
    fn compile(&self, schema: &str, index: bool) -> Result<Composite, CompilerError> {
        (**self).compile(schema, index)
    }

    fn set_alias(&self, composite: Composite, name: &str) -> Result<CompiledArtifact, CompilerError> {
        (**self).set_alias(composite, name)
    }

    fn start_indexing(&self, definition: &MergedDefinition) -> Result<(), CompilerError> {
        (**self).start_indexing(definition)
    }
}
