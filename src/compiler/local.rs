//! Offline compiler
//!
//! Compiles schema text without a remote node: models get content-derived
//! stream identifiers and field metadata is read from the relation and view
//! directives on each field.

use std::collections::{BTreeMap, HashMap, HashSet};

use tracing::{debug, warn};

use super::{
    Composite, CompilerError, CompositeCompiler, FieldKind, FieldMeta, ModelDefinition,
    RelationDescriptor, RelationSource, ViewKind,
};
use crate::checksum::{model_stream_id, STREAM_ID_PREFIX};
use crate::merge::MergedDefinition;
use crate::parser::{
    parse_document, Definition, Directive, Document, FieldDefinition, ObjectType,
};
use crate::schema::MODEL_DIRECTIVE;

const LOAD_DIRECTIVE: &str = "loadModel";
const RELATION_DOCUMENT: &str = "relationDocument";
const RELATION_FROM: &str = "relationFrom";
const RELATION_COUNT_FROM: &str = "relationCountFrom";
const DOCUMENT_ACCOUNT: &str = "documentAccount";
const DOCUMENT_VERSION: &str = "documentVersion";

/// Scalars every schema can use without declaring them
const BUILTIN_SCALARS: &[&str] = &[
    "Boolean",
    "CommitID",
    "CountryCode",
    "Date",
    "DateTime",
    "DID",
    "Duration",
    "Float",
    "GitCommitHash",
    "ID",
    "Int",
    "InterPlanetaryCID",
    "Latitude",
    "LocalDate",
    "LocalTime",
    "Longitude",
    "StreamID",
    "String",
    "Time",
    "URI",
];

/// Compiler that runs entirely in-process
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalCompiler;

impl LocalCompiler {
    pub fn new() -> Self {
        Self
    }
}

impl CompositeCompiler for LocalCompiler {
    fn compile(&self, schema: &str, index: bool) -> Result<Composite, CompilerError> {
        let document = parse_document(schema)?;
        ensure_unique_types(&document)?;
        let ids = model_ids(&document, schema);

        let mut models = BTreeMap::new();
        for object in document.object_types() {
            if object.directive_names().first() != Some(&MODEL_DIRECTIVE) {
                continue;
            }
            let id = ids
                .get(object.name.as_str())
                .cloned()
                .ok_or_else(|| CompilerError::ModelNotFound(object.name.clone()))?;
            let mut fields = BTreeMap::new();
            for field in &object.fields {
                fields.insert(field.name.clone(), field_meta(object, field, &document, &ids)?);
            }
            debug!(model = %object.name, id = %id, fields = fields.len(), "compiled model");
            models.insert(object.name.clone(), ModelDefinition { id, fields });
        }

        Ok(Composite {
            models,
            aliases: BTreeMap::new(),
            indexed: index,
        })
    }

    fn start_indexing(&self, definition: &MergedDefinition) -> Result<(), CompilerError> {
        warn!(
            models = definition.models.len(),
            "local compiler has no node to index on; skipping"
        );
        Ok(())
    }
}

fn ensure_unique_types(document: &Document) -> Result<(), CompilerError> {
    let mut seen = HashSet::new();
    for definition in &document.definitions {
        if !seen.insert(definition.name()) {
            return Err(CompilerError::DuplicateType(definition.name().to_string()));
        }
    }
    Ok(())
}

/// Identifier of every type that is a model: created here or loaded by id
fn model_ids<'a>(document: &'a Document, schema: &str) -> HashMap<&'a str, String> {
    let mut ids = HashMap::new();
    for definition in &document.definitions {
        let object = match definition {
            Definition::Object(object) | Definition::Interface(object) => object,
            _ => continue,
        };
        if object.directive_names().first() == Some(&MODEL_DIRECTIVE) {
            ids.insert(
                object.name.as_str(),
                model_stream_id(&object.name, object.span.slice(schema)),
            );
        } else if let Some(id) = object
            .directive(LOAD_DIRECTIVE)
            .and_then(|d| d.string_argument("id"))
        {
            ids.insert(object.name.as_str(), id.to_string());
        }
    }
    ids
}

fn field_meta(
    object: &ObjectType,
    field: &FieldDefinition,
    document: &Document,
    ids: &HashMap<&str, String>,
) -> Result<FieldMeta, CompilerError> {
    let mut meta = FieldMeta {
        kind: FieldKind::Scalar,
        type_name: field.ty.to_string(),
        required: field.ty.is_required(),
        view_type: None,
        relation: None,
    };

    if let Some(directive) = field.directive(RELATION_DOCUMENT) {
        let property = required_argument(object, field, RELATION_DOCUMENT, directive, "property")?;
        let target = field.ty.base_name();
        meta.kind = FieldKind::View;
        meta.view_type = Some(ViewKind::Relation);
        meta.relation = Some(RelationDescriptor {
            source: RelationSource::Document,
            model: target_id(object, field, target, ids)?,
            property: property.to_string(),
        });
        return Ok(meta);
    }

    for (name, source) in [
        (RELATION_FROM, RelationSource::QueryConnection),
        (RELATION_COUNT_FROM, RelationSource::QueryCount),
    ] {
        if let Some(directive) = field.directive(name) {
            let model = required_argument(object, field, name, directive, "model")?;
            let property = required_argument(object, field, name, directive, "property")?;
            meta.kind = FieldKind::View;
            meta.view_type = Some(ViewKind::Relation);
            meta.relation = Some(RelationDescriptor {
                source,
                model: target_id(object, field, model, ids)?,
                property: property.to_string(),
            });
            return Ok(meta);
        }
    }

    let base = field.ty.base_name();
    if !BUILTIN_SCALARS.contains(&base) && !document.definitions.iter().any(|d| d.name() == base) {
        return Err(CompilerError::UnknownType {
            model: object.name.clone(),
            field: field.name.clone(),
            type_name: base.to_string(),
        });
    }

    if field.directive(DOCUMENT_ACCOUNT).is_some() {
        meta.kind = FieldKind::View;
        meta.view_type = Some(ViewKind::DocumentAccount);
    } else if field.directive(DOCUMENT_VERSION).is_some() {
        meta.kind = FieldKind::View;
        meta.view_type = Some(ViewKind::DocumentVersion);
    } else if field.ty.is_list() {
        meta.kind = FieldKind::List;
    } else if document.object_type(base).is_some() {
        meta.kind = FieldKind::Reference;
    }

    Ok(meta)
}

fn required_argument<'a>(
    object: &ObjectType,
    field: &FieldDefinition,
    name: &str,
    directive: &'a Directive,
    argument: &str,
) -> Result<&'a str, CompilerError> {
    directive
        .string_argument(argument)
        .ok_or_else(|| CompilerError::MissingArgument {
            model: object.name.clone(),
            field: field.name.clone(),
            directive: name.to_string(),
            argument: argument.to_string(),
        })
}

/// Resolve a type name (or an already-resolved stream id) to a model id
fn target_id(
    object: &ObjectType,
    field: &FieldDefinition,
    target: &str,
    ids: &HashMap<&str, String>,
) -> Result<String, CompilerError> {
    if let Some(id) = ids.get(target) {
        return Ok(id.clone());
    }
    if target.starts_with(STREAM_ID_PREFIX) {
        return Ok(target.to_string());
    }
    Err(CompilerError::UnresolvedModel {
        model: object.name.clone(),
        field: field.name.clone(),
        target: target.to_string(),
    })
}
