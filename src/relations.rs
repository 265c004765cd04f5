//! Relation Graph Extractor
//!
//! Recovers relationship declarations from the relation views in a merged
//! definition and synthesizes the reciprocal side of single-document links,
//! producing one declaration list per model for the relational mirror.
//!
//! Naming:
//! - A relation label is `<declaring model>_<property>`, lower-cased
//!   (`Comment.post` over `postID` is `comment_postid`). The foreign key and
//!   its synthesized inverse share it; nothing else does. When the label is
//!   already taken (a connection on a model that also links through the same
//!   property), the lower-cased field name is appended.
//! - Document links claim labels before connections.
//! - Foreign-key columns keep the raw property (`custom_<property>`) because
//!   they name physical columns; the constraint map is `<field>-<property>`.

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::compiler::RelationSource;
use crate::error::{ComposeError, Result};
use crate::merge::MergedDefinition;

/// Primary key column of every mirror table
pub const IDENTITY_COLUMN: &str = "stream_id";

/// Prefix of foreign-key columns holding a related stream id
pub const FOREIGN_KEY_PREFIX: &str = "custom_";

/// One declaration on a mirror table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Declaration {
    /// The model's own stream id, primary key of its table
    Identity { column: String },
    /// A navigable relation to another model
    Relation(RelationDeclaration),
}

impl Declaration {
    pub fn as_relation(&self) -> Option<&RelationDeclaration> {
        match self {
            Declaration::Relation(relation) => Some(relation),
            Declaration::Identity { .. } => None,
        }
    }

    fn field_name(&self) -> &str {
        match self {
            Declaration::Identity { column } => column,
            Declaration::Relation(relation) => &relation.field,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationDeclaration {
    /// Field name on the declaring model
    pub field: String,
    /// Related model name
    pub target: String,
    /// Label pairing a foreign key with its inverse
    pub label: String,
    pub kind: RelationKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationKind {
    /// Nullable single link backed by a foreign-key column
    ForeignKey { column: String, constraint: String },
    /// Synthesized list side of a single-document link
    Inverse,
    /// List of related documents declared by a connection view
    Connection,
}

/// Declarations of one mirror table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableRelations {
    /// Stable identifier the table is mapped to
    pub table: String,
    pub declarations: Vec<Declaration>,
}

impl TableRelations {
    fn new(table: String) -> Self {
        Self {
            table,
            declarations: vec![Declaration::Identity {
                column: IDENTITY_COLUMN.to_string(),
            }],
        }
    }

    pub fn relations(&self) -> impl Iterator<Item = &RelationDeclaration> {
        self.declarations.iter().filter_map(Declaration::as_relation)
    }

    fn has_field(&self, name: &str) -> bool {
        self.declarations.iter().any(|d| d.field_name() == name)
            || self.relations().any(|r| match &r.kind {
                RelationKind::ForeignKey { column, .. } => column == name,
                _ => false,
            })
    }
}

/// Model name → mirror table declarations
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationGraph {
    pub models: BTreeMap<String, TableRelations>,
}

impl RelationGraph {
    pub fn get(&self, model: &str) -> Option<&TableRelations> {
        self.models.get(model)
    }

    /// All relation declarations carrying `label`, with their owning model
    pub fn with_label<'a>(&'a self, label: &'a str) -> impl Iterator<Item = (&'a str, &'a RelationDeclaration)> {
        self.models.iter().flat_map(move |(model, table)| {
            table
                .relations()
                .filter(move |r| r.label == label)
                .map(move |r| (model.as_str(), r))
        })
    }
}

/// Label of a relation declared on `model` through `property`
pub fn relation_label(model: &str, property: &str) -> String {
    format!("{}_{}", model.to_lowercase(), property.to_lowercase())
}

/// Name of the foreign-key column for a relation property
pub fn foreign_key_column(property: &str) -> String {
    format!("{}{}", FOREIGN_KEY_PREFIX, property)
}

/// A relation view that takes part in the mirror
struct Link<'a> {
    model: &'a str,
    field: &'a str,
    target: String,
    property: &'a str,
    source: RelationSource,
}

/// Walk every relation view in `definition` and build the relation graph
pub fn extract(definition: &MergedDefinition) -> Result<RelationGraph> {
    let mut graph = RelationGraph::default();
    for (name, model) in &definition.models {
        graph
            .models
            .insert(name.clone(), TableRelations::new(model.id.clone()));
    }

    let mut links = Vec::new();
    for (name, model) in &definition.models {
        for (field, meta) in &model.fields {
            if !meta.is_relation_view() {
                continue;
            }
            let Some(relation) = &meta.relation else {
                continue;
            };
            let target = definition
                .model_name_for_id(&relation.model)
                .ok_or_else(|| ComposeError::DanglingRelation {
                    model: name.clone(),
                    field: field.clone(),
                    target: relation.model.clone(),
                })?
                .to_string();
            links.push(Link {
                model: name,
                field,
                target,
                property: &relation.property,
                source: relation.source,
            });
        }
    }

    let mut labels = HashSet::new();
    let mut inverses = Vec::new();
    for link in links.iter().filter(|l| l.source == RelationSource::Document) {
        let label = claim_label(&mut labels, link);
        debug!(model = %link.model, field = %link.field, target = %link.target, label = %label, "document relation");
        push(&mut graph, link.model, RelationDeclaration {
            field: link.field.to_string(),
            target: link.target.clone(),
            label: label.clone(),
            kind: RelationKind::ForeignKey {
                column: foreign_key_column(link.property),
                constraint: format!("{}-{}", link.field, link.property),
            },
        });
        inverses.push((link, label));
    }

    for link in links.iter().filter(|l| l.source == RelationSource::QueryConnection) {
        let label = claim_label(&mut labels, link);
        debug!(model = %link.model, field = %link.field, target = %link.target, label = %label, "connection relation");
        push(&mut graph, link.model, RelationDeclaration {
            field: link.field.to_string(),
            target: link.target.clone(),
            label,
            kind: RelationKind::Connection,
        });
    }

    // Inverses go last so their names see every declared field
    for (link, label) in inverses {
        let field = inverse_field_name(&graph, link);
        debug!(model = %link.target, field = %field, "synthesized inverse relation");
        push(&mut graph, &link.target, RelationDeclaration {
            field,
            target: link.model.to_string(),
            label,
            kind: RelationKind::Inverse,
        });
    }

    Ok(graph)
}

fn claim_label(used: &mut HashSet<String>, link: &Link) -> String {
    let base = relation_label(link.model, link.property);
    let label = if used.contains(&base) {
        format!("{}_{}", base, link.field.to_lowercase())
    } else {
        base
    };
    used.insert(label.clone());
    label
}

fn push(graph: &mut RelationGraph, model: &str, declaration: RelationDeclaration) {
    if let Some(table) = graph.models.get_mut(model) {
        table.declarations.push(Declaration::Relation(declaration));
    }
}

/// `<model>s` on the target, suffixed with the property when already taken
fn inverse_field_name(graph: &RelationGraph, link: &Link) -> String {
    let base = format!("{}s", link.model.to_lowercase());
    match graph.get(&link.target) {
        Some(table) if table.has_field(&base) => format!("{}_{}", base, link.property.to_lowercase()),
        _ => base,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::{FieldKind, FieldMeta, ModelDefinition, RelationDescriptor, ViewKind};

    fn relation(source: RelationSource, model: &str, property: &str) -> FieldMeta {
        FieldMeta {
            kind: FieldKind::View,
            type_name: "X".to_string(),
            required: false,
            view_type: Some(ViewKind::Relation),
            relation: Some(RelationDescriptor {
                source,
                model: model.to_string(),
                property: property.to_string(),
            }),
        }
    }

    fn definition(models: Vec<(&str, &str, Vec<(&str, FieldMeta)>)>) -> MergedDefinition {
        let mut merged = MergedDefinition::new();
        for (name, id, fields) in models {
            merged.models.insert(
                name.to_string(),
                ModelDefinition {
                    id: id.to_string(),
                    fields: fields
                        .into_iter()
                        .map(|(f, m)| (f.to_string(), m))
                        .collect(),
                },
            );
        }
        merged
    }

    #[test]
    fn test_every_model_gets_identity_column() {
        let graph = extract(&definition(vec![("Author", "kjz-a", vec![])])).unwrap();
        let author = graph.get("Author").unwrap();
        assert_eq!(author.table, "kjz-a");
        assert_eq!(
            author.declarations,
            vec![Declaration::Identity {
                column: "stream_id".to_string()
            }]
        );
    }

    #[test]
    fn test_document_relation_synthesizes_inverse() {
        let graph = extract(&definition(vec![
            ("Author", "kjz-a", vec![]),
            ("Post", "kjz-p", vec![("author", relation(RelationSource::Document, "kjz-a", "authorID"))]),
        ]))
        .unwrap();

        let sides: Vec<_> = graph.with_label("post_authorid").collect();
        assert_eq!(sides.len(), 2);

        let post = graph.get("Post").unwrap().relations().next().unwrap();
        assert_eq!(post.field, "author");
        assert_eq!(post.target, "Author");
        assert_eq!(
            post.kind,
            RelationKind::ForeignKey {
                column: "custom_authorID".to_string(),
                constraint: "author-authorID".to_string(),
            }
        );

        let author = graph.get("Author").unwrap().relations().next().unwrap();
        assert_eq!(author.field, "posts");
        assert_eq!(author.target, "Post");
        assert_eq!(author.kind, RelationKind::Inverse);
    }

    #[test]
    fn test_connection_has_no_inverse() {
        let graph = extract(&definition(vec![
            ("Author", "kjz-a", vec![("posts", relation(RelationSource::QueryConnection, "kjz-p", "authorID"))]),
            ("Post", "kjz-p", vec![]),
        ]))
        .unwrap();

        let sides: Vec<_> = graph.with_label("author_authorid").collect();
        assert_eq!(sides.len(), 1);
        assert_eq!(sides[0].0, "Author");
        assert_eq!(sides[0].1.kind, RelationKind::Connection);
        assert_eq!(graph.get("Post").unwrap().relations().count(), 0);
    }

    #[test]
    fn test_count_views_are_ignored() {
        let graph = extract(&definition(vec![
            ("Author", "kjz-a", vec![("postCount", relation(RelationSource::QueryCount, "kjz-p", "authorID"))]),
            ("Post", "kjz-p", vec![]),
        ]))
        .unwrap();
        assert_eq!(graph.get("Author").unwrap().relations().count(), 0);
    }

    #[test]
    fn test_dangling_relation_fails() {
        let result = extract(&definition(vec![(
            "Post",
            "kjz-p",
            vec![("author", relation(RelationSource::Document, "kjz-elsewhere", "authorID"))],
        )]));
        match result {
            Err(ComposeError::DanglingRelation { model, field, target }) => {
                assert_eq!(model, "Post");
                assert_eq!(field, "author");
                assert_eq!(target, "kjz-elsewhere");
            }
            other => panic!("Expected dangling relation, got {:?}", other),
        }
    }

    #[test]
    fn test_inverse_names_are_disambiguated() {
        let graph = extract(&definition(vec![
            ("Author", "kjz-a", vec![]),
            (
                "Post",
                "kjz-p",
                vec![
                    ("author", relation(RelationSource::Document, "kjz-a", "authorID")),
                    ("editor", relation(RelationSource::Document, "kjz-a", "editorID")),
                ],
            ),
        ]))
        .unwrap();
        let fields: Vec<_> = graph
            .get("Author")
            .unwrap()
            .relations()
            .map(|r| r.field.as_str())
            .collect();
        assert_eq!(fields, vec!["posts", "posts_editorid"]);
    }

    #[test]
    fn test_inverse_avoids_connection_field() {
        let graph = extract(&definition(vec![
            ("Author", "kjz-a", vec![("posts", relation(RelationSource::QueryConnection, "kjz-p", "authorID"))]),
            ("Post", "kjz-p", vec![("author", relation(RelationSource::Document, "kjz-a", "authorID"))]),
        ]))
        .unwrap();
        let fields: Vec<_> = graph
            .get("Author")
            .unwrap()
            .relations()
            .map(|r| r.field.as_str())
            .collect();
        assert_eq!(fields, vec!["posts", "posts_authorid"]);
    }

    #[test]
    fn test_links_through_same_property_get_distinct_labels() {
        let graph = extract(&definition(vec![
            ("Post", "kjz-p", vec![]),
            ("Comment", "kjz-c", vec![("post", relation(RelationSource::Document, "kjz-p", "postID"))]),
            (
                "Discussion",
                "kjz-d",
                vec![
                    ("post", relation(RelationSource::Document, "kjz-p", "postID")),
                    ("comments", relation(RelationSource::QueryConnection, "kjz-c", "postID")),
                ],
            ),
        ]))
        .unwrap();

        for label in ["comment_postid", "discussion_postid"] {
            let sides: Vec<_> = graph.with_label(label).collect();
            assert_eq!(sides.len(), 2, "label {}", label);
            assert!(sides.iter().any(|(_, r)| matches!(r.kind, RelationKind::ForeignKey { .. })));
            assert!(sides.iter().any(|(model, r)| *model == "Post" && r.kind == RelationKind::Inverse));
        }

        let connection: Vec<_> = graph.with_label("discussion_postid_comments").collect();
        assert_eq!(connection.len(), 1);
        assert_eq!(connection[0].1.kind, RelationKind::Connection);

        let labels: Vec<_> = graph
            .models
            .values()
            .flat_map(|t| t.relations())
            .map(|r| r.label.as_str())
            .collect();
        assert_eq!(labels.len(), 5);
    }

    #[test]
    fn test_self_relation() {
        let graph = extract(&definition(vec![(
            "Comment",
            "kjz-c",
            vec![("parent", relation(RelationSource::Document, "kjz-c", "parentID"))],
        )]))
        .unwrap();
        let kinds: Vec<_> = graph
            .get("Comment")
            .unwrap()
            .relations()
            .map(|r| r.kind.clone())
            .collect();
        assert_eq!(kinds.len(), 2);
        assert_eq!(kinds[1], RelationKind::Inverse);
    }

    #[test]
    fn test_extraction_is_deterministic() {
        let def = definition(vec![
            ("Author", "kjz-a", vec![]),
            ("Post", "kjz-p", vec![("author", relation(RelationSource::Document, "kjz-a", "authorID"))]),
        ]);
        assert_eq!(extract(&def).unwrap(), extract(&def).unwrap());
    }
}
