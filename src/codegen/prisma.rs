//! Relational schema emitter
//!
//! Renders a [`RelationGraph`] as a Prisma schema: one `<Model>Stream` table
//! per model, keyed by stream id and mapped to the model's identifier.

use std::fmt::Write as _;

use crate::config::RelationalConfig;
use crate::relations::{Declaration, RelationDeclaration, RelationGraph, RelationKind, IDENTITY_COLUMN};

/// Table name of a model in the relational schema
pub fn table_name(model: &str) -> String {
    format!("{}Stream", model)
}

/// Render the complete schema file
pub fn render_schema(graph: &RelationGraph, config: &RelationalConfig) -> String {
    let mut out = render_header(config);
    for (model, table) in &graph.models {
        let _ = writeln!(out);
        let _ = writeln!(out, "model {} {{", table_name(model));
        for declaration in &table.declarations {
            for line in declaration_lines(declaration) {
                let _ = writeln!(out, "  {}", line);
            }
        }
        let _ = writeln!(out, "  @@map(\"{}\")", table.table);
        let _ = writeln!(out, "}}");
    }
    out
}

fn render_header(config: &RelationalConfig) -> String {
    let features = config
        .preview_features
        .iter()
        .map(|f| format!("\"{}\"", f))
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "generator client {{\n  provider        = \"prisma-client-js\"\n  previewFeatures = [{}]\n}}\n\n\
         datasource db {{\n  provider     = \"{}\"\n  url          = env(\"{}\")\n  relationMode = \"prisma\"\n}}\n",
        features, config.provider, config.url_env
    )
}

fn declaration_lines(declaration: &Declaration) -> Vec<String> {
    match declaration {
        Declaration::Identity { column } => vec![format!("{} String @id", column)],
        Declaration::Relation(relation) => relation_lines(relation),
    }
}

fn relation_lines(relation: &RelationDeclaration) -> Vec<String> {
    let target = table_name(&relation.target);
    match &relation.kind {
        RelationKind::Connection => vec![format!(
            "{} {}[] @relation(\"{}\")",
            relation.field, target, relation.label
        )],
        RelationKind::Inverse => vec![format!(
            "{} {}[] @relation(name: \"{}\")",
            relation.field, target, relation.label
        )],
        RelationKind::ForeignKey { column, constraint } => vec![
            format!(
                "{} {}? @relation(name: \"{}\", fields: [{}], references: [{}], map: \"{}\")",
                relation.field, target, relation.label, column, IDENTITY_COLUMN, constraint
            ),
            format!("{} String", column),
        ],
    }
}
