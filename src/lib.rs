//! Slang Composites
//!
//! Turns a directory of model schema files into compiled, cross-referencing
//! composite artifacts, a merged runtime definition and a relational mirror
//! schema describing how the models relate.
//!
//! ## Features
//!
//! - **Embeds**: directive-less object types are shared with every later model
//! - **Model references**: `${Model}` placeholders resolve to the stable id of
//!   a model compiled earlier in the build
//! - **Dependency planning**: files are ordered so referenced models compile first
//! - **Checksummed artifacts**: one versioned envelope per model on disk
//! - **Relational mirror**: document links gain a synthesized inverse side
//!
//! ## Architecture
//!
//! ```text
//! models/*.graphql
//!     │  loader::discover_schema_files
//!     ▼
//! plan::plan_build ──► build::Orchestrator ──► store::ArtifactStore
//!                         │  collect   (embeds / models)
//!                         │  resolver  (${Model} → id)
//!                         │  compiler  (CompositeCompiler)
//!                         ▼
//!                      merge ──► definition.ts, schema.graphql, index.json
//!                         │
//!                         ▼
//!                      relations ──► codegen::prisma ──► schema.prisma
//!                      codegen::{mutations, client}
//! ```

pub mod build;
pub mod checksum;
pub mod codegen;
pub mod collect;
pub mod compiler;
pub mod config;
pub mod error;
pub mod loader;
pub mod merge;
pub mod parser;
pub mod pipeline;
pub mod plan;
pub mod registry;
pub mod relations;
pub mod resolver;
pub mod schema;
pub mod store;
pub mod version;

pub use build::{BuildContext, Orchestrator};
pub use checksum::Checksum;
pub use compiler::{CompiledArtifact, CompositeCompiler, CompilerError, LocalCompiler};
pub use config::ComposerConfig;
pub use error::{ComposeError, Result};
pub use merge::MergedDefinition;
pub use pipeline::{Pipeline, PipelineReport};
pub use plan::{plan_build, BuildOrder, BuildPlan};
pub use registry::ArtifactRegistry;
pub use relations::RelationGraph;
pub use schema::{SchemaFile, TypeDefinition};
pub use version::FormatVersion;
