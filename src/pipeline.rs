//! End-to-end generation
//!
//! Discovers schema files, plans and runs the build, merges the written
//! artifacts and emits every enabled output.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::build::Orchestrator;
use crate::codegen::{self, client, mutations, prisma};
use crate::compiler::CompositeCompiler;
use crate::config::ComposerConfig;
use crate::error::{ComposeError, Result};
use crate::loader::discover_schema_files;
use crate::merge::{merge_artifact_files, write_index, write_runtime, MergedDefinition};
use crate::plan::plan_build;
use crate::relations::{self, RelationGraph};
use crate::schema::SchemaFile;
use crate::store::ArtifactStore;

/// Runtime definition module inside the composites directory
pub const RUNTIME_MODULE: &str = "definition.ts";
/// Schema description inside the output directory
pub const SCHEMA_DESCRIPTION: &str = "schema.graphql";
/// Mutation documents inside the output directory
pub const MUTATIONS_MODULE: &str = "mutations.ts";

/// What a run produced
#[derive(Debug, Clone, Default)]
pub struct PipelineReport {
    /// Files in the order they were compiled
    pub build_order: Vec<PathBuf>,
    /// One artifact per model, in compile order
    pub artifacts: Vec<PathBuf>,
    pub definition: MergedDefinition,
    pub relations: Option<RelationGraph>,
    /// Every other file written
    pub outputs: Vec<PathBuf>,
}

/// Generation pipeline over a compiler
pub struct Pipeline<C> {
    config: ComposerConfig,
    compiler: C,
}

impl<C: CompositeCompiler> Pipeline<C> {
    pub fn new(config: ComposerConfig, compiler: C) -> Self {
        Self { config, compiler }
    }

    pub fn config(&self) -> &ComposerConfig {
        &self.config
    }

    /// Run over the configured model directory
    pub fn run(&self) -> Result<PipelineReport> {
        let files = discover_schema_files(&self.config.paths.model_dir, &self.config.compiler.extensions)?;
        self.run_files(files)
    }

    /// Run over already-read schema files
    pub fn run_files(&self, files: Vec<SchemaFile>) -> Result<PipelineReport> {
        let config = &self.config;
        let plan = plan_build(files, config.generate.build_order)?;
        let build_order: Vec<PathBuf> = plan.files.iter().map(|f| f.path.clone()).collect();

        let store = ArtifactStore::open(config.composite_dir())?;
        let orchestrator = Orchestrator::new(&self.compiler)
            .with_store(store.clone())
            .with_indexing(config.generate.deploy);
        let context = orchestrator.build(&plan.files)?;
        let artifacts = context.registry.locations();

        let definition = merge_artifact_files(&artifacts)?;
        let mut outputs = Vec::new();

        write_index(&definition, &store.index_path())?;
        outputs.push(store.index_path());
        let runtime = store.root().join(RUNTIME_MODULE);
        let schema = config.paths.output_dir.join(SCHEMA_DESCRIPTION);
        write_runtime(&definition, &runtime, &schema)?;
        outputs.extend([runtime, schema]);

        if config.generate.deploy {
            info!("starting indexing");
            self.compiler
                .start_indexing(&definition)
                .map_err(ComposeError::Indexing)?;
        }

        if config.generate.codegen {
            let path = config.paths.output_dir.join(MUTATIONS_MODULE);
            fs::write(&path, mutations::render_mutations(&definition))?;
            info!(path = %path.display(), "wrote mutations");
            outputs.push(path);
        }

        let relations = if config.generate.relational {
            let graph = relations::extract(&definition)?;
            let path = config.relational_schema_path();
            write_with_parent(&path, &prisma::render_schema(&graph, &config.relational))?;
            info!(path = %path.display(), "wrote relational schema");
            outputs.push(path);
            Some(graph)
        } else {
            None
        };

        if config.generate.client {
            let files = client::render_client(&definition)?;
            outputs.extend(codegen::write_files(&config.client_dir(), &files)?);
            info!(dir = %config.client_dir().display(), "wrote client");
        }

        info!(
            models = definition.models.len(),
            outputs = outputs.len(),
            "generation complete"
        );
        Ok(PipelineReport {
            build_order,
            artifacts,
            definition,
            relations,
            outputs,
        })
    }
}

fn write_with_parent(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, content)?;
    Ok(())
}
