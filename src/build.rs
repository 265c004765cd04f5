//! Build Orchestrator
//!
//! Drives parsing, reference resolution and compilation across schema files
//! in a fixed order. Files are processed strictly one after another because a
//! file's placeholders resolve against the models compiled before it; within
//! a file, models compile in declaration order.

use std::collections::HashSet;
use std::path::PathBuf;

use tracing::{debug, info};

use crate::collect::{scan_file, EmbedSet};
use crate::compiler::CompositeCompiler;
use crate::error::{ComposeError, Result};
use crate::registry::ArtifactRegistry;
use crate::resolver;
use crate::schema::SchemaFile;
use crate::store::{is_reserved_model_name, ArtifactStore};

/// State threaded through a build: compiled models and accumulated embeds
#[derive(Debug, Clone, Default)]
pub struct BuildContext {
    pub registry: ArtifactRegistry,
    pub embeds: EmbedSet,
}

impl BuildContext {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Compiles schema files into a [`BuildContext`]
pub struct Orchestrator<C> {
    compiler: C,
    store: Option<ArtifactStore>,
    index: bool,
}

impl<C: CompositeCompiler> Orchestrator<C> {
    pub fn new(compiler: C) -> Self {
        Self {
            compiler,
            store: None,
            index: false,
        }
    }

    /// Persist every compiled artifact into `store`
    pub fn with_store(mut self, store: ArtifactStore) -> Self {
        self.store = Some(store);
        self
    }

    /// Ask the compiler to index the models it compiles
    pub fn with_indexing(mut self, index: bool) -> Self {
        self.index = index;
        self
    }

    pub fn compiler(&self) -> &C {
        &self.compiler
    }

    /// Run a fresh build over `files` in the given order
    pub fn build(&self, files: &[SchemaFile]) -> Result<BuildContext> {
        let mut context = BuildContext::new();
        self.build_into(&mut context, files)?;
        Ok(context)
    }

    /// Continue a build on an existing context
    pub fn build_into(&self, context: &mut BuildContext, files: &[SchemaFile]) -> Result<Vec<PathBuf>> {
        let mut written = Vec::new();
        for file in files {
            written.extend(self.process_file(context, file)?);
        }
        info!(models = context.registry.len(), "build complete");
        Ok(written)
    }

    fn process_file(&self, context: &mut BuildContext, file: &SchemaFile) -> Result<Vec<PathBuf>> {
        info!(file = %file.display_name(), "parsing");
        let scan = scan_file(file)?;
        let embeds = resolver::resolve_embeds(&scan.embeds, &context.registry)?;
        context.embeds.absorb(&embeds)?;

        // Reject reserved names and redeclarations before anything in this file compiles
        let mut seen = HashSet::new();
        for draft in &scan.models {
            if is_reserved_model_name(&draft.name) {
                return Err(ComposeError::ReservedModelName {
                    model: draft.name.clone(),
                    file: file.path.clone(),
                });
            }
            if let Some(first) = context.registry.source_of(&draft.name) {
                return Err(ComposeError::DuplicateModel {
                    model: draft.name.clone(),
                    first: first.to_path_buf(),
                    second: file.path.clone(),
                });
            }
            if !seen.insert(draft.name.as_str()) {
                return Err(ComposeError::DuplicateModel {
                    model: draft.name.clone(),
                    first: file.path.clone(),
                    second: file.path.clone(),
                });
            }
        }

        let declared = scan.declared_names();
        let text = resolver::prepare(file, &declared, &context.registry, &context.embeds)?;

        let mut written = Vec::new();
        for draft in &scan.models {
            debug!(model = %draft.name, "generating composite");
            let composite = self
                .compiler
                .compile(&text, self.index)
                .and_then(|composite| self.compiler.set_alias(composite, &draft.name))
                .map_err(|source| ComposeError::Compiler {
                    model: draft.name.clone(),
                    file: file.path.clone(),
                    source,
                })?;

            let location = match &self.store {
                Some(store) => Some(store.write(&composite)?),
                None => None,
            };
            if let Some(path) = &location {
                written.push(path.clone());
            }
            info!(model = %draft.name, id = %composite.id, "compiled");
            context
                .registry
                .register_at(composite, file.path.clone(), location)?;
        }

        Ok(written)
    }
}
