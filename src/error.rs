//! Error types for the composition pipeline

use std::path::PathBuf;

use thiserror::Error;

use crate::compiler::CompilerError;

/// Result type for pipeline operations
pub type Result<T> = std::result::Result<T, ComposeError>;

/// Composition pipeline errors
///
/// Every variant aborts the build. Variants carry enough context (file, model,
/// identifier) to locate the faulty schema source.
#[derive(Error, Debug)]
pub enum ComposeError {
    #[error("Parse error in {file}: {message}")]
    Parse { file: PathBuf, message: String },

    #[error("{file} references model {model} before it has been compiled{}", suggestion_suffix(.suggestion))]
    ForwardReference {
        file: PathBuf,
        model: String,
        suggestion: Option<String>,
    },

    #[error("Model {model} declared in {second} was already declared in {first}")]
    DuplicateModel {
        model: String,
        first: PathBuf,
        second: PathBuf,
    },

    #[error("Model {model} in {file} uses a reserved name: its artifact would overwrite the merged index")]
    ReservedModelName { model: String, file: PathBuf },

    #[error("Embedded type {name} in {file} conflicts with an earlier definition of the same name")]
    EmbedConflict { name: String, file: PathBuf },

    #[error("Field {model}.{field} relates to unknown model id {target}")]
    DanglingRelation {
        model: String,
        field: String,
        target: String,
    },

    #[error("Merged definition already contains model {model}")]
    MergeConflict { model: String },

    #[error("Dependency cycle between schema files: {}", display_paths(.files))]
    DependencyCycle { files: Vec<PathBuf> },

    #[error("Compiling model {model} from {file} failed")]
    Compiler {
        model: String,
        file: PathBuf,
        #[source]
        source: CompilerError,
    },

    #[error("Indexing the merged definition failed")]
    Indexing(#[source] CompilerError),

    #[error("Invalid artifact {path}: {message}")]
    Artifact { path: PathBuf, message: String },

    #[error("Missing code generation template {0}")]
    Template(String),

    #[error("Configuration error: {0}")]
    Config(#[from] config_crate::ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

fn suggestion_suffix(suggestion: &Option<String>) -> String {
    match suggestion {
        Some(name) => format!(" (did you mean {}?)", name),
        None => String::new(),
    }
}

fn display_paths(files: &[PathBuf]) -> String {
    files
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(" -> ")
}
