//! Configuration management for the composer
//!
//! Supports loading configuration from:
//! - Default values
//! - Config file (slang.toml)
//! - Environment variables (SLANG_*)
//!
//! ## Example config file (slang.toml):
//! ```toml
//! [paths]
//! output_dir = "__generated__"
//! model_dir = "models"
//! composite_folder = "composites"
//!
//! [generate]
//! deploy = false
//! codegen = true
//! relational = true
//! build_order = "dependency"
//!
//! [relational]
//! provider = "postgresql"
//! url_env = "COMPOSEDB_POSTGRES_URL"
//! ```

use config_crate::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::loader::DEFAULT_EXTENSIONS;
use crate::plan::BuildOrder;

/// Main configuration for the composer
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ComposerConfig {
    /// Input and output locations
    #[serde(default)]
    pub paths: PathsConfig,

    /// Which outputs to produce
    #[serde(default)]
    pub generate: GenerateConfig,

    /// Relational schema header settings
    #[serde(default)]
    pub relational: RelationalConfig,

    /// Compiler input settings
    #[serde(default)]
    pub compiler: CompilerConfig,
}

/// Paths configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Root of every generated file
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Directory holding the schema files
    #[serde(default = "default_model_dir")]
    pub model_dir: PathBuf,

    /// Folder under `output_dir` for compiled artifacts
    #[serde(default = "default_composite_folder")]
    pub composite_folder: PathBuf,

    /// Folder under `output_dir` for the generated client
    #[serde(default = "default_client_folder")]
    pub client_folder: PathBuf,

    /// Folder the relational schema is written to
    #[serde(default = "default_relational_folder")]
    pub relational_folder: PathBuf,
}

/// Output selection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateConfig {
    /// Ask the compiler to index the merged definition
    #[serde(default)]
    pub deploy: bool,

    /// Emit mutation documents
    #[serde(default = "default_true")]
    pub codegen: bool,

    /// Emit the relational schema
    #[serde(default = "default_true")]
    pub relational: bool,

    /// Emit the typed client
    #[serde(default = "default_true")]
    pub client: bool,

    #[serde(default)]
    pub build_order: BuildOrder,
}

/// Relational schema settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelationalConfig {
    /// Datasource provider
    #[serde(default = "default_provider")]
    pub provider: String,

    /// Environment variable holding the datasource URL
    #[serde(default = "default_url_env")]
    pub url_env: String,

    #[serde(default = "default_preview_features")]
    pub preview_features: Vec<String>,
}

/// Compiler input settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompilerConfig {
    /// File extensions read from the model directory
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,
}

// Default value functions
fn default_output_dir() -> PathBuf {
    PathBuf::from("__generated__")
}

fn default_model_dir() -> PathBuf {
    PathBuf::from("models")
}

fn default_composite_folder() -> PathBuf {
    PathBuf::from("composites")
}

fn default_client_folder() -> PathBuf {
    PathBuf::from("client")
}

fn default_relational_folder() -> PathBuf {
    PathBuf::from(".")
}

fn default_true() -> bool {
    true
}

fn default_provider() -> String {
    "postgresql".to_string()
}

fn default_url_env() -> String {
    "COMPOSEDB_POSTGRES_URL".to_string()
}

fn default_preview_features() -> Vec<String> {
    vec![
        "fieldReference".to_string(),
        "filteredRelationCount".to_string(),
        "fullTextSearch".to_string(),
    ]
}

fn default_extensions() -> Vec<String> {
    DEFAULT_EXTENSIONS.iter().map(|e| e.to_string()).collect()
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            model_dir: default_model_dir(),
            composite_folder: default_composite_folder(),
            client_folder: default_client_folder(),
            relational_folder: default_relational_folder(),
        }
    }
}

impl Default for GenerateConfig {
    fn default() -> Self {
        Self {
            deploy: false,
            codegen: true,
            relational: true,
            client: true,
            build_order: BuildOrder::default(),
        }
    }
}

impl Default for RelationalConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            url_env: default_url_env(),
            preview_features: default_preview_features(),
        }
    }
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            extensions: default_extensions(),
        }
    }
}

impl ComposerConfig {
    /// Load configuration from default locations
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(None)
    }

    /// Load configuration from a specific file
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder();

        let config_locations = ["slang.toml", ".slang.toml", "config/slang.toml"];
        for location in config_locations {
            builder = builder.add_source(File::with_name(location).required(false));
        }

        // XDG config directory
        if let Some(config_dir) = directories::ProjectDirs::from("dev", "slang", "composer") {
            let xdg_config = config_dir.config_dir().join("slang.toml");
            if xdg_config.exists() {
                builder = builder.add_source(File::from(xdg_config).required(false));
            }
        }

        if let Some(path) = config_path {
            builder = builder.add_source(File::from(path).required(true));
        }

        // SLANG_GENERATE__DEPLOY=true and friends
        builder = builder.add_source(
            Environment::with_prefix("SLANG")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build()?;
        config.try_deserialize()
    }

    /// Save configuration to a file
    pub fn save(&self, path: &Path) -> std::io::Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        std::fs::write(path, content)
    }

    /// Directory compiled artifacts are written to
    pub fn composite_dir(&self) -> PathBuf {
        self.paths.output_dir.join(&self.paths.composite_folder)
    }

    /// Directory the generated client is written to
    pub fn client_dir(&self) -> PathBuf {
        self.paths.output_dir.join(&self.paths.client_folder)
    }

    /// Path of the relational schema file
    pub fn relational_schema_path(&self) -> PathBuf {
        self.paths.relational_folder.join("schema.prisma")
    }
}
