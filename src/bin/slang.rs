//! Composer CLI
//!
//! Compiles model schema files into composites and derived outputs.

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use slang_composites::loader::discover_schema_files;
use slang_composites::merge::{merge_artifact_files, write_index, write_runtime};
use slang_composites::pipeline::{RUNTIME_MODULE, SCHEMA_DESCRIPTION};
use slang_composites::store::INDEX_FILE;
use slang_composites::{plan_build, BuildOrder, ComposerConfig, LocalCompiler, Pipeline};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "slang")]
#[command(about = "Compile model schemas into composites and a relational mirror")]
struct Cli {
    /// Config file (defaults to slang.toml lookup)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full generation pipeline
    Generate {
        /// Directory holding the schema files
        #[arg(short, long)]
        models: Option<PathBuf>,
        /// Root of the generated output
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Index the merged definition after compiling
        #[arg(long)]
        deploy: bool,
        /// Skip mutation documents
        #[arg(long)]
        no_codegen: bool,
        /// Skip the relational schema
        #[arg(long)]
        no_relational: bool,
        /// Skip the client
        #[arg(long)]
        no_client: bool,
        /// Build order: dependency or listing
        #[arg(long)]
        order: Option<BuildOrder>,
    },

    /// Print the order schema files would be compiled in
    Plan {
        #[arg(short, long)]
        models: Option<PathBuf>,
        #[arg(long)]
        order: Option<BuildOrder>,
    },

    /// Merge existing artifact files into an index and runtime definition
    Merge {
        /// Artifact files, in build order
        #[arg(required = true)]
        artifacts: Vec<PathBuf>,
        /// Directory to write the merged outputs to
        #[arg(short, long, default_value = ".")]
        output: PathBuf,
    },

    /// Print the effective configuration, or save it
    Config {
        #[arg(long)]
        save: Option<PathBuf>,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = ComposerConfig::load_from(cli.config.as_deref()).context("loading configuration")?;

    match cli.command {
        Commands::Generate {
            models,
            output,
            deploy,
            no_codegen,
            no_relational,
            no_client,
            order,
        } => {
            if let Some(models) = models {
                config.paths.model_dir = models;
            }
            if let Some(output) = output {
                config.paths.output_dir = output;
            }
            if let Some(order) = order {
                config.generate.build_order = order;
            }
            config.generate.deploy |= deploy;
            config.generate.codegen &= !no_codegen;
            config.generate.relational &= !no_relational;
            config.generate.client &= !no_client;

            println!("🔨 Generating from {}", config.paths.model_dir.display());
            let report = Pipeline::new(config, LocalCompiler::new()).run()?;

            for path in &report.build_order {
                println!("  📄 {}", path.display());
            }
            println!();
            println!("✅ Compiled {} models", report.definition.models.len());
            for path in report.artifacts.iter().chain(&report.outputs) {
                println!("  {}", path.display());
            }
            Ok(())
        }

        Commands::Plan { models, order } => {
            let dir = models.unwrap_or(config.paths.model_dir);
            let order = order.unwrap_or(config.generate.build_order);
            let files = discover_schema_files(&dir, &config.compiler.extensions)?;
            let plan = plan_build(files, order)?;

            println!("📋 Build order ({:?}):", order);
            for (i, path) in plan.paths().iter().enumerate() {
                println!("  {}. {}", i + 1, path.display());
            }
            println!();
            for (model, path) in &plan.declared {
                println!("  {} ← {}", model, path.display());
            }
            Ok(())
        }

        Commands::Merge { artifacts, output } => {
            let definition = merge_artifact_files(&artifacts)?;
            std::fs::create_dir_all(&output)?;
            write_index(&definition, &output.join(INDEX_FILE))?;
            write_runtime(
                &definition,
                &output.join(RUNTIME_MODULE),
                &output.join(SCHEMA_DESCRIPTION),
            )?;
            println!("✅ Merged {} models into {}", definition.models.len(), output.display());
            Ok(())
        }

        Commands::Config { save } => {
            match save {
                Some(path) => {
                    config.save(&path)?;
                    println!("✅ Saved configuration to {}", path.display());
                }
                None => print!("{}", toml::to_string_pretty(&config)?),
            }
            Ok(())
        }
    }
}
