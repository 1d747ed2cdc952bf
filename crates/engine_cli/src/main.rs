//! # scene-tool
//!
//! Command line access to scene documents: print the tree, list relative
//! paths, resolve a path, make a deep copy, or check that every reference
//! resolves. Documents are read with the default component set from
//! `engine_defaults`.

mod commands;

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use engine_scene::{EntityId, Scene, SceneConfig};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "scene-tool", about = "Inspect and copy scene documents")]
struct Args {
    /// Fail on component types that are not registered instead of skipping them
    #[arg(long, global = true)]
    strict: bool,

    /// Maximum numeric suffix tried when making a child name unique
    #[arg(long, global = true)]
    name_suffix_limit: Option<u64>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the entity tree with component types
    Tree { file: PathBuf },
    /// Print the relative path from one entity to every other
    Paths {
        file: PathBuf,
        /// Entity path, relative to the document root
        #[arg(long, default_value = ".")]
        from: String,
    },
    /// Resolve `entity/path` or `entity/path:Type` from the document root
    Resolve { file: PathBuf, path: String },
    /// Write a deep copy of the document
    Copy {
        file: PathBuf,
        #[arg(short, long)]
        output: PathBuf,
        /// Name for the copy's root entity
        #[arg(long)]
        name: Option<String>,
    },
    /// Check that the document loads and every reference resolves
    Validate { file: PathBuf },
}

impl Args {
    fn config(&self) -> SceneConfig {
        let config = SceneConfig::new().with_strict_json(self.strict);
        match self.name_suffix_limit {
            Some(limit) => config.with_name_suffix_limit(limit),
            None => config,
        }
    }
}

fn open(file: &Path, config: SceneConfig) -> Result<(Scene, EntityId)> {
    let text = fs::read_to_string(file).with_context(|| format!("can't read {}", file.display()))?;
    commands::load(&text, config).with_context(|| format!("in {}", file.display()))
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("engine_cli=info".parse()?))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let config = args.config();

    let output = match &args.command {
        Command::Tree { file } => {
            let (scene, root) = open(file, config)?;
            commands::tree(&scene, root)?
        }
        Command::Paths { file, from } => {
            let (scene, root) = open(file, config)?;
            commands::paths(&scene, root, from)?
        }
        Command::Resolve { file, path } => {
            let (scene, root) = open(file, config)?;
            commands::resolve(&scene, root, path)?
        }
        Command::Copy { file, output, name } => {
            let (mut scene, root) = open(file, config)?;
            let text = commands::copy(&mut scene, root, name.as_deref())?;
            fs::write(output, text).with_context(|| format!("can't write {}", output.display()))?;
            info!(output = %output.display(), "copy written");
            String::new()
        }
        Command::Validate { file } => {
            let (scene, _) = open(file, config)?;
            commands::validate(&scene)?
        }
    };
    print!("{output}");
    Ok(())
}
