//! CLI argument parsing and command dispatch

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use log::debug;

use cmpreset::catalog::PresetCatalog;
use cmpreset::config::CatalogConfig;

use crate::commands;

/// cmpreset - Resolve and edit CMake presets without breaking inheritance
#[derive(Parser, Debug)]
#[command(name = "cmpreset")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,

    #[command(flatten)]
    globals: GlobalArgs,
}

/// Options shared by every subcommand.
#[derive(Args, Debug, Clone)]
pub struct GlobalArgs {
    /// Project source directory; `${sourceDir}` and the default location of
    /// both presets documents.
    #[arg(long, global = true, value_name = "DIR", env = "CMPRESET_SOURCE_DIR")]
    pub source_dir: Option<PathBuf>,

    /// Project presets document (default: <source-dir>/CMakePresets.json).
    #[arg(long, global = true, value_name = "FILE", env = "CMPRESET_PROJECT_FILE")]
    pub project_file: Option<PathBuf>,

    /// User presets document (default: <source-dir>/CMakeUserPresets.json).
    #[arg(long, global = true, value_name = "FILE", env = "CMPRESET_USER_FILE")]
    pub user_file: Option<PathBuf>,

    /// JSON object supplying values for `$vendor{key}` macros.
    #[arg(long, global = true, value_name = "FILE", env = "CMPRESET_VENDOR_FILE")]
    pub vendor_file: Option<PathBuf>,

    /// Colorize output (always, never, auto)
    #[arg(long, global = true, value_name = "WHEN", default_value = "auto")]
    pub color: String,

    /// Set log level (error, warn, info, debug, trace)
    #[arg(long, global = true, value_name = "LEVEL", default_value = "warn")]
    pub log_level: String,
}

impl GlobalArgs {
    /// Builds the catalog configuration, taking the one environment snapshot
    /// the engine will ever see.
    pub fn catalog_config(&self) -> Result<CatalogConfig> {
        let cwd = std::env::current_dir().context("Failed to determine the current directory")?;
        let source_dir = match &self.source_dir {
            Some(dir) => absolute(&cwd, dir),
            None => cwd.clone(),
        };

        let mut config = CatalogConfig::discover(&source_dir).with_environment(std::env::vars());
        if let Some(project) = &self.project_file {
            config = config.with_project_path(Some(absolute(&cwd, project)));
        }
        if let Some(user) = &self.user_file {
            config = config.with_user_path(absolute(&cwd, user));
        }
        if let Some(vendor) = &self.vendor_file {
            config = config.with_vendor_file(&absolute(&cwd, vendor))?;
        }

        debug!(
            "Source directory {}, project document {}, user document {}",
            config.source_dir.display(),
            config
                .project_path
                .as_deref()
                .map_or_else(|| "(none)".to_string(), |p| p.display().to_string()),
            config.user_path.display()
        );
        Ok(config)
    }

    /// Loads the catalog described by these options.
    pub fn open_catalog(&self) -> Result<PresetCatalog> {
        Ok(PresetCatalog::load(self.catalog_config()?)?)
    }
}

fn absolute(cwd: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        cwd.join(path)
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List preset names
    List(commands::list::ListArgs),

    /// Print a preset with its inheritance chain merged in
    Show(commands::show::ShowArgs),

    /// Add a preset to the user document
    Add(commands::add::AddArgs),

    /// Set one field of a preset (through a user override for project presets)
    Set(commands::set::SetArgs),

    /// Remove one field from a user preset or override
    Unset(commands::unset::UnsetArgs),

    /// Replace the parents of a preset
    Inherit(commands::inherit::InheritArgs),

    /// Remove a preset from the user document
    Remove(commands::remove::RemoveArgs),

    /// Check both documents for structural problems
    Validate(commands::validate::ValidateArgs),

    /// Display the inheritance tree above a preset
    Tree(commands::tree::TreeArgs),

    /// Generate shell completion scripts
    Completions(commands::completions::CompletionsArgs),
}

impl Cli {
    /// Execute the CLI command
    pub fn execute(self) -> Result<()> {
        init_logging(&self.globals.log_level);

        let globals = &self.globals;
        match self.command {
            Commands::List(args) => commands::list::execute(args, globals),
            Commands::Show(args) => commands::show::execute(args, globals),
            Commands::Add(args) => commands::add::execute(args, globals),
            Commands::Set(args) => commands::set::execute(args, globals),
            Commands::Unset(args) => commands::unset::execute(args, globals),
            Commands::Inherit(args) => commands::inherit::execute(args, globals),
            Commands::Remove(args) => commands::remove::execute(args, globals),
            Commands::Validate(args) => commands::validate::execute(args, globals),
            Commands::Tree(args) => commands::tree::execute(args, globals),
            Commands::Completions(args) => commands::completions::execute(args),
        }
    }
}

/// Logs go to stderr; `RUST_LOG` takes precedence over `--log-level`.
fn init_logging(level: &str) {
    let env = env_logger::Env::default().default_filter_or(level);
    let _ = env_logger::Builder::from_env(env)
        .format_timestamp(None)
        .target(env_logger::Target::Stderr)
        .try_init();
}
