//! # Show Command Implementation
//!
//! This module implements the `show` subcommand, which prints one preset with
//! its whole inheritance chain merged in.
//!
//! ## Functionality
//!
//! - **Merged View**: Fields from every ancestor, the nearest one winning, with
//!   `cacheVariables` and `environment` merged key by key
//! - **Macro Expansion**: `${...}`, `$env{}`, `$penv{}` and `$vendor{}` are
//!   expanded and the preset's condition is evaluated, unless `--raw` is given
//! - **Output Formats**: JSON (default) or YAML on stdout
//!
//! This command is a safe, read-only operation that does not modify any files.

use anyhow::Result;
use clap::{Args, ValueEnum};
use log::warn;

use cmpreset::preset::{PresetKind, ResolvedPreset};

use crate::cli::GlobalArgs;
use crate::commands::require_preset;

/// Print a resolved preset
#[derive(Args, Debug)]
pub struct ShowArgs {
    /// Name of the preset.
    pub name: String,

    /// Kind of the preset (configure, build, test, package, workflow).
    #[arg(short, long, value_name = "KIND", default_value = "configure")]
    pub kind: PresetKind,

    /// Output format.
    #[arg(short, long, value_enum, default_value = "json")]
    pub format: OutputFormat,

    /// Merge the inheritance chain but leave macros unexpanded.
    #[arg(long)]
    pub raw: bool,
}

/// Serialization used for `show`
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Default)]
pub enum OutputFormat {
    /// Pretty-printed JSON
    #[default]
    Json,
    /// YAML
    Yaml,
}

/// Execute the `show` command.
pub fn execute(args: ShowArgs, globals: &GlobalArgs) -> Result<()> {
    let catalog = globals.open_catalog()?;
    require_preset(&catalog, args.kind, &args.name)?;

    let preset = if args.raw {
        catalog.show_unexpanded(args.kind, &args.name)?
    } else {
        catalog.show(args.kind, &args.name)?
    };
    if preset.enabled == Some(false) {
        warn!("{} preset '{}' is disabled by its condition", args.kind, args.name);
    }

    print!("{}", render(&preset, args.format)?);
    Ok(())
}

/// Renders a resolved preset, always ending with a newline.
pub fn render(preset: &ResolvedPreset, format: OutputFormat) -> Result<String> {
    let text = match format {
        OutputFormat::Json => {
            let mut json = serde_json::to_string_pretty(preset)?;
            json.push('\n');
            json
        }
        OutputFormat::Yaml => serde_yaml::to_string(preset)?,
    };
    Ok(text)
}
