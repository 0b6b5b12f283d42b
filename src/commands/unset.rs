//! # Unset Command Implementation
//!
//! This module implements the `unset` subcommand, which deletes one field from
//! a user preset, or from the user override of a project preset.
//!
//! Removing a field lets the inherited value show through again. To hide an
//! inherited `cacheVariables` or `environment` entry instead, use
//! `cmpreset set <name> <path> null`.

use anyhow::Result;
use clap::Args;

use cmpreset::output::OutputConfig;
use cmpreset::preset::PresetKind;

use crate::cli::GlobalArgs;
use crate::commands::{report_edit, require_preset};

/// Remove one field from a user preset or override
#[derive(Args, Debug)]
pub struct UnsetArgs {
    /// Name of the preset.
    pub name: String,

    /// Field to remove, e.g. `binaryDir` or `environment.CC`.
    pub field: String,

    /// Kind of the preset (configure, build, test, package, workflow).
    #[arg(short, long, value_name = "KIND", default_value = "configure")]
    pub kind: PresetKind,

    /// Name of the user override to edit when the preset belongs to the project.
    #[arg(long = "as", value_name = "NAME")]
    pub as_name: Option<String>,
}

/// Execute the `unset` command.
pub fn execute(args: UnsetArgs, globals: &GlobalArgs) -> Result<()> {
    let out = OutputConfig::from_env_and_flag(&globals.color);
    let mut catalog = globals.open_catalog()?;
    require_preset(&catalog, args.kind, &args.name)?;
    let outcome = catalog.unset(args.kind, &args.name, &args.field, args.as_name)?;
    report_edit(&out, &catalog, args.kind, &outcome);
    Ok(())
}
