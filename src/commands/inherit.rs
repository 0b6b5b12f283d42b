//! # Inherit Command Implementation
//!
//! This module implements the `inherit` subcommand, which replaces the
//! `inherits` list of a preset.
//!
//! ## Functionality
//!
//! - **Parent Order**: Parents are stored in the order given; values from
//!   earlier parents win over later ones
//! - **No Parents**: Running without parents removes `inherits`
//! - **Project Presets**: The override keeps the project preset as its first
//!   parent, followed by the requested ones
//! - **Cycle Check**: An edit that would close an inheritance cycle is rejected
//!   and the user document is left unchanged

use anyhow::Result;
use clap::Args;

use cmpreset::output::OutputConfig;
use cmpreset::preset::PresetKind;

use crate::cli::GlobalArgs;
use crate::commands::{report_edit, require_preset};

/// Replace the parents of a preset
#[derive(Args, Debug)]
pub struct InheritArgs {
    /// Name of the preset.
    pub name: String,

    /// New parents, highest precedence first.
    #[arg(value_name = "PARENT")]
    pub parents: Vec<String>,

    /// Kind of the preset (configure, build, test, package, workflow).
    #[arg(short, long, value_name = "KIND", default_value = "configure")]
    pub kind: PresetKind,

    /// Name of the user override to edit when the preset belongs to the project.
    #[arg(long = "as", value_name = "NAME")]
    pub as_name: Option<String>,
}

/// Execute the `inherit` command.
pub fn execute(args: InheritArgs, globals: &GlobalArgs) -> Result<()> {
    let out = OutputConfig::from_env_and_flag(&globals.color);
    let mut catalog = globals.open_catalog()?;
    require_preset(&catalog, args.kind, &args.name)?;
    for parent in &args.parents {
        require_preset(&catalog, args.kind, parent)?;
    }

    let outcome = catalog.set_inherits(args.kind, &args.name, args.parents, args.as_name)?;
    report_edit(&out, &catalog, args.kind, &outcome);
    Ok(())
}
