//! # Remove Command Implementation
//!
//! This module implements the `remove` subcommand, which deletes a preset from
//! the user document.
//!
//! ## Functionality
//!
//! - **Dependency Check**: A preset other presets inherit from or refer to is
//!   only removed with `--cascade`, which removes those dependents as well
//! - **User Document Only**: Project presets cannot be removed, and a cascade
//!   that would reach into the project document is rejected

use anyhow::Result;
use clap::Args;

use cmpreset::output::OutputConfig;
use cmpreset::preset::PresetKind;

use crate::cli::GlobalArgs;
use crate::commands::{report_edit, require_preset};

/// Remove a preset from the user document
#[derive(Args, Debug)]
pub struct RemoveArgs {
    /// Name of the preset.
    pub name: String,

    /// Kind of the preset (configure, build, test, package, workflow).
    #[arg(short, long, value_name = "KIND", default_value = "configure")]
    pub kind: PresetKind,

    /// Also remove every preset that depends on this one.
    #[arg(long)]
    pub cascade: bool,
}

/// Execute the `remove` command.
pub fn execute(args: RemoveArgs, globals: &GlobalArgs) -> Result<()> {
    let out = OutputConfig::from_env_and_flag(&globals.color);
    let mut catalog = globals.open_catalog()?;
    require_preset(&catalog, args.kind, &args.name)?;
    let outcome = catalog.remove(args.kind, &args.name, args.cascade)?;
    report_edit(&out, &catalog, args.kind, &outcome);
    Ok(())
}
