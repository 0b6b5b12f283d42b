//! # Set Command Implementation
//!
//! This module implements the `set` subcommand, which changes one field of a
//! preset.
//!
//! ## Functionality
//!
//! - **User Presets**: Edited in place
//! - **Project Presets**: The value goes to a user override named
//!   `<name>-user` (or `--as NAME`), created on first use and reused after
//! - **Field Paths**: Dots and brackets address nested keys, e.g.
//!   `cacheVariables.CMAKE_BUILD_TYPE` or `cacheVariables["a.b"]`
//! - **JSON Values**: The value is parsed as JSON; `null` suppresses an
//!   inherited `cacheVariables` or `environment` entry

use anyhow::Result;
use clap::Args;
use serde_json::Value;

use cmpreset::output::OutputConfig;
use cmpreset::preset::PresetKind;
use cmpreset::suggestions;

use crate::cli::GlobalArgs;
use crate::commands::{report_edit, require_preset};

/// Set one field of a preset
#[derive(Args, Debug)]
pub struct SetArgs {
    /// Name of the preset.
    pub name: String,

    /// Field to set, e.g. `generator` or `cacheVariables.CMAKE_BUILD_TYPE`.
    pub field: String,

    /// New value as JSON, e.g. '"Debug"', 'true', '{"type": "BOOL", "value": "ON"}'.
    #[arg(allow_hyphen_values = true)]
    pub value: String,

    /// Kind of the preset (configure, build, test, package, workflow).
    #[arg(short, long, value_name = "KIND", default_value = "configure")]
    pub kind: PresetKind,

    /// Name of the user override to write when the preset belongs to the project.
    #[arg(long = "as", value_name = "NAME")]
    pub as_name: Option<String>,
}

/// Execute the `set` command.
pub fn execute(args: SetArgs, globals: &GlobalArgs) -> Result<()> {
    let out = OutputConfig::from_env_and_flag(&globals.color);
    let value: Value =
        serde_json::from_str(&args.value).map_err(|e| suggestions::invalid_json_value(&args.value, &e))?;

    let mut catalog = globals.open_catalog()?;
    require_preset(&catalog, args.kind, &args.name)?;
    let outcome = catalog.update(args.kind, &args.name, &args.field, value, args.as_name)?;
    report_edit(&out, &catalog, args.kind, &outcome);
    Ok(())
}
