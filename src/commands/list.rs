//! # List Command Implementation
//!
//! This module implements the `list` subcommand, which prints preset names
//! from the project and user documents in load order.
//!
//! ## Functionality
//!
//! - **Single Kind**: With `--kind`, prints one name per line and nothing
//!   else, for use in scripts
//! - **All Kinds**: Without `--kind`, groups the names under a heading per kind
//! - **Hidden Presets**: Left out unless `--all` is given
//! - **Pattern Filtering**: `--pattern` keeps names matching a glob
//!
//! This command is a safe, read-only operation that does not modify any files.

use anyhow::Result;
use clap::Args;

use cmpreset::output::{dim, OutputConfig};
use cmpreset::preset::PresetKind;
use cmpreset::suggestions;

use crate::cli::GlobalArgs;

/// List preset names
#[derive(Args, Debug)]
pub struct ListArgs {
    /// Only list presets of this kind (configure, build, test, package, workflow).
    #[arg(short, long, value_name = "KIND")]
    pub kind: Option<PresetKind>,

    /// Include hidden presets.
    #[arg(short, long)]
    pub all: bool,

    /// Filter preset names by glob pattern (e.g., "ci-*").
    #[arg(short, long, value_name = "PATTERN")]
    pub pattern: Option<String>,
}

/// Execute the `list` command.
pub fn execute(args: ListArgs, globals: &GlobalArgs) -> Result<()> {
    let catalog = globals.open_catalog()?;
    let pattern = args
        .pattern
        .as_deref()
        .map(|p| glob::Pattern::new(p).map_err(|e| suggestions::invalid_glob(p, &e)))
        .transpose()?;
    let matches = |name: &str| pattern.as_ref().is_none_or(|p| p.matches(name));

    if let Some(kind) = args.kind {
        for name in catalog.list(kind, args.all) {
            if matches(&name) {
                println!("{}", name);
            }
        }
        return Ok(());
    }

    let out = OutputConfig::from_env_and_flag(&globals.color);
    let mut first = true;
    for kind in PresetKind::ALL {
        let visible = catalog.list(kind, false);
        let names: Vec<String> = catalog
            .list(kind, args.all)
            .into_iter()
            .filter(|name| matches(name))
            .collect();
        if names.is_empty() {
            continue;
        }

        if !first {
            println!();
        }
        first = false;
        println!("{} presets:", kind);
        for name in names {
            if visible.contains(&name) {
                println!("  {}", name);
            } else {
                println!("  {} {}", name, dim(&out, "(hidden)"));
            }
        }
    }
    Ok(())
}
