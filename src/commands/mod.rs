//! # CLI Command Implementations
//!
//! This module contains the implementation for each subcommand of the `cmpreset`
//! command-line tool. Each subcommand is defined in its own file.
//!
//! ## Structure
//!
//! Each command module contains:
//! - An `Args` struct that defines the command-specific arguments and options,
//!   derived using `clap`.
//! - An `execute` function that takes the parsed `Args` plus the global
//!   options and calls into the `cmpreset` library.
//!
//! Read-only commands print machine-readable output on stdout. Editing
//! commands print one status line per preset they wrote or removed.

pub mod add;
pub mod completions;
pub mod inherit;
pub mod list;
pub mod remove;
pub mod set;
pub mod show;
pub mod tree;
pub mod unset;
pub mod validate;

use anyhow::Result;

use cmpreset::catalog::PresetCatalog;
use cmpreset::merge::EditOutcome;
use cmpreset::output::{dim, emoji, preset_name, OutputConfig};
use cmpreset::preset::PresetKind;
use cmpreset::suggestions;

/// Fails with a "did you mean" hint when `name` is not a preset of `kind`.
pub(crate) fn require_preset(catalog: &PresetCatalog, kind: PresetKind, name: &str) -> Result<()> {
    let names = catalog.list(kind, true);
    if names.iter().any(|n| n == name) {
        Ok(())
    } else {
        Err(suggestions::preset_not_found(kind, name, &names).into())
    }
}

/// Prints what an edit changed in the user document.
pub(crate) fn report_edit(out: &OutputConfig, catalog: &PresetCatalog, kind: PresetKind, outcome: &EditOutcome) {
    let user_path = catalog.config().user_path.display().to_string();
    let written = outcome.touched.iter().filter(|name| !outcome.removed.contains(*name));
    for name in written {
        let via = outcome
            .override_of
            .as_deref()
            .map(|original| format!(" (override of {})", preset_name(out, original)))
            .unwrap_or_default();
        println!(
            "{} Wrote {} preset {}{} {}",
            emoji(out, "✏️ ", "[EDIT]"),
            kind,
            preset_name(out, name),
            via,
            dim(out, &user_path)
        );
    }
    for name in &outcome.removed {
        println!(
            "{} Removed preset {} {}",
            emoji(out, "🗑️ ", "[DEL]"),
            preset_name(out, name),
            dim(out, &user_path)
        );
    }
}

/// Parses a list of `KEY=VALUE` arguments, keeping their order.
pub(crate) fn parse_assignments(flag: &str, items: &[String]) -> Result<Vec<(String, String)>> {
    items
        .iter()
        .map(|item| match item.split_once('=') {
            Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
            _ => Err(suggestions::invalid_assignment(flag, item)),
        })
        .collect()
}
