//! # Validate Command Implementation
//!
//! This module implements the `validate` subcommand, which checks the project
//! and user documents without modifying them.
//!
//! ## Functionality
//!
//! - **Document Checks**: Both documents and everything they include must
//!   parse and follow the presets schema (loading stops at the first failure)
//! - **Graph Checks**: Duplicate names, missing parents and references,
//!   inheritance cycles, and project presets that depend on user presets
//! - **Macro Checks**: Unknown macros and macros the document version does
//!   not allow, found without expanding anything
//! - **Strict Mode**: `--strict` also fails on hidden presets nothing uses
//!
//! This command is a safe, read-only operation that does not modify any files.

use anyhow::Result;
use clap::Args;
use thiserror::Error;

use cmpreset::error::{exit_codes, ErrorKind};
use cmpreset::output::{emoji, preset_name, problem_line, OutputConfig};

use crate::cli::GlobalArgs;

/// Check both documents for structural problems
#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Use strict validation (fail on warnings).
    #[arg(long)]
    pub strict: bool,
}

/// Validation finished and found problems; already printed on stdout.
#[derive(Debug, Error)]
#[error("validation failed with {count} problem(s)")]
pub struct ProblemsFound {
    pub count: usize,
    pub exit_code: i32,
}

/// Execute the `validate` command.
pub fn execute(args: ValidateArgs, globals: &GlobalArgs) -> Result<()> {
    let out = OutputConfig::from_env_and_flag(&globals.color);
    let catalog = globals.open_catalog()?;
    println!(
        "{} Validating presets in {}",
        emoji(&out, "🔍", "[SCAN]"),
        catalog.config().source_dir.display()
    );

    let problems = catalog.validate();
    for problem in &problems {
        println!("{} {}", emoji(&out, "❌", "[ERR]"), problem_line(&out, problem));
    }

    let unused = catalog.unused_hidden();
    for (kind, name) in &unused {
        println!(
            "{} hidden {} preset {} is never inherited or referenced",
            emoji(&out, "⚠️ ", "[WARN]"),
            kind,
            preset_name(&out, name)
        );
    }

    let failures = problems.len() + if args.strict { unused.len() } else { 0 };
    if failures == 0 {
        println!("{} No problems found", emoji(&out, "✅", "[OK]"));
        return Ok(());
    }

    let invalid_document = problems
        .iter()
        .any(|p| matches!(p.kind, ErrorKind::ParseError | ErrorKind::SchemaError));
    Err(ProblemsFound {
        count: failures,
        exit_code: if invalid_document {
            exit_codes::INVALID_DOCUMENT
        } else {
            exit_codes::STRUCTURE
        },
    }
    .into())
}
