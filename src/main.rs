//! # cmpreset CLI
//!
//! This is the binary entry point for the `cmpreset` command-line tool.
//!
//! Its primary responsibilities are:
//! - Parsing command-line arguments using `clap`.
//! - Executing the appropriate command based on the parsed arguments.
//! - Printing failures with hints and exiting with the code of the error kind.
//!
//! The core application logic is defined in the `lib.rs` library crate, ensuring
//! that the binary is a thin wrapper around the reusable library functionality.

mod cli;
mod commands;

use std::process::ExitCode;

use clap::Parser;

use cmpreset::error::{exit_codes, Error};
use cmpreset::suggestions;

use crate::commands::validate::ProblemsFound;

fn main() -> ExitCode {
    let cli = cli::Cli::parse();
    match cli.execute() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            report(&err);
            ExitCode::from(exit_code(&err) as u8)
        }
    }
}

fn report(err: &anyhow::Error) {
    eprintln!("Error: {err:#}");
    if let Some(error) = err.downcast_ref::<Error>() {
        for hint in suggestions::hints(error) {
            eprintln!("  hint: {hint}");
        }
    }
}

fn exit_code(err: &anyhow::Error) -> i32 {
    if let Some(error) = err.downcast_ref::<Error>() {
        error.exit_code()
    } else if let Some(problems) = err.downcast_ref::<ProblemsFound>() {
        problems.exit_code
    } else {
        exit_codes::GENERAL
    }
}
