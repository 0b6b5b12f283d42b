//! # Output Configuration
//!
//! Controls how the CLI decorates what it prints: status markers, preset
//! names, and validation problems.
//!
//! ## Respecting User Preferences
//!
//! - `--color=never|always|auto` - CLI flag for color control
//! - `NO_COLOR` - Disables colors when set (per https://no-color.org/)
//! - `CLICOLOR=0` - Disables colors
//! - `CLICOLOR_FORCE=1` - Forces colors even in non-TTY
//! - `TERM=dumb` - Disables colors for dumb terminals
//!
//! Machine-readable output (`show`, `list --kind`) is never decorated.

use std::env;

use console::style;

use crate::error::{ErrorKind, Problem};

/// Output configuration for controlling colors and status markers.
#[derive(Debug, Clone)]
pub struct OutputConfig {
    /// Whether colors and emojis should be used in output.
    pub use_color: bool,
}

impl OutputConfig {
    /// Create an output configuration from environment and CLI flag.
    ///
    /// `color_flag` is the value of `--color`: `always` forces colors on
    /// (overriding `NO_COLOR`), `never` forces them off, and anything else
    /// detects support from the environment and the terminal.
    pub fn from_env_and_flag(color_flag: &str) -> Self {
        let use_color = match color_flag.to_lowercase().as_str() {
            "always" => true,
            "never" => false,
            _ => Self::detect_color_support(),
        };

        Self { use_color }
    }

    fn detect_color_support() -> bool {
        if env::var_os("NO_COLOR").is_some() {
            return false;
        }
        if env::var("CLICOLOR").is_ok_and(|v| v == "0") {
            return false;
        }
        if env::var("CLICOLOR_FORCE").is_ok_and(|v| v != "0" && !v.is_empty()) {
            return true;
        }
        if env::var("TERM").is_ok_and(|v| v == "dumb") {
            return false;
        }
        console::Term::stdout().features().colors_supported()
    }

    #[cfg(test)]
    pub fn with_color() -> Self {
        Self { use_color: true }
    }

    #[cfg(test)]
    pub fn without_color() -> Self {
        Self { use_color: false }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self::from_env_and_flag("auto")
    }
}

/// Returns `emoji_str` when colors are enabled, `plain` otherwise.
pub fn emoji<'a>(config: &OutputConfig, emoji_str: &'a str, plain: &'a str) -> &'a str {
    if config.use_color {
        emoji_str
    } else {
        plain
    }
}

/// A preset name, bold when colors are enabled.
pub fn preset_name(config: &OutputConfig, name: &str) -> String {
    if config.use_color {
        style(name).bold().to_string()
    } else {
        name.to_string()
    }
}

/// Secondary text such as locations, dimmed when colors are enabled.
pub fn dim(config: &OutputConfig, text: &str) -> String {
    if config.use_color {
        style(text).dim().to_string()
    } else {
        text.to_string()
    }
}

/// One validation problem as a single display line.
///
/// Document-level failures are red; graph problems are yellow.
pub fn problem_line(config: &OutputConfig, problem: &Problem) -> String {
    let tag = format!("[{}]", problem.kind);
    let tag = if !config.use_color {
        tag
    } else if matches!(problem.kind, ErrorKind::ParseError | ErrorKind::SchemaError) {
        style(tag).red().to_string()
    } else {
        style(tag).yellow().to_string()
    };
    format!("{} {}", tag, problem.message)
}
