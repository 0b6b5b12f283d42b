//! # Error Suggestions
//!
//! Helpers that turn failures into messages telling the user what went wrong
//! AND how to fix it.
//!
//! Library errors keep their type so the binary can still pick an exit code;
//! the hints for them come from [`hints`]. Mistakes that only the CLI can make
//! (a bad glob, a value that is not JSON) become `anyhow` errors with the
//! hints already in the message.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use cmpreset::suggestions;
//!
//! let pattern = glob::Pattern::new(text).map_err(|e| suggestions::invalid_glob(text, &e))?;
//! ```

use crate::error::{Error, ErrorKind};
use crate::preset::PresetKind;

/// Builds a not-found error for a preset the user named on the command line.
///
/// When one of `candidates` is a likely typo of `name`, the hint suggests it;
/// otherwise the hint points at `list`.
pub fn preset_not_found(kind: PresetKind, name: &str, candidates: &[String]) -> Error {
    let candidates: Vec<&str> = candidates.iter().map(String::as_str).collect();
    let hint = match find_similar(name, &candidates) {
        Some(similar) => format!("Did you mean '{similar}'?"),
        None => format!("Run 'cmpreset list --all --kind {kind}' to see the available presets"),
    };
    Error::PresetNotFound {
        kind,
        name: name.to_string(),
        hint: Some(hint),
    }
}

/// Generate an error for an invalid glob pattern.
pub fn invalid_glob(pattern: &str, error: &glob::PatternError) -> anyhow::Error {
    anyhow::anyhow!(
        "Invalid glob pattern: {pattern}\n\
         error: {error}\n\n\
         hint: Use * to match any run of characters, ? for exactly one\n\
         hint: Use [abc] for character classes, [!abc] to negate"
    )
}

/// Generate an error for a `set` value that is not JSON.
pub fn invalid_json_value(text: &str, error: &serde_json::Error) -> anyhow::Error {
    anyhow::anyhow!(
        "Invalid JSON value: {text}\n\
         error: {error}\n\n\
         hint: Quote strings for the shell as well as for JSON, e.g. '\"Debug\"'\n\
         hint: Use null to suppress an inherited cacheVariables or environment entry"
    )
}

/// Generate an error for a `--cache`/`--env` argument without `=`.
pub fn invalid_assignment(flag: &str, text: &str) -> anyhow::Error {
    anyhow::anyhow!(
        "Invalid {flag} argument: {text}\n\n\
         hint: Use KEY=VALUE, e.g. {flag} CMAKE_BUILD_TYPE=Debug"
    )
}

/// Generate an error for `add` options that do not apply to a preset kind.
pub fn configure_only_option(kind: PresetKind, option: &str) -> anyhow::Error {
    anyhow::anyhow!(
        "{option} only applies to configure presets, not {kind} presets\n\n\
         hint: Drop {option} or use --kind configure"
    )
}

/// Follow-up advice for a library error, one line per hint.
pub fn hints(error: &Error) -> Vec<&'static str> {
    match error.kind() {
        ErrorKind::NotFound => match error {
            Error::FileNotFound { .. } => vec![
                "Use --project-file or --user-file to point at the presets documents",
                "Use --source-dir to run against another project",
            ],
            _ => Vec::new(),
        },
        ErrorKind::ParseError => vec!["Check for trailing commas and unquoted keys"],
        ErrorKind::SchemaError => vec!["Run 'cmpreset validate' to list every problem in the documents"],
        ErrorKind::CyclicInclude => vec!["Remove one of the 'include' entries to break the cycle"],
        ErrorKind::CyclicInheritance => {
            vec!["Change 'inherits' of one preset in the cycle, e.g. with 'cmpreset inherit'"]
        }
        ErrorKind::NameCollision => {
            vec!["Preset names must be unique per kind across every included document"]
        }
        ErrorKind::UnknownMacro => vec![
            "Supported forms are ${name}, $env{VAR}, $penv{VAR} and $vendor{key}",
            "Write a literal '$' as ${dollar}",
        ],
        ErrorKind::DanglingReference => vec!["Rerun with --cascade to remove the dependent presets too"],
        ErrorKind::LockContention => vec!["Another cmpreset is editing the user document; retry when it is done"],
        ErrorKind::StaleDocument => vec!["The user document changed since it was read; rerun the command to apply the edit to the current version"],
        ErrorKind::Io => Vec::new(),
    }
}

/// Find a similar string from a list of candidates using edit distance.
///
/// Returns the closest candidate within an edit distance of 2, if any.
fn find_similar<'a>(input: &str, candidates: &[&'a str]) -> Option<&'a str> {
    candidates
        .iter()
        .filter_map(|&candidate| {
            let distance = edit_distance(input, candidate);
            if distance <= 2 && distance < input.len() {
                Some((candidate, distance))
            } else {
                None
            }
        })
        .min_by_key(|(_, distance)| *distance)
        .map(|(candidate, _)| candidate)
}

/// Levenshtein distance over chars, keeping a single row.
fn edit_distance(a: &str, b: &str) -> usize {
    let b: Vec<char> = b.chars().collect();
    let mut row: Vec<usize> = (0..=b.len()).collect();

    for (i, ca) in a.chars().enumerate() {
        let mut diagonal = row[0];
        row[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let substitution = diagonal + usize::from(ca != *cb);
            diagonal = row[j + 1];
            row[j + 1] = substitution.min(row[j] + 1).min(row[j + 1] + 1);
        }
    }

    row[b.len()]
}
