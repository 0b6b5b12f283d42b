//! # Error Handling
//!
//! This module defines the centralized error type for the `cmpreset` library.
//! Every failure below the catalog boundary is one of the variants of
//! [`Error`], built with `thiserror`, and carries enough context (file path,
//! preset kind and name, cycle path) for the CLI to render a useful message.
//!
//! ## Key Components
//!
//! - **`Error`**: all failure modes of loading, resolving, expanding, and
//!   editing preset documents.
//! - **`ErrorKind`**: the flat discriminant of an `Error`, used by callers that
//!   only need to branch on the category (and by the CLI to pick an exit code).
//! - **`Result<T>`**: a type alias for `std::result::Result<T, Error>`.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

use crate::preset::{PresetKind, PresetLocation};

/// Main error type for cmpreset operations
#[derive(Error, Debug)]
pub enum Error {
    /// A preset document does not exist on disk.
    #[error("File not found: {}", path.display())]
    FileNotFound { path: PathBuf },

    /// A named preset does not exist in the document set.
    #[error("{kind} preset '{name}' not found{}", hint.as_ref().map(|h| format!("\n  hint: {}", h)).unwrap_or_default())]
    PresetNotFound {
        kind: PresetKind,
        name: String,
        /// Optional hint, e.g. which preset referenced the missing one
        hint: Option<String>,
    },

    /// A document is not well-formed JSON.
    #[error("JSON parse error in {} at line {line}, column {column}: {message}", path.display())]
    Parse {
        path: PathBuf,
        line: usize,
        column: usize,
        message: String,
    },

    /// A document is valid JSON but violates the presets schema.
    #[error("Schema error in {}: {message}{}", path.display(), hint.as_ref().map(|h| format!("\n  hint: {}", h)).unwrap_or_default())]
    Schema {
        path: PathBuf,
        message: String,
        /// Optional hint for how to fix the document
        hint: Option<String>,
    },

    /// A document includes itself, directly or through other documents.
    #[error("Cyclic include detected: {}", format_include_cycle(cycle))]
    CyclicInclude { cycle: Vec<PathBuf> },

    /// A preset inherits from itself, directly or through other presets.
    #[error("Cyclic inheritance detected in {kind} presets: {}", cycle.join(" -> "))]
    CyclicInheritance { kind: PresetKind, cycle: Vec<String> },

    /// Two presets of the same kind share a name.
    #[error("Duplicate {kind} preset '{name}': defined in {first} and {second}")]
    NameCollision {
        kind: PresetKind,
        name: String,
        first: PresetLocation,
        second: PresetLocation,
    },

    /// A macro reference uses a form that is not supported.
    #[error("Unknown macro: {text}")]
    UnknownMacro { text: String },

    /// A preset cannot be removed because other presets depend on it.
    #[error("Cannot remove {kind} preset '{name}': still referenced by {}", dependents.join(", "))]
    DanglingReference {
        kind: PresetKind,
        name: String,
        dependents: Vec<String>,
    },

    /// Another process holds the write lock on a document.
    #[error("Lock contention: {} is being written by another process", path.display())]
    LockContention { path: PathBuf },

    /// The document changed on disk after it was loaded.
    #[error("{} was modified by another process since it was loaded", path.display())]
    StaleDocument { path: PathBuf },

    /// Any other I/O failure, with the path it happened on.
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// The category of an [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    NotFound,
    ParseError,
    SchemaError,
    CyclicInclude,
    CyclicInheritance,
    NameCollision,
    UnknownMacro,
    DanglingReference,
    LockContention,
    StaleDocument,
    Io,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::NotFound => "not-found",
            ErrorKind::ParseError => "parse-error",
            ErrorKind::SchemaError => "schema-error",
            ErrorKind::CyclicInclude => "cyclic-include",
            ErrorKind::CyclicInheritance => "cyclic-inheritance",
            ErrorKind::NameCollision => "name-collision",
            ErrorKind::UnknownMacro => "unknown-macro",
            ErrorKind::DanglingReference => "dangling-reference",
            ErrorKind::LockContention => "lock-contention",
            ErrorKind::StaleDocument => "stale-document",
            ErrorKind::Io => "io",
        };
        f.write_str(name)
    }
}

/// Process exit codes returned by the `cmpreset` binary.
pub mod exit_codes {
    /// The command completed successfully.
    pub const SUCCESS: i32 = 0;
    /// Unclassified failure, including I/O errors.
    pub const GENERAL: i32 = 1;
    /// Invalid command-line usage (emitted by clap).
    pub const USAGE: i32 = 2;
    /// A document or preset does not exist.
    pub const NOT_FOUND: i32 = 3;
    /// A document is malformed or violates the schema.
    pub const INVALID_DOCUMENT: i32 = 4;
    /// The preset graph is inconsistent (cycles, collisions, dangling references, bad macros).
    pub const STRUCTURE: i32 = 5;
    /// Another process is writing the user document, or wrote it since it was loaded.
    pub const LOCKED: i32 = 6;
}

impl Error {
    /// Returns the category of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::FileNotFound { .. } | Error::PresetNotFound { .. } => ErrorKind::NotFound,
            Error::Parse { .. } => ErrorKind::ParseError,
            Error::Schema { .. } => ErrorKind::SchemaError,
            Error::CyclicInclude { .. } => ErrorKind::CyclicInclude,
            Error::CyclicInheritance { .. } => ErrorKind::CyclicInheritance,
            Error::NameCollision { .. } => ErrorKind::NameCollision,
            Error::UnknownMacro { .. } => ErrorKind::UnknownMacro,
            Error::DanglingReference { .. } => ErrorKind::DanglingReference,
            Error::LockContention { .. } => ErrorKind::LockContention,
            Error::StaleDocument { .. } => ErrorKind::StaleDocument,
            Error::Io { .. } => ErrorKind::Io,
        }
    }

    /// Returns the process exit code the CLI should use for this error.
    pub fn exit_code(&self) -> i32 {
        match self.kind() {
            ErrorKind::NotFound => exit_codes::NOT_FOUND,
            ErrorKind::ParseError | ErrorKind::SchemaError => exit_codes::INVALID_DOCUMENT,
            ErrorKind::CyclicInclude
            | ErrorKind::CyclicInheritance
            | ErrorKind::NameCollision
            | ErrorKind::UnknownMacro
            | ErrorKind::DanglingReference => exit_codes::STRUCTURE,
            ErrorKind::LockContention | ErrorKind::StaleDocument => exit_codes::LOCKED,
            ErrorKind::Io => exit_codes::GENERAL,
        }
    }

    /// Builds an I/O error, mapping `NotFound` onto [`Error::FileNotFound`].
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        if source.kind() == std::io::ErrorKind::NotFound {
            Error::FileNotFound { path }
        } else {
            Error::Io { path, source }
        }
    }

    /// Builds a schema error without a hint.
    pub fn schema(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Error::Schema {
            path: path.into(),
            message: message.into(),
            hint: None,
        }
    }
}

fn format_include_cycle(cycle: &[PathBuf]) -> String {
    cycle
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(" -> ")
}

/// One finding of an offline validation run.
///
/// Unlike [`Error`], problems are plain data so they can be collected,
/// compared, and deduplicated. `subjects` names what the problem is about
/// (preset kinds and names, paths) without any document position, so the
/// same finding can be recognized after an edit has moved presets around.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Problem {
    pub kind: ErrorKind,
    pub message: String,
    pub subjects: Vec<String>,
}

impl Problem {
    /// Replaces the subjects derived from the error.
    pub fn about<I, S>(mut self, subjects: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.subjects = subjects.into_iter().map(Into::into).collect();
        self
    }

    /// Whether `other` reports the same finding, ignoring the wording.
    pub fn same_finding(&self, other: &Problem) -> bool {
        self.kind == other.kind && self.subjects == other.subjects
    }
}

impl From<&Error> for Problem {
    fn from(error: &Error) -> Self {
        Self {
            kind: error.kind(),
            message: error.to_string(),
            subjects: subjects_of(error),
        }
    }
}

impl From<Error> for Problem {
    fn from(error: Error) -> Self {
        Self::from(&error)
    }
}

fn subjects_of(error: &Error) -> Vec<String> {
    fn sorted(mut items: Vec<String>) -> Vec<String> {
        items.sort();
        items.dedup();
        items
    }

    match error {
        Error::FileNotFound { path }
        | Error::LockContention { path }
        | Error::StaleDocument { path }
        | Error::Io { path, .. } => vec![path.display().to_string()],
        Error::Parse { path, message, .. } | Error::Schema { path, message, .. } => {
            vec![path.display().to_string(), message.clone()]
        }
        Error::PresetNotFound { kind, name, .. }
        | Error::NameCollision { kind, name, .. }
        | Error::DanglingReference { kind, name, .. } => vec![kind.to_string(), name.clone()],
        Error::CyclicInclude { cycle } => sorted(cycle.iter().map(|p| p.display().to_string()).collect()),
        Error::CyclicInheritance { kind, cycle } => {
            let mut subjects = vec![kind.to_string()];
            subjects.extend(sorted(cycle.clone()));
            subjects
        }
        Error::UnknownMacro { text } => vec![text.clone()],
    }
}

impl fmt::Display for Problem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.kind, self.message)
    }
}

/// A convenient type alias for `Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;
