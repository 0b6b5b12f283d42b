//! # CMake Presets Library
//!
//! This library resolves and edits CMake presets documents
//! (`CMakePresets.json` and `CMakeUserPresets.json`). It is designed to be used
//! by the `cmpreset` command-line tool but can also be embedded in other build
//! tooling that needs the fully merged view of a preset.
//!
//! ## Quick Example
//!
//! ```
//! use std::path::Path;
//! use cmpreset::document::{DocumentSet, PresetDocument};
//! use cmpreset::preset::PresetKind;
//! use cmpreset::resolve::{InheritanceGraph, ResolveOptions};
//! use cmpreset::config::CatalogConfig;
//!
//! let project = PresetDocument::parse(
//!     Path::new("/src/CMakePresets.json"),
//!     r#"{"version": 6, "configurePresets": [
//!         {"name": "base", "hidden": true, "generator": "Ninja"},
//!         {"name": "dev", "inherits": "base", "binaryDir": "${sourceDir}/build"}
//!     ]}"#,
//! ).unwrap();
//! let user = PresetDocument::empty(Path::new("/src/CMakeUserPresets.json"), 6);
//! let set = DocumentSet::from_documents(vec![project, user], 1).unwrap();
//!
//! let config = CatalogConfig::new("/src");
//! let graph = InheritanceGraph::build(&set);
//! let dev = graph
//!     .resolve(PresetKind::Configure, "dev", &ResolveOptions::from_config(&config))
//!     .unwrap();
//! assert_eq!(dev.str_field("generator"), Some("Ninja"));
//! assert_eq!(dev.str_field("binaryDir"), Some("/src/build"));
//! ```
//!
//! ## Core Concepts
//!
//! - **Documents (`document`, `filesystem`)**: loading, schema checks,
//!   `include` resolution, and locked atomic saves of presets documents.
//! - **Macros (`expand`, `condition`)**: `${...}`, `$env{}`, `$penv{}` and
//!   `$vendor{}` expansion against an injected environment snapshot, and
//!   evaluation of preset conditions.
//! - **Inheritance (`resolve`)**: the preset graph, cycle detection, and the
//!   field merge that produces a [`preset::ResolvedPreset`].
//! - **Edits (`merge`)**: validated edits that only ever rewrite the user
//!   document, creating overrides for presets the project owns.
//! - **Catalog (`catalog`)**: the façade tying these together.
//!
//! Project documents are never written. Every edit is checked against the
//! whole preset graph before the user document is saved, so a rejected edit
//! leaves the file untouched.

pub mod catalog;
pub mod condition;
pub mod config;
pub mod defaults;
pub mod document;
pub mod error;
pub mod expand;
pub mod filesystem;
pub mod merge;
pub mod output;
pub mod preset;
pub mod resolve;
pub mod suggestions;

#[cfg(test)]
mod expand_proptest;
