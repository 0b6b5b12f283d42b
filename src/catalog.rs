//! # Preset Catalog
//!
//! [`PresetCatalog`] is the entry point of the library. It loads the project
//! and user documents described by a [`CatalogConfig`], answers queries
//! through the inheritance resolver, and routes every mutation through the
//! merge engine before saving the user document.
//!
//! ## Example
//!
//! ```no_run
//! use cmpreset::catalog::PresetCatalog;
//! use cmpreset::config::CatalogConfig;
//! use cmpreset::preset::PresetKind;
//!
//! # fn main() -> cmpreset::error::Result<()> {
//! let config = CatalogConfig::discover("/path/to/project")
//!     .with_environment(std::env::vars());
//! let catalog = PresetCatalog::load(config)?;
//! for name in catalog.list(PresetKind::Configure, false) {
//!     let preset = catalog.show(PresetKind::Configure, &name)?;
//!     println!("{} -> {:?}", name, preset.str_field("binaryDir"));
//! }
//! # Ok(())
//! # }
//! ```

use log::{debug, info};
use serde_json::{Map, Value};

use crate::config::CatalogConfig;
use crate::defaults::DEFAULT_DOCUMENT_VERSION;
use crate::document::DocumentSet;
use crate::error::{Problem, Result};
use crate::merge::{Edit, EditOutcome, MergeEngine};
use crate::preset::{PresetKind, ResolvedPreset};
use crate::resolve::{Ancestry, InheritanceGraph, ResolveOptions};

/// A loaded pair of presets documents.
pub struct PresetCatalog {
    config: CatalogConfig,
    documents: DocumentSet,
}

impl PresetCatalog {
    /// Loads the documents named by `config`.
    ///
    /// Fails on the first parse or schema error; nothing is partially loaded.
    pub fn load(config: CatalogConfig) -> Result<Self> {
        let documents = DocumentSet::load(
            config.project_path.as_deref(),
            &config.user_path,
            DEFAULT_DOCUMENT_VERSION,
        )?;
        debug!(
            "Loaded {} presets documents (user document: {})",
            documents.documents().len(),
            config.user_path.display()
        );
        Ok(Self { config, documents })
    }

    pub fn config(&self) -> &CatalogConfig {
        &self.config
    }

    pub fn documents(&self) -> &DocumentSet {
        &self.documents
    }

    /// Names of the presets of `kind`, in load order.
    ///
    /// Hidden presets are left out unless `include_hidden` is set.
    pub fn list(&self, kind: PresetKind, include_hidden: bool) -> Vec<String> {
        InheritanceGraph::build(&self.documents)
            .nodes()
            .iter()
            .filter(|node| node.kind == kind && (include_hidden || !node.hidden))
            .map(|node| node.name.to_string())
            .collect()
    }

    /// Resolves a preset with macros expanded and its condition evaluated.
    pub fn show(&self, kind: PresetKind, name: &str) -> Result<ResolvedPreset> {
        let options = ResolveOptions::from_config(&self.config);
        InheritanceGraph::build(&self.documents).resolve(kind, name, &options)
    }

    /// Resolves a preset without expanding macros.
    pub fn show_unexpanded(&self, kind: PresetKind, name: &str) -> Result<ResolvedPreset> {
        let options = ResolveOptions::from_config(&self.config).offline();
        InheritanceGraph::build(&self.documents).resolve(kind, name, &options)
    }

    /// The `inherits` tree above a preset.
    pub fn ancestry(&self, kind: PresetKind, name: &str) -> Result<Ancestry> {
        InheritanceGraph::build(&self.documents).ancestry(kind, name)
    }

    /// Every structural problem of the loaded documents.
    ///
    /// Nothing is expanded against the environment, so this works offline.
    pub fn validate(&self) -> Vec<Problem> {
        InheritanceGraph::build(&self.documents).validate()
    }

    /// Hidden presets that nothing inherits from or refers to, as
    /// `(kind, name)` pairs in load order.
    pub fn unused_hidden(&self) -> Vec<(PresetKind, String)> {
        let graph = InheritanceGraph::build(&self.documents);
        graph
            .unused_hidden()
            .into_iter()
            .map(|idx| {
                let node = graph.node(idx);
                (node.kind, node.name.to_string())
            })
            .collect()
    }

    /// Adds a preset to the user document.
    pub fn add(&mut self, kind: PresetKind, preset: Map<String, Value>) -> Result<EditOutcome> {
        self.apply(&Edit::AddPreset { kind, preset })
    }

    /// Sets one field of a preset, writing to an override when the preset is
    /// not defined in the user document.
    pub fn update(
        &mut self,
        kind: PresetKind,
        name: &str,
        field: &str,
        value: Value,
        override_name: Option<String>,
    ) -> Result<EditOutcome> {
        self.apply(&Edit::UpdatePresetField {
            kind,
            name: name.to_string(),
            field: field.to_string(),
            value: Some(value),
            override_name,
        })
    }

    /// Removes one field of a user preset (or of its override).
    pub fn unset(
        &mut self,
        kind: PresetKind,
        name: &str,
        field: &str,
        override_name: Option<String>,
    ) -> Result<EditOutcome> {
        self.apply(&Edit::UpdatePresetField {
            kind,
            name: name.to_string(),
            field: field.to_string(),
            value: None,
            override_name,
        })
    }

    /// Replaces the parents of a preset.
    pub fn set_inherits(
        &mut self,
        kind: PresetKind,
        name: &str,
        inherits: Vec<String>,
        override_name: Option<String>,
    ) -> Result<EditOutcome> {
        self.apply(&Edit::SetInherits {
            kind,
            name: name.to_string(),
            inherits,
            override_name,
        })
    }

    /// Removes a user preset, and with `cascade` everything that depends on it.
    pub fn remove(&mut self, kind: PresetKind, name: &str, cascade: bool) -> Result<EditOutcome> {
        self.apply(&Edit::RemovePreset {
            kind,
            name: name.to_string(),
            cascade,
        })
    }

    /// Validates `edit`, saves the updated user document, then commits it in memory.
    ///
    /// If validation or the save fails, both the file and the loaded
    /// document are left as they were. The save also fails with
    /// [`crate::error::Error::StaleDocument`] when another process has written the user
    /// document since this catalog loaded it.
    pub fn apply(&mut self, edit: &Edit) -> Result<EditOutcome> {
        let mut outcome = MergeEngine::new(&self.documents).apply(edit)?;
        outcome.document.save_over(self.documents.user())?;
        self.documents.replace_user(outcome.document.clone());
        info!("Saved {}", self.config.user_path.display());
        Ok(outcome)
    }
}
