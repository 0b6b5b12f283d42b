//! # Catalog Configuration
//!
//! [`CatalogConfig`] is everything the engine needs from its caller: where the
//! two presets documents live, which directory counts as `${sourceDir}`, an
//! immutable snapshot of the environment, and the vendor key/value bag used by
//! `$vendor{}` references.
//!
//! The library never reads the process environment or the current directory
//! on its own. The binary builds a snapshot once at startup and passes it in,
//! which keeps macro expansion deterministic under test.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde_json::{Map, Value};

use crate::defaults::{PROJECT_PRESETS_FILENAME, USER_PRESETS_FILENAME};
use crate::error::{Error, Result};
use crate::filesystem;

/// Immutable environment snapshot (variable name to value).
pub type Environment = BTreeMap<String, String>;

/// Inputs of a catalog session.
#[derive(Debug, Clone)]
pub struct CatalogConfig {
    /// The project document, if the project has one.
    pub project_path: Option<PathBuf>,
    /// The user document; created on first save if missing.
    pub user_path: PathBuf,
    /// Value of `${sourceDir}`.
    pub source_dir: PathBuf,
    /// Environment snapshot consulted by `$env{}` and `$penv{}`.
    pub environment: Environment,
    /// Values for `$vendor{}` references.
    pub vendor: Map<String, Value>,
}

impl CatalogConfig {
    /// Creates a configuration with the conventional document names under
    /// `source_dir`, an empty environment, and no vendor values.
    pub fn new(source_dir: impl Into<PathBuf>) -> Self {
        let source_dir = source_dir.into();
        Self {
            project_path: Some(source_dir.join(PROJECT_PRESETS_FILENAME)),
            user_path: source_dir.join(USER_PRESETS_FILENAME),
            source_dir,
            environment: Environment::new(),
            vendor: Map::new(),
        }
    }

    /// Like [`CatalogConfig::new`], but drops the project path when no
    /// project document exists next to the user document.
    pub fn discover(source_dir: impl Into<PathBuf>) -> Self {
        let mut config = Self::new(source_dir);
        if let Some(project) = &config.project_path {
            if !project.exists() {
                config.project_path = None;
            }
        }
        config
    }

    pub fn with_project_path(mut self, path: Option<PathBuf>) -> Self {
        self.project_path = path;
        self
    }

    pub fn with_user_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.user_path = path.into();
        self
    }

    pub fn with_environment<I, K, V>(mut self, vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.environment = vars
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        self
    }

    pub fn with_vendor(mut self, vendor: Map<String, Value>) -> Self {
        self.vendor = vendor;
        self
    }

    /// Loads the vendor bag from a JSON file holding a single object.
    pub fn with_vendor_file(self, path: &Path) -> Result<Self> {
        let text = filesystem::read_text(path)?;
        let value: Value = serde_json::from_str(&text).map_err(|e| Error::Parse {
            path: path.to_path_buf(),
            line: e.line(),
            column: e.column(),
            message: e.to_string(),
        })?;
        match value {
            Value::Object(map) => Ok(self.with_vendor(map)),
            _ => Err(Error::schema(path, "vendor file must contain a JSON object")),
        }
    }
}
