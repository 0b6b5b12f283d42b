//! Preset data model shared by the resolver, merge engine, and catalog.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::Serialize;
use serde_json::{Map, Value};

/// The stage a preset configures.
///
/// Each kind lives in its own top-level array of a presets document, and
/// preset names only have to be unique within one kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PresetKind {
    Configure,
    Build,
    Test,
    Package,
    Workflow,
}

impl PresetKind {
    /// All kinds, in document order.
    pub const ALL: [PresetKind; 5] = [
        PresetKind::Configure,
        PresetKind::Build,
        PresetKind::Test,
        PresetKind::Package,
        PresetKind::Workflow,
    ];

    /// The document key holding presets of this kind.
    pub fn document_key(self) -> &'static str {
        match self {
            PresetKind::Configure => "configurePresets",
            PresetKind::Build => "buildPresets",
            PresetKind::Test => "testPresets",
            PresetKind::Package => "packagePresets",
            PresetKind::Workflow => "workflowPresets",
        }
    }

    /// The kind stored under a document key, if any.
    pub fn from_document_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.document_key() == key)
    }

    /// Lowest document `version` that may contain presets of this kind.
    pub fn min_version(self) -> u64 {
        match self {
            PresetKind::Configure => 1,
            PresetKind::Build | PresetKind::Test => 2,
            PresetKind::Package | PresetKind::Workflow => 6,
        }
    }

    /// Whether presets of this kind name a configure preset to run against.
    pub fn has_configure_preset(self) -> bool {
        matches!(
            self,
            PresetKind::Build | PresetKind::Test | PresetKind::Package
        )
    }
}

impl fmt::Display for PresetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PresetKind::Configure => "configure",
            PresetKind::Build => "build",
            PresetKind::Test => "test",
            PresetKind::Package => "package",
            PresetKind::Workflow => "workflow",
        };
        f.write_str(name)
    }
}

impl FromStr for PresetKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "configure" => Ok(PresetKind::Configure),
            "build" => Ok(PresetKind::Build),
            "test" => Ok(PresetKind::Test),
            "package" => Ok(PresetKind::Package),
            "workflow" => Ok(PresetKind::Workflow),
            _ => Err(format!(
                "Unknown preset kind '{}'. Use: configure, build, test, package, or workflow",
                s
            )),
        }
    }
}

/// Where a preset is defined: the document path and its index in the kind's array.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct PresetLocation {
    pub path: PathBuf,
    pub index: usize,
}

impl PresetLocation {
    pub fn new(path: impl Into<PathBuf>, index: usize) -> Self {
        Self {
            path: path.into(),
            index,
        }
    }

    /// Directory containing the defining document (the `${fileDir}` of the preset).
    pub fn file_dir(&self) -> &Path {
        self.path.parent().unwrap_or_else(|| Path::new(""))
    }
}

impl fmt::Display for PresetLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}]", self.path.display(), self.index)
    }
}

/// A preset with its whole inheritance chain merged in.
///
/// Produced fresh by every query and never written back to disk. `fields`
/// holds every inheritable field in merge order; `name`, `hidden`, and
/// `inherits` describe the preset itself.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedPreset {
    pub name: String,
    #[serde(skip)]
    pub kind: PresetKind,
    pub hidden: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub inherits: Vec<String>,
    /// Every preset that contributed fields, most distant ancestor first,
    /// ending with the preset itself.
    #[serde(skip)]
    pub chain: Vec<String>,
    #[serde(skip)]
    pub location: PresetLocation,
    /// The effective condition (own, or the nearest ancestor's).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub condition: Option<Value>,
    /// Result of evaluating `condition`; `None` when macros were not expanded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl ResolvedPreset {
    /// Looks up a merged field.
    pub fn field(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// Looks up a merged field as a string.
    pub fn str_field(&self, key: &str) -> Option<&str> {
        self.fields.get(key).and_then(Value::as_str)
    }
}
