//! Default values for cmpreset.
//!
//! This module centralizes file names, the supported `version` range, the
//! per-version feature gates of the presets format, and the canonical key
//! orders used when a new key has to be inserted into an existing document.

use std::ops::RangeInclusive;

/// Conventional name of the project (shared, read-only) presets document.
pub const PROJECT_PRESETS_FILENAME: &str = "CMakePresets.json";

/// Conventional name of the user (local, read-write) presets document.
pub const USER_PRESETS_FILENAME: &str = "CMakeUserPresets.json";

/// Document versions this tool understands.
pub const SUPPORTED_VERSIONS: RangeInclusive<u64> = 1..=10;

/// Version used for a freshly created user document when there is no
/// project document to copy it from.
pub const DEFAULT_DOCUMENT_VERSION: u64 = 6;

/// Lowest version allowing the `include` field.
pub const INCLUDE_MIN_VERSION: u64 = 4;

/// Lowest version allowing the `condition` field on presets.
pub const CONDITION_MIN_VERSION: u64 = 3;

/// Lowest version allowing `$penv{}` references.
pub const PENV_MIN_VERSION: u64 = 3;

/// Lowest version allowing `${fileDir}` references.
pub const FILE_DIR_MIN_VERSION: u64 = 4;

/// Lowest version allowing `${pathListSep}` references.
pub const PATH_LIST_SEP_MIN_VERSION: u64 = 5;

/// Suffix appended to a project preset's name when a user override has to be
/// synthesized for it (`<name>-user`).
pub const DEFAULT_OVERRIDE_SUFFIX: &str = "user";

/// Canonical order of the recognized top-level keys of a presets document.
pub const DOCUMENT_KEY_ORDER: &[&str] = &[
    "$schema",
    "version",
    "cmakeMinimumRequired",
    "include",
    "vendor",
    "configurePresets",
    "buildPresets",
    "testPresets",
    "packagePresets",
    "workflowPresets",
];

/// Canonical order of the recognized keys of a single preset.
pub const PRESET_KEY_ORDER: &[&str] = &[
    "name",
    "displayName",
    "description",
    "hidden",
    "inherits",
    "condition",
    "vendor",
    "configurePreset",
    "inheritConfigureEnvironment",
    "generator",
    "architecture",
    "toolset",
    "toolchainFile",
    "binaryDir",
    "installDir",
    "cmakeExecutable",
    "cacheVariables",
    "environment",
    "warnings",
    "errors",
    "debug",
    "trace",
    "jobs",
    "targets",
    "configuration",
    "cleanFirst",
    "verbose",
    "nativeToolOptions",
    "output",
    "filter",
    "execution",
    "generators",
    "configurations",
    "variables",
    "packageName",
    "packageVersion",
    "packageDirectory",
    "steps",
];

/// Preset fields that describe the preset itself and are never inherited.
pub const NON_INHERITED_FIELDS: &[&str] = &[
    "name",
    "hidden",
    "inherits",
    "displayName",
    "description",
    "vendor",
    "condition",
];

/// Preset fields merged key-by-key along the inheritance chain.
pub const MAPPING_FIELDS: &[&str] = &["cacheVariables", "environment"];

/// Preset fields that are never macro-expanded.
pub const UNEXPANDED_FIELDS: &[&str] = &["generator", "configurePreset", "steps", "vendor"];
