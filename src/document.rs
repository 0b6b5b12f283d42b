//! # Preset Documents
//!
//! Loading, schema checking, and saving of `CMakePresets.json` /
//! `CMakeUserPresets.json` documents, plus the [`DocumentSet`] of every
//! document reachable from them through `include`.
//!
//! A [`PresetDocument`] keeps the whole JSON object it was parsed from, in its
//! original key order (`serde_json` is built with `preserve_order`). Fields the
//! tool does not recognize are never interpreted and are written back exactly
//! where they were. A document also remembers the text it was loaded from:
//! while its content is unchanged it is written back as that text, so an
//! unedited document round-trips byte for byte (escapes included).

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use log::{debug, info, warn};
use serde_json::{Map, Value};

use crate::defaults::{
    DOCUMENT_KEY_ORDER, INCLUDE_MIN_VERSION, SUPPORTED_VERSIONS,
};
use crate::error::{Error, Result};
use crate::filesystem::{self, WriteLock};
use crate::preset::{PresetKind, PresetLocation};

/// One presets document held in memory.
#[derive(Debug, Clone, PartialEq)]
pub struct PresetDocument {
    path: PathBuf,
    version: u64,
    root: Map<String, Value>,
    source: Option<SourceText>,
}

/// The text a document was read from (or last written as).
#[derive(Debug, Clone, PartialEq)]
struct SourceText {
    text: String,
    /// The canonical rendering of the root at the time, used to tell
    /// whether the root has changed since.
    rendered: String,
}

impl PresetDocument {
    /// Loads and checks the document at `path`.
    pub fn load(path: &Path) -> Result<Self> {
        debug!("Loading presets document {}", path.display());
        let text = filesystem::read_text(path)?;
        Self::parse(path, &text)
    }

    /// Parses document text; `path` is used for error reporting and includes.
    pub fn parse(path: &Path, text: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(text).map_err(|e| Error::Parse {
            path: path.to_path_buf(),
            line: e.line(),
            column: e.column(),
            message: e.to_string(),
        })?;
        let mut document = match value {
            Value::Object(root) => Self::from_root(path, root)?,
            _ => return Err(Error::schema(path, "document root must be a JSON object")),
        };
        document.source = Some(SourceText {
            text: text.to_string(),
            rendered: document.render()?,
        });
        Ok(document)
    }

    /// Builds a document from an already-parsed root object, checking the schema.
    pub fn from_root(path: &Path, root: Map<String, Value>) -> Result<Self> {
        let version = check_version(path, &root)?;
        check_schema(path, version, &root)?;
        Ok(Self {
            path: path.to_path_buf(),
            version,
            root,
            source: None,
        })
    }

    /// This document with `root` as its content, checked against the schema.
    ///
    /// The loaded text is carried over, so an edit that leaves the content as
    /// it was still writes the document back unchanged.
    pub fn with_root(&self, root: Map<String, Value>) -> Result<Self> {
        let mut document = Self::from_root(&self.path, root)?;
        document.source = self.source.clone();
        Ok(document)
    }

    /// An empty document (`{"version": N}`) that does not exist on disk yet.
    pub fn empty(path: &Path, version: u64) -> Self {
        let mut root = Map::new();
        root.insert("version".to_string(), Value::from(version));
        Self {
            path: path.to_path_buf(),
            version,
            root,
            source: None,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    /// The raw root object, including passthrough fields.
    pub fn root(&self) -> &Map<String, Value> {
        &self.root
    }

    /// Consumes the document, returning its raw root object.
    pub fn into_root(self) -> Map<String, Value> {
        self.root
    }

    /// Relative paths listed in `include`, in order.
    pub fn includes(&self) -> Vec<&str> {
        self.root
            .get("include")
            .and_then(Value::as_array)
            .map(|entries| entries.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default()
    }

    /// Presets of `kind` in document order (empty if the kind is absent).
    pub fn presets(&self, kind: PresetKind) -> &[Value] {
        self.root
            .get(kind.document_key())
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Index of the preset named `name` within the `kind` array.
    pub fn preset_index(&self, kind: PresetKind, name: &str) -> Option<usize> {
        self.presets(kind)
            .iter()
            .position(|preset| preset_name(preset) == Some(name))
    }

    /// The raw preset named `name`, if this document defines it.
    pub fn preset(&self, kind: PresetKind, name: &str) -> Option<&Map<String, Value>> {
        self.preset_index(kind, name)
            .and_then(|idx| self.presets(kind)[idx].as_object())
    }

    /// Serializes the document.
    ///
    /// An unchanged document comes back as the exact text it was loaded
    /// from. Otherwise it is rendered with two-space indentation and a
    /// trailing newline.
    pub fn to_json_string(&self) -> Result<String> {
        let rendered = self.render()?;
        match &self.source {
            Some(source) if source.rendered == rendered => Ok(source.text.clone()),
            _ => Ok(rendered),
        }
    }

    fn render(&self) -> Result<String> {
        let mut text = serde_json::to_string_pretty(&self.root).map_err(|e| Error::Io {
            path: self.path.clone(),
            source: e.into(),
        })?;
        text.push('\n');
        Ok(text)
    }

    /// Writes the document back to its own path.
    pub fn save(&self) -> Result<()> {
        self.save_to(&self.path)
    }

    /// Writes the document to `path` atomically, holding the path's write lock.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        let text = self.to_json_string()?;
        let _lock = WriteLock::acquire(path)?;
        filesystem::write_atomic(path, text.as_bytes())?;
        info!("Wrote {}", path.display());
        Ok(())
    }

    /// Writes the document over `loaded`, the version of the same file this
    /// session started from.
    ///
    /// Under the write lock the file is read again; if it no longer holds
    /// what `loaded` was read from (or exists when `loaded` did not), another
    /// process wrote it in the meantime and the save fails with
    /// [`Error::StaleDocument`], leaving the file as it is. On success this
    /// document remembers the written text.
    pub fn save_over(&mut self, loaded: &PresetDocument) -> Result<()> {
        let text = self.to_json_string()?;
        let _lock = WriteLock::acquire(&self.path)?;

        let on_disk = match filesystem::read_text(&self.path) {
            Ok(current) => Some(current),
            Err(Error::FileNotFound { .. }) => None,
            Err(e) => return Err(e),
        };
        let expected = loaded.source.as_ref().map(|source| source.text.as_str());
        if on_disk.as_deref() != expected {
            warn!("{} changed on disk since it was loaded", self.path.display());
            return Err(Error::StaleDocument {
                path: self.path.clone(),
            });
        }

        filesystem::write_atomic(&self.path, text.as_bytes())?;
        info!("Wrote {}", self.path.display());
        self.source = Some(SourceText {
            rendered: self.render()?,
            text,
        });
        Ok(())
    }
}

/// Name of a raw preset value.
pub fn preset_name(preset: &Value) -> Option<&str> {
    preset.get("name").and_then(Value::as_str)
}

/// Parents of a raw preset, normalizing the string and array forms of `inherits`.
pub fn preset_inherits(preset: &Map<String, Value>) -> Vec<String> {
    match preset.get("inherits") {
        Some(Value::String(parent)) => vec![parent.clone()],
        Some(Value::Array(parents)) => parents
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect(),
        _ => Vec::new(),
    }
}

/// Whether a raw preset is marked `hidden`.
pub fn preset_hidden(preset: &Map<String, Value>) -> bool {
    preset
        .get("hidden")
        .and_then(Value::as_bool)
        .unwrap_or(false)
}

/// Inserts `key` into `map`, keeping existing keys where they are.
///
/// An existing key is overwritten in place. A new key is placed after the
/// last existing key that precedes it in `order`; keys missing from `order`
/// go to the end.
pub fn insert_ordered(map: &mut Map<String, Value>, key: &str, value: Value, order: &[&str]) {
    if let Some(existing) = map.get_mut(key) {
        *existing = value;
        return;
    }

    let rank = match order.iter().position(|k| *k == key) {
        Some(rank) => rank,
        None => {
            map.insert(key.to_string(), value);
            return;
        }
    };

    let insert_after = map
        .keys()
        .enumerate()
        .filter(|(_, k)| {
            order
                .iter()
                .position(|o| o == k)
                .is_some_and(|r| r < rank)
        })
        .map(|(i, _)| i)
        .last();
    let position = insert_after.map(|i| i + 1).unwrap_or(0);

    let old = std::mem::take(map);
    let mut pending = Some(value);
    for (i, (k, v)) in old.into_iter().enumerate() {
        if i == position {
            if let Some(value) = pending.take() {
                map.insert(key.to_string(), value);
            }
        }
        map.insert(k, v);
    }
    if let Some(value) = pending {
        map.insert(key.to_string(), value);
    }
}

fn check_version(path: &Path, root: &Map<String, Value>) -> Result<u64> {
    let version = match root.get("version") {
        Some(value) => value.as_u64().ok_or_else(|| Error::Schema {
            path: path.to_path_buf(),
            message: format!("'version' must be a non-negative integer, found {}", value),
            hint: None,
        })?,
        None => {
            return Err(Error::Schema {
                path: path.to_path_buf(),
                message: "missing required field 'version'".to_string(),
                hint: Some("add \"version\": 6 at the top of the document".to_string()),
            })
        }
    };

    if !SUPPORTED_VERSIONS.contains(&version) {
        return Err(Error::Schema {
            path: path.to_path_buf(),
            message: format!("unsupported version {}", version),
            hint: Some(format!(
                "supported versions are {} through {}",
                SUPPORTED_VERSIONS.start(),
                SUPPORTED_VERSIONS.end()
            )),
        });
    }
    Ok(version)
}

fn check_schema(path: &Path, version: u64, root: &Map<String, Value>) -> Result<()> {
    if let Some(include) = root.get("include") {
        if version < INCLUDE_MIN_VERSION {
            return Err(Error::schema(
                path,
                format!(
                    "'include' requires version {} or later (document is version {})",
                    INCLUDE_MIN_VERSION, version
                ),
            ));
        }
        let valid = include
            .as_array()
            .is_some_and(|entries| entries.iter().all(Value::is_string));
        if !valid {
            return Err(Error::schema(path, "'include' must be an array of strings"));
        }
    }

    if let Some(minimum) = root.get("cmakeMinimumRequired") {
        let valid = minimum.as_object().is_some_and(|parts| {
            parts
                .iter()
                .all(|(k, v)| !matches!(k.as_str(), "major" | "minor" | "patch") || v.is_u64())
        });
        if !valid {
            return Err(Error::schema(
                path,
                "'cmakeMinimumRequired' must be an object with integer major/minor/patch",
            ));
        }
    }

    for kind in PresetKind::ALL {
        let Some(presets) = root.get(kind.document_key()) else {
            continue;
        };
        if version < kind.min_version() {
            return Err(Error::schema(
                path,
                format!(
                    "'{}' requires version {} or later (document is version {})",
                    kind.document_key(),
                    kind.min_version(),
                    version
                ),
            ));
        }
        let Some(presets) = presets.as_array() else {
            return Err(Error::schema(
                path,
                format!("'{}' must be an array", kind.document_key()),
            ));
        };
        for (index, preset) in presets.iter().enumerate() {
            check_preset(path, kind, index, preset)?;
        }
    }
    Ok(())
}

fn check_preset(path: &Path, kind: PresetKind, index: usize, preset: &Value) -> Result<()> {
    let location = PresetLocation::new(path, index);
    let Some(object) = preset.as_object() else {
        return Err(Error::schema(
            path,
            format!("{} preset at {} must be an object", kind, location),
        ));
    };

    match object.get("name").and_then(Value::as_str) {
        Some(name) if !name.is_empty() => {}
        _ => {
            return Err(Error::schema(
                path,
                format!("{} preset at {} needs a non-empty string 'name'", kind, location),
            ))
        }
    }

    match object.get("inherits") {
        None | Some(Value::String(_)) => {}
        Some(Value::Array(parents)) if parents.iter().all(Value::is_string) => {}
        Some(_) => {
            return Err(Error::schema(
                path,
                format!(
                    "'inherits' of {} preset at {} must be a string or an array of strings",
                    kind, location
                ),
            ))
        }
    }

    if let Some(hidden) = object.get("hidden") {
        if !hidden.is_boolean() {
            return Err(Error::schema(
                path,
                format!("'hidden' of {} preset at {} must be a boolean", kind, location),
            ));
        }
    }

    for mapping in ["cacheVariables", "environment"] {
        if let Some(value) = object.get(mapping) {
            if !value.is_object() {
                return Err(Error::schema(
                    path,
                    format!("'{}' of {} preset at {} must be an object", mapping, kind, location),
                ));
            }
        }
    }
    Ok(())
}

/// Every document reachable from the project and user documents.
///
/// Documents are kept in load order: the project document and everything it
/// includes (depth-first, in `include` order), then the user document and its
/// includes. A document reached twice is loaded once. Only the user document
/// is ever modified.
#[derive(Debug, Clone)]
pub struct DocumentSet {
    documents: Vec<PresetDocument>,
    user: usize,
}

impl DocumentSet {
    /// Loads the project document (if any) and the user document, following
    /// includes from both.
    ///
    /// The user document implicitly includes the project document. When the
    /// user document does not exist yet, an empty one is used in its place,
    /// with the project document's version (or `default_version`).
    pub fn load(project: Option<&Path>, user: &Path, default_version: u64) -> Result<Self> {
        let mut loader = IncludeLoader::default();

        let mut project_version = None;
        if let Some(project_path) = project {
            let document = PresetDocument::load(project_path)?;
            project_version = Some(document.version());
            loader.visit(document)?;
        }

        let user_document = if user.exists() {
            PresetDocument::load(user)?
        } else {
            let version = project_version.unwrap_or(default_version);
            debug!(
                "User document {} does not exist yet; starting empty (version {})",
                user.display(),
                version
            );
            PresetDocument::empty(user, version)
        };
        let user_index = loader.visit(user_document)?.ok_or_else(|| {
            Error::schema(user, "the user document is already part of the project include graph")
        })?;

        Ok(Self {
            documents: loader.documents,
            user: user_index,
        })
    }

    /// Follows the includes of a single root document.
    ///
    /// The root is treated as the mutable document of the resulting set.
    pub fn resolve_includes(root: PresetDocument) -> Result<Self> {
        let mut loader = IncludeLoader::default();
        let user = loader.visit(root)?.unwrap_or(0);
        Ok(Self {
            documents: loader.documents,
            user,
        })
    }

    /// A set of already-loaded documents, in load order.
    ///
    /// `user` is the index of the mutable document. Includes are not followed.
    pub fn from_documents(documents: Vec<PresetDocument>, user: usize) -> Result<Self> {
        if user >= documents.len() {
            return Err(Error::schema(
                PathBuf::new(),
                format!(
                    "user document index {} is out of range for {} document(s)",
                    user,
                    documents.len()
                ),
            ));
        }
        Ok(Self { documents, user })
    }

    /// All documents in load order.
    pub fn documents(&self) -> &[PresetDocument] {
        &self.documents
    }

    /// The mutable user document.
    pub fn user(&self) -> &PresetDocument {
        &self.documents[self.user]
    }

    /// Index of the user document within [`DocumentSet::documents`].
    pub fn user_index(&self) -> usize {
        self.user
    }

    /// Whether `path` is the user document.
    pub fn is_user_document(&self, path: &Path) -> bool {
        self.user().path() == path
    }

    /// A copy of this set with the user document replaced.
    pub fn with_user(&self, document: PresetDocument) -> Self {
        let mut set = self.clone();
        set.documents[self.user] = document;
        set
    }

    /// Replaces the user document in place.
    pub fn replace_user(&mut self, document: PresetDocument) {
        self.documents[self.user] = document;
    }
}

#[derive(Default)]
struct IncludeLoader {
    documents: Vec<PresetDocument>,
    seen: HashSet<PathBuf>,
    stack: Vec<PathBuf>,
}

impl IncludeLoader {
    /// Adds `document` and, recursively, everything it includes. Returns the
    /// document's index, or `None` when it had already been loaded.
    fn visit(&mut self, document: PresetDocument) -> Result<Option<usize>> {
        let key = canonical(document.path());
        if self.stack.contains(&key) {
            let mut cycle = self.stack.clone();
            cycle.push(key);
            return Err(Error::CyclicInclude { cycle });
        }
        if !self.seen.insert(key.clone()) {
            debug!("Skipping already loaded document {}", document.path().display());
            return Ok(None);
        }

        let base_dir = document
            .path()
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        let includes: Vec<PathBuf> = document
            .includes()
            .into_iter()
            .map(|include| base_dir.join(include))
            .collect();

        let index = self.documents.len();
        self.documents.push(document);
        self.stack.push(key);

        for include in includes {
            let include_key = canonical(&include);
            if self.stack.contains(&include_key) {
                let mut cycle = self.stack.clone();
                cycle.push(include_key);
                return Err(Error::CyclicInclude { cycle });
            }
            if self.seen.contains(&include_key) {
                warn!("{} is included more than once", include.display());
                continue;
            }
            let included = PresetDocument::load(&include)?;
            self.visit(included)?;
        }

        self.stack.pop();
        Ok(Some(index))
    }
}

fn canonical(path: &Path) -> PathBuf {
    std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn parse(text: &str) -> Result<PresetDocument> {
        PresetDocument::parse(Path::new("/p/CMakePresets.json"), text)
    }

    mod parsing_tests {
        use super::*;

        #[test]
        fn test_parse_minimal_document() {
            let doc = parse(r#"{"version": 6}"#).unwrap();
            assert_eq!(doc.version(), 6);
            assert!(doc.presets(PresetKind::Configure).is_empty());
        }

        #[test]
        fn test_malformed_json_is_parse_error() {
            let err = parse(r#"{"version": 6,"#).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::ParseError);
        }

        #[test]
        fn test_non_object_root_is_schema_error() {
            let err = parse("[1, 2]").unwrap_err();
            assert_eq!(err.kind(), ErrorKind::SchemaError);
        }

        #[test]
        fn test_missing_version_is_schema_error() {
            let err = parse(r#"{"configurePresets": []}"#).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::SchemaError);
            assert!(err.to_string().contains("version"));
        }

        #[test]
        fn test_unsupported_version_is_checked_first() {
            // The bad preset would also be a schema error; version wins.
            let err = parse(r#"{"version": 99, "configurePresets": [42]}"#).unwrap_err();
            assert!(err.to_string().contains("unsupported version 99"));
        }

        #[test]
        fn test_include_requires_version_4() {
            let err = parse(r#"{"version": 3, "include": ["other.json"]}"#).unwrap_err();
            assert!(err.to_string().contains("'include' requires version 4"));
        }

        #[test]
        fn test_workflow_presets_require_version_6() {
            let err = parse(r#"{"version": 5, "workflowPresets": []}"#).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::SchemaError);
        }

        #[test]
        fn test_preset_without_name_is_rejected() {
            let err = parse(r#"{"version": 6, "configurePresets": [{"hidden": true}]}"#).unwrap_err();
            assert!(err.to_string().contains("non-empty string 'name'"));
        }

        #[test]
        fn test_inherits_must_be_strings() {
            let err =
                parse(r#"{"version": 6, "configurePresets": [{"name": "a", "inherits": [1]}]}"#)
                    .unwrap_err();
            assert!(err.to_string().contains("'inherits'"));
        }

        #[test]
        fn test_cache_variables_must_be_object() {
            let err = parse(
                r#"{"version": 6, "configurePresets": [{"name": "a", "cacheVariables": []}]}"#,
            )
            .unwrap_err();
            assert!(err.to_string().contains("'cacheVariables'"));
        }

        #[test]
        fn test_unknown_kinds_and_fields_are_preserved() {
            let text = r#"{"version": 6, "x-custom": {"a": 1}, "futurePresets": [{"odd": true}]}"#;
            let doc = parse(text).unwrap();
            assert_eq!(doc.root()["x-custom"]["a"], 1);
            assert!(doc.root().contains_key("futurePresets"));
        }
    }

    mod accessor_tests {
        use super::*;

        #[test]
        fn test_preset_lookup_and_inherits_forms() {
            let doc = parse(
                r#"{
                    "version": 6,
                    "configurePresets": [
                        {"name": "base", "hidden": true},
                        {"name": "one", "inherits": "base"},
                        {"name": "two", "inherits": ["one", "base"]}
                    ]
                }"#,
            )
            .unwrap();

            assert_eq!(doc.preset_index(PresetKind::Configure, "two"), Some(2));
            assert!(preset_hidden(doc.preset(PresetKind::Configure, "base").unwrap()));
            assert_eq!(
                preset_inherits(doc.preset(PresetKind::Configure, "one").unwrap()),
                vec!["base"]
            );
            assert_eq!(
                preset_inherits(doc.preset(PresetKind::Configure, "two").unwrap()),
                vec!["one", "base"]
            );
            assert!(doc.preset(PresetKind::Build, "one").is_none());
        }

        #[test]
        fn test_insert_ordered_places_key_canonically() {
            let mut map: Map<String, Value> =
                serde_json::from_str(r#"{"version": 6, "x-extra": 1, "buildPresets": []}"#).unwrap();
            insert_ordered(&mut map, "configurePresets", Value::Array(vec![]), DOCUMENT_KEY_ORDER);
            let keys: Vec<&str> = map.keys().map(String::as_str).collect();
            assert_eq!(keys, vec!["version", "configurePresets", "x-extra", "buildPresets"]);
        }

        #[test]
        fn test_insert_ordered_overwrites_in_place() {
            let mut map: Map<String, Value> =
                serde_json::from_str(r#"{"name": "a", "generator": "Make", "binaryDir": "b"}"#)
                    .unwrap();
            insert_ordered(&mut map, "generator", Value::from("Ninja"), &["name", "generator"]);
            let keys: Vec<&str> = map.keys().map(String::as_str).collect();
            assert_eq!(keys, vec!["name", "generator", "binaryDir"]);
            assert_eq!(map["generator"], "Ninja");
        }

        #[test]
        fn test_insert_ordered_unknown_key_appends() {
            let mut map: Map<String, Value> = serde_json::from_str(r#"{"name": "a"}"#).unwrap();
            insert_ordered(&mut map, "x-note", Value::from(1), &["name"]);
            assert_eq!(map.keys().last().map(String::as_str), Some("x-note"));
        }

        #[test]
        fn test_to_json_string_uses_two_spaces_and_newline() {
            let root = serde_json::from_str(r#"{"version":6,"configurePresets":[{"name":"a"}]}"#)
                .unwrap();
            let doc = PresetDocument::from_root(Path::new("/p/CMakePresets.json"), root).unwrap();
            let text = doc.to_json_string().unwrap();
            assert_eq!(
                text,
                "{\n  \"version\": 6,\n  \"configurePresets\": [\n    {\n      \"name\": \"a\"\n    }\n  ]\n}\n"
            );
        }
    }

    mod document_set_tests {
        use super::*;
        use std::fs;

        #[test]
        fn test_load_with_missing_user_document() {
            let temp = tempfile::TempDir::new().unwrap();
            let project = temp.path().join("CMakePresets.json");
            fs::write(&project, r#"{"version": 5, "configurePresets": [{"name": "a"}]}"#).unwrap();
            let user = temp.path().join("CMakeUserPresets.json");

            let set = DocumentSet::load(Some(&project), &user, 6).unwrap();
            assert_eq!(set.documents().len(), 2);
            assert_eq!(set.user().version(), 5);
            assert_eq!(set.user().path(), user.as_path());
            assert!(set.is_user_document(&user));
        }

        #[test]
        fn test_includes_are_loaded_depth_first() {
            let temp = tempfile::TempDir::new().unwrap();
            fs::create_dir(temp.path().join("presets")).unwrap();
            fs::write(
                temp.path().join("CMakePresets.json"),
                r#"{"version": 6, "include": ["presets/a.json", "presets/b.json"]}"#,
            )
            .unwrap();
            fs::write(
                temp.path().join("presets/a.json"),
                r#"{"version": 6, "include": ["c.json"]}"#,
            )
            .unwrap();
            fs::write(temp.path().join("presets/b.json"), r#"{"version": 6}"#).unwrap();
            fs::write(temp.path().join("presets/c.json"), r#"{"version": 6}"#).unwrap();

            let set = DocumentSet::load(
                Some(&temp.path().join("CMakePresets.json")),
                &temp.path().join("CMakeUserPresets.json"),
                6,
            )
            .unwrap();

            let names: Vec<String> = set
                .documents()
                .iter()
                .map(|d| d.path().file_name().unwrap().to_string_lossy().into_owned())
                .collect();
            assert_eq!(
                names,
                vec!["CMakePresets.json", "a.json", "c.json", "b.json", "CMakeUserPresets.json"]
            );
        }

        #[test]
        fn test_user_including_project_is_deduplicated() {
            let temp = tempfile::TempDir::new().unwrap();
            let project = temp.path().join("CMakePresets.json");
            let user = temp.path().join("CMakeUserPresets.json");
            fs::write(&project, r#"{"version": 6}"#).unwrap();
            fs::write(&user, r#"{"version": 6, "include": ["CMakePresets.json"]}"#).unwrap();

            let set = DocumentSet::load(Some(&project), &user, 6).unwrap();
            assert_eq!(set.documents().len(), 2);
        }

        #[test]
        fn test_cyclic_include_is_rejected() {
            let temp = tempfile::TempDir::new().unwrap();
            let a = temp.path().join("a.json");
            fs::write(&a, r#"{"version": 6, "include": ["b.json"]}"#).unwrap();
            fs::write(
                temp.path().join("b.json"),
                r#"{"version": 6, "include": ["a.json"]}"#,
            )
            .unwrap();

            let root = PresetDocument::load(&a).unwrap();
            let err = DocumentSet::resolve_includes(root).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::CyclicInclude);
            assert!(err.to_string().contains("a.json"));
            assert!(err.to_string().contains("b.json"));
        }

        #[test]
        fn test_missing_include_is_not_found() {
            let temp = tempfile::TempDir::new().unwrap();
            let root = temp.path().join("CMakePresets.json");
            fs::write(&root, r#"{"version": 6, "include": ["missing.json"]}"#).unwrap();

            let err = DocumentSet::resolve_includes(PresetDocument::load(&root).unwrap())
                .unwrap_err();
            assert_eq!(err.kind(), ErrorKind::NotFound);
        }

        #[test]
        fn test_save_then_load_roundtrip() {
            let temp = tempfile::TempDir::new().unwrap();
            let path = temp.path().join("CMakeUserPresets.json");
            let text = "{\n  \"version\": 6,\n  \"x-keep\": [\n    1,\n    2\n  ],\n  \"configurePresets\": []\n}\n";
            fs::write(&path, text).unwrap();

            let doc = PresetDocument::load(&path).unwrap();
            doc.save().unwrap();

            assert_eq!(fs::read_to_string(&path).unwrap(), text);
        }

        #[test]
        fn test_unchanged_document_keeps_source_text() {
            let text = "{\"version\": 6, \"x-url\": \"a\\/b\", \"x-name\": \"caf\\u00e9\"}\n";
            let doc = parse(text).unwrap();
            assert_eq!(doc.root()["x-name"], "café");
            assert_eq!(doc.to_json_string().unwrap(), text);
        }

        #[test]
        fn test_changed_document_is_rendered() {
            let doc = parse("{\"version\": 6}").unwrap();
            let mut root = doc.root().clone();
            root.insert("x-note".to_string(), Value::from("caf\u{e9}"));
            let doc = doc.with_root(root).unwrap();
            assert_eq!(
                doc.to_json_string().unwrap(),
                "{\n  \"version\": 6,\n  \"x-note\": \"café\"\n}\n"
            );
        }

        #[test]
        fn test_save_over_rejects_document_changed_on_disk() {
            let temp = tempfile::TempDir::new().unwrap();
            let path = temp.path().join("CMakeUserPresets.json");
            fs::write(&path, "{\"version\": 6}\n").unwrap();

            let loaded = PresetDocument::load(&path).unwrap();
            fs::write(&path, "{\"version\": 6, \"x-other\": true}\n").unwrap();

            let mut root = loaded.root().clone();
            root.insert("x-mine".to_string(), Value::Bool(true));
            let mut edited = loaded.with_root(root).unwrap();
            let err = edited.save_over(&loaded).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::StaleDocument);
            assert_eq!(
                fs::read_to_string(&path).unwrap(),
                "{\"version\": 6, \"x-other\": true}\n"
            );
        }

        #[test]
        fn test_save_over_missing_document_rejects_one_created_since() {
            let temp = tempfile::TempDir::new().unwrap();
            let path = temp.path().join("CMakeUserPresets.json");
            let loaded = PresetDocument::empty(&path, 6);
            fs::write(&path, "{\"version\": 6}\n").unwrap();

            let err = loaded.clone().save_over(&loaded).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::StaleDocument);
        }

        #[test]
        fn test_save_over_tracks_written_text() {
            let temp = tempfile::TempDir::new().unwrap();
            let path = temp.path().join("CMakeUserPresets.json");
            let loaded = PresetDocument::empty(&path, 6);

            let mut first = loaded.clone();
            first.save_over(&loaded).unwrap();
            let mut root = first.root().clone();
            root.insert("x-more".to_string(), Value::Bool(true));
            let mut second = first.with_root(root).unwrap();
            second.save_over(&first).unwrap();

            let reloaded = PresetDocument::load(&path).unwrap();
            assert_eq!(reloaded.root()["x-more"], true);
        }

        #[test]
        fn test_from_documents_rejects_out_of_range_user() {
            let doc = PresetDocument::empty(Path::new("/p/CMakeUserPresets.json"), 6);
            let err = DocumentSet::from_documents(vec![doc], 1).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::SchemaError);
        }
    }
}
