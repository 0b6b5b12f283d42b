//! The edit engine
//!
//! Every mutation goes to the user document. An edit is applied to a copy of
//! that document, the copy is checked against the post-edit inheritance
//! graph, and only then handed back to the caller. A rejected edit therefore
//! never touches the loaded document or the file on disk.
//!
//! When an edit names a preset that the user document does not define, the
//! engine writes an override instead: a user preset that inherits the
//! original and carries only the changed fields.

use log::{debug, info};
use serde_json::{Map, Value};

use super::json::{remove_at_path, set_at_path};
use super::{parse_path, PathSegment};
use crate::defaults::{DEFAULT_OVERRIDE_SUFFIX, DOCUMENT_KEY_ORDER, PRESET_KEY_ORDER};
use crate::document::{insert_ordered, preset_name, DocumentSet, PresetDocument};
use crate::error::{Error, Problem, Result};
use crate::preset::{PresetKind, PresetLocation};
use crate::resolve::InheritanceGraph;

/// A requested change to the preset catalog.
#[derive(Debug, Clone, PartialEq)]
pub enum Edit {
    /// Append a new preset to the user document.
    AddPreset {
        kind: PresetKind,
        preset: Map<String, Value>,
    },
    /// Set (`Some`) or remove (`None`) the field at `field`, a path such as
    /// `cacheVariables.CMAKE_BUILD_TYPE`.
    UpdatePresetField {
        kind: PresetKind,
        name: String,
        field: String,
        value: Option<Value>,
        /// Name of the override to create for a preset the user document
        /// does not define; defaults to `<name>-user`.
        override_name: Option<String>,
    },
    /// Remove a user preset; with `cascade`, everything depending on it too.
    RemovePreset {
        kind: PresetKind,
        name: String,
        cascade: bool,
    },
    /// Replace the parents of a preset.
    SetInherits {
        kind: PresetKind,
        name: String,
        inherits: Vec<String>,
        override_name: Option<String>,
    },
}

impl Edit {
    pub fn kind(&self) -> PresetKind {
        match self {
            Edit::AddPreset { kind, .. }
            | Edit::UpdatePresetField { kind, .. }
            | Edit::RemovePreset { kind, .. }
            | Edit::SetInherits { kind, .. } => *kind,
        }
    }
}

/// The result of an accepted edit.
#[derive(Debug, Clone, PartialEq)]
pub struct EditOutcome {
    /// The updated user document, not yet saved.
    pub document: PresetDocument,
    /// Presets added, changed, or removed, in the order they were touched.
    pub touched: Vec<String>,
    /// Presets removed by a `RemovePreset` edit, the target first.
    pub removed: Vec<String>,
    /// The original preset, when the edit went to an override of it.
    pub override_of: Option<String>,
}

/// Applies edits to the user document of a [`DocumentSet`].
pub struct MergeEngine<'a> {
    set: &'a DocumentSet,
    override_suffix: String,
}

/// Where an edit of an existing preset lands in the user document.
struct Target {
    /// Index in the user document's array for the kind.
    index: usize,
    name: String,
    override_of: Option<String>,
}

impl<'a> MergeEngine<'a> {
    pub fn new(set: &'a DocumentSet) -> Self {
        Self {
            set,
            override_suffix: DEFAULT_OVERRIDE_SUFFIX.to_string(),
        }
    }

    /// Uses `<name>-<suffix>` for synthesized overrides.
    pub fn with_override_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.override_suffix = suffix.into();
        self
    }

    /// Applies `edit` tentatively and validates the result.
    ///
    /// The edit is rejected if the post-edit graph has a problem the
    /// pre-edit graph did not have.
    pub fn apply(&self, edit: &Edit) -> Result<EditOutcome> {
        debug!("Applying {:?}", edit);
        let graph = InheritanceGraph::build(self.set);
        let baseline = graph.validate();

        let user = self.set.user();
        let mut root = user.root().clone();
        let kind = edit.kind();

        let mut outcome_touched = Vec::new();
        let mut removed = Vec::new();
        let mut override_of = None;

        match edit {
            Edit::AddPreset { preset, .. } => {
                let name = self.add_preset(&graph, kind, preset, &mut root)?;
                outcome_touched.push(name);
            }
            Edit::UpdatePresetField {
                name,
                field,
                value,
                override_name,
                ..
            } => {
                let path = parse_path(field).map_err(|message| Error::schema(user.path(), message))?;
                match path.first() {
                    None => return Err(Error::schema(user.path(), "empty field path")),
                    Some(PathSegment::Key(key)) if key == "name" => {
                        return Err(Error::Schema {
                            path: user.path().to_path_buf(),
                            message: "presets cannot be renamed through a field edit".to_string(),
                            hint: Some("add a new preset and remove the old one".to_string()),
                        })
                    }
                    _ => {}
                }

                let target = match value {
                    Some(_) => self.target(&graph, kind, name, override_name.as_deref(), &mut root)?,
                    None => self.existing_target(&graph, kind, name, override_name.as_deref())?,
                };
                let preset = preset_mut(&mut root, kind, target.index, user.path())?;
                match value {
                    Some(value) => set_at_path(preset, &path, value.clone())
                        .map_err(|message| Error::schema(user.path(), message))?,
                    None => {
                        if !remove_at_path(preset, &path) {
                            debug!("'{}' is not set on '{}'; nothing to remove", field, target.name);
                        }
                    }
                }
                outcome_touched.push(target.name);
                override_of = target.override_of;
            }
            Edit::SetInherits {
                name,
                inherits,
                override_name,
                ..
            } => {
                let target = self.target(&graph, kind, name, override_name.as_deref(), &mut root)?;
                let mut parents = Vec::new();
                if let Some(original) = &target.override_of {
                    // The override keeps the original first so its values still win.
                    parents.push(original.clone());
                }
                for parent in inherits {
                    if !parents.contains(parent) {
                        parents.push(parent.clone());
                    }
                }

                let preset = preset_mut(&mut root, kind, target.index, user.path())?;
                let was_string = matches!(preset.get("inherits"), Some(Value::String(_)));
                match parents.len() {
                    0 => {
                        preset.shift_remove("inherits");
                    }
                    1 if was_string => {
                        insert_ordered(preset, "inherits", Value::from(parents[0].clone()), PRESET_KEY_ORDER)
                    }
                    _ => insert_ordered(
                        preset,
                        "inherits",
                        Value::Array(parents.into_iter().map(Value::from).collect()),
                        PRESET_KEY_ORDER,
                    ),
                }
                outcome_touched.push(target.name);
                override_of = target.override_of;
            }
            Edit::RemovePreset { name, cascade, .. } => {
                removed = self.remove_preset(&graph, kind, name, *cascade, &mut root)?;
                outcome_touched.extend(removed.iter().map(|(_, name)| name.clone()));
            }
        }

        let document = user.with_root(root)?;
        let candidate = self.set.with_user(document.clone());
        check_post_edit(&candidate, kind, &outcome_touched, &removed, &baseline)?;

        info!(
            "Edit accepted for {} preset(s): {}",
            outcome_touched.len(),
            outcome_touched.join(", ")
        );
        Ok(EditOutcome {
            document,
            touched: outcome_touched,
            removed: removed.into_iter().map(|(_, name)| name).collect(),
            override_of,
        })
    }

    fn add_preset(
        &self,
        graph: &InheritanceGraph<'_>,
        kind: PresetKind,
        preset: &Map<String, Value>,
        root: &mut Map<String, Value>,
    ) -> Result<String> {
        let user_path = self.set.user().path();
        let name = match preset.get("name").and_then(Value::as_str) {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => return Err(Error::schema(user_path, "a new preset needs a non-empty string 'name'")),
        };

        if let Some(existing) = graph.lookup(kind, &name) {
            return Err(Error::NameCollision {
                kind,
                name,
                first: graph.node(existing).location.clone(),
                second: PresetLocation::new(user_path, self.set.user().presets(kind).len()),
            });
        }

        presets_mut(root, kind, user_path)?.push(Value::Object(preset.clone()));
        debug!("Added {} preset '{}' to {}", kind, name, user_path.display());
        Ok(name)
    }

    /// The user preset an edit of `name` should modify, creating an override
    /// when the user document does not define `name` itself.
    fn target(
        &self,
        graph: &InheritanceGraph<'_>,
        kind: PresetKind,
        name: &str,
        override_name: Option<&str>,
        root: &mut Map<String, Value>,
    ) -> Result<Target> {
        if let Some(index) = self.set.user().preset_index(kind, name) {
            return Ok(Target {
                index,
                name: name.to_string(),
                override_of: None,
            });
        }
        if graph.lookup(kind, name).is_none() {
            return Err(Error::PresetNotFound {
                kind,
                name: name.to_string(),
                hint: None,
            });
        }

        let override_name = self.override_name(name, override_name);
        if let Some(index) = self.set.user().preset_index(kind, &override_name) {
            debug!("Reusing override '{}' of '{}'", override_name, name);
            return Ok(Target {
                index,
                name: override_name,
                override_of: Some(name.to_string()),
            });
        }
        if let Some(existing) = graph.lookup(kind, &override_name) {
            return Err(Error::NameCollision {
                kind,
                name: override_name,
                first: graph.node(existing).location.clone(),
                second: PresetLocation::new(self.set.user().path(), self.set.user().presets(kind).len()),
            });
        }

        let mut preset = Map::new();
        preset.insert("name".to_string(), Value::from(override_name.clone()));
        preset.insert("inherits".to_string(), Value::from(name));
        let presets = presets_mut(root, kind, self.set.user().path())?;
        presets.push(Value::Object(preset));
        info!("Created override '{}' of {} preset '{}'", override_name, kind, name);

        Ok(Target {
            index: presets.len() - 1,
            name: override_name,
            override_of: Some(name.to_string()),
        })
    }

    /// Like [`MergeEngine::target`], but never creates an override.
    fn existing_target(
        &self,
        graph: &InheritanceGraph<'_>,
        kind: PresetKind,
        name: &str,
        override_name: Option<&str>,
    ) -> Result<Target> {
        let user = self.set.user();
        if let Some(index) = user.preset_index(kind, name) {
            return Ok(Target {
                index,
                name: name.to_string(),
                override_of: None,
            });
        }
        if graph.lookup(kind, name).is_none() {
            return Err(Error::PresetNotFound {
                kind,
                name: name.to_string(),
                hint: None,
            });
        }

        let override_name = self.override_name(name, override_name);
        match user.preset_index(kind, &override_name) {
            Some(index) => Ok(Target {
                index,
                name: override_name,
                override_of: Some(name.to_string()),
            }),
            None => Err(Error::Schema {
                path: user.path().to_path_buf(),
                message: format!(
                    "{} preset '{}' is not defined in the user document and has no override",
                    kind, name
                ),
                hint: Some("fields of project presets can only be unset in a user override".to_string()),
            }),
        }
    }

    fn override_name(&self, name: &str, requested: Option<&str>) -> String {
        requested
            .map(str::to_string)
            .unwrap_or_else(|| format!("{}-{}", name, self.override_suffix))
    }

    fn remove_preset(
        &self,
        graph: &InheritanceGraph<'_>,
        kind: PresetKind,
        name: &str,
        cascade: bool,
        root: &mut Map<String, Value>,
    ) -> Result<Vec<(PresetKind, String)>> {
        let user = self.set.user();
        let Some(idx) = graph.lookup(kind, name) else {
            return Err(Error::PresetNotFound {
                kind,
                name: name.to_string(),
                hint: None,
            });
        };
        if user.preset_index(kind, name).is_none() {
            return Err(Error::Schema {
                path: graph.node(idx).location.path.clone(),
                message: format!("{} preset '{}' is not defined in the user document", kind, name),
                hint: Some("only presets of the user document can be removed".to_string()),
            });
        }

        let dependents = graph.dependents(idx);
        let describe = |idx: usize| {
            let node = graph.node(idx);
            if node.kind == kind {
                node.name.to_string()
            } else {
                format!("{} preset '{}'", node.kind, node.name)
            }
        };

        if !dependents.is_empty() {
            let outside: Vec<usize> = dependents
                .iter()
                .copied()
                .filter(|&d| !self.set.is_user_document(&graph.node(d).location.path))
                .collect();
            if !cascade || !outside.is_empty() {
                let blocking = if cascade { outside } else { dependents };
                return Err(Error::DanglingReference {
                    kind,
                    name: name.to_string(),
                    dependents: blocking.into_iter().map(describe).collect(),
                });
            }
        }

        let mut removed = vec![(kind, name.to_string())];
        removed.extend(
            dependents
                .iter()
                .map(|&d| (graph.node(d).kind, graph.node(d).name.to_string())),
        );

        for removed_kind in PresetKind::ALL {
            let Some(Value::Array(presets)) = root.get_mut(removed_kind.document_key()) else {
                continue;
            };
            presets.retain(|preset| {
                let name = preset_name(preset).unwrap_or_default();
                !removed.iter().any(|(k, n)| *k == removed_kind && n == name)
            });
        }
        debug!("Removing {:?} from {}", removed, user.path().display());
        Ok(removed)
    }
}

/// Applies `edit` to the user document of `set` with the default override suffix.
pub fn apply_edit(set: &DocumentSet, edit: &Edit) -> Result<EditOutcome> {
    MergeEngine::new(set).apply(edit)
}

fn presets_mut<'m>(
    root: &'m mut Map<String, Value>,
    kind: PresetKind,
    path: &std::path::Path,
) -> Result<&'m mut Vec<Value>> {
    let key = kind.document_key();
    if !root.contains_key(key) {
        insert_ordered(root, key, Value::Array(Vec::new()), DOCUMENT_KEY_ORDER);
    }
    match root.get_mut(key) {
        Some(Value::Array(presets)) => Ok(presets),
        _ => Err(Error::schema(path, format!("'{}' must be an array", key))),
    }
}

fn preset_mut<'m>(
    root: &'m mut Map<String, Value>,
    kind: PresetKind,
    index: usize,
    path: &std::path::Path,
) -> Result<&'m mut Map<String, Value>> {
    presets_mut(root, kind, path)?
        .get_mut(index)
        .and_then(Value::as_object_mut)
        .ok_or_else(|| Error::schema(path, format!("{} preset at index {} is not an object", kind, index)))
}

/// Rejects the candidate set if it has problems the baseline did not.
///
/// Problems are matched with [`Problem::same_finding`], so a finding that
/// only moved (a removal shifts the positions of later presets) is not new.
/// When a touched preset no longer resolves, its own typed error (a cycle, a
/// missing parent) is returned; anything else new is reported as a schema
/// error.
fn check_post_edit(
    candidate: &DocumentSet,
    kind: PresetKind,
    touched: &[String],
    removed: &[(PresetKind, String)],
    baseline: &[Problem],
) -> Result<()> {
    let graph = InheritanceGraph::build(candidate);
    let introduced: Vec<Problem> = graph
        .validate()
        .into_iter()
        .filter(|problem| !baseline.iter().any(|known| known.same_finding(problem)))
        .collect();
    let Some(first) = introduced.first() else {
        return Ok(());
    };
    debug!("Rejecting edit: {} new problem(s)", introduced.len());

    let environment = crate::config::Environment::new();
    let vendor = Map::new();
    let options = crate::resolve::ResolveOptions {
        source_dir: std::path::Path::new(""),
        environment: &environment,
        vendor: &vendor,
        expand_macros: false,
    };
    for name in touched {
        if removed.iter().any(|(k, n)| *k == kind && n == name) {
            continue;
        }
        if let Err(error) = graph.resolve(kind, name, &options) {
            if introduced.iter().any(|problem| problem.kind == error.kind()) {
                return Err(error);
            }
        }
    }

    Err(Error::Schema {
        path: candidate.user().path().to_path_buf(),
        message: format!("the edit would introduce a problem: {}", first.message),
        hint: Some("the user document was left unchanged".to_string()),
    })
}
