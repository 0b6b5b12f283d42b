//! # Inheritance Resolution
//!
//! Builds the graph of every preset in a [`DocumentSet`] and flattens a
//! preset's inheritance chain into a [`ResolvedPreset`].
//!
//! ## Merge Order
//!
//! Parents are applied in reverse listed order, then the preset's own fields,
//! so the first parent listed wins over later ones and the preset wins over
//! all of them. `cacheVariables` and `environment` merge key by key; a `null`
//! entry suppresses the ancestor's value. Every other field is replaced
//! wholesale. `name`, `hidden`, `inherits`, `displayName`, `description`,
//! `vendor`, and `condition` describe the preset itself and are not inherited,
//! except that a preset without its own `condition` takes the nearest
//! ancestor's.
//!
//! ## Structure Checks
//!
//! Duplicate names within a kind, missing parents, and inheritance cycles are
//! all detected while building or walking the graph. [`InheritanceGraph::validate`]
//! collects every such problem without stopping at the first one.

use std::collections::{HashMap, HashSet, VecDeque};
use std::path::Path;

use log::{debug, trace};
use serde_json::{Map, Value};

use crate::condition;
use crate::config::{CatalogConfig, Environment};
use crate::defaults::{CONDITION_MIN_VERSION, NON_INHERITED_FIELDS, UNEXPANDED_FIELDS};
use crate::document::{preset_hidden, preset_inherits, preset_name, DocumentSet};
use crate::error::{Error, ErrorKind, Problem, Result};
use crate::expand::{self, MacroContext};
use crate::merge::json::{merge_mapping, overlay_fields, strip_tombstones};
use crate::preset::{PresetKind, PresetLocation, ResolvedPreset};

/// Inputs for macro expansion during resolution.
#[derive(Debug, Clone, Copy)]
pub struct ResolveOptions<'a> {
    pub source_dir: &'a Path,
    pub environment: &'a Environment,
    pub vendor: &'a Map<String, Value>,
    /// When false, fields are merged but left unexpanded and `enabled` is not computed.
    pub expand_macros: bool,
}

impl<'a> ResolveOptions<'a> {
    pub fn from_config(config: &'a CatalogConfig) -> Self {
        Self {
            source_dir: &config.source_dir,
            environment: &config.environment,
            vendor: &config.vendor,
            expand_macros: true,
        }
    }

    /// The same inputs, with macro expansion switched off.
    pub fn offline(self) -> Self {
        Self {
            expand_macros: false,
            ..self
        }
    }
}

/// One preset in the graph.
#[derive(Debug, Clone)]
pub struct PresetNode<'s> {
    pub kind: PresetKind,
    pub name: &'s str,
    pub location: PresetLocation,
    /// Index of the defining document in the set.
    pub document: usize,
    pub hidden: bool,
    pub raw: &'s Map<String, Value>,
}

/// Where a preset's ancestry walk ended up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AncestryStatus {
    Defined,
    /// Named in `inherits` but not defined anywhere.
    Missing,
    /// Already on the path from the root; the walk stops here.
    Cycle,
}

/// The `inherits` tree above one preset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ancestry {
    pub name: String,
    pub location: Option<PresetLocation>,
    pub hidden: bool,
    pub status: AncestryStatus,
    pub parents: Vec<Ancestry>,
}

/// Every preset of a document set, with its `inherits` edges.
pub struct InheritanceGraph<'s> {
    set: &'s DocumentSet,
    nodes: Vec<PresetNode<'s>>,
    index: HashMap<(PresetKind, String), usize>,
    parents: Vec<Vec<usize>>,
    /// (child, parent name) for every parent that is not defined.
    missing: Vec<(usize, String)>,
    /// (first definition, location of the duplicate).
    collisions: Vec<(usize, PresetLocation)>,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Visit {
    New,
    Active,
    Done,
}

impl<'s> InheritanceGraph<'s> {
    /// Indexes every preset of `set`.
    ///
    /// When a name repeats within a kind, the first definition in load order
    /// is the node and the later one is recorded as a collision.
    pub fn build(set: &'s DocumentSet) -> Self {
        let mut nodes: Vec<PresetNode<'s>> = Vec::new();
        let mut index = HashMap::new();
        let mut collisions = Vec::new();

        for (doc_idx, document) in set.documents().iter().enumerate() {
            for kind in PresetKind::ALL {
                for (position, preset) in document.presets(kind).iter().enumerate() {
                    let (Some(raw), Some(name)) = (preset.as_object(), preset_name(preset)) else {
                        continue;
                    };
                    let location = PresetLocation::new(document.path(), position);
                    let key = (kind, name.to_string());
                    if let Some(&existing) = index.get(&key) {
                        collisions.push((existing, location));
                        continue;
                    }
                    index.insert(key, nodes.len());
                    nodes.push(PresetNode {
                        kind,
                        name,
                        location,
                        document: doc_idx,
                        hidden: preset_hidden(raw),
                        raw,
                    });
                }
            }
        }

        let mut parents = Vec::with_capacity(nodes.len());
        let mut missing = Vec::new();
        for (idx, node) in nodes.iter().enumerate() {
            let mut edges = Vec::new();
            for parent in preset_inherits(node.raw) {
                match index.get(&(node.kind, parent.clone())) {
                    Some(&parent_idx) => edges.push(parent_idx),
                    None => missing.push((idx, parent)),
                }
            }
            parents.push(edges);
        }

        debug!(
            "Indexed {} presets from {} documents ({} collisions, {} missing parents)",
            nodes.len(),
            set.documents().len(),
            collisions.len(),
            missing.len()
        );

        Self {
            set,
            nodes,
            index,
            parents,
            missing,
            collisions,
        }
    }

    pub fn nodes(&self) -> &[PresetNode<'s>] {
        &self.nodes
    }

    pub fn node(&self, idx: usize) -> &PresetNode<'s> {
        &self.nodes[idx]
    }

    pub fn lookup(&self, kind: PresetKind, name: &str) -> Option<usize> {
        self.index.get(&(kind, name.to_string())).copied()
    }

    /// Direct parents of a node, in listed order (missing ones left out).
    pub fn parents(&self, idx: usize) -> &[usize] {
        &self.parents[idx]
    }

    /// Presets of another kind that a node points at: `configurePreset` of
    /// build/test/package presets, and the steps of workflow presets.
    pub fn references(&self, idx: usize) -> Vec<(PresetKind, &'s str)> {
        let node = &self.nodes[idx];
        let mut references = Vec::new();
        if node.kind.has_configure_preset() {
            if let Some(target) = node.raw.get("configurePreset").and_then(Value::as_str) {
                references.push((PresetKind::Configure, target));
            }
        }
        if node.kind == PresetKind::Workflow {
            let steps = node.raw.get("steps").and_then(Value::as_array);
            for step in steps.into_iter().flatten() {
                let kind = step
                    .get("type")
                    .and_then(Value::as_str)
                    .and_then(|t| t.parse::<PresetKind>().ok());
                if let (Some(kind), Some(name)) = (kind, step.get("name").and_then(Value::as_str)) {
                    references.push((kind, name));
                }
            }
        }
        references
    }

    /// Every preset that depends on `idx`, directly or transitively, through
    /// `inherits` or a cross-kind reference. Breadth-first order.
    pub fn dependents(&self, idx: usize) -> Vec<usize> {
        let mut result = Vec::new();
        let mut seen = HashSet::from([idx]);
        let mut queue = VecDeque::from([idx]);

        while let Some(current) = queue.pop_front() {
            let target = &self.nodes[current];
            for other in 0..self.nodes.len() {
                let inherits = self.parents[other].contains(&current);
                let refers = !inherits
                    && self
                        .references(other)
                        .iter()
                        .any(|(kind, name)| *kind == target.kind && *name == target.name);
                if (inherits || refers) && seen.insert(other) {
                    result.push(other);
                    queue.push_back(other);
                }
            }
        }
        result
    }

    /// The first inheritance cycle reachable from `start`, as preset names
    /// with the repeated name at both ends.
    pub fn find_cycle_from(&self, start: usize) -> Option<Vec<String>> {
        let mut state = vec![Visit::New; self.nodes.len()];
        let mut stack = Vec::new();
        let mut cycles = Vec::new();
        self.search_cycles(start, &mut state, &mut stack, &mut cycles, true);
        cycles.into_iter().next().map(|cycle| self.cycle_names(&cycle))
    }

    /// Every inheritance cycle in the graph, each reported once.
    pub fn cycles(&self) -> Vec<(PresetKind, Vec<String>)> {
        let mut state = vec![Visit::New; self.nodes.len()];
        let mut stack = Vec::new();
        let mut cycles = Vec::new();
        for start in 0..self.nodes.len() {
            if state[start] == Visit::New {
                self.search_cycles(start, &mut state, &mut stack, &mut cycles, false);
            }
        }
        cycles
            .into_iter()
            .map(|cycle| (self.nodes[cycle[0]].kind, self.cycle_names(&cycle)))
            .collect()
    }

    fn cycle_names(&self, cycle: &[usize]) -> Vec<String> {
        cycle.iter().map(|&idx| self.nodes[idx].name.to_string()).collect()
    }

    fn search_cycles(
        &self,
        idx: usize,
        state: &mut [Visit],
        stack: &mut Vec<usize>,
        cycles: &mut Vec<Vec<usize>>,
        first_only: bool,
    ) {
        state[idx] = Visit::Active;
        stack.push(idx);
        for &parent in &self.parents[idx] {
            if first_only && !cycles.is_empty() {
                break;
            }
            match state[parent] {
                Visit::New => self.search_cycles(parent, state, stack, cycles, first_only),
                Visit::Active => {
                    let start = stack.iter().position(|&s| s == parent).unwrap_or(0);
                    let mut cycle = stack[start..].to_vec();
                    cycle.push(parent);
                    cycles.push(cycle);
                }
                Visit::Done => {}
            }
        }
        stack.pop();
        state[idx] = Visit::Done;
    }

    /// Resolves the preset `name` of `kind`.
    pub fn resolve(&self, kind: PresetKind, name: &str, options: &ResolveOptions<'_>) -> Result<ResolvedPreset> {
        let idx = self.lookup(kind, name).ok_or_else(|| Error::PresetNotFound {
            kind,
            name: name.to_string(),
            hint: None,
        })?;
        self.resolve_index(idx, options)
    }

    /// Resolves the preset at node `idx`.
    pub fn resolve_index(&self, idx: usize, options: &ResolveOptions<'_>) -> Result<ResolvedPreset> {
        let node = &self.nodes[idx];
        if let Some(cycle) = self.find_cycle_from(idx) {
            return Err(Error::CyclicInheritance {
                kind: node.kind,
                cycle,
            });
        }

        let chain = self.chain(idx);
        for &member in &chain {
            self.check_member(member)?;
        }
        trace!(
            "Resolving {} preset '{}' through {:?}",
            node.kind,
            node.name,
            chain.iter().map(|&m| self.nodes[m].name).collect::<Vec<_>>()
        );

        let mut memo = HashMap::new();
        let inherited = self.merge_fields(idx, &mut memo);

        // Own keys first, in their own order, then everything only inherited.
        let mut fields = Map::new();
        for (key, value) in node.raw {
            match key.as_str() {
                "name" | "hidden" | "inherits" | "condition" => {}
                other if NON_INHERITED_FIELDS.contains(&other) => {
                    fields.insert(key.clone(), value.clone());
                }
                _ => {
                    if let Some(merged) = inherited.get(key) {
                        fields.insert(key.clone(), merged.clone());
                    }
                }
            }
        }
        for (key, value) in &inherited {
            if !fields.contains_key(key) {
                fields.insert(key.clone(), value.clone());
            }
        }
        strip_tombstones(&mut fields);

        let mut resolved = ResolvedPreset {
            name: node.name.to_string(),
            kind: node.kind,
            hidden: node.hidden,
            inherits: preset_inherits(node.raw),
            chain: chain.iter().map(|&m| self.nodes[m].name.to_string()).collect(),
            location: node.location.clone(),
            condition: self.effective_condition(idx)?,
            enabled: None,
            fields,
        };

        if options.expand_macros {
            self.expand(idx, &mut resolved, options)?;
        }
        Ok(resolved)
    }

    /// Ancestors of `idx` in application order, ending with `idx`.
    fn chain(&self, idx: usize) -> Vec<usize> {
        let mut chain = Vec::new();
        self.collect_chain(idx, &mut chain);
        chain
    }

    fn collect_chain(&self, idx: usize, chain: &mut Vec<usize>) {
        for &parent in self.parents[idx].iter().rev() {
            self.collect_chain(parent, chain);
        }
        if !chain.contains(&idx) {
            chain.push(idx);
        }
    }

    fn check_member(&self, idx: usize) -> Result<()> {
        let node = &self.nodes[idx];
        if let Some((_, second)) = self.collisions.iter().find(|(first, _)| *first == idx) {
            return Err(Error::NameCollision {
                kind: node.kind,
                name: node.name.to_string(),
                first: node.location.clone(),
                second: second.clone(),
            });
        }
        if let Some((_, parent)) = self.missing.iter().find(|(child, _)| *child == idx) {
            return Err(Error::PresetNotFound {
                kind: node.kind,
                name: parent.clone(),
                hint: Some(format!("inherited by '{}' at {}", node.name, node.location)),
            });
        }
        Ok(())
    }

    /// Inheritable fields of `idx` with all of its ancestors merged in.
    /// Tombstones are kept.
    fn merge_fields(&self, idx: usize, memo: &mut HashMap<usize, Map<String, Value>>) -> Map<String, Value> {
        if let Some(merged) = memo.get(&idx) {
            return merged.clone();
        }

        let mut merged = Map::new();
        for &parent in self.parents[idx].iter().rev() {
            let parent_fields = self.merge_fields(parent, memo);
            overlay_fields(&mut merged, &parent_fields);
        }
        let own: Map<String, Value> = self.nodes[idx]
            .raw
            .iter()
            .filter(|(key, _)| !NON_INHERITED_FIELDS.contains(&key.as_str()))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();
        overlay_fields(&mut merged, &own);

        memo.insert(idx, merged.clone());
        merged
    }

    /// The preset's own `condition`, else the nearest ancestor's
    /// (breadth-first, parents in listed order).
    fn effective_condition(&self, idx: usize) -> Result<Option<Value>> {
        let mut queue = VecDeque::from([idx]);
        let mut seen = HashSet::from([idx]);
        while let Some(current) = queue.pop_front() {
            let node = &self.nodes[current];
            if let Some(condition) = node.raw.get("condition") {
                let version = self.set.documents()[node.document].version();
                if version < CONDITION_MIN_VERSION {
                    return Err(Error::schema(
                        &node.location.path,
                        format!(
                            "'condition' of {} preset '{}' requires version {} or later (document is version {})",
                            node.kind, node.name, CONDITION_MIN_VERSION, version
                        ),
                    ));
                }
                return Ok(Some(condition.clone()));
            }
            for &parent in &self.parents[current] {
                if seen.insert(parent) {
                    queue.push_back(parent);
                }
            }
        }
        Ok(None)
    }

    fn expand(&self, idx: usize, resolved: &mut ResolvedPreset, options: &ResolveOptions<'_>) -> Result<()> {
        let node = &self.nodes[idx];
        let generator = resolved.str_field("generator").map(str::to_string);
        let base = MacroContext {
            source_dir: options.source_dir,
            file_dir: node.location.file_dir(),
            preset_name: node.name,
            generator: generator.as_deref(),
            version: self.set.documents()[node.document].version(),
            environment: options.environment,
            preset_environment: None,
            vendor: options.vendor,
        };

        let environment = match resolved.fields.get("environment") {
            Some(Value::Object(_)) => {
                let mut memo = HashMap::new();
                let mut env = self.expand_environment_of(idx, &base, &mut memo)?;
                env.retain(|_, value| !value.is_null());
                Some(env)
            }
            _ => None,
        };
        let ctx = MacroContext {
            preset_environment: environment.as_ref(),
            ..base
        };

        let mut expanded = Map::new();
        for (key, value) in &resolved.fields {
            let value = match (key.as_str(), &environment) {
                ("environment", Some(env)) => Value::Object(env.clone()),
                (field, _) if UNEXPANDED_FIELDS.contains(&field) => value.clone(),
                _ => expand::expand_value(value, &ctx)?,
            };
            expanded.insert(key.clone(), value);
        }

        let enabled = match &resolved.condition {
            Some(condition) => condition::evaluate(condition, &ctx, &node.location.path)?,
            None => true,
        };
        if !enabled {
            debug!("{} preset '{}' is disabled by its condition", node.kind, node.name);
        }

        resolved.fields = expanded;
        resolved.enabled = Some(enabled);
        Ok(())
    }

    /// The expanded `environment` of `idx`, built the same way as
    /// [`InheritanceGraph::merge_fields`] so each preset's entries are
    /// expanded against what its ancestors define. Tombstones are kept.
    fn expand_environment_of(
        &self,
        idx: usize,
        ctx: &MacroContext<'_>,
        memo: &mut HashMap<usize, Map<String, Value>>,
    ) -> Result<Map<String, Value>> {
        if let Some(expanded) = memo.get(&idx) {
            return Ok(expanded.clone());
        }

        let mut inherited = Map::new();
        for &parent in self.parents[idx].iter().rev() {
            let parent_env = self.expand_environment_of(parent, ctx, memo)?;
            merge_mapping(&mut inherited, &parent_env);
        }
        let expanded = match self.nodes[idx].raw.get("environment") {
            Some(Value::Object(own)) => expand::expand_environment(own, &inherited, ctx)?,
            _ => inherited,
        };

        memo.insert(idx, expanded.clone());
        Ok(expanded)
    }

    /// The `inherits` tree above the preset `name` of `kind`.
    pub fn ancestry(&self, kind: PresetKind, name: &str) -> Result<Ancestry> {
        let idx = self.lookup(kind, name).ok_or_else(|| Error::PresetNotFound {
            kind,
            name: name.to_string(),
            hint: None,
        })?;
        let mut path = Vec::new();
        Ok(self.ancestry_of(idx, &mut path))
    }

    fn ancestry_of(&self, idx: usize, path: &mut Vec<usize>) -> Ancestry {
        let node = &self.nodes[idx];
        if path.contains(&idx) {
            return Ancestry {
                name: node.name.to_string(),
                location: Some(node.location.clone()),
                hidden: node.hidden,
                status: AncestryStatus::Cycle,
                parents: Vec::new(),
            };
        }

        path.push(idx);
        let parents = preset_inherits(node.raw)
            .into_iter()
            .map(|parent| match self.lookup(node.kind, &parent) {
                Some(parent_idx) => self.ancestry_of(parent_idx, path),
                None => Ancestry {
                    name: parent,
                    location: None,
                    hidden: false,
                    status: AncestryStatus::Missing,
                    parents: Vec::new(),
                },
            })
            .collect();
        path.pop();

        Ancestry {
            name: node.name.to_string(),
            location: Some(node.location.clone()),
            hidden: node.hidden,
            status: AncestryStatus::Defined,
            parents,
        }
    }

    /// Every structural problem of the set, without expanding macros.
    ///
    /// Reports duplicate names, missing parents and references, inheritance
    /// cycles, project presets depending on user presets, malformed
    /// conditions, and unknown macros. Each problem is listed once.
    pub fn validate(&self) -> Vec<Problem> {
        let environment = Environment::new();
        let vendor = Map::new();
        let options = ResolveOptions {
            source_dir: Path::new(""),
            environment: &environment,
            vendor: &vendor,
            expand_macros: false,
        };

        let mut problems: Vec<Problem> = Vec::new();
        let mut push = |problem: Problem| {
            if !problems.contains(&problem) {
                problems.push(problem);
            }
        };

        for (first, second) in &self.collisions {
            let node = &self.nodes[*first];
            push(
                Error::NameCollision {
                    kind: node.kind,
                    name: node.name.to_string(),
                    first: node.location.clone(),
                    second: second.clone(),
                }
                .into(),
            );
        }

        for (child, parent) in &self.missing {
            let node = &self.nodes[*child];
            push(
                Problem::from(Error::PresetNotFound {
                    kind: node.kind,
                    name: parent.clone(),
                    hint: Some(format!("inherited by '{}' at {}", node.name, node.location)),
                })
                .about([node.kind.to_string(), node.name.to_string(), "inherits".to_string(), parent.clone()]),
            );
        }

        for (kind, cycle) in self.cycles() {
            push(Error::CyclicInheritance { kind, cycle }.into());
        }

        for (idx, node) in self.nodes.iter().enumerate() {
            let user_side = is_user_side(self.set, node.document);

            for (kind, target) in self.references(idx) {
                match self.lookup(kind, target) {
                    None => push(
                        Problem::from(Error::PresetNotFound {
                            kind,
                            name: target.to_string(),
                            hint: Some(format!(
                                "referenced by {} preset '{}' at {}",
                                node.kind, node.name, node.location
                            )),
                        })
                        .about([
                            node.kind.to_string(),
                            node.name.to_string(),
                            "refers".to_string(),
                            kind.to_string(),
                            target.to_string(),
                        ]),
                    ),
                    Some(target_idx) => {
                        let target_node = &self.nodes[target_idx];
                        if !user_side && is_user_side(self.set, target_node.document) {
                            push(project_depends_on_user(node, target_node));
                        }
                    }
                }
            }

            if !user_side {
                for &parent in &self.parents[idx] {
                    let parent_node = &self.nodes[parent];
                    if is_user_side(self.set, parent_node.document) {
                        push(project_depends_on_user(node, parent_node));
                    }
                }
            }

            let version = self.set.documents()[node.document].version();
            let mut macro_errors = Vec::new();
            for (key, value) in node.raw {
                match key.as_str() {
                    "name" | "inherits" | "hidden" | "vendor" => {}
                    "condition" => {
                        if let Err(e) = condition::check(value, version, &node.location.path) {
                            let subjects = [node.kind.to_string(), node.name.to_string(), e.to_string()];
                            push(Problem::from(e).about(subjects));
                        }
                    }
                    field if UNEXPANDED_FIELDS.contains(&field) => {}
                    _ => expand::check_value(value, version, &mut macro_errors),
                }
            }
            for error in macro_errors {
                push(Problem {
                    kind: error.kind(),
                    message: format!(
                        "{} (in {} preset '{}' at {})",
                        error, node.kind, node.name, node.location
                    ),
                    subjects: vec![node.kind.to_string(), node.name.to_string(), error.to_string()],
                });
            }

            // Structural failures were reported above; keep what only
            // resolution finds.
            if let Err(error) = self.resolve_index(idx, &options) {
                if !matches!(
                    error.kind(),
                    ErrorKind::CyclicInheritance | ErrorKind::NameCollision | ErrorKind::NotFound
                ) {
                    let subjects = [node.kind.to_string(), node.name.to_string(), error.to_string()];
                    push(Problem::from(error).about(subjects));
                }
            }
        }

        debug!("Validation found {} problems", problems.len());
        problems
    }

    /// Hidden presets that nothing inherits from or refers to.
    ///
    /// Such presets can never take effect.
    pub fn unused_hidden(&self) -> Vec<usize> {
        let mut used = HashSet::new();
        for idx in 0..self.nodes.len() {
            used.extend(self.parents[idx].iter().copied());
            for (kind, name) in self.references(idx) {
                if let Some(target) = self.lookup(kind, name) {
                    used.insert(target);
                }
            }
        }
        (0..self.nodes.len())
            .filter(|idx| self.nodes[*idx].hidden && !used.contains(idx))
            .collect()
    }
}

fn is_user_side(set: &DocumentSet, document: usize) -> bool {
    document >= set.user_index()
}

fn project_depends_on_user(node: &PresetNode<'_>, target: &PresetNode<'_>) -> Problem {
    Problem::from(Error::Schema {
        path: node.location.path.clone(),
        message: format!(
            "project {} preset '{}' depends on user {} preset '{}'",
            node.kind, node.name, target.kind, target.name
        ),
        hint: Some("move the dependency into the user document or the project document".to_string()),
    })
    .about([
        node.kind.to_string(),
        node.name.to_string(),
        "depends on".to_string(),
        target.kind.to_string(),
        target.name.to_string(),
    ])
}
