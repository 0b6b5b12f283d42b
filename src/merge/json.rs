//! JSON operations on preset objects
//!
//! ## Features
//!
//! - Field overlay along an inheritance chain, with `cacheVariables` and
//!   `environment` merged key by key
//! - `null` tombstones that survive intermediate merges and are stripped once
//!   the whole chain has been applied
//! - Path-based get/set/remove inside a single preset object
//!
//! Everything here works on `serde_json` maps built with `preserve_order`, so
//! keys that already exist never move.

use serde_json::{Map, Value};

use super::PathSegment;
use crate::defaults::{MAPPING_FIELDS, PRESET_KEY_ORDER};
use crate::document::insert_ordered;

/// Navigate to a specific path within a JSON value, creating intermediate
/// structures as needed.
///
/// Missing keys become empty objects and short arrays are padded with `null`.
/// Returns a message naming the offending segment when the path runs into a
/// scalar.
pub fn navigate_json_value<'a>(
    value: &'a mut Value,
    path: &[PathSegment],
) -> Result<&'a mut Value, String> {
    let mut current = value;
    for segment in path {
        match segment {
            PathSegment::Key(key) => {
                if current.is_null() {
                    *current = Value::Object(Map::new());
                }
                let Value::Object(map) = current else {
                    return Err(format!("expected an object while navigating to '{}'", key));
                };
                current = map
                    .entry(key.clone())
                    .or_insert(Value::Object(Map::new()));
            }
            PathSegment::Index(idx) => {
                if current.is_null() {
                    *current = Value::Array(Vec::new());
                }
                let Value::Array(array) = current else {
                    return Err(format!("expected an array while navigating to index {}", idx));
                };
                while array.len() <= *idx {
                    array.push(Value::Null);
                }
                current = &mut array[*idx];
            }
        }
    }

    Ok(current)
}

/// Looks up the value at `path`, without creating anything.
pub fn get_at_path<'a>(value: &'a Value, path: &[PathSegment]) -> Option<&'a Value> {
    path.iter().try_fold(value, |current, segment| match segment {
        PathSegment::Key(key) => current.get(key.as_str()),
        PathSegment::Index(idx) => current.get(*idx),
    })
}

/// Sets the field at `path` inside a preset object.
///
/// A new top-level field is placed at its canonical position among the
/// preset's keys; nested keys are appended.
pub fn set_at_path(preset: &mut Map<String, Value>, path: &[PathSegment], value: Value) -> Result<(), String> {
    let Some((first, rest)) = path.split_first() else {
        return Err("empty field path".to_string());
    };
    let PathSegment::Key(field) = first else {
        return Err("a field path must start with a field name".to_string());
    };

    if rest.is_empty() {
        insert_ordered(preset, field, value, PRESET_KEY_ORDER);
        return Ok(());
    }

    if !preset.contains_key(field.as_str()) {
        let empty = match rest[0] {
            PathSegment::Key(_) => Value::Object(Map::new()),
            PathSegment::Index(_) => Value::Array(Vec::new()),
        };
        insert_ordered(preset, field, empty, PRESET_KEY_ORDER);
    }
    let Some(container) = preset.get_mut(field.as_str()) else {
        return Err(format!("field '{}' could not be created", field));
    };
    *navigate_json_value(container, rest)? = value;
    Ok(())
}

/// Removes the field at `path` inside a preset object.
///
/// Returns whether anything was removed. An object left empty by the removal
/// is kept.
pub fn remove_at_path(preset: &mut Map<String, Value>, path: &[PathSegment]) -> bool {
    let Some((last, parents)) = path.split_last() else {
        return false;
    };

    let mut current = match parents.split_first() {
        None => return remove_segment_from_map(preset, last),
        Some((PathSegment::Key(field), _)) => match preset.get_mut(field.as_str()) {
            Some(value) => value,
            None => return false,
        },
        Some((PathSegment::Index(_), _)) => return false,
    };
    for segment in &parents[1..] {
        let next = match segment {
            PathSegment::Key(key) => current.get_mut(key.as_str()),
            PathSegment::Index(idx) => current.get_mut(*idx),
        };
        match next {
            Some(value) => current = value,
            None => return false,
        }
    }

    match (current, last) {
        (Value::Object(map), segment) => remove_segment_from_map(map, segment),
        (Value::Array(array), PathSegment::Index(idx)) if *idx < array.len() => {
            array.remove(*idx);
            true
        }
        _ => false,
    }
}

fn remove_segment_from_map(map: &mut Map<String, Value>, segment: &PathSegment) -> bool {
    match segment {
        PathSegment::Key(key) => map.shift_remove(key.as_str()).is_some(),
        PathSegment::Index(_) => false,
    }
}

/// Overlays `source` fields onto `target`.
///
/// Mapping fields are merged key by key with [`merge_mapping`]; every other
/// field is replaced wholesale, arrays included.
pub fn overlay_fields(target: &mut Map<String, Value>, source: &Map<String, Value>) {
    for (key, value) in source {
        if MAPPING_FIELDS.contains(&key.as_str()) {
            if let (Some(Value::Object(existing)), Value::Object(incoming)) =
                (target.get_mut(key.as_str()), value)
            {
                merge_mapping(existing, incoming);
                continue;
            }
        }
        target.insert(key.clone(), value.clone());
    }
}

/// Merges one mapping into another, `source` entries winning.
///
/// A `null` entry is kept as a tombstone so it keeps suppressing the
/// ancestor's value through later merges; [`strip_tombstones`] drops it at
/// the end.
pub fn merge_mapping(target: &mut Map<String, Value>, source: &Map<String, Value>) {
    for (key, value) in source {
        target.insert(key.clone(), value.clone());
    }
}

/// Drops `null` entries from every mapping field.
pub fn strip_tombstones(fields: &mut Map<String, Value>) {
    for field in MAPPING_FIELDS {
        if let Some(Value::Object(mapping)) = fields.get_mut(*field) {
            mapping.retain(|_, value| !value.is_null());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::merge::parse_path;
    use serde_json::json;

    fn object(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected an object"),
        }
    }

    fn path(text: &str) -> Vec<PathSegment> {
        parse_path(text).unwrap()
    }

    mod navigation_tests {
        use super::*;

        #[test]
        fn test_navigate_creates_intermediate_objects() {
            let mut value = json!({});
            *navigate_json_value(&mut value, &path("a.b")).unwrap() = json!(1);
            assert_eq!(value, json!({"a": {"b": 1}}));
        }

        #[test]
        fn test_navigate_pads_arrays() {
            let mut value = json!({"targets": []});
            *navigate_json_value(&mut value, &path("targets[2]")).unwrap() = json!("all");
            assert_eq!(value["targets"], json!([null, null, "all"]));
        }

        #[test]
        fn test_navigate_into_scalar_fails() {
            let mut value = json!({"jobs": 4});
            let err = navigate_json_value(&mut value, &path("jobs.x")).unwrap_err();
            assert!(err.contains("'x'"));
        }

        #[test]
        fn test_get_at_path() {
            let value = json!({"cacheVariables": {"A": {"type": "BOOL", "value": "ON"}}, "targets": ["x"]});
            assert_eq!(get_at_path(&value, &path("cacheVariables.A.value")), Some(&json!("ON")));
            assert_eq!(get_at_path(&value, &path("targets[0]")), Some(&json!("x")));
            assert_eq!(get_at_path(&value, &path("missing.key")), None);
        }
    }

    mod edit_tests {
        use super::*;

        #[test]
        fn test_set_top_level_field_in_canonical_position() {
            let mut preset = object(json!({"name": "dev", "binaryDir": "build"}));
            set_at_path(&mut preset, &path("generator"), json!("Ninja")).unwrap();
            let keys: Vec<&str> = preset.keys().map(String::as_str).collect();
            assert_eq!(keys, vec!["name", "generator", "binaryDir"]);
        }

        #[test]
        fn test_set_nested_creates_mapping() {
            let mut preset = object(json!({"name": "dev"}));
            set_at_path(&mut preset, &path("cacheVariables.CMAKE_BUILD_TYPE"), json!("Debug")).unwrap();
            assert_eq!(preset["cacheVariables"]["CMAKE_BUILD_TYPE"], "Debug");
        }

        #[test]
        fn test_set_rejects_index_first() {
            let mut preset = object(json!({"name": "dev"}));
            assert!(set_at_path(&mut preset, &path("[0]"), json!(1)).is_err());
            assert!(set_at_path(&mut preset, &[], json!(1)).is_err());
        }

        #[test]
        fn test_remove_at_path() {
            let mut preset = object(json!({
                "name": "dev",
                "cacheVariables": {"A": "1", "B": "2"},
                "targets": ["x", "y"]
            }));
            assert!(remove_at_path(&mut preset, &path("cacheVariables.A")));
            assert!(remove_at_path(&mut preset, &path("targets[0]")));
            assert!(!remove_at_path(&mut preset, &path("cacheVariables.A")));
            assert!(!remove_at_path(&mut preset, &path("nothing.here")));
            assert_eq!(preset["cacheVariables"], json!({"B": "2"}));
            assert_eq!(preset["targets"], json!(["y"]));

            assert!(remove_at_path(&mut preset, &path("cacheVariables")));
            let keys: Vec<&str> = preset.keys().map(String::as_str).collect();
            assert_eq!(keys, vec!["name", "targets"]);
        }
    }

    mod overlay_tests {
        use super::*;

        #[test]
        fn test_overlay_replaces_scalars_and_arrays() {
            let mut target = object(json!({"generator": "Make", "targets": ["a", "b"]}));
            overlay_fields(&mut target, &object(json!({"generator": "Ninja", "targets": ["c"]})));
            assert_eq!(target["generator"], "Ninja");
            assert_eq!(target["targets"], json!(["c"]));
        }

        #[test]
        fn test_overlay_merges_mappings_key_by_key() {
            let mut target = object(json!({"cacheVariables": {"A": "1", "B": "2"}}));
            overlay_fields(&mut target, &object(json!({"cacheVariables": {"B": "3", "C": "4"}})));
            assert_eq!(target["cacheVariables"], json!({"A": "1", "B": "3", "C": "4"}));
        }

        #[test]
        fn test_non_mapping_objects_are_replaced() {
            let mut target = object(json!({"output": {"verbosity": "verbose", "debug": true}}));
            overlay_fields(&mut target, &object(json!({"output": {"verbosity": "default"}})));
            assert_eq!(target["output"], json!({"verbosity": "default"}));
        }

        #[test]
        fn test_tombstone_survives_then_strips() {
            let mut fields = object(json!({"environment": {"CC": "gcc", "CXX": "g++"}}));
            overlay_fields(&mut fields, &object(json!({"environment": {"CC": null}})));
            overlay_fields(&mut fields, &object(json!({"environment": {"LD": "lld"}})));
            assert_eq!(fields["environment"]["CC"], Value::Null);

            strip_tombstones(&mut fields);
            assert_eq!(fields["environment"], json!({"CXX": "g++", "LD": "lld"}));
        }
    }
}
