//! Evaluation of preset `condition` expressions.
//!
//! A condition is either a JSON boolean, `null` (always true), or an object
//! whose `type` selects one of: `const`, `equals`, `notEquals`, `inList`,
//! `notInList`, `matches`, `notMatches`, `anyOf`, `allOf`, `not`. String
//! operands are macro-expanded before comparison.
//!
//! [`check`] walks the same structure without expanding anything, so
//! conditions can be linted offline.

use std::path::Path;

use regex::Regex;
use serde_json::{Map, Value};

use crate::error::{Error, Result};
use crate::expand::{self, MacroContext};

enum Mode<'c, 'a> {
    Evaluate(&'c MacroContext<'a>),
    Check(u64),
}

/// Evaluates `condition` with macros expanded against `ctx`.
///
/// `path` names the defining document in schema errors.
pub fn evaluate(condition: &Value, ctx: &MacroContext<'_>, path: &Path) -> Result<bool> {
    walk(condition, &Mode::Evaluate(ctx), path)
}

/// Checks the shape of `condition` and the macros it uses.
pub fn check(condition: &Value, version: u64, path: &Path) -> Result<()> {
    walk(condition, &Mode::Check(version), path).map(|_| ())
}

fn walk(condition: &Value, mode: &Mode<'_, '_>, path: &Path) -> Result<bool> {
    let object = match condition {
        Value::Null => return Ok(true),
        Value::Bool(value) => return Ok(*value),
        Value::Object(object) => object,
        other => {
            return Err(Error::schema(
                path,
                format!("condition must be a boolean, null, or an object, found {}", other),
            ))
        }
    };

    let kind = object
        .get("type")
        .and_then(Value::as_str)
        .ok_or_else(|| Error::schema(path, "condition object needs a string 'type'"))?;

    match kind {
        "const" => object
            .get("value")
            .and_then(Value::as_bool)
            .ok_or_else(|| Error::schema(path, "'const' condition needs a boolean 'value'")),
        "equals" | "notEquals" => {
            let lhs = operand(object, "lhs", mode, path)?;
            let rhs = operand(object, "rhs", mode, path)?;
            Ok((lhs == rhs) == (kind == "equals"))
        }
        "inList" | "notInList" => {
            let needle = operand(object, "string", mode, path)?;
            let list = object
                .get("list")
                .and_then(Value::as_array)
                .ok_or_else(|| Error::schema(path, format!("'{}' condition needs an array 'list'", kind)))?;
            let mut found = false;
            for item in list {
                let item = item.as_str().ok_or_else(|| {
                    Error::schema(path, format!("'{}' list entries must be strings", kind))
                })?;
                if expand_operand(item, mode)? == needle {
                    found = true;
                }
            }
            Ok(found == (kind == "inList"))
        }
        "matches" | "notMatches" => {
            let haystack = operand(object, "string", mode, path)?;
            let pattern = operand(object, "regex", mode, path)?;
            if let Mode::Check(_) = mode {
                // Unexpanded macros are not valid regex syntax.
                return Ok(true);
            }
            let regex = Regex::new(&pattern).map_err(|e| {
                Error::schema(path, format!("invalid regex in '{}' condition: {}", kind, e))
            })?;
            Ok(regex.is_match(&haystack) == (kind == "matches"))
        }
        "anyOf" | "allOf" => {
            let conditions = object
                .get("conditions")
                .and_then(Value::as_array)
                .ok_or_else(|| {
                    Error::schema(path, format!("'{}' condition needs an array 'conditions'", kind))
                })?;
            let mut results = Vec::with_capacity(conditions.len());
            for nested in conditions {
                results.push(walk(nested, mode, path)?);
            }
            Ok(if kind == "anyOf" {
                results.into_iter().any(|r| r)
            } else {
                results.into_iter().all(|r| r)
            })
        }
        "not" => {
            let nested = object
                .get("condition")
                .ok_or_else(|| Error::schema(path, "'not' condition needs a 'condition'"))?;
            Ok(!walk(nested, mode, path)?)
        }
        other => Err(Error::schema(path, format!("unknown condition type '{}'", other))),
    }
}

fn operand(object: &Map<String, Value>, key: &str, mode: &Mode<'_, '_>, path: &Path) -> Result<String> {
    let raw = object
        .get(key)
        .and_then(Value::as_str)
        .ok_or_else(|| Error::schema(path, format!("condition needs a string '{}'", key)))?;
    expand_operand(raw, mode)
}

fn expand_operand(raw: &str, mode: &Mode<'_, '_>) -> Result<String> {
    match mode {
        Mode::Evaluate(ctx) => expand::expand_str(raw, ctx),
        Mode::Check(version) => {
            expand::check_str(raw, *version)?;
            Ok(raw.to_string())
        }
    }
}
