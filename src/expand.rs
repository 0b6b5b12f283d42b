//! # Macro Expansion
//!
//! Presets may reference their surroundings through macros embedded in string
//! fields:
//!
//! - `${sourceDir}`, `${sourceParentDir}`, `${sourceDirName}`
//! - `${presetName}`, `${generator}`, `${fileDir}`, `${hostSystemName}`
//! - `${dollar}` (a literal `$`), `${pathListSep}` (`:` or `;`)
//! - `$env{NAME}`: the preset's environment, then the injected snapshot
//! - `$penv{NAME}`: the injected snapshot only
//! - `$vendor{KEY}`: the caller-supplied vendor bag
//!
//! Expansion is a single left-to-right textual substitution. Substituted text
//! is never scanned again, so a variable whose value contains `$env{...}`
//! cannot trigger further expansion. Any other `$xxx{...}` or `${...}` form
//! fails with [`Error::UnknownMacro`].
//!
//! Nothing here reads the real process environment: `$env{}` and `$penv{}`
//! see only the snapshot carried by [`MacroContext`].

use std::path::Path;
use std::sync::OnceLock;

use log::warn;
use regex::Regex;
use serde_json::{Map, Value};

use crate::config::Environment;
use crate::defaults::{FILE_DIR_MIN_VERSION, PATH_LIST_SEP_MIN_VERSION, PENV_MIN_VERSION};
use crate::error::{Error, Result};

/// Everything a macro may expand to, for one preset.
#[derive(Debug, Clone, Copy)]
pub struct MacroContext<'a> {
    pub source_dir: &'a Path,
    /// Directory of the document defining the preset.
    pub file_dir: &'a Path,
    pub preset_name: &'a str,
    /// The merged `generator` field, if any.
    pub generator: Option<&'a str>,
    /// Version of the document defining the preset; gates newer macros.
    pub version: u64,
    pub environment: &'a Environment,
    /// The preset's own expanded environment, consulted by `$env{}` first.
    pub preset_environment: Option<&'a Map<String, Value>>,
    pub vendor: &'a Map<String, Value>,
}

/// A recognized macro reference.
#[derive(Debug, Clone, PartialEq, Eq)]
enum MacroRef<'t> {
    SourceDir,
    SourceParentDir,
    SourceDirName,
    PresetName,
    Generator,
    FileDir,
    HostSystemName,
    Dollar,
    PathListSep,
    Env(&'t str),
    Penv(&'t str),
    Vendor(&'t str),
}

fn macro_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"\$([A-Za-z]*)\{([^{}]*)\}").expect("macro pattern is a valid regex")
    })
}

fn classify<'t>(namespace: &'t str, name: &'t str, text: &str, version: u64) -> Result<MacroRef<'t>> {
    let unknown = || Error::UnknownMacro {
        text: text.to_string(),
    };
    let reference = match (namespace, name) {
        ("", "sourceDir") => MacroRef::SourceDir,
        ("", "sourceParentDir") => MacroRef::SourceParentDir,
        ("", "sourceDirName") => MacroRef::SourceDirName,
        ("", "presetName") => MacroRef::PresetName,
        ("", "generator") => MacroRef::Generator,
        ("", "hostSystemName") => MacroRef::HostSystemName,
        ("", "dollar") => MacroRef::Dollar,
        ("", "fileDir") if version >= FILE_DIR_MIN_VERSION => MacroRef::FileDir,
        ("", "pathListSep") if version >= PATH_LIST_SEP_MIN_VERSION => MacroRef::PathListSep,
        ("env", var) if !var.is_empty() => MacroRef::Env(var),
        ("penv", var) if !var.is_empty() && version >= PENV_MIN_VERSION => MacroRef::Penv(var),
        ("vendor", key) if !key.is_empty() => MacroRef::Vendor(key),
        _ => return Err(unknown()),
    };
    Ok(reference)
}

/// Expands every macro in `raw`.
pub fn expand_str(raw: &str, ctx: &MacroContext<'_>) -> Result<String> {
    let lookup = |name: &str| -> Option<String> {
        ctx.preset_environment
            .and_then(|env| env.get(name))
            .and_then(Value::as_str)
            .map(str::to_string)
            .or_else(|| ctx.environment.get(name).cloned())
    };
    expand_with(raw, ctx, &lookup)
}

fn expand_with(
    raw: &str,
    ctx: &MacroContext<'_>,
    env_lookup: &dyn Fn(&str) -> Option<String>,
) -> Result<String> {
    let mut out = String::with_capacity(raw.len());
    let mut last = 0;

    for caps in macro_pattern().captures_iter(raw) {
        let whole = caps.get(0).map(|m| (m.start(), m.end(), m.as_str()));
        let Some((start, end, text)) = whole else {
            continue;
        };
        let namespace = caps.get(1).map_or("", |m| m.as_str());
        let name = caps.get(2).map_or("", |m| m.as_str());

        out.push_str(&raw[last..start]);
        match classify(namespace, name, text, ctx.version)? {
            MacroRef::SourceDir => out.push_str(&path_text(ctx.source_dir)),
            MacroRef::SourceParentDir => {
                out.push_str(&path_text(ctx.source_dir.parent().unwrap_or(ctx.source_dir)))
            }
            MacroRef::SourceDirName => out.push_str(
                &ctx.source_dir
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default(),
            ),
            MacroRef::PresetName => out.push_str(ctx.preset_name),
            MacroRef::Generator => out.push_str(ctx.generator.unwrap_or_default()),
            MacroRef::FileDir => out.push_str(&path_text(ctx.file_dir)),
            MacroRef::HostSystemName => out.push_str(host_system_name()),
            MacroRef::Dollar => out.push('$'),
            MacroRef::PathListSep => out.push_str(if cfg!(windows) { ";" } else { ":" }),
            MacroRef::Env(var) => out.push_str(&env_lookup(var).unwrap_or_default()),
            MacroRef::Penv(var) => {
                out.push_str(ctx.environment.get(var).map(String::as_str).unwrap_or_default())
            }
            MacroRef::Vendor(key) => match ctx.vendor.get(key) {
                Some(Value::String(value)) => out.push_str(value),
                Some(value) => out.push_str(&value.to_string()),
                None => {
                    warn!("No vendor value for {}; leaving it unexpanded", text);
                    out.push_str(text);
                }
            },
        }
        last = end;
    }

    out.push_str(&raw[last..]);
    Ok(out)
}

/// Expands every string inside `value`; other JSON types are returned unchanged.
pub fn expand_value(value: &Value, ctx: &MacroContext<'_>) -> Result<Value> {
    match value {
        Value::String(raw) => Ok(Value::String(expand_str(raw, ctx)?)),
        Value::Array(items) => items
            .iter()
            .map(|item| expand_value(item, ctx))
            .collect::<Result<Vec<_>>>()
            .map(Value::Array),
        Value::Object(map) => {
            let mut expanded = Map::new();
            for (key, item) in map {
                expanded.insert(key.clone(), expand_value(item, ctx)?);
            }
            Ok(Value::Object(expanded))
        }
        other => Ok(other.clone()),
    }
}

/// Expands one preset's own `environment` mapping at define time.
///
/// `inherited` is the already expanded environment of the preset's
/// ancestors, merged in inheritance order. Entries of `own` are expanded in
/// map order and `$env{NAME}` sees, in turn: entries of `own` expanded
/// before it, then `inherited`, then the injected snapshot. An entry that is
/// `null` (unset) expands to the empty string.
///
/// Returns `inherited` with the expanded entries of `own` merged over it.
/// `null` entries are kept as tombstones.
pub fn expand_environment(
    own: &Map<String, Value>,
    inherited: &Map<String, Value>,
    ctx: &MacroContext<'_>,
) -> Result<Map<String, Value>> {
    let mut expanded = inherited.clone();
    for (key, value) in own {
        let result = match value {
            Value::String(raw) => {
                let lookup = |name: &str| -> Option<String> {
                    match expanded.get(name) {
                        Some(Value::String(value)) => Some(value.clone()),
                        Some(Value::Null) => Some(String::new()),
                        Some(other) => Some(other.to_string()),
                        None => ctx.environment.get(name).cloned(),
                    }
                };
                Value::String(expand_with(raw, ctx, &lookup)?)
            }
            other => other.clone(),
        };
        expanded.insert(key.clone(), result);
    }
    Ok(expanded)
}

/// Checks the macro references in `raw` without expanding them.
///
/// Used for offline validation, where no live environment is available.
pub fn check_str(raw: &str, version: u64) -> Result<()> {
    for caps in macro_pattern().captures_iter(raw) {
        let text = caps.get(0).map_or("", |m| m.as_str());
        let namespace = caps.get(1).map_or("", |m| m.as_str());
        let name = caps.get(2).map_or("", |m| m.as_str());
        classify(namespace, name, text, version)?;
    }
    Ok(())
}

/// Checks every string inside `value`, collecting one error per bad reference.
pub fn check_value(value: &Value, version: u64, errors: &mut Vec<Error>) {
    match value {
        Value::String(raw) => {
            for caps in macro_pattern().captures_iter(raw) {
                let text = caps.get(0).map_or("", |m| m.as_str());
                let namespace = caps.get(1).map_or("", |m| m.as_str());
                let name = caps.get(2).map_or("", |m| m.as_str());
                if let Err(e) = classify(namespace, name, text, version) {
                    errors.push(e);
                }
            }
        }
        Value::Array(items) => items.iter().for_each(|item| check_value(item, version, errors)),
        Value::Object(map) => map.values().for_each(|item| check_value(item, version, errors)),
        _ => {}
    }
}

/// Name of the host system as spelled by `${hostSystemName}`.
pub fn host_system_name() -> &'static str {
    match std::env::consts::OS {
        "linux" => "Linux",
        "macos" => "Darwin",
        "windows" => "Windows",
        "freebsd" => "FreeBSD",
        "netbsd" => "NetBSD",
        "openbsd" => "OpenBSD",
        other => other,
    }
}

fn path_text(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    struct Fixture {
        environment: Environment,
        vendor: Map<String, Value>,
    }

    impl Fixture {
        fn new() -> Self {
            let mut environment = Environment::new();
            environment.insert("HOME".to_string(), "/home/tester".to_string());
            environment.insert("PATH".to_string(), "/usr/bin".to_string());
            let mut vendor = Map::new();
            vendor.insert("toolchain".to_string(), Value::from("llvm"));
            vendor.insert("jobs".to_string(), Value::from(8));
            Self {
                environment,
                vendor,
            }
        }

        fn ctx(&self) -> MacroContext<'_> {
            MacroContext {
                source_dir: Path::new("/work/proj"),
                file_dir: Path::new("/work/proj/cmake"),
                preset_name: "dev",
                generator: Some("Ninja"),
                version: 10,
                environment: &self.environment,
                preset_environment: None,
                vendor: &self.vendor,
            }
        }
    }

    #[test]
    fn test_expand_path_macros() {
        let f = Fixture::new();
        let ctx = f.ctx();
        assert_eq!(
            expand_str("${sourceDir}/build/${presetName}", &ctx).unwrap(),
            "/work/proj/build/dev"
        );
        assert_eq!(expand_str("${sourceParentDir}", &ctx).unwrap(), "/work");
        assert_eq!(expand_str("${sourceDirName}", &ctx).unwrap(), "proj");
        assert_eq!(expand_str("${fileDir}/toolchain.cmake", &ctx).unwrap(), "/work/proj/cmake/toolchain.cmake");
        assert_eq!(expand_str("gen=${generator}", &ctx).unwrap(), "gen=Ninja");
    }

    #[test]
    fn test_expand_dollar_and_host() {
        let f = Fixture::new();
        let ctx = f.ctx();
        assert_eq!(expand_str("${dollar}{x}", &ctx).unwrap(), "${x}");
        assert_eq!(expand_str("${hostSystemName}", &ctx).unwrap(), host_system_name());
    }

    #[test]
    fn test_env_uses_injected_snapshot() {
        let f = Fixture::new();
        let ctx = f.ctx();
        assert_eq!(expand_str("$env{HOME}/.local", &ctx).unwrap(), "/home/tester/.local");
        assert_eq!(expand_str("[$env{NOT_SET_ANYWHERE}]", &ctx).unwrap(), "[]");
    }

    #[test]
    fn test_env_prefers_preset_environment_penv_does_not() {
        let f = Fixture::new();
        let mut preset_env = Map::new();
        preset_env.insert("HOME".to_string(), Value::from("/opt/sandbox"));
        let ctx = MacroContext {
            preset_environment: Some(&preset_env),
            ..f.ctx()
        };
        assert_eq!(expand_str("$env{HOME}", &ctx).unwrap(), "/opt/sandbox");
        assert_eq!(expand_str("$penv{HOME}", &ctx).unwrap(), "/home/tester");
    }

    #[test]
    fn test_vendor_values() {
        let f = Fixture::new();
        let ctx = f.ctx();
        assert_eq!(expand_str("$vendor{toolchain}", &ctx).unwrap(), "llvm");
        assert_eq!(expand_str("-j$vendor{jobs}", &ctx).unwrap(), "-j8");
        assert_eq!(expand_str("$vendor{missing}", &ctx).unwrap(), "$vendor{missing}");
    }

    #[test]
    fn test_unknown_macro_names_literal_text() {
        let f = Fixture::new();
        let ctx = f.ctx();
        let err = expand_str("a ${bogus} b", &ctx).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnknownMacro);
        assert!(err.to_string().contains("${bogus}"));

        let err = expand_str("$shell{PATH}", &ctx).unwrap_err();
        assert!(err.to_string().contains("$shell{PATH}"));
    }

    #[test]
    fn test_version_gates() {
        let f = Fixture::new();
        let ctx = MacroContext {
            version: 3,
            ..f.ctx()
        };
        assert!(expand_str("${fileDir}", &ctx).is_err());
        assert!(expand_str("${pathListSep}", &ctx).is_err());
        assert!(expand_str("$penv{HOME}", &ctx).is_ok());

        let ctx = MacroContext {
            version: 2,
            ..f.ctx()
        };
        assert!(expand_str("$penv{HOME}", &ctx).is_err());
    }

    #[test]
    fn test_plain_dollar_text_is_left_alone() {
        let f = Fixture::new();
        let ctx = f.ctx();
        assert_eq!(expand_str("cost: $5 and $HOME", &ctx).unwrap(), "cost: $5 and $HOME");
    }

    #[test]
    fn test_expansion_is_not_recursive() {
        let mut environment = Environment::new();
        environment.insert("A".to_string(), "$env{B}".to_string());
        environment.insert("B".to_string(), "boom".to_string());
        let vendor = Map::new();
        let ctx = MacroContext {
            source_dir: Path::new("/s"),
            file_dir: Path::new("/s"),
            preset_name: "p",
            generator: None,
            version: 10,
            environment: &environment,
            preset_environment: None,
            vendor: &vendor,
        };
        assert_eq!(expand_str("$env{A}", &ctx).unwrap(), "$env{B}");
    }

    #[test]
    fn test_expand_value_only_touches_strings() {
        let f = Fixture::new();
        let ctx = f.ctx();
        let value: Value = serde_json::json!({
            "CMAKE_BUILD_TYPE": "Debug",
            "ENABLE": true,
            "LEVEL": 3,
            "PREFIX": {"type": "PATH", "value": "${sourceDir}/install"},
            "LIST": ["$env{HOME}", 1]
        });
        let expanded = expand_value(&value, &ctx).unwrap();
        assert_eq!(expanded["ENABLE"], true);
        assert_eq!(expanded["LEVEL"], 3);
        assert_eq!(expanded["PREFIX"]["value"], "/work/proj/install");
        assert_eq!(expanded["LIST"][0], "/home/tester");
        assert_eq!(expanded["LIST"][1], 1);
    }

    #[test]
    fn test_environment_sees_only_earlier_entries() {
        let f = Fixture::new();
        let ctx = f.ctx();
        let env: Map<String, Value> = serde_json::from_str(
            r#"{
                "TOOLS": "/opt/tools",
                "PATH": "$env{TOOLS}/bin:$env{PATH}",
                "EARLY": "$env{LATE}",
                "LATE": "late-value"
            }"#,
        )
        .unwrap();

        let expanded = expand_environment(&env, &Map::new(), &ctx).unwrap();
        assert_eq!(expanded["PATH"], "/opt/tools/bin:/usr/bin");
        // LATE is defined after EARLY and not in the snapshot.
        assert_eq!(expanded["EARLY"], "");
        assert_eq!(expanded["LATE"], "late-value");
    }

    #[test]
    fn test_environment_sees_inherited_entries_before_snapshot() {
        let f = Fixture::new();
        let ctx = f.ctx();
        let inherited: Map<String, Value> =
            serde_json::from_str(r#"{"PATH": "/base/bin", "CC": null}"#).unwrap();
        let own: Map<String, Value> = serde_json::from_str(
            r#"{"PATH": "$env{PATH}:/child/bin", "COMPILER": "[$env{CC}]", "HOME_COPY": "$env{HOME}"}"#,
        )
        .unwrap();

        let expanded = expand_environment(&own, &inherited, &ctx).unwrap();
        assert_eq!(expanded["PATH"], "/base/bin:/child/bin");
        assert_eq!(expanded["COMPILER"], "[]");
        assert_eq!(expanded["HOME_COPY"], "/home/tester");
        assert_eq!(expanded["CC"], Value::Null);
        let keys: Vec<&str> = expanded.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["PATH", "CC", "COMPILER", "HOME_COPY"]);
    }

    #[test]
    fn test_check_str_and_check_value() {
        assert!(check_str("${sourceDir}/$env{X}", 6).is_ok());
        assert!(check_str("${nope}", 6).is_err());

        let mut errors = Vec::new();
        let value = serde_json::json!({"a": "${nope}", "b": ["$what{x}", "${presetName}"]});
        check_value(&value, 6, &mut errors);
        assert_eq!(errors.len(), 2);
        assert!(errors.iter().all(|e| e.kind() == ErrorKind::UnknownMacro));
    }
}
