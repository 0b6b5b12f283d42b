//! # Add Command Implementation
//!
//! This module implements the `add` subcommand, which appends a new preset to
//! the user document.
//!
//! ## Functionality
//!
//! - **Preset Construction**: Builds the preset from flags, keys in the
//!   conventional order (`name`, `displayName`, `hidden`, `inherits`, ...)
//! - **Graph Validation**: The new preset must not collide with an existing
//!   name, and every parent it names must exist
//! - **User Document Only**: The project document is never modified; the user
//!   document is created if it does not exist yet

use anyhow::Result;
use clap::Args;
use serde_json::{Map, Value};

use cmpreset::output::OutputConfig;
use cmpreset::preset::PresetKind;
use cmpreset::suggestions;

use crate::cli::GlobalArgs;
use crate::commands::{parse_assignments, report_edit};

/// Add a preset to the user document
#[derive(Args, Debug)]
pub struct AddArgs {
    /// Name of the new preset.
    pub name: String,

    /// Kind of the preset (configure, build, test, package, workflow).
    #[arg(short, long, value_name = "KIND", default_value = "configure")]
    pub kind: PresetKind,

    /// Parent preset; repeat for several parents, the first one winning.
    #[arg(short, long, value_name = "PRESET")]
    pub inherits: Vec<String>,

    /// CMake generator (configure presets only).
    #[arg(short, long, value_name = "GENERATOR")]
    pub generator: Option<String>,

    /// Build directory (configure presets only); macros are allowed.
    #[arg(long, value_name = "DIR")]
    pub binary_dir: Option<String>,

    /// Cache variable as KEY=VALUE (configure presets only); repeatable.
    #[arg(long = "cache", value_name = "KEY=VALUE")]
    pub cache: Vec<String>,

    /// Environment variable as KEY=VALUE; repeatable.
    #[arg(long = "env", value_name = "KEY=VALUE")]
    pub env: Vec<String>,

    /// Mark the preset as hidden (only usable as a parent).
    #[arg(long)]
    pub hidden: bool,

    /// Human-readable name shown by IDEs.
    #[arg(long, value_name = "TEXT")]
    pub display_name: Option<String>,
}

/// Execute the `add` command.
pub fn execute(args: AddArgs, globals: &GlobalArgs) -> Result<()> {
    let out = OutputConfig::from_env_and_flag(&globals.color);
    let kind = args.kind;
    let preset = build_preset(args)?;

    let mut catalog = globals.open_catalog()?;
    let outcome = catalog.add(kind, preset)?;
    report_edit(&out, &catalog, kind, &outcome);
    Ok(())
}

/// Builds the preset object described by the flags.
fn build_preset(args: AddArgs) -> Result<Map<String, Value>> {
    if args.kind != PresetKind::Configure {
        let configure_only = [
            ("--generator", args.generator.is_some()),
            ("--binary-dir", args.binary_dir.is_some()),
            ("--cache", !args.cache.is_empty()),
        ];
        if let Some((option, _)) = configure_only.iter().find(|(_, given)| *given) {
            return Err(suggestions::configure_only_option(args.kind, option));
        }
    }

    let mut preset = Map::new();
    preset.insert("name".to_string(), Value::from(args.name));
    if let Some(display_name) = args.display_name {
        preset.insert("displayName".to_string(), Value::from(display_name));
    }
    if args.hidden {
        preset.insert("hidden".to_string(), Value::Bool(true));
    }
    match args.inherits.len() {
        0 => {}
        1 => {
            preset.insert("inherits".to_string(), Value::from(args.inherits[0].clone()));
        }
        _ => {
            preset.insert("inherits".to_string(), Value::from(args.inherits));
        }
    }
    if let Some(generator) = args.generator {
        preset.insert("generator".to_string(), Value::from(generator));
    }
    if let Some(binary_dir) = args.binary_dir {
        preset.insert("binaryDir".to_string(), Value::from(binary_dir));
    }
    if !args.cache.is_empty() {
        preset.insert("cacheVariables".to_string(), mapping("--cache", &args.cache)?);
    }
    if !args.env.is_empty() {
        preset.insert("environment".to_string(), mapping("--env", &args.env)?);
    }
    Ok(preset)
}

fn mapping(flag: &str, items: &[String]) -> Result<Value> {
    let entries = parse_assignments(flag, items)?
        .into_iter()
        .map(|(key, value)| (key, Value::from(value)))
        .collect::<Map<String, Value>>();
    Ok(Value::Object(entries))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn args(name: &str) -> AddArgs {
        AddArgs {
            name: name.to_string(),
            kind: PresetKind::Configure,
            inherits: Vec::new(),
            generator: None,
            binary_dir: None,
            cache: Vec::new(),
            env: Vec::new(),
            hidden: false,
            display_name: None,
        }
    }

    #[test]
    fn test_build_preset_in_conventional_order() {
        let mut add = args("dev");
        add.binary_dir = Some("${sourceDir}/build/dev".to_string());
        add.inherits = vec!["base".to_string()];
        add.cache = vec!["CMAKE_BUILD_TYPE=Debug".to_string()];
        add.hidden = true;

        let preset = build_preset(add).unwrap();
        let keys: Vec<&str> = preset.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["name", "hidden", "inherits", "binaryDir", "cacheVariables"]);
        assert_eq!(preset["inherits"], json!("base"));
        assert_eq!(preset["cacheVariables"], json!({"CMAKE_BUILD_TYPE": "Debug"}));
    }

    #[test]
    fn test_several_parents_become_an_array() {
        let mut add = args("dev");
        add.inherits = vec!["a".to_string(), "b".to_string()];
        assert_eq!(build_preset(add).unwrap()["inherits"], json!(["a", "b"]));
    }

    #[test]
    fn test_configure_only_options_rejected_for_build_presets() {
        let mut add = args("b");
        add.kind = PresetKind::Build;
        add.generator = Some("Ninja".to_string());
        let message = build_preset(add).unwrap_err().to_string();
        assert!(message.contains("--generator only applies to configure presets"));
    }

    #[test]
    fn test_environment_for_build_presets() {
        let mut add = args("b");
        add.kind = PresetKind::Build;
        add.env = vec!["VERBOSE=1".to_string()];
        assert_eq!(build_preset(add).unwrap()["environment"], json!({"VERBOSE": "1"}));
    }
}
