//! Snapshot tests for rendered presets using insta.
//!
//! The snapshots are inline, so a change to the rendered form shows up in
//! the diff of this file. To update them after intentional changes:
//! ```bash
//! cargo insta test --accept
//! ```

mod common;
use common::prelude::*;

fn stdout_of(fixture: &TestFixture, args: &[&str]) -> String {
    let output = fixture.command().args(args).output().expect("Failed to execute command");
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    String::from_utf8_lossy(&output.stdout)
        .lines()
        .map(str::trim_end)
        .collect::<Vec<_>>()
        .join("\n")
}

#[test]
fn test_show_raw_json_snapshot() {
    let fixture = TestFixture::new().with_project(presets::BASIC);

    insta::assert_snapshot!(stdout_of(&fixture, &["show", "debug", "--raw"]), @r#"
    {
      "name": "debug",
      "hidden": false,
      "inherits": [
        "base"
      ],
      "displayName": "Debug",
      "cacheVariables": {
        "CMAKE_EXPORT_COMPILE_COMMANDS": "ON",
        "CMAKE_BUILD_TYPE": "Debug"
      },
      "generator": "Ninja",
      "binaryDir": "${sourceDir}/build/${presetName}",
      "environment": {
        "CC": "clang"
      }
    }
    "#);
}

#[test]
fn test_show_override_json_snapshot() {
    let fixture = TestFixture::new()
        .with_project(presets::BASIC)
        .with_user(presets::USER_DEV);

    insta::assert_snapshot!(stdout_of(&fixture, &["show", "dev", "--raw"]), @r#"
    {
      "name": "dev",
      "hidden": false,
      "inherits": [
        "debug"
      ],
      "environment": {},
      "generator": "Ninja",
      "binaryDir": "${sourceDir}/build/${presetName}",
      "cacheVariables": {
        "CMAKE_EXPORT_COMPILE_COMMANDS": "ON",
        "CMAKE_BUILD_TYPE": "Debug"
      }
    }
    "#);
}

#[test]
fn test_show_build_preset_yaml_snapshot() {
    let fixture = TestFixture::new().with_project(presets::BASIC);

    insta::assert_snapshot!(stdout_of(&fixture, &["show", "release", "--kind", "build", "--format", "yaml"]), @r"
    name: release
    hidden: false
    configurePreset: release
    ");
}
