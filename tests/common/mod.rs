//! Shared test utilities for integration and E2E tests.
//!
//! This module provides preset documents, a temporary project fixture, and
//! helpers to run the `cmpreset` binary against it.
//!
//! ## Usage
//!
//! Add `mod common;` to your test file, then use the helpers:
//!
//! ```rust,ignore
//! mod common;
//! use common::prelude::*;
//!
//! #[test]
//! fn test_example() {
//!     let fixture = TestFixture::new().with_project(presets::BASIC);
//!     fixture.command().args(["list"]).assert().success();
//! }
//! ```

use assert_fs::prelude::*;
use std::path::{Path, PathBuf};

/// Re-export commonly used test dependencies for convenience.
pub mod prelude {
    #[allow(unused_imports)]
    pub use assert_cmd::cargo::cargo_bin_cmd;
    pub use assert_fs::prelude::*;
    #[allow(unused_imports)]
    pub use assert_fs::TempDir;
    pub use predicates::prelude::*;

    #[allow(unused_imports)]
    pub use super::presets;
    pub use super::TestFixture;
}

/// Presets documents used across tests.
#[allow(dead_code)]
pub mod presets {
    /// A project with a hidden base, two visible configure presets, and a
    /// build preset pointing at one of them.
    pub const BASIC: &str = r#"{
  "version": 6,
  "configurePresets": [
    {
      "name": "base",
      "hidden": true,
      "generator": "Ninja",
      "binaryDir": "${sourceDir}/build/${presetName}",
      "cacheVariables": {
        "CMAKE_EXPORT_COMPILE_COMMANDS": "ON"
      },
      "environment": {
        "CC": "clang"
      }
    },
    {
      "name": "debug",
      "displayName": "Debug",
      "inherits": "base",
      "cacheVariables": {
        "CMAKE_BUILD_TYPE": "Debug"
      }
    },
    {
      "name": "release",
      "inherits": "base",
      "cacheVariables": {
        "CMAKE_BUILD_TYPE": "Release"
      }
    }
  ],
  "buildPresets": [
    {
      "name": "release",
      "configurePreset": "release"
    }
  ]
}
"#;

    /// A project whose inheritance graph has a cycle.
    pub const CYCLIC: &str = r#"{
  "version": 6,
  "configurePresets": [
    {
      "name": "a",
      "inherits": "b"
    },
    {
      "name": "b",
      "inherits": "a"
    }
  ]
}
"#;

    /// A user document adding one preset on top of [`BASIC`].
    pub const USER_DEV: &str = r#"{
  "version": 6,
  "configurePresets": [
    {
      "name": "dev",
      "inherits": "debug",
      "environment": {
        "CC": null
      }
    }
  ]
}
"#;

    /// Not JSON at all.
    pub const MALFORMED: &str = r#"{ "version": 6, "configurePresets": [ }"#;
}

/// A temporary project directory holding presets documents.
///
/// # Example
///
/// ```rust,ignore
/// let fixture = TestFixture::new()
///     .with_project(presets::BASIC)
///     .with_user(presets::USER_DEV);
///
/// fixture.command().args(["show", "dev"]).assert().success();
/// ```
pub struct TestFixture {
    temp_dir: assert_fs::TempDir,
}

impl TestFixture {
    /// Create a new test fixture with an empty temporary directory.
    pub fn new() -> Self {
        Self {
            temp_dir: assert_fs::TempDir::new().expect("Failed to create temp directory"),
        }
    }

    /// Write `CMakePresets.json` with the given content.
    pub fn with_project(self, content: &str) -> Self {
        self.with_file("CMakePresets.json", content)
    }

    /// Write `CMakeUserPresets.json` with the given content.
    #[allow(dead_code)]
    pub fn with_user(self, content: &str) -> Self {
        self.with_file("CMakeUserPresets.json", content)
    }

    /// Add a file with the given path and content.
    pub fn with_file(self, path: &str, content: &str) -> Self {
        self.temp_dir
            .child(path)
            .write_str(content)
            .expect("Failed to write file");
        self
    }

    /// Get the path to the temporary directory.
    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    #[allow(dead_code)]
    pub fn project_path(&self) -> PathBuf {
        self.path().join("CMakePresets.json")
    }

    #[allow(dead_code)]
    pub fn user_path(&self) -> PathBuf {
        self.path().join("CMakeUserPresets.json")
    }

    /// Current content of a file in the fixture.
    #[allow(dead_code)]
    pub fn read(&self, path: &str) -> String {
        std::fs::read_to_string(self.path().join(path)).expect("Failed to read file")
    }

    /// Current user document, parsed.
    #[allow(dead_code)]
    pub fn user_json(&self) -> serde_json::Value {
        serde_json::from_str(&self.read("CMakeUserPresets.json")).expect("user document is JSON")
    }

    /// Create a child path in the temp directory.
    #[allow(dead_code)]
    pub fn child(&self, path: &str) -> assert_fs::fixture::ChildPath {
        self.temp_dir.child(path)
    }
}

impl Default for TestFixture {
    fn default() -> Self {
        Self::new()
    }
}

impl TestFixture {
    /// Create a command running in this fixture's directory.
    ///
    /// `CMPRESET_*` variables of the surrounding environment are cleared and
    /// colors are turned off, so output is stable.
    pub fn command(&self) -> assert_cmd::Command {
        let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("cmpreset");
        cmd.current_dir(self.path())
            .env_remove("CMPRESET_SOURCE_DIR")
            .env_remove("CMPRESET_PROJECT_FILE")
            .env_remove("CMPRESET_USER_FILE")
            .env_remove("CMPRESET_VENDOR_FILE")
            .env_remove("RUST_LOG")
            .arg("--color")
            .arg("never");
        cmd
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixture_creates_temp_dir() {
        let fixture = TestFixture::new();
        assert!(fixture.path().exists());
    }

    #[test]
    fn test_fixture_with_project() {
        let fixture = TestFixture::new().with_project(presets::BASIC);
        assert!(fixture.project_path().exists());
        assert!(!fixture.user_path().exists());
    }

    #[test]
    fn test_presets_are_valid_json() {
        for text in [presets::BASIC, presets::CYCLIC, presets::USER_DEV] {
            serde_json::from_str::<serde_json::Value>(text).expect("preset fixture must be JSON");
        }
        assert!(serde_json::from_str::<serde_json::Value>(presets::MALFORMED).is_err());
    }
}
