//! Property-based tests for macro expansion.
//!
//! These tests use proptest to generate random inputs and verify that
//! invariants hold for all possible inputs.

#[cfg(test)]
mod proptest_tests {
    use crate::config::Environment;
    use crate::expand::{expand_str, MacroContext};
    use proptest::prelude::*;
    use serde_json::Map;
    use std::path::Path;

    fn with_ctx<T>(environment: &Environment, f: impl FnOnce(&MacroContext<'_>) -> T) -> T {
        let vendor = Map::new();
        let ctx = MacroContext {
            source_dir: Path::new("/src"),
            file_dir: Path::new("/src"),
            preset_name: "p",
            generator: None,
            version: 10,
            environment,
            preset_environment: None,
            vendor: &vendor,
        };
        f(&ctx)
    }

    proptest! {
        /// Property: text without any '$' comes back unchanged
        #[test]
        fn expand_is_identity_without_dollar(input in "[^$]*") {
            let env = Environment::new();
            let result = with_ctx(&env, |ctx| expand_str(&input, ctx)).unwrap();
            prop_assert_eq!(result, input);
        }

        /// Property: an environment value is substituted verbatim, never re-scanned
        #[test]
        fn env_values_are_not_rescanned(value in ".*") {
            let mut env = Environment::new();
            env.insert("V".to_string(), value.clone());
            let result = with_ctx(&env, |ctx| expand_str("$env{V}", ctx)).unwrap();
            prop_assert_eq!(result, value);
        }

        /// Property: literal text around a macro is preserved
        #[test]
        fn surrounding_text_is_preserved(prefix in "[a-z/]*", suffix in "[a-z/]*") {
            let env = Environment::new();
            let raw = format!("{}${{presetName}}{}", prefix, suffix);
            let result = with_ctx(&env, |ctx| expand_str(&raw, ctx)).unwrap();
            prop_assert_eq!(result, format!("{}p{}", prefix, suffix));
        }
    }
}
