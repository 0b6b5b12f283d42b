//! Merge operations on preset documents
//!
//! This module holds the JSON-level helpers shared by the resolver and the
//! edit engine, and the edit engine itself.
//!
//! ## Submodules
//!
//! - `json` - overlaying preset fields, variable tombstones, and path-based
//!   get/set/remove inside a preset object
//! - `engine` - the `MergeEngine`: tentative edits of the user document,
//!   validated against the post-edit inheritance graph before they are
//!   committed
//!
//! ## Field Paths
//!
//! Edits address a field inside a preset with a path expression such as
//! `cacheVariables.CMAKE_BUILD_TYPE`, parsed by [`parse_path`] into
//! [`PathSegment`]s.

pub mod engine;
pub mod json;

pub use engine::{apply_edit, Edit, EditOutcome, MergeEngine};

/// Represents a segment in a field path
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PathSegment {
    /// A named key inside an object
    Key(String),
    /// A numeric index inside an array
    Index(usize),
}

/// Parse a field path into segments
///
/// Supports:
/// - Dot notation: `cacheVariables.CMAKE_BUILD_TYPE`
/// - Quoted brackets for keys containing dots: `cacheVariables["my.var"]`
/// - Array indices: `targets[0]`
/// - Escaped dots: `cacheVariables.my\.var`
///
/// Returns an error message for unterminated brackets or quotes.
///
/// # Examples
///
/// ```
/// use cmpreset::merge::{parse_path, PathSegment};
///
/// let segments = parse_path("cacheVariables.CMAKE_BUILD_TYPE").unwrap();
/// assert_eq!(segments[1], PathSegment::Key("CMAKE_BUILD_TYPE".to_string()));
/// ```
pub fn parse_path(path: &str) -> Result<Vec<PathSegment>, String> {
    let mut segments = Vec::new();
    let mut current = String::new();
    let mut chars = path.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '\\' => match chars.next() {
                Some(escaped) => current.push(escaped),
                None => return Err(format!("trailing escape in '{}'", path)),
            },
            '.' => {
                if !current.is_empty() {
                    segments.push(PathSegment::Key(std::mem::take(&mut current)));
                }
            }
            '[' => {
                if !current.is_empty() {
                    segments.push(PathSegment::Key(std::mem::take(&mut current)));
                }

                match chars.peek().copied() {
                    Some(quote @ ('"' | '\'')) => {
                        chars.next();
                        let mut key = String::new();
                        let mut closed = false;
                        while let Some(ch) = chars.next() {
                            if ch == '\\' {
                                if let Some(escaped) = chars.next() {
                                    key.push(escaped);
                                }
                            } else if ch == quote {
                                closed = true;
                                break;
                            } else {
                                key.push(ch);
                            }
                        }
                        if !closed || chars.next() != Some(']') {
                            return Err(format!("unterminated quoted key in '{}'", path));
                        }
                        segments.push(PathSegment::Key(key));
                    }
                    _ => {
                        let mut content = String::new();
                        let mut closed = false;
                        for ch in chars.by_ref() {
                            if ch == ']' {
                                closed = true;
                                break;
                            }
                            content.push(ch);
                        }
                        if !closed {
                            return Err(format!("unterminated '[' in '{}'", path));
                        }
                        let content = content.trim();
                        match content.parse::<usize>() {
                            Ok(idx) => segments.push(PathSegment::Index(idx)),
                            Err(_) if !content.is_empty() => {
                                segments.push(PathSegment::Key(content.to_string()))
                            }
                            Err(_) => return Err(format!("empty brackets in '{}'", path)),
                        }
                    }
                }
            }
            _ => current.push(ch),
        }
    }

    if !current.is_empty() {
        segments.push(PathSegment::Key(current));
    }

    Ok(segments)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_path_dot_notation() {
        let segments = parse_path("cacheVariables.CMAKE_BUILD_TYPE").unwrap();
        assert_eq!(
            segments,
            vec![
                PathSegment::Key("cacheVariables".to_string()),
                PathSegment::Key("CMAKE_BUILD_TYPE".to_string()),
            ]
        );
    }

    #[test]
    fn test_parse_path_single_field() {
        assert_eq!(
            parse_path("generator").unwrap(),
            vec![PathSegment::Key("generator".to_string())]
        );
    }

    #[test]
    fn test_parse_path_array_index() {
        let segments = parse_path("targets[1]").unwrap();
        assert_eq!(segments[0], PathSegment::Key("targets".to_string()));
        assert_eq!(segments[1], PathSegment::Index(1));
    }

    #[test]
    fn test_parse_path_quoted_key_with_dots() {
        let segments = parse_path(r#"cacheVariables["my.var"]"#).unwrap();
        assert_eq!(segments[1], PathSegment::Key("my.var".to_string()));
        let segments = parse_path("cacheVariables['x']").unwrap();
        assert_eq!(segments[1], PathSegment::Key("x".to_string()));
    }

    #[test]
    fn test_parse_path_escaped_dot() {
        let segments = parse_path(r"environment.A\.B").unwrap();
        assert_eq!(segments[1], PathSegment::Key("A.B".to_string()));
    }

    #[test]
    fn test_parse_path_empty() {
        assert!(parse_path("").unwrap().is_empty());
    }

    #[test]
    fn test_parse_path_errors() {
        assert!(parse_path("targets[0").is_err());
        assert!(parse_path(r#"cacheVariables["open"#).is_err());
        assert!(parse_path("a[]").is_err());
        assert!(parse_path("a\\").is_err());
    }
}
