//! Path mapper for extracting sub-values from recorded bodies.
//!
//! Supports:
//! - Nested key access (e.g., "a.b.c")
//! - Array indexing (e.g., "pets[0].name", or "pets.0.name")
//! - Quoted bracket keys for names containing dots (e.g., "headers['x.trace'].id")
//! - An optional leading "$." (JSONPath style)

use serde_json::Value;

/// Path mapper error
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PathMapperError {
    #[error("Invalid path: {0}")]
    InvalidPath(String),
}

/// One step of a parsed path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSegment {
    Key(String),
    Index(usize),
}

/// Path mapper for reading values from JSON using dot/bracket-notation paths
pub struct PathMapper;

impl PathMapper {
    /// Get value from JSON using a dot/bracket path.
    ///
    /// Examples:
    /// - "pets[0].name"
    /// - "$.owner.address"
    /// - "matrix[1][2]"
    pub fn get_path<'a>(obj: &'a Value, path: &str) -> Option<&'a Value> {
        let segments = Self::parse(path).ok()?;
        if segments.is_empty() {
            return None;
        }

        let mut current = obj;
        for segment in &segments {
            current = match (segment, current) {
                (PathSegment::Key(key), Value::Object(map)) => map.get(key)?,
                (PathSegment::Index(idx), Value::Array(arr)) => arr.get(*idx)?,
                // "pets.0" style index on arrays
                (PathSegment::Key(key), Value::Array(arr)) => arr.get(key.parse::<usize>().ok()?)?,
                _ => return None,
            };
        }
        Some(current)
    }

    /// Get string value from path (converts non-strings to their JSON text)
    pub fn get_string(obj: &Value, path: &str) -> Option<String> {
        Self::get_path(obj, path).and_then(|v| match v {
            Value::String(s) => Some(s.clone()),
            other => serde_json::to_string(other).ok(),
        })
    }

    /// Split a path into key and index segments.
    pub fn parse(path: &str) -> Result<Vec<PathSegment>, PathMapperError> {
        let trimmed = path.trim();
        let normalized = trimmed
            .strip_prefix("$.")
            .or_else(|| trimmed.strip_prefix('$'))
            .unwrap_or(trimmed);

        let mut segments = Vec::new();
        let mut key = String::new();
        let mut chars = normalized.chars().peekable();

        while let Some(c) = chars.next() {
            match c {
                '.' => {
                    if !key.is_empty() {
                        segments.push(PathSegment::Key(std::mem::take(&mut key)));
                    }
                }
                '[' => {
                    if !key.is_empty() {
                        segments.push(PathSegment::Key(std::mem::take(&mut key)));
                    }
                    let mut inner = String::new();
                    let mut closed = false;
                    for c in chars.by_ref() {
                        if c == ']' {
                            closed = true;
                            break;
                        }
                        inner.push(c);
                    }
                    if !closed {
                        return Err(PathMapperError::InvalidPath(format!(
                            "unterminated '[' in '{}'",
                            path
                        )));
                    }
                    segments.push(Self::bracket_segment(&inner, path)?);
                }
                _ => key.push(c),
            }
        }
        if !key.is_empty() {
            segments.push(PathSegment::Key(key));
        }

        Ok(segments)
    }

    fn bracket_segment(inner: &str, path: &str) -> Result<PathSegment, PathMapperError> {
        let inner = inner.trim();
        let quoted = inner
            .strip_prefix('\'')
            .and_then(|s| s.strip_suffix('\''))
            .or_else(|| inner.strip_prefix('"').and_then(|s| s.strip_suffix('"')));
        if let Some(key) = quoted {
            return Ok(PathSegment::Key(key.to_string()));
        }
        inner
            .parse::<usize>()
            .map(PathSegment::Index)
            .map_err(|_| {
                PathMapperError::InvalidPath(format!("bad index '{}' in '{}'", inner, path))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_get_path_nested() {
        let obj = json!({"owner": {"pets": [{"name": "rex"}, {"name": "tom"}]}});
        assert_eq!(
            PathMapper::get_path(&obj, "owner.pets[1].name"),
            Some(&json!("tom"))
        );
        assert_eq!(
            PathMapper::get_path(&obj, "$.owner.pets.0.name"),
            Some(&json!("rex"))
        );
        assert_eq!(PathMapper::get_path(&obj, "owner.cats"), None);
        assert_eq!(PathMapper::get_path(&obj, ""), None);
    }

    #[test]
    fn test_quoted_bracket_keys() {
        let obj = json!({"a.b": {"c": 1}});
        assert_eq!(PathMapper::get_path(&obj, "['a.b'].c"), Some(&json!(1)));
        assert_eq!(PathMapper::get_path(&obj, "[\"a.b\"]"), Some(&json!({"c": 1})));
    }

    #[test]
    fn test_top_level_array() {
        let obj = json!([[1, 2], [3, 4]]);
        assert_eq!(PathMapper::get_path(&obj, "[1][0]"), Some(&json!(3)));
    }

    #[test]
    fn test_get_string() {
        let obj = json!({"n": 5, "s": "x"});
        assert_eq!(PathMapper::get_string(&obj, "n"), Some("5".to_string()));
        assert_eq!(PathMapper::get_string(&obj, "s"), Some("x".to_string()));
    }

    #[test]
    fn test_parse_errors() {
        assert!(PathMapper::parse("a[0").is_err());
        assert!(PathMapper::parse("a[x]").is_err());
        assert_eq!(
            PathMapper::parse("a[2].b").unwrap(),
            vec![
                PathSegment::Key("a".into()),
                PathSegment::Index(2),
                PathSegment::Key("b".into())
            ]
        );
    }
}
