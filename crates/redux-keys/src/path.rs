//! Dotted state paths and their resolution against a JSON state tree.

use std::fmt;

use serde_json::Value;

use crate::error::{Error, Result};

/// A dotted path such as `projects.data.items`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StatePath {
    raw: String,
}

impl StatePath {
    pub fn parse(raw: impl Into<String>) -> Result<Self> {
        let raw = raw.into();
        if raw.is_empty() {
            return Err(Error::EmptyStatePath);
        }
        Ok(Self { raw })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.raw.split('.')
    }

    /// The last segment; used as the property name for unaliased paths.
    pub fn leaf(&self) -> &str {
        self.raw.rsplit('.').next().unwrap_or(&self.raw)
    }

    /// Resolve against `state`.
    ///
    /// The first segment is looked up on the root. Every further step needs
    /// the current value to be an object or array, otherwise the whole path is
    /// reported. A missing leaf resolves to `null`.
    pub fn resolve(&self, state: &Value) -> Result<Value> {
        let mut segments = self.segments();
        let mut current = segments.next().and_then(|first| child(state, first));

        for segment in segments {
            match current {
                Some(value) if is_container(value) => current = child(value, segment),
                _ => {
                    return Err(Error::PathResolution {
                        path: self.raw.clone(),
                    })
                }
            }
        }

        Ok(current.cloned().unwrap_or(Value::Null))
    }
}

impl fmt::Display for StatePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

fn is_container(value: &Value) -> bool {
    matches!(value, Value::Object(_) | Value::Array(_))
}

fn child<'a>(value: &'a Value, segment: &str) -> Option<&'a Value> {
    match value {
        Value::Object(map) => map.get(segment),
        Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn path(raw: &str) -> StatePath {
        StatePath::parse(raw).unwrap()
    }

    #[test]
    fn test_resolves_nested_value() {
        let state = json!({ "a": { "b": { "c": 42 } } });
        assert_eq!(path("a.b.c").resolve(&state).unwrap(), json!(42));
        assert_eq!(path("a.b").resolve(&state).unwrap(), json!({ "c": 42 }));
    }

    #[test]
    fn test_missing_leaf_is_null() {
        let state = json!({ "a": {} });
        assert_eq!(path("a.c").resolve(&state).unwrap(), Value::Null);
        assert_eq!(path("z").resolve(&state).unwrap(), Value::Null);
    }

    #[test]
    fn test_descending_past_missing_segment_fails() {
        let state = json!({ "a": {} });
        let err = path("a.missing.c").resolve(&state).unwrap_err();
        assert_eq!(
            err,
            Error::PathResolution {
                path: "a.missing.c".to_string()
            }
        );
    }

    #[test]
    fn test_descending_into_scalar_fails() {
        let state = json!({ "a": { "b": 1 } });
        assert!(path("a.b.c").resolve(&state).is_err());
        let state = json!({ "a": null });
        assert!(path("a.b").resolve(&state).is_err());
    }

    #[test]
    fn test_arrays_indexed_by_segment() {
        let state = json!({ "list": [{ "id": 1 }, { "id": 2 }] });
        assert_eq!(path("list.1.id").resolve(&state).unwrap(), json!(2));
        assert_eq!(path("list.x").resolve(&state).unwrap(), Value::Null);
    }

    #[test]
    fn test_leaf_names() {
        assert_eq!(path("a.b.c").leaf(), "c");
        assert_eq!(path("projects").leaf(), "projects");
        assert_eq!(StatePath::parse(""), Err(Error::EmptyStatePath));
    }
}
