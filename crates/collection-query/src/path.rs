//! Dot-path field resolution.
//!
//! Field paths such as `owner.email` address nested members of a JSON record.
//! The same traversal rules are used for searchability checks, filter
//! evaluation and output projection:
//!
//! - object members are looked up by key
//! - a numeric segment indexes into an array
//! - any other segment applied to an array fans out over its elements

use serde_json::{Map, Value};

/// Splits a path into its segments.
pub fn segments(path: &str) -> impl Iterator<Item = &str> {
    path.split('.').filter(|s| !s.is_empty())
}

/// Returns true if `prefix` equals `path` or is a whole-segment prefix of it.
///
/// `owner` is a prefix of `owner.email`; `own` is not.
pub fn is_prefix(prefix: &str, path: &str) -> bool {
    path == prefix
        || (path.len() > prefix.len()
            && path.starts_with(prefix)
            && path.as_bytes()[prefix.len()] == b'.')
}

/// Resolves a path to a single value.
///
/// Arrays are only traversed through numeric segments; use [`resolve_all`]
/// to fan out over array elements.
pub fn resolve<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    segments(path).try_fold(value, |current, segment| match current {
        Value::Object(obj) => obj.get(segment),
        Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    })
}

/// Resolves a path to every value it reaches, fanning out over arrays.
///
/// A path that reaches nothing yields an empty list. A path that ends on an
/// array yields the array itself, not its elements.
pub fn resolve_all<'a>(value: &'a Value, path: &str) -> Vec<&'a Value> {
    let parts: Vec<&str> = segments(path).collect();
    let mut out = Vec::new();
    collect(value, &parts, &mut out);
    out
}

fn collect<'a>(value: &'a Value, parts: &[&str], out: &mut Vec<&'a Value>) {
    let Some((head, rest)) = parts.split_first() else {
        out.push(value);
        return;
    };

    match value {
        Value::Object(obj) => {
            if let Some(child) = obj.get(*head) {
                collect(child, rest, out);
            }
        }
        Value::Array(items) => match head.parse::<usize>() {
            Ok(index) => {
                if let Some(child) = items.get(index) {
                    collect(child, rest, out);
                }
            }
            Err(_) => {
                for item in items {
                    collect(item, parts, out);
                }
            }
        },
        _ => {}
    }
}

/// Projects a record onto the given paths, preserving nesting.
///
/// Members not named by any path are dropped. A path that is absent on the
/// record is omitted from the result rather than filled with `null`. Arrays are
/// projected element by element.
pub fn project(value: &Value, paths: &[&str]) -> Value {
    match value {
        Value::Object(obj) => Value::Object(project_object(obj, paths)),
        Value::Array(items) => Value::Array(
            items
                .iter()
                .map(|item| project(item, paths))
                .filter(|item| !is_empty_projection(item))
                .collect(),
        ),
        _ => value.clone(),
    }
}

fn project_object(obj: &Map<String, Value>, paths: &[&str]) -> Map<String, Value> {
    let mut result = Map::new();

    for (key, val) in obj {
        if paths.iter().any(|p| *p == key) {
            result.insert(key.clone(), val.clone());
            continue;
        }

        let nested: Vec<&str> = paths
            .iter()
            .filter_map(|p| p.strip_prefix(key.as_str())?.strip_prefix('.'))
            .collect();

        if nested.is_empty() || !(val.is_object() || val.is_array()) {
            continue;
        }

        let projected = project(val, &nested);
        if !is_empty_projection(&projected) {
            result.insert(key.clone(), projected);
        }
    }

    result
}

fn is_empty_projection(value: &Value) -> bool {
    match value {
        Value::Object(obj) => obj.is_empty(),
        Value::Array(items) => items.is_empty(),
        _ => false,
    }
}

/// Removes the given top-level or nested paths from a record.
pub fn strip(value: &Value, paths: &[&str]) -> Value {
    match value {
        Value::Object(obj) => {
            let mut result = Map::new();
            for (key, val) in obj {
                if paths.iter().any(|p| *p == key) {
                    continue;
                }
                let nested: Vec<&str> = paths
                    .iter()
                    .filter_map(|p| p.strip_prefix(key.as_str())?.strip_prefix('.'))
                    .collect();
                if nested.is_empty() {
                    result.insert(key.clone(), val.clone());
                } else {
                    result.insert(key.clone(), strip(val, &nested));
                }
            }
            Value::Object(result)
        }
        Value::Array(items) => Value::Array(items.iter().map(|item| strip(item, paths)).collect()),
        _ => value.clone(),
    }
}
