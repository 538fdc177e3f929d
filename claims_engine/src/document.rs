//! Path resolution over loosely structured claim documents.
//!
//! Documents are plain `serde_json::Value` trees (null, bool, number,
//! string, array, object) with object keys kept in declared order. Two
//! lookup strategies exist and callers always try them in this order:
//!
//! 1. [`resolve_path`]: dotted path (`Claim.MemberID`, `Claim.Activity.0.Code`),
//!    exact key first, then a case-insensitive match for that segment only.
//! 2. [`find_first_occurrence`]: the first key with a case-insensitive name
//!    match anywhere in the tree.

use serde_json::{Map, Value};

/// Resolve a dotted path. Missing keys, out-of-range indices and stepping
/// into scalars all yield `None`.
pub fn resolve_path<'a>(document: &'a Value, path: &str) -> Option<&'a Value> {
    let mut current = document;
    for segment in path.split('.') {
        current = step(current, segment)?;
    }
    Some(current)
}

fn step<'a>(current: &'a Value, segment: &str) -> Option<&'a Value> {
    if is_index_segment(segment) {
        let index: usize = segment.parse().ok()?;
        return match current {
            Value::Array(items) => items.get(index),
            _ => None,
        };
    }

    match current {
        Value::Object(map) => lookup_key(map, segment),
        _ => None,
    }
}

fn is_index_segment(segment: &str) -> bool {
    !segment.is_empty() && segment.bytes().all(|b| b.is_ascii_digit())
}

/// Exact key match, then the first key equal ignoring case.
pub fn lookup_key<'a>(map: &'a Map<String, Value>, key: &str) -> Option<&'a Value> {
    if let Some(value) = map.get(key) {
        return Some(value);
    }
    let wanted = key.to_lowercase();
    map.iter()
        .find(|(candidate, _)| candidate.to_lowercase() == wanted)
        .map(|(_, value)| value)
}

/// Depth-first search for the first non-null value stored under `key`
/// (case-insensitive).
///
/// At each object the keys of that object are checked before descending;
/// children are visited in declared order, array elements in index order.
/// Null-valued keys are treated as absent and the search continues.
pub fn find_first_occurrence<'a>(document: &'a Value, key: &str) -> Option<&'a Value> {
    match document {
        Value::Object(map) => {
            if let Some(found) = lookup_key(map, key).filter(|value| !value.is_null()) {
                return Some(found);
            }
            map.values()
                .find_map(|child| find_first_occurrence(child, key))
        }
        Value::Array(items) => items
            .iter()
            .find_map(|item| find_first_occurrence(item, key)),
        _ => None,
    }
}

/// Copy of `value` with every object's keys sorted.
pub fn canonicalize(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(&String, &Value)> = map.iter().collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));
            Value::Object(
                entries
                    .into_iter()
                    .map(|(key, child)| (key.clone(), canonicalize(child)))
                    .collect(),
            )
        }
        Value::Array(items) => Value::Array(items.iter().map(canonicalize).collect()),
        other => other.clone(),
    }
}

/// Compact JSON with sorted keys and no whitespace.
pub fn canonical_json(value: &Value) -> String {
    serde_json::to_string(&canonicalize(value)).unwrap_or_default()
}

/// Human-facing text for a value: strings unquoted, numbers and booleans in
/// JSON form, structures as canonical JSON.
pub fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        other => canonical_json(other),
    }
}

/// Loose truthiness used when choosing between alternative fields:
/// null, `false`, zero, empty strings and empty structures are all "unset".
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}
