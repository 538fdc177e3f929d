//! Composite key construction.
//!
//! A composite key is `ShortName=Value` per configured field, joined with
//! [`FIELD_SEPARATOR`] in the configured field order. Building fails closed:
//! one absent or blank field and there is no key at all.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

use crate::document::{canonical_json, find_first_occurrence, resolve_path};

/// Separator placed between `ShortName=Value` parts.
pub const FIELD_SEPARATOR: &str = "||";

/// Deterministic lookup key for one stage's index partition.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CompositeKey(String);

impl CompositeKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for CompositeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Final segment of a dotted path (`Claim.MemberID` -> `MemberID`).
pub fn short_name(field_path: &str) -> &str {
    field_path.rsplit('.').next().unwrap_or(field_path)
}

/// Resolve one configured field: dotted path first, then a tree-wide search
/// by short name. Bare names go straight to the tree-wide search.
pub fn resolve_field<'a>(document: &'a Value, field_path: &str) -> Option<&'a Value> {
    if field_path.contains('.') {
        resolve_path(document, field_path)
            .filter(|value| !value.is_null())
            .or_else(|| find_first_occurrence(document, short_name(field_path)))
    } else {
        find_first_occurrence(document, field_path)
    }
}

/// Text form of a resolved value, or `None` when it cannot key a request.
///
/// Structures serialize canonically; scalars are trimmed and a blank result
/// counts as absent. Case and punctuation are kept.
pub fn normalize_value(value: &Value) -> Option<String> {
    let text = match value {
        Value::Null => return None,
        Value::Object(_) | Value::Array(_) => canonical_json(value),
        Value::String(s) => s.trim().to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
    };
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

// `|` never appears unescaped inside a value, so the separator is unambiguous.
fn escape_value(text: &str) -> String {
    if !text.contains(['%', '|']) {
        return text.to_string();
    }
    text.replace('%', "%25").replace('|', "%7C")
}

/// Build the composite key for `document` over `field_paths`.
///
/// Returns `None` for an empty field list or when any field is missing,
/// null or blank after trimming.
pub fn build_composite<S: AsRef<str>>(document: &Value, field_paths: &[S]) -> Option<CompositeKey> {
    if field_paths.is_empty() {
        return None;
    }

    let mut parts = Vec::with_capacity(field_paths.len());
    for path in field_paths {
        let path = path.as_ref();
        let value = normalize_value(resolve_field(document, path)?)?;
        parts.push(format!("{}={}", short_name(path), escape_value(&value)));
    }
    Some(CompositeKey(parts.join(FIELD_SEPARATOR)))
}

/// Raw values found for each configured field, keyed by short name.
///
/// Fields that resolve to nothing are left out; used for diagnostics only.
pub fn extract_found_values<S: AsRef<str>>(document: &Value, field_paths: &[S]) -> Map<String, Value> {
    let mut found = Map::new();
    for path in field_paths {
        let path = path.as_ref();
        if let Some(value) = resolve_field(document, path) {
            found.insert(short_name(path).to_string(), value.clone());
        }
    }
    found
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const ELIGIBILITY: [&str; 2] = ["Claim.ID", "Claim.MemberID"];

    #[test]
    fn test_build_composite_configured_order() {
        let doc = json!({"Claim": {"MemberID": "784-1987-1234567-1", "ID": "CLM-ELG-0001"}});
        let key = build_composite(&doc, &ELIGIBILITY).unwrap();
        assert_eq!(key.as_str(), "ID=CLM-ELG-0001||MemberID=784-1987-1234567-1");
    }

    #[test]
    fn test_build_composite_deterministic_across_shapes() {
        let nested = json!({"Claim": {"ID": " CLM-1 ", "MemberID": "M-1", "Extra": 4}});
        let scattered = json!({
            "Header": {"Sender": "X"},
            "Claim": {"ID": "CLM-1"},
            "Member": {"memberid": "M-1"}
        });
        assert_eq!(
            build_composite(&nested, &ELIGIBILITY),
            build_composite(&scattered, &ELIGIBILITY)
        );
    }

    #[test]
    fn test_build_composite_fails_closed() {
        let missing = json!({"Claim": {"ID": "CLM-1"}});
        assert!(build_composite(&missing, &ELIGIBILITY).is_none());

        let blank = json!({"Claim": {"ID": "CLM-1", "MemberID": "   "}});
        assert!(build_composite(&blank, &ELIGIBILITY).is_none());

        let null = json!({"Claim": {"ID": "CLM-1", "MemberID": null}});
        assert!(build_composite(&null, &ELIGIBILITY).is_none());

        let no_fields: [&str; 0] = [];
        assert!(build_composite(&missing, &no_fields).is_none());
    }

    #[test]
    fn test_null_path_falls_back_to_search() {
        let doc = json!({
            "Claim": {"ID": "CLM-1", "MemberID": null},
            "Member": {"MemberID": "M-9"}
        });
        let key = build_composite(&doc, &ELIGIBILITY).unwrap();
        assert_eq!(key.as_str(), "ID=CLM-1||MemberID=M-9");
    }

    #[test]
    fn test_structured_and_scalar_values() {
        let doc = json!({"A": {"Code": {"z": 1, "a": [true, null]}}, "Flag": false, "Amount": 150.0});
        let key = build_composite(&doc, &["A.Code", "Flag", "Amount"]).unwrap();
        assert_eq!(key.as_str(), r#"Code={"a":[true,null],"z":1}||Flag=false||Amount=150.0"#);
    }

    #[test]
    fn test_separator_in_value_is_escaped() {
        let left = json!({"A": "x||B=y", "B": "z"});
        let right = json!({"A": "x", "B": "y||B=z"});
        let fields = ["A", "B"];
        assert_ne!(build_composite(&left, &fields), build_composite(&right, &fields));
        assert_eq!(build_composite(&left, &fields).unwrap().as_str(), "A=x%7C%7CB=y||B=z");
    }

    #[test]
    fn test_extract_found_values() {
        let doc = json!({"Claim": {"ID": "CLM-1"}});
        let found = extract_found_values(&doc, &ELIGIBILITY);
        assert_eq!(found.len(), 1);
        assert_eq!(found.get("ID"), Some(&json!("CLM-1")));
    }

    #[test]
    fn test_short_name() {
        assert_eq!(short_name("Claim.Activity.0.Code"), "Code");
        assert_eq!(short_name("MemberID"), "MemberID");
    }
}
