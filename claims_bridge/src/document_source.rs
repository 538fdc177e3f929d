// Document source used by the eligibility fetch path.
//
// Design:
// - `DocumentSource` is the seam; the gateway only needs "latest record of
//   a collection, optionally filtered on one dotted field".
// - `JsonDirSource` serves `<dir>/<collection>.json` exports. A file holds
//   either an array of records (oldest first) or one record.
// - Extended-JSON scalars from database exports are flattened to strings
//   so the simulator sees plain values.

use log::debug;
use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};

use claims_engine::{document::display_value, resolve_path};

use crate::error::{BridgeError, BridgeResult};

/// Read-only access to stored documents.
pub trait DocumentSource: Send + Sync {
    /// Most recent record of `collection`, or the most recent one whose
    /// dotted `filter.0` field equals `filter.1`. `Ok(None)` when nothing
    /// matches; `CollectionNotFound` when the collection does not exist.
    fn fetch(&self, collection: &str, filter: Option<(&str, &str)>) -> BridgeResult<Option<Value>>;
}

/// Directory of JSON collection exports.
#[derive(Debug, Clone)]
pub struct JsonDirSource {
    dir: PathBuf,
}

impl JsonDirSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn collection_path(&self, collection: &str) -> BridgeResult<PathBuf> {
        let valid = !collection.is_empty()
            && collection
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
            && !collection.starts_with('.');
        if !valid {
            return Err(BridgeError::CollectionNotFound(collection.to_string()));
        }
        Ok(self.dir.join(format!("{}.json", collection)))
    }

    fn load(&self, collection: &str) -> BridgeResult<Vec<Value>> {
        let path = self.collection_path(collection)?;
        if !path.is_file() {
            return Err(BridgeError::CollectionNotFound(collection.to_string()));
        }

        let raw = fs::read_to_string(&path)?;
        let records = match serde_json::from_str::<Value>(&raw)? {
            Value::Array(items) => items,
            Value::Null => Vec::new(),
            single => vec![single],
        };
        debug!("Loaded {} records from {}", records.len(), path.display());
        Ok(records)
    }
}

impl DocumentSource for JsonDirSource {
    fn fetch(&self, collection: &str, filter: Option<(&str, &str)>) -> BridgeResult<Option<Value>> {
        let records = self.load(collection)?;

        let found = records.into_iter().rev().find(|record| match filter {
            None => true,
            Some((field, expected)) => {
                let value = resolve_path(record, field).map(flatten_extended);
                matches!(value, Some(ref v) if !v.is_null() && display_value(v) == expected)
            }
        });

        Ok(found.map(|record| flatten_extended(&record)))
    }
}

// ================================================================================================
// EXTENDED JSON
// ================================================================================================

const EXTENDED_SCALARS: [&str; 4] = ["$oid", "$date", "$numberLong", "$numberDecimal"];

/// Replace single-key extended-JSON wrappers with their string payload.
///
/// `{"$date": {"$numberLong": "..."}}` unwraps recursively.
pub fn flatten_extended(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            if let Some(scalar) = extended_scalar(map) {
                return scalar;
            }
            Value::Object(map.iter().map(|(k, v)| (k.clone(), flatten_extended(v))).collect())
        }
        Value::Array(items) => Value::Array(items.iter().map(flatten_extended).collect()),
        other => other.clone(),
    }
}

fn extended_scalar(map: &Map<String, Value>) -> Option<Value> {
    if map.len() != 1 {
        return None;
    }
    let (key, inner) = map.iter().next()?;
    if !EXTENDED_SCALARS.contains(&key.as_str()) {
        return None;
    }
    let text = match flatten_extended(inner) {
        Value::String(s) => s,
        other => display_value(&other),
    };
    Some(Value::String(text))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn write_collection(dir: &TempDir, name: &str, contents: &Value) {
        fs::write(dir.path().join(format!("{}.json", name)), contents.to_string()).unwrap();
    }

    fn members() -> Value {
        json!([
            {"_id": {"$oid": "64f000000000000000000001"}, "Claim": {"ID": "CLM-1", "MemberID": "M-1"}},
            {"_id": {"$oid": "64f000000000000000000002"}, "Claim": {"ID": "CLM-2", "MemberID": "M-2"},
             "received": {"$date": "2025-09-08T14:30:00Z"}},
            {"_id": {"$oid": "64f000000000000000000003"}, "Claim": {"ID": "CLM-3", "MemberID": "M-1"}}
        ])
    }

    #[test]
    fn test_fetch_latest_record() {
        let dir = TempDir::new().unwrap();
        write_collection(&dir, "members", &members());
        let source = JsonDirSource::new(dir.path());

        let record = source.fetch("members", None).unwrap().unwrap();
        assert_eq!(record["Claim"]["ID"], json!("CLM-3"));
        assert_eq!(record["_id"], json!("64f000000000000000000003"));
    }

    #[test]
    fn test_fetch_filtered_takes_most_recent_match() {
        let dir = TempDir::new().unwrap();
        write_collection(&dir, "members", &members());
        let source = JsonDirSource::new(dir.path());

        let record = source.fetch("members", Some(("Claim.MemberID", "M-1"))).unwrap().unwrap();
        assert_eq!(record["Claim"]["ID"], json!("CLM-3"));

        let record = source.fetch("members", Some(("Claim.ID", "CLM-2"))).unwrap().unwrap();
        assert_eq!(record["received"], json!("2025-09-08T14:30:00Z"));

        assert!(source.fetch("members", Some(("Claim.ID", "CLM-9"))).unwrap().is_none());
    }

    #[test]
    fn test_filter_on_extended_id() {
        let dir = TempDir::new().unwrap();
        write_collection(&dir, "members", &members());
        let source = JsonDirSource::new(dir.path());

        let record = source
            .fetch("members", Some(("_id", "64f000000000000000000001")))
            .unwrap()
            .unwrap();
        assert_eq!(record["Claim"]["ID"], json!("CLM-1"));
    }

    #[test]
    fn test_single_object_collection() {
        let dir = TempDir::new().unwrap();
        write_collection(&dir, "one", &json!({"Claim": {"ID": "CLM-ONLY"}}));
        let source = JsonDirSource::new(dir.path());
        let record = source.fetch("one", None).unwrap().unwrap();
        assert_eq!(record["Claim"]["ID"], json!("CLM-ONLY"));
    }

    #[test]
    fn test_missing_or_unsafe_collection() {
        let dir = TempDir::new().unwrap();
        let source = JsonDirSource::new(dir.path());
        assert!(matches!(source.fetch("absent", None), Err(BridgeError::CollectionNotFound(_))));
        assert!(matches!(source.fetch("../etc", None), Err(BridgeError::CollectionNotFound(_))));
        assert!(matches!(source.fetch("", None), Err(BridgeError::CollectionNotFound(_))));
    }

    #[test]
    fn test_flatten_nested_wrappers() {
        let flat = flatten_extended(&json!({
            "when": {"$date": {"$numberLong": "1694183400000"}},
            "amount": {"$numberDecimal": "125.50"},
            "items": [{"count": {"$numberLong": "3"}}],
            "plain": {"$oid": "x", "extra": 1}
        }));
        assert_eq!(flat["when"], json!("1694183400000"));
        assert_eq!(flat["amount"], json!("125.50"));
        assert_eq!(flat["items"][0]["count"], json!("3"));
        assert_eq!(flat["plain"]["$oid"], json!("x"));
    }
}
