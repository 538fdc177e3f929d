//! Patient identity extraction for PHI-bearing stages.
//!
//! Identity comes from the matched rule's reference example, never from the
//! incoming request. An explicit `Patient` / `PatientInfo` node wins; the
//! remaining gaps are filled from the first matching key anywhere in the
//! document.

use serde_json::{Map, Value};

use crate::document::{find_first_occurrence, is_truthy};

const PATIENT_NODES: [&str; 2] = ["Patient", "PatientInfo"];
const NODE_ID_KEYS: [&str; 5] = ["PatientID", "PatientId", "MemberID", "MemberId", "ID"];
const NODE_NAME_KEYS: [&str; 4] = ["Name", "FullName", "GivenName", "FirstName"];
const DOB_KEYS: [&str; 3] = ["DOB", "DateOfBirth", "BirthDate"];
const MEMBER_KEYS: [&str; 2] = ["MemberID", "MemberId"];
const NAME_KEYS: [&str; 3] = ["Name", "PatientName", "FullName"];

// First truthy value among `keys`, each looked up in turn.
fn first_of<'a, F>(keys: &[&str], mut lookup: F) -> Option<&'a Value>
where
    F: FnMut(&str) -> Option<&'a Value>,
{
    keys.iter()
        .filter_map(|key| lookup(*key))
        .find(|value| is_truthy(value))
}

fn node_field<'a>(node: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    first_of(keys, |key| node.get(key))
}

/// Extract `patient_id`, `name`, `dob` and `member_id` where present.
pub fn extract_patient_info(document: &Value) -> Map<String, Value> {
    let mut patient = Map::new();

    let node = first_of(&PATIENT_NODES, |key| find_first_occurrence(document, key));
    if let Some(Value::Object(node)) = node {
        let fields = [
            ("patient_id", node_field(node, &NODE_ID_KEYS)),
            ("name", node_field(node, &NODE_NAME_KEYS)),
            ("dob", node_field(node, &DOB_KEYS)),
        ];
        for (key, value) in fields {
            if let Some(value) = value {
                patient.insert(key.to_string(), value.clone());
            }
        }
    }

    let has = |patient: &Map<String, Value>, key: &str| patient.get(key).map(is_truthy).unwrap_or(false);

    if !has(&patient, "patient_id") {
        if let Some(member) = first_of(&MEMBER_KEYS, |key| find_first_occurrence(document, key)) {
            patient.insert("patient_id".to_string(), member.clone());
            patient.insert("member_id".to_string(), member.clone());
        }
    }
    if !has(&patient, "name") {
        if let Some(name) = first_of(&NAME_KEYS, |key| find_first_occurrence(document, key)) {
            patient.insert("name".to_string(), name.clone());
        }
    }
    if !has(&patient, "dob") {
        if let Some(dob) = first_of(&DOB_KEYS, |key| find_first_occurrence(document, key)) {
            patient.insert("dob".to_string(), dob.clone());
        }
    }

    patient
}

/// Merge extracted identity into `outcome.patient`, filling only keys the
/// outcome does not already define.
///
/// A `patient` entry that is present but not an object is left alone.
pub fn merge_patient_info(outcome: &mut Map<String, Value>, info: Map<String, Value>) {
    if info.is_empty() {
        return;
    }

    let patient = outcome
        .entry("patient")
        .or_insert_with(|| Value::Object(Map::new()));
    if let Value::Object(existing) = patient {
        for (key, value) in info {
            existing.entry(key).or_insert(value);
        }
    }
}
