//! Deterministic human-readable summaries of matched outcomes.
//!
//! Pure functions of the outcome map. Every summary starts with `Summary:`.

use serde_json::{Map, Value};

use crate::config::DEFAULT_SUMMARY_MAX_LEN;
use crate::document::{canonical_json, display_value, is_truthy};

const SUMMARY_PREFIX: &str = "Summary:";
const CURRENCY_SUFFIX: &str = "Dirham (AED)";

const STATUS_TRIGGER_KEYS: [&str; 6] = [
    "status_label",
    "prior_auth_id",
    "submission_status",
    "doc_status",
    "coding_status",
    "scrub_status",
];
const STATUS_LABEL_KEYS: [&str; 6] = [
    "status_label",
    "submission_status",
    "doc_status",
    "coding_status",
    "scrub_status",
    "prior_auth_id",
];

/// Summarize with the default fallback truncation length.
pub fn summarize(outcome: &Map<String, Value>) -> String {
    summarize_with_limit(outcome, DEFAULT_SUMMARY_MAX_LEN)
}

/// Summarize an outcome.
///
/// 1. An explicit `human_readable_summary` is used verbatim.
/// 2. Otherwise recognised field clusters (labels, patient, amounts,
///    references) become ordered sentence fragments.
/// 3. With nothing recognised, the canonical compact JSON of the outcome is
///    used, cut at `max_len` characters with a trailing `...`.
pub fn summarize_with_limit(outcome: &Map<String, Value>, max_len: usize) -> String {
    if let Some(text) = outcome.get("human_readable_summary").filter(|v| is_truthy(v)) {
        return format!("{} {}", SUMMARY_PREFIX, display_value(text));
    }

    let parts = fragments(outcome);
    if parts.is_empty() {
        return format!("{} {}", SUMMARY_PREFIX, truncate(&canonical_json(&Value::Object(outcome.clone())), max_len));
    }

    let text = parts.join(" ");
    if text.to_lowercase().starts_with(&SUMMARY_PREFIX.to_lowercase()) {
        text
    } else {
        format!("{} {}", SUMMARY_PREFIX, text)
    }
}

fn fragments(outcome: &Map<String, Value>) -> Vec<String> {
    let mut parts = Vec::new();

    if outcome.contains_key("outcome_label") || outcome.contains_key("outcome_code") {
        let label = first_truthy(outcome, &["outcome_label", "outcome_code"]);
        parts.push(format!("{} {}.", SUMMARY_PREFIX, label.map(display_value).unwrap_or_default()));
        if let Some(description) = truthy(outcome, "description") {
            parts.push(display_value(description));
        }
    } else if STATUS_TRIGGER_KEYS.iter().any(|key| outcome.contains_key(*key)) {
        let label = first_truthy(outcome, &STATUS_LABEL_KEYS);
        parts.push(format!("{} {}.", SUMMARY_PREFIX, label.map(display_value).unwrap_or_default()));
    }

    if let Some(Value::Object(patient)) = outcome.get("patient") {
        let mut identity = Vec::new();
        if let Some(name) = truthy(patient, "name") {
            identity.push(format!("Name={}", display_value(name)));
        }
        if let Some(id) = first_truthy(patient, &["patient_id", "member_id"]) {
            identity.push(format!("ID={}", display_value(id)));
        }
        if let Some(dob) = truthy(patient, "dob") {
            identity.push(format!("DOB={}", display_value(dob)));
        }
        if !identity.is_empty() {
            parts.push(format!("Patient: {}.", identity.join(", ")));
        }
    }

    let mut claim_reference_added = false;
    let mut push_claim_reference = |parts: &mut Vec<String>| {
        if claim_reference_added {
            return;
        }
        if let Some(reference) = truthy(outcome, "claim_ref_id") {
            parts.push(format!("Claim reference: {}.", display_value(reference)));
            claim_reference_added = true;
        }
    };

    if let Some(amount) = outcome.get("settlement_amount") {
        parts.push(format!(
            "Record has been reconciled; total amount received is {}.",
            format_currency(amount)
        ));
        push_claim_reference(&mut parts);
    }

    if outcome.contains_key("paid_amount") || outcome.contains_key("remit_id") {
        let paid = outcome
            .get("paid_amount")
            .filter(|v| !v.is_null())
            .or_else(|| outcome.get("paid").filter(|v| !v.is_null()));
        if let Some(paid) = paid {
            parts.push(format!("Payment recorded: {}.", format_currency(paid)));
        }
        if let Some(remit_id) = truthy(outcome, "remit_id") {
            parts.push(format!("Remittance ID: {}.", display_value(remit_id)));
        }
        push_claim_reference(&mut parts);
    }

    parts
}

fn truthy<'a>(map: &'a Map<String, Value>, key: &str) -> Option<&'a Value> {
    map.get(key).filter(|v| is_truthy(v))
}

fn first_truthy<'a>(map: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter().find_map(|key| truthy(map, key))
}

/// Two-decimal amount with the currency suffix. Numeric strings are parsed;
/// anything else is shown as-is.
pub fn format_currency(amount: &Value) -> String {
    let numeric = match amount {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    match numeric {
        Some(value) => format!("{:.2} {}", value, CURRENCY_SUFFIX),
        None => display_value(amount),
    }
}

fn truncate(text: &str, max_len: usize) -> String {
    match text.char_indices().nth(max_len) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}
