// Seeded and admin-created rules.
//
// A rule ties a canned outcome to a reference example document. The
// reference example is only ever used to derive the rule's composite key;
// `match_criteria` is carried for callers and never evaluated. Priority is
// stored but plays no part in lookups (collisions are last-indexed-wins).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

use crate::error::SimulatorError;
use crate::stage::Stage;

/// Priority assigned when a caller does not supply one.
pub const DEFAULT_PRIORITY: i64 = 100;

/// Globally unique, immutable rule identifier (`RULE-xxxxxxxxxx`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RuleId(String);

impl RuleId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Fresh random id with the `RULE` prefix.
    pub fn generate() -> Self {
        Self(generate_id("RULE"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RuleId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// `PREFIX-` followed by ten lowercase hex characters of a v4 uuid.
pub fn generate_id(prefix: &str) -> String {
    let hex = uuid::Uuid::new_v4().simple().to_string();
    format!("{}-{}", prefix, &hex[..10])
}

/// A stored rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    pub id: RuleId,
    pub stage: Stage,
    #[serde(default)]
    pub match_criteria: Map<String, Value>,
    pub outcome: Map<String, Value>,
    pub priority: i64,
    pub reference_example: Value,
    pub created_at: DateTime<Utc>,
}

impl Rule {
    /// Materialize a draft under a given id and creation time.
    pub fn from_draft(id: RuleId, draft: RuleDraft, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            stage: draft.stage,
            match_criteria: draft.match_criteria,
            outcome: draft.outcome,
            priority: draft.priority.unwrap_or(DEFAULT_PRIORITY),
            reference_example: draft.reference_example,
            created_at,
        }
    }
}

/// Caller-supplied rule contents, used for both create and update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleDraft {
    pub stage: Stage,
    #[serde(default)]
    pub match_criteria: Map<String, Value>,
    #[serde(default)]
    pub outcome: Map<String, Value>,
    #[serde(default)]
    pub priority: Option<i64>,
    #[serde(default)]
    pub reference_example: Value,
}

impl RuleDraft {
    pub fn new(stage: Stage) -> Self {
        Self {
            stage,
            match_criteria: Map::new(),
            outcome: Map::new(),
            priority: None,
            reference_example: Value::Object(Map::new()),
        }
    }

    /// Set the outcome. Non-object values are wrapped as `{"value": ...}`.
    pub fn outcome(mut self, outcome: Value) -> Self {
        self.outcome = into_map(outcome);
        self
    }

    pub fn reference_example(mut self, example: Value) -> Self {
        self.reference_example = example;
        self
    }

    pub fn match_criteria(mut self, criteria: Value) -> Self {
        self.match_criteria = into_map(criteria);
        self
    }

    pub fn priority(mut self, priority: i64) -> Self {
        self.priority = Some(priority);
        self
    }

    /// Parse an admin-supplied JSON draft.
    ///
    /// Lenient where serde would be strict: stage route aliases are
    /// accepted and scalar outcomes are wrapped.
    pub fn from_json(value: Value) -> Result<Self, SimulatorError> {
        let Value::Object(mut fields) = value else {
            return Err(SimulatorError::InvalidDocument("rule draft must be a JSON object".to_string()));
        };

        let stage = match fields.remove("stage") {
            Some(Value::String(name)) => name.parse::<Stage>()?,
            Some(other) => {
                return Err(SimulatorError::InvalidDocument(format!("stage must be a string, got {}", other)))
            }
            None => return Err(SimulatorError::InvalidDocument("missing stage".to_string())),
        };

        let mut draft = Self::new(stage);
        if let Some(outcome) = fields.remove("outcome") {
            draft = draft.outcome(outcome);
        }
        if let Some(criteria) = fields.remove("match_criteria") {
            draft = draft.match_criteria(criteria);
        }
        if let Some(example) = fields.remove("reference_example") {
            draft = draft.reference_example(example);
        }
        match fields.remove("priority") {
            None | Some(Value::Null) => {}
            Some(value) => {
                let priority = value
                    .as_i64()
                    .ok_or_else(|| SimulatorError::InvalidDocument(format!("priority must be an integer, got {}", value)))?;
                draft = draft.priority(priority);
            }
        }
        Ok(draft)
    }
}

fn into_map(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        Value::Null => Map::new(),
        other => {
            let mut map = Map::new();
            map.insert("value".to_string(), other);
            map
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_generate_id_shape() {
        let id = RuleId::generate();
        let (prefix, hex) = id.as_str().split_once('-').unwrap();
        assert_eq!(prefix, "RULE");
        assert_eq!(hex.len(), 10);
        assert!(hex.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(RuleId::generate(), id);
    }

    #[test]
    fn test_draft_defaults_priority() {
        let draft = RuleDraft::new(Stage::Eligibility)
            .outcome(json!({"outcome_code": "ELG_OK"}))
            .reference_example(json!({"Claim": {"ID": "CLM-1"}}));
        let rule = Rule::from_draft(RuleId::from("RULE-0000000001"), draft, Utc::now());
        assert_eq!(rule.priority, DEFAULT_PRIORITY);
        assert_eq!(rule.outcome.get("outcome_code"), Some(&json!("ELG_OK")));
        assert!(rule.match_criteria.is_empty());
    }

    #[test]
    fn test_draft_deserializes_with_defaults() {
        let draft: RuleDraft = serde_json::from_value(json!({
            "stage": "denial_management",
            "outcome": {"denial_code": "CO-197"}
        }))
        .unwrap();
        assert_eq!(draft.stage, Stage::DenialManagement);
        assert_eq!(draft.priority, None);
        assert!(draft.reference_example.is_null());
    }

    #[test]
    fn test_from_json_accepts_aliases() {
        let draft = RuleDraft::from_json(json!({
            "stage": "prior_auth",
            "outcome": "approved",
            "reference_example": {"PriorAuthorizationRequest": {"RequestID": "PAR-1"}},
            "priority": 10
        }))
        .unwrap();
        assert_eq!(draft.stage, Stage::PriorAuthorization);
        assert_eq!(draft.outcome.get("value"), Some(&json!("approved")));
        assert_eq!(draft.priority, Some(10));
    }

    #[test]
    fn test_from_json_rejects_bad_drafts() {
        assert!(matches!(
            RuleDraft::from_json(json!([1, 2])),
            Err(SimulatorError::InvalidDocument(_))
        ));
        assert!(matches!(
            RuleDraft::from_json(json!({"outcome": {}})),
            Err(SimulatorError::InvalidDocument(_))
        ));
        assert!(matches!(
            RuleDraft::from_json(json!({"stage": "billing"})),
            Err(SimulatorError::UnknownStage(_))
        ));
        assert!(matches!(
            RuleDraft::from_json(json!({"stage": "eligibility", "priority": "high"})),
            Err(SimulatorError::InvalidDocument(_))
        ));
    }

    #[test]
    fn test_scalar_outcome_wrapped() {
        let draft = RuleDraft::new(Stage::Reconciliation).outcome(json!("closed"));
        assert_eq!(draft.outcome.get("value"), Some(&json!("closed")));
    }
}
