//! Resolution results.
//!
//! [`Resolution`] is the caller-visible body. The composite key travels
//! beside it in [`ResolutionOutcome`] so transports can surface it as a
//! diagnostic header without putting it in the body.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::composite::CompositeKey;
use crate::rule::RuleId;
use crate::stage::Stage;

/// Terminal state of a single-document resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionState {
    /// Stage has no required-field configuration
    NoStageConfig,
    /// Composite key could not be built
    MissingFields,
    /// Composite key built, nothing indexed under it
    IndexMiss,
    Matched,
}

impl ResolutionState {
    pub fn is_matched(&self) -> bool {
        matches!(self, ResolutionState::Matched)
    }
}

/// Response body for one document.
///
/// Matched: `{matched: true, stage, result, summary}`.
/// Unmatched: `{matched: false, message}`, identical for every failure reason.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resolution {
    pub matched: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stage: Option<Stage>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Map<String, Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl Resolution {
    pub fn matched(stage: Stage, result: Map<String, Value>, summary: String) -> Self {
        Self {
            matched: true,
            stage: Some(stage),
            result: Some(result),
            summary: Some(summary),
            message: None,
        }
    }

    pub fn unmatched(message: &str) -> Self {
        Self {
            matched: false,
            stage: None,
            result: None,
            summary: None,
            message: Some(message.to_string()),
        }
    }

    pub fn to_json(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

/// A resolution plus its out-of-band diagnostics.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolutionOutcome {
    pub state: ResolutionState,
    pub response: Resolution,
    /// Key computed for the request; `None` when none could be built
    pub composite: Option<CompositeKey>,
    pub rule_id: Option<RuleId>,
}

impl ResolutionOutcome {
    pub fn is_matched(&self) -> bool {
        self.state.is_matched()
    }
}

/// Positional results for a batch request.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BatchResolution {
    pub outcomes: Vec<ResolutionOutcome>,
}

impl BatchResolution {
    pub fn responses(&self) -> Vec<&Resolution> {
        self.outcomes.iter().map(|outcome| &outcome.response).collect()
    }

    /// Composite keys by position, `None` where no key was built.
    pub fn composites(&self) -> Vec<Option<&CompositeKey>> {
        self.outcomes.iter().map(|outcome| outcome.composite.as_ref()).collect()
    }

    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    pub fn to_json(&self) -> Value {
        Value::Array(self.outcomes.iter().map(|o| o.response.to_json()).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_unmatched_body_shape() {
        let body = Resolution::unmatched("Invalid Credential.").to_json();
        assert_eq!(body, json!({"matched": false, "message": "Invalid Credential."}));
    }

    #[test]
    fn test_matched_body_shape() {
        let result = json!({"outcome_code": "ELG_OK"}).as_object().cloned().unwrap();
        let body = Resolution::matched(Stage::Eligibility, result, "Summary: ELG_OK.".into()).to_json();
        assert_eq!(
            body,
            json!({
                "matched": true,
                "stage": "eligibility",
                "result": {"outcome_code": "ELG_OK"},
                "summary": "Summary: ELG_OK."
            })
        );
        assert!(body.get("message").is_none());
    }
}
