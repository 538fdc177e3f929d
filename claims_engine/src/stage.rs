// Claims-processing workflow stages.
//
// The set is closed: every rule, index partition and audit event is tagged
// with one of these. Key shapes per stage live in `SimulatorConfig`, not
// here, so a stage without configured fields simply never matches.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::SimulatorError;

/// One step of the claims workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Eligibility,
    PriorAuthorization,
    ClaimsSubmission,
    ClaimsScrubbing,
    ClaimsResubmission,
    RemittanceTracking,
    RemittancePostResubmission,
    DenialManagement,
    Reconciliation,
    MedicalCoding,
    ClinicalDocumentation,
}

impl Stage {
    /// Every stage, in workflow order.
    pub const ALL: [Stage; 11] = [
        Stage::Eligibility,
        Stage::PriorAuthorization,
        Stage::ClaimsSubmission,
        Stage::ClaimsScrubbing,
        Stage::ClaimsResubmission,
        Stage::RemittanceTracking,
        Stage::RemittancePostResubmission,
        Stage::DenialManagement,
        Stage::Reconciliation,
        Stage::MedicalCoding,
        Stage::ClinicalDocumentation,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Eligibility => "eligibility",
            Stage::PriorAuthorization => "prior_authorization",
            Stage::ClaimsSubmission => "claims_submission",
            Stage::ClaimsScrubbing => "claims_scrubbing",
            Stage::ClaimsResubmission => "claims_resubmission",
            Stage::RemittanceTracking => "remittance_tracking",
            Stage::RemittancePostResubmission => "remittance_post_resubmission",
            Stage::DenialManagement => "denial_management",
            Stage::Reconciliation => "reconciliation",
            Stage::MedicalCoding => "medical_coding",
            Stage::ClinicalDocumentation => "clinical_documentation",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Stage {
    type Err = SimulatorError;

    /// Accepts the canonical stage names plus the short route names
    /// (`prior_auth`, `resubmit`) callers have historically used.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim();
        if let Some(stage) = Stage::ALL.iter().find(|stage| stage.as_str() == name) {
            return Ok(*stage);
        }
        match name {
            "prior_auth" => Ok(Stage::PriorAuthorization),
            "resubmit" => Ok(Stage::ClaimsResubmission),
            _ => Err(SimulatorError::UnknownStage(name.to_string())),
        }
    }
}
