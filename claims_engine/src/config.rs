//! Simulator configuration: per-stage key shapes and PHI handling.
//!
//! The defaults reproduce the seeded workflow. Stages are keyed only by the
//! fields listed here; the order of the list is the order of the fields in
//! the composite key.

use std::collections::{HashMap, HashSet};

use crate::stage::Stage;

/// Message returned for every unmatched resolution.
pub const UNMATCHED_MESSAGE: &str = "Invalid Credential.";

/// Fallback summaries longer than this are truncated.
pub const DEFAULT_SUMMARY_MAX_LEN: usize = 800;

/// Upper bound for audit tail queries.
pub const DEFAULT_AUDIT_TAIL_MAX: usize = 1000;

/// Configuration for a `ClaimsSimulator` instance.
#[derive(Debug, Clone)]
pub struct SimulatorConfig {
    /// Ordered required field paths per stage
    pub stage_fields: HashMap<Stage, Vec<String>>,
    /// Stages whose matched outcomes carry patient identity fields
    pub phi_stages: HashSet<Stage>,
    /// Truncation length for the compact-serialization summary fallback
    pub summary_max_len: usize,
    /// Largest `limit` honoured by audit tail queries
    pub audit_tail_max: usize,
    /// Body message for unmatched resolutions
    pub unmatched_message: String,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        let stage_fields = [
            (Stage::Eligibility, vec!["Claim.ID", "Claim.MemberID"]),
            (Stage::PriorAuthorization, vec!["PriorAuthorizationRequest.RequestID"]),
            (Stage::RemittanceTracking, vec!["Remittance.RemitID", "Remittance.ClaimRefID"]),
            (Stage::ClaimsSubmission, vec!["ClaimSubmission.ClaimID", "ClaimSubmission.ExternalID"]),
            (Stage::ClaimsScrubbing, vec!["Claim.ExternalID"]),
            (Stage::ClaimsResubmission, vec!["Resubmission.OriginalClaimRefID"]),
            (Stage::RemittancePostResubmission, vec!["RemittancePost.NewClaimRefID"]),
            (Stage::DenialManagement, vec!["Denial.ClaimRefID"]),
            (Stage::Reconciliation, vec!["Reconciliation.ReconID"]),
            (Stage::MedicalCoding, vec!["Claim.ID"]),
            (Stage::ClinicalDocumentation, vec!["ClinicalDocument.ProcedureCode", "ClinicalDocument.ClinicianID"]),
        ]
        .into_iter()
        .map(|(stage, fields)| (stage, fields.into_iter().map(String::from).collect()))
        .collect();

        let phi_stages = [
            Stage::Eligibility,
            Stage::PriorAuthorization,
            Stage::ClaimsSubmission,
            Stage::ClaimsScrubbing,
            Stage::ClaimsResubmission,
            Stage::MedicalCoding,
            Stage::ClinicalDocumentation,
        ]
        .into_iter()
        .collect();

        Self {
            stage_fields,
            phi_stages,
            summary_max_len: DEFAULT_SUMMARY_MAX_LEN,
            audit_tail_max: DEFAULT_AUDIT_TAIL_MAX,
            unmatched_message: UNMATCHED_MESSAGE.to_string(),
        }
    }
}

impl SimulatorConfig {
    /// Configuration with no stage keyed and no PHI stages.
    pub fn empty() -> Self {
        Self {
            stage_fields: HashMap::new(),
            phi_stages: HashSet::new(),
            ..Self::default()
        }
    }

    /// Replace the key shape of one stage.
    pub fn with_stage_fields<I, S>(mut self, stage: Stage, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.stage_fields
            .insert(stage, fields.into_iter().map(Into::into).collect());
        self
    }

    /// Remove the key shape of one stage; it will never match afterwards.
    pub fn without_stage_fields(mut self, stage: Stage) -> Self {
        self.stage_fields.remove(&stage);
        self
    }

    pub fn with_phi_stage(mut self, stage: Stage) -> Self {
        self.phi_stages.insert(stage);
        self
    }

    pub fn without_phi_stage(mut self, stage: Stage) -> Self {
        self.phi_stages.remove(&stage);
        self
    }

    /// Required fields for a stage, or `None` when the stage cannot be keyed.
    pub fn fields_for(&self, stage: Stage) -> Option<&[String]> {
        self.stage_fields
            .get(&stage)
            .map(Vec::as_slice)
            .filter(|fields| !fields.is_empty())
    }

    pub fn is_phi_bearing(&self, stage: Stage) -> bool {
        self.phi_stages.contains(&stage)
    }

    /// Clamp a requested tail size into `1..=audit_tail_max`.
    pub fn clamp_tail_limit(&self, limit: usize) -> usize {
        limit.clamp(1, self.audit_tail_max.max(1))
    }
}
