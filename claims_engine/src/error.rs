use thiserror::Error;

use crate::stage::Stage;

/// Errors surfaced by the simulator at its collaborator boundary.
///
/// Resolution itself never fails: unknown shapes, missing fields and index
/// misses are all normal unmatched outcomes. These variants cover the admin
/// surface only.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SimulatorError {
    #[error("Rule not found: {0}")]
    RuleNotFound(String),

    #[error("Unknown stage: {0}")]
    UnknownStage(String),

    #[error("Stage not configured: {0}")]
    StageNotConfigured(Stage),

    #[error("Invalid document: {0}")]
    InvalidDocument(String),
}
