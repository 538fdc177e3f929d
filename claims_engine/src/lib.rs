pub mod error;
pub mod stage;
pub mod config;
pub mod document;
pub mod composite;
pub mod rule;
pub mod rule_store;
pub mod unique_index;
pub mod audit;
pub mod patient;
pub mod summary;
pub mod resolution;
pub mod seed;
pub mod simulator;

pub use error::SimulatorError;
pub use stage::Stage;

pub use config::{
    SimulatorConfig,        // Stage key shapes and PHI stages
    DEFAULT_AUDIT_TAIL_MAX,
    DEFAULT_SUMMARY_MAX_LEN,
    UNMATCHED_MESSAGE,
};

pub use document::{
    canonical_json,         // Sorted-key compact JSON
    find_first_occurrence,  // Tree-wide case-insensitive key search
    resolve_path,           // Dotted path lookup
};

pub use composite::{
    build_composite,        // Fail-closed composite key builder
    extract_found_values,   // Diagnostics for partial documents
    short_name,
    CompositeKey,
    FIELD_SEPARATOR,
};

pub use rule::{generate_id, Rule, RuleDraft, RuleId, DEFAULT_PRIORITY};
pub use rule_store::RuleStore;
pub use unique_index::{Collision, StageIndex, UniqueIndex};

pub use audit::{
    AuditEvent,             // Immutable audit event
    AuditEventBuilder,
    AuditEventType,
    AuditLevel,
    AuditLog,               // Append-only in-process log
    SequenceNumber,
};

pub use patient::{extract_patient_info, merge_patient_info};
pub use summary::{format_currency, summarize, summarize_with_limit};

pub use resolution::{
    BatchResolution,        // Positional batch results
    Resolution,             // Caller-visible body
    ResolutionOutcome,      // Body plus composite diagnostics
    ResolutionState,
};

pub use seed::{catalogue, SeedScenario, SEED_VERSION};

pub use simulator::{
    ClaimsSimulator,        // Service owning rules, index and audit log
    CompositeReport,
    IndexEntry,
    IndexSnapshot,
    ReferenceExample,
};
