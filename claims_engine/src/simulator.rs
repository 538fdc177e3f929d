// Claims simulator service.
//
// Owns the rule store, the unique index and the audit log. All three are
// instance state; callers hold a reference to the simulator (usually an
// `Arc<ClaimsSimulator>`), so isolated instances can coexist.
//
// Concurrency:
// - Rule store and index live together behind one `RwLock`
// - Resolutions take the read lock; every mutation takes the write lock and
//   finishes its index rebuild before releasing it
// - The audit log has its own `Mutex`, always acquired after the registry
//   lock, never before

use chrono::Utc;
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;

use crate::audit::{
    AuditEvent, AuditEventBuilder, AuditEventType, AuditLog, ACTOR_ADMIN, ACTOR_GATEWAY, ACTOR_SYSTEM,
};
use crate::composite::{build_composite, extract_found_values, CompositeKey};
use crate::config::SimulatorConfig;
use crate::error::SimulatorError;
use crate::patient::{extract_patient_info, merge_patient_info};
use crate::resolution::{BatchResolution, Resolution, ResolutionOutcome, ResolutionState};
use crate::rule::{generate_id, Rule, RuleDraft, RuleId};
use crate::rule_store::RuleStore;
use crate::seed::{catalogue, SEED_VERSION};
use crate::stage::Stage;
use crate::summary::summarize_with_limit;
use crate::unique_index::{Collision, UniqueIndex};

// ============================================================================
// Diagnostic views
// ============================================================================

/// Result of an admin composite computation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompositeReport {
    pub computed_composite: Option<CompositeKey>,
    pub expected_fields: Vec<String>,
    pub found_values: Map<String, Value>,
}

/// One live index entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexEntry {
    pub rule_id: RuleId,
    pub outcome_sample: Option<Map<String, Value>>,
}

/// Live index dump: stage -> composite -> entry.
pub type IndexSnapshot = BTreeMap<Stage, BTreeMap<CompositeKey, IndexEntry>>;

/// A rule's keying material, without its outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceExample {
    pub rule_id: RuleId,
    pub stage: Stage,
    pub match_criteria: Map<String, Value>,
    pub reference_example: Value,
    pub priority: i64,
}

// ============================================================================
// Service
// ============================================================================

#[derive(Debug, Default)]
struct Registry {
    store: RuleStore,
    index: UniqueIndex,
}

pub struct ClaimsSimulator {
    config: SimulatorConfig,
    registry: RwLock<Registry>,
    audit: Mutex<AuditLog>,
}

impl ClaimsSimulator {
    /// Empty simulator; call [`seed_all`](Self::seed_all) to load the catalogue.
    pub fn new(config: SimulatorConfig) -> Self {
        Self {
            config,
            registry: RwLock::new(Registry::default()),
            audit: Mutex::new(AuditLog::new()),
        }
    }

    /// Default configuration, already seeded.
    pub fn with_defaults() -> Self {
        let simulator = Self::new(SimulatorConfig::default());
        simulator.seed_all();
        simulator
    }

    pub fn config(&self) -> &SimulatorConfig {
        &self.config
    }

    // ------------------------------------------------------------------------
    // Seeding
    // ------------------------------------------------------------------------

    /// Replace rules, index and audit log with the seed catalogue.
    ///
    /// Scenarios whose reference example cannot be keyed for a configured
    /// stage are skipped with a warning event. Returns the installed count.
    pub fn seed_all(&self) -> usize {
        let mut store = RuleStore::new();
        let mut audit = AuditLog::new();

        for scenario in catalogue() {
            if let Some(fields) = self.config.fields_for(scenario.stage) {
                if build_composite(&scenario.reference_example, fields).is_none() {
                    audit.append(
                        AuditEvent::builder(ACTOR_SYSTEM, AuditEventType::SeedRuleSkipped)
                            .stage(scenario.stage)
                            .payload("scenario", scenario.key.as_str())
                            .payload("expected_fields", fields.to_vec())
                            .reference("scenario", scenario.key.as_str()),
                    );
                    continue;
                }
            }
            store.insert(scenario.to_rule());
        }

        let mut index = UniqueIndex::new();
        for stage in Stage::ALL {
            let collisions = index.rebuild_stage(stage, self.config.fields_for(stage), &store);
            record_collisions(&mut audit, collisions, AuditEventType::IndexCollision);
        }

        let count = store.len();
        audit.append(
            AuditEvent::builder(ACTOR_SYSTEM, AuditEventType::Seeded)
                .payload("seeded_rules", count)
                .payload("indexed_keys", index.len())
                .reference("seed_version", SEED_VERSION),
        );

        let mut registry = self.registry.write();
        *registry = Registry { store, index };
        *self.audit.lock() = audit;
        drop(registry);

        log::info!("Seeded {} rules (catalogue {})", count, SEED_VERSION);
        count
    }

    // ------------------------------------------------------------------------
    // Rule CRUD
    // ------------------------------------------------------------------------

    /// Create a rule and index it into its stage.
    pub fn create_rule(&self, draft: RuleDraft) -> Rule {
        let mut registry = self.registry.write();

        let mut id = RuleId::generate();
        while registry.store.get(&id).is_some() {
            id = RuleId::generate();
        }
        let rule = Rule::from_draft(id, draft, Utc::now());
        registry.store.insert(rule.clone());
        let collision = registry
            .index
            .index_single_rule(&rule, self.config.fields_for(rule.stage));

        let mut audit = self.audit.lock();
        record_collisions(&mut audit, collision, AuditEventType::IndexCollisionSingle);
        audit.append(
            AuditEvent::builder(ACTOR_ADMIN, AuditEventType::RuleCreated)
                .stage(rule.stage)
                .payload("priority", rule.priority)
                .reference("rule_id", rule.id.as_str()),
        );

        log::info!("Created rule {} for stage {}", rule.id, rule.stage);
        rule
    }

    pub fn get_rule(&self, id: &RuleId) -> Result<Rule, SimulatorError> {
        self.registry
            .read()
            .store
            .get(id)
            .cloned()
            .ok_or_else(|| SimulatorError::RuleNotFound(id.to_string()))
    }

    /// Rules in insertion order, optionally restricted to one stage.
    pub fn list_rules(&self, stage: Option<Stage>) -> Vec<Rule> {
        let registry = self.registry.read();
        registry
            .store
            .iter()
            .filter(|rule| stage.map_or(true, |s| rule.stage == s))
            .cloned()
            .collect()
    }

    /// Replace a rule's contents, keeping its id and creation time.
    ///
    /// Rebuilds the rule's stage, and its previous stage when it moved.
    pub fn update_rule(&self, id: &RuleId, draft: RuleDraft) -> Result<Rule, SimulatorError> {
        let mut registry = self.registry.write();
        let Registry { store, index } = &mut *registry;

        let existing = store
            .get(id)
            .ok_or_else(|| SimulatorError::RuleNotFound(id.to_string()))?;
        let previous_stage = existing.stage;
        let rule = Rule::from_draft(id.clone(), draft, existing.created_at);
        store.insert(rule.clone());

        let mut collisions = index.rebuild_stage(rule.stage, self.config.fields_for(rule.stage), store);
        if previous_stage != rule.stage {
            collisions.extend(index.rebuild_stage(previous_stage, self.config.fields_for(previous_stage), store));
        }

        let mut audit = self.audit.lock();
        record_collisions(&mut audit, collisions, AuditEventType::IndexCollision);
        audit.append(
            AuditEvent::builder(ACTOR_ADMIN, AuditEventType::RuleUpdated)
                .stage(rule.stage)
                .payload("previous_stage", previous_stage.as_str())
                .reference("rule_id", rule.id.as_str()),
        );

        log::info!("Updated rule {} ({} -> {})", rule.id, previous_stage, rule.stage);
        Ok(rule)
    }

    /// Delete a rule and rebuild its stage. Returns the removed rule.
    pub fn delete_rule(&self, id: &RuleId) -> Result<Rule, SimulatorError> {
        let mut registry = self.registry.write();
        let Registry { store, index } = &mut *registry;

        let removed = store
            .remove(id)
            .ok_or_else(|| SimulatorError::RuleNotFound(id.to_string()))?;
        let collisions = index.rebuild_stage(removed.stage, self.config.fields_for(removed.stage), store);

        let mut audit = self.audit.lock();
        record_collisions(&mut audit, collisions, AuditEventType::IndexCollision);
        audit.append(
            AuditEvent::builder(ACTOR_ADMIN, AuditEventType::RuleDeleted)
                .stage(removed.stage)
                .reference("rule_id", removed.id.as_str()),
        );

        log::info!("Deleted rule {} from stage {}", removed.id, removed.stage);
        Ok(removed)
    }

    /// Rebuild one stage's index from the current rules.
    pub fn rebuild_stage_index(&self, stage: Stage) -> Vec<Collision> {
        let mut registry = self.registry.write();
        let Registry { store, index } = &mut *registry;
        let collisions = index.rebuild_stage(stage, self.config.fields_for(stage), store);

        record_collisions(&mut self.audit.lock(), collisions.clone(), AuditEventType::IndexCollision);
        collisions
    }

    // ------------------------------------------------------------------------
    // Resolution
    // ------------------------------------------------------------------------

    /// Resolve one document at `stage`. Emits exactly one audit event.
    pub fn resolve(&self, stage: Stage, document: &Value) -> ResolutionOutcome {
        let registry = self.registry.read();
        self.resolve_locked(&registry, stage, document)
    }

    /// Resolve each document independently, in order, against one
    /// consistent view of the index.
    pub fn resolve_batch(&self, stage: Stage, documents: &[Value]) -> BatchResolution {
        let registry = self.registry.read();
        BatchResolution {
            outcomes: documents
                .iter()
                .map(|document| self.resolve_locked(&registry, stage, document))
                .collect(),
        }
    }

    /// Remittance lookup by claim reference.
    pub fn lookup_remittance(&self, claim_ref_id: &str) -> ResolutionOutcome {
        let document = json!({
            "Remittance": {"RemitID": claim_ref_id, "ClaimRefID": claim_ref_id},
            "ClaimRefID": claim_ref_id
        });
        self.resolve(Stage::RemittanceTracking, &document)
    }

    fn resolve_locked(&self, registry: &Registry, stage: Stage, document: &Value) -> ResolutionOutcome {
        let request_sample = generate_id("REQ");

        let Some(fields) = self.config.fields_for(stage) else {
            return self.unmatched(
                ResolutionState::NoStageConfig,
                None,
                AuditEvent::builder(ACTOR_GATEWAY, AuditEventType::StageNotConfigured)
                    .stage(stage)
                    .payload("stage", stage.as_str())
                    .reference("request_sample", request_sample),
            );
        };

        let Some(composite) = build_composite(document, fields) else {
            let found: Vec<String> = extract_found_values(document, fields).keys().cloned().collect();
            return self.unmatched(
                ResolutionState::MissingFields,
                None,
                AuditEvent::builder(ACTOR_GATEWAY, AuditEventType::MissingFields)
                    .stage(stage)
                    .payload("expected_fields", fields.to_vec())
                    .payload("found", found)
                    .reference("request_sample", request_sample),
            );
        };

        let rule = registry
            .index
            .lookup(stage, &composite)
            .and_then(|id| registry.store.get(id));
        let Some(rule) = rule else {
            return self.unmatched(
                ResolutionState::IndexMiss,
                Some(composite.clone()),
                AuditEvent::builder(ACTOR_GATEWAY, AuditEventType::IndexMiss)
                    .stage(stage)
                    .payload("incoming_composite", composite.as_str())
                    .reference("request_sample", request_sample),
            );
        };

        let mut result = rule.outcome.clone();
        if self.config.is_phi_bearing(stage) {
            merge_patient_info(&mut result, extract_patient_info(&rule.reference_example));
        }
        let summary = summarize_with_limit(&result, self.config.summary_max_len);

        self.audit.lock().append(
            AuditEvent::builder(ACTOR_GATEWAY, AuditEventType::Match)
                .stage(stage)
                .payload("rule_id", rule.id.as_str())
                .payload("composite", composite.as_str())
                .reference("rule_id", rule.id.as_str())
                .reference("request_sample", request_sample),
        );
        log::debug!("Resolved {} request to rule {}", stage, rule.id);

        ResolutionOutcome {
            state: ResolutionState::Matched,
            response: Resolution::matched(stage, result, summary),
            composite: Some(composite),
            rule_id: Some(rule.id.clone()),
        }
    }

    fn unmatched(
        &self,
        state: ResolutionState,
        composite: Option<CompositeKey>,
        event: AuditEventBuilder,
    ) -> ResolutionOutcome {
        self.audit.lock().append(event);
        log::debug!("Unmatched request: {:?}", state);

        ResolutionOutcome {
            state,
            response: Resolution::unmatched(&self.config.unmatched_message),
            composite,
            rule_id: None,
        }
    }

    // ------------------------------------------------------------------------
    // Diagnostics
    // ------------------------------------------------------------------------

    /// Composite key and found values for a document, without resolving it.
    pub fn compute_composite(&self, stage: Stage, document: &Value) -> Result<CompositeReport, SimulatorError> {
        let fields = self
            .config
            .fields_for(stage)
            .ok_or(SimulatorError::StageNotConfigured(stage))?;

        Ok(CompositeReport {
            computed_composite: build_composite(document, fields),
            expected_fields: fields.to_vec(),
            found_values: extract_found_values(document, fields),
        })
    }

    /// Dump of the live index with each entry's outcome.
    pub fn list_index_entries(&self) -> IndexSnapshot {
        let registry = self.registry.read();
        registry
            .index
            .iter()
            .map(|(stage, partition)| {
                let entries: BTreeMap<CompositeKey, IndexEntry> = partition
                    .iter()
                    .map(|(key, id)| {
                        let entry = IndexEntry {
                            rule_id: id.clone(),
                            outcome_sample: registry.store.get(id).map(|rule| rule.outcome.clone()),
                        };
                        (key.clone(), entry)
                    })
                    .collect();
                (stage, entries)
            })
            .collect()
    }

    pub fn list_reference_examples(&self, stage: Option<Stage>) -> Vec<ReferenceExample> {
        self.list_rules(stage)
            .into_iter()
            .map(|rule| ReferenceExample {
                rule_id: rule.id,
                stage: rule.stage,
                match_criteria: rule.match_criteria,
                reference_example: rule.reference_example,
                priority: rule.priority,
            })
            .collect()
    }

    /// Most recent audit events, `limit` clamped to `1..=audit_tail_max`.
    pub fn tail_events(&self, limit: usize) -> Vec<AuditEvent> {
        self.audit.lock().tail(self.config.clamp_tail_limit(limit))
    }

    pub fn event_count(&self) -> usize {
        self.audit.lock().len()
    }

    pub fn rule_count(&self) -> usize {
        self.registry.read().store.len()
    }
}

impl Default for ClaimsSimulator {
    fn default() -> Self {
        Self::new(SimulatorConfig::default())
    }
}

fn record_collisions<I>(audit: &mut AuditLog, collisions: I, event_type: AuditEventType)
where
    I: IntoIterator<Item = Collision>,
{
    for collision in collisions {
        audit.append(
            AuditEvent::builder(ACTOR_SYSTEM, event_type)
                .stage(collision.stage)
                .payload("composite", collision.composite.as_str())
                .payload("old_rule", collision.previous.as_str())
                .payload("new_rule", collision.replacement.as_str())
                .reference("rule_id_old", collision.previous.as_str())
                .reference("rule_id_new", collision.replacement.as_str()),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::AuditLevel;
    use std::sync::Arc;
    use std::thread;

    fn elg_ok_request() -> Value {
        json!({"Claim": {"ID": "CLM-ELG-0001", "MemberID": "784-1987-1234567-1"}})
    }

    fn eligibility_draft(claim_id: &str, code: &str) -> RuleDraft {
        RuleDraft::new(Stage::Eligibility)
            .outcome(json!({"outcome_code": code}))
            .reference_example(json!({"Claim": {"ID": claim_id, "MemberID": "M-1"}}))
    }

    #[test]
    fn test_seed_installs_keyable_scenarios() {
        let simulator = ClaimsSimulator::default();
        assert_eq!(simulator.seed_all(), 32);
        assert_eq!(simulator.rule_count(), 32);

        let skipped = simulator
            .tail_events(1000)
            .into_iter()
            .filter(|e| e.event_type == AuditEventType::SeedRuleSkipped)
            .count();
        assert_eq!(skipped, 2);
    }

    #[test]
    fn test_eligibility_match() {
        let simulator = ClaimsSimulator::with_defaults();
        let outcome = simulator.resolve(Stage::Eligibility, &elg_ok_request());

        assert_eq!(outcome.state, ResolutionState::Matched);
        assert!(outcome.response.matched);
        let result = outcome.response.result.as_ref().unwrap();
        assert_eq!(result["outcome_code"], json!("ELG_OK"));
        assert_eq!(result["patient"]["patient_id"], json!("PT-ELG-0001"));
        assert_eq!(result["patient"]["name"], json!("Aisha Khalid"));
        assert!(outcome.response.summary.as_ref().unwrap().starts_with("Summary:"));
        assert_eq!(
            outcome.composite.unwrap().as_str(),
            "ID=CLM-ELG-0001||MemberID=784-1987-1234567-1"
        );
    }

    #[test]
    fn test_missing_member_id_is_unmatched_without_composite() {
        let simulator = ClaimsSimulator::with_defaults();
        let outcome = simulator.resolve(Stage::Eligibility, &json!({"Claim": {"ID": "CLM-ELG-0001"}}));

        assert_eq!(outcome.state, ResolutionState::MissingFields);
        assert!(outcome.composite.is_none());
        assert_eq!(
            outcome.response.to_json(),
            json!({"matched": false, "message": "Invalid Credential."})
        );

        let event = simulator.tail_events(1).remove(0);
        assert_eq!(event.event_type, AuditEventType::MissingFields);
        assert_eq!(event.payload_summary["found"], json!(["ID"]));
        assert!(event.reference_ids["request_sample"].starts_with("REQ-"));
    }

    #[test]
    fn test_index_miss_surfaces_composite() {
        let simulator = ClaimsSimulator::with_defaults();
        let outcome = simulator.resolve(
            Stage::Eligibility,
            &json!({"Claim": {"ID": "CLM-UNKNOWN", "MemberID": "784-1987-1234567-1"}}),
        );
        assert_eq!(outcome.state, ResolutionState::IndexMiss);
        assert!(outcome.composite.is_some());
        assert_eq!(
            outcome.response,
            simulator
                .resolve(Stage::Eligibility, &json!({"Claim": {}}))
                .response
        );
    }

    #[test]
    fn test_unconfigured_stage_never_matches() {
        let config = SimulatorConfig::default().without_stage_fields(Stage::Eligibility);
        let simulator = ClaimsSimulator::new(config);
        simulator.seed_all();

        let outcome = simulator.resolve(Stage::Eligibility, &elg_ok_request());
        assert_eq!(outcome.state, ResolutionState::NoStageConfig);
        assert!(outcome.composite.is_none());
        assert_eq!(
            simulator.compute_composite(Stage::Eligibility, &elg_ok_request()),
            Err(SimulatorError::StageNotConfigured(Stage::Eligibility))
        );
    }

    #[test]
    fn test_batch_preserves_positions() {
        let simulator = ClaimsSimulator::with_defaults();
        let batch = simulator.resolve_batch(
            Stage::Eligibility,
            &[
                json!({"Claim": {"ID": "CLM-ELG-0001"}}),
                elg_ok_request(),
                json!({"Claim": {"ID": "CLM-NOPE", "MemberID": "X"}}),
            ],
        );

        assert_eq!(batch.len(), 3);
        let matched: Vec<bool> = batch.responses().iter().map(|r| r.matched).collect();
        assert_eq!(matched, vec![false, true, false]);
        let composites = batch.composites();
        assert!(composites[0].is_none());
        assert!(composites[1].is_some());
        assert!(composites[2].is_some());
    }

    #[test]
    fn test_each_resolution_emits_one_event() {
        let simulator = ClaimsSimulator::with_defaults();
        let before = simulator.event_count();
        simulator.resolve(Stage::Eligibility, &elg_ok_request());
        simulator.resolve(Stage::Eligibility, &json!({}));
        assert_eq!(simulator.event_count(), before + 2);
    }

    #[test]
    fn test_result_does_not_alias_rule() {
        let simulator = ClaimsSimulator::with_defaults();
        let mut first = simulator.resolve(Stage::Eligibility, &elg_ok_request());
        let result = first.response.result.as_mut().unwrap();
        result.insert("outcome_code".into(), json!("TAMPERED"));
        result.remove("patient");

        let second = simulator.resolve(Stage::Eligibility, &elg_ok_request());
        let result = second.response.result.unwrap();
        assert_eq!(result["outcome_code"], json!("ELG_OK"));
        assert!(result.contains_key("patient"));
    }

    #[test]
    fn test_patient_fields_not_clobbered() {
        let simulator = ClaimsSimulator::default();
        simulator.create_rule(
            RuleDraft::new(Stage::Eligibility)
                .outcome(json!({"outcome_code": "ELG_OK", "patient": {"name": "Preferred Name"}}))
                .reference_example(json!({
                    "Claim": {"ID": "C-1", "MemberID": "M-1"},
                    "Patient": {"PatientID": "P-1", "Name": "Example Name", "DOB": "1990-01-01"}
                })),
        );

        let outcome = simulator.resolve(Stage::Eligibility, &json!({"Claim": {"ID": "C-1", "MemberID": "M-1"}}));
        let result = outcome.response.result.unwrap();
        let patient = &result["patient"];
        assert_eq!(patient["name"], json!("Preferred Name"));
        assert_eq!(patient["patient_id"], json!("P-1"));
        assert_eq!(patient["dob"], json!("1990-01-01"));
    }

    #[test]
    fn test_non_phi_stage_not_augmented() {
        let simulator = ClaimsSimulator::with_defaults();
        let outcome = simulator.resolve(
            Stage::RemittanceTracking,
            &json!({"Remittance": {"RemitID": "RA-PAID-1", "ClaimRefID": "CLM-PAID-1"}}),
        );
        let result = outcome.response.result.unwrap();
        assert!(!result.contains_key("patient"));
        assert!(outcome
            .response
            .summary
            .unwrap()
            .contains("Payment recorded: 100.00 Dirham (AED)."));
    }

    #[test]
    fn test_collision_last_created_wins() {
        let simulator = ClaimsSimulator::default();
        let a = simulator.create_rule(eligibility_draft("C-1", "FIRST"));
        let b = simulator.create_rule(eligibility_draft("C-1", "SECOND"));

        let outcome = simulator.resolve(Stage::Eligibility, &json!({"Claim": {"ID": "C-1", "MemberID": "M-1"}}));
        assert_eq!(outcome.rule_id.as_ref(), Some(&b.id));
        assert_eq!(outcome.response.result.unwrap()["outcome_code"], json!("SECOND"));

        let collision = simulator
            .tail_events(1000)
            .into_iter()
            .find(|e| e.event_type == AuditEventType::IndexCollisionSingle)
            .unwrap();
        assert_eq!(collision.level, AuditLevel::Warning);
        assert_eq!(collision.reference_ids["rule_id_old"], a.id.as_str());
        assert_eq!(collision.reference_ids["rule_id_new"], b.id.as_str());

        // a full rebuild agrees with incremental indexing
        let collisions = simulator.rebuild_stage_index(Stage::Eligibility);
        assert_eq!(collisions.len(), 1);
        let outcome = simulator.resolve(Stage::Eligibility, &json!({"Claim": {"ID": "C-1", "MemberID": "M-1"}}));
        assert_eq!(outcome.rule_id, Some(b.id));
    }

    #[test]
    fn test_update_moves_rule_between_stages() {
        let simulator = ClaimsSimulator::default();
        let rule = simulator.create_rule(eligibility_draft("C-1", "ELG_OK"));

        let updated = simulator
            .update_rule(
                &rule.id,
                RuleDraft::new(Stage::MedicalCoding)
                    .outcome(json!({"coding_status": "CODE_VALID"}))
                    .reference_example(json!({"Claim": {"ID": "C-1"}}))
                    .priority(5),
            )
            .unwrap();
        assert_eq!(updated.id, rule.id);
        assert_eq!(updated.created_at, rule.created_at);
        assert_eq!(updated.priority, 5);

        let request = json!({"Claim": {"ID": "C-1", "MemberID": "M-1"}});
        assert!(!simulator.resolve(Stage::Eligibility, &request).is_matched());
        assert!(simulator.resolve(Stage::MedicalCoding, &request).is_matched());
    }

    #[test]
    fn test_delete_and_not_found() {
        let simulator = ClaimsSimulator::default();
        let rule = simulator.create_rule(eligibility_draft("C-1", "ELG_OK"));

        assert!(simulator.delete_rule(&rule.id).is_ok());
        assert_eq!(
            simulator.delete_rule(&rule.id),
            Err(SimulatorError::RuleNotFound(rule.id.to_string()))
        );
        assert!(simulator.get_rule(&rule.id).is_err());
        assert!(simulator
            .update_rule(&rule.id, eligibility_draft("C-2", "X"))
            .is_err());
        assert!(simulator.list_index_entries().values().all(|entries| entries.is_empty()));
    }

    #[test]
    fn test_reseed_is_idempotent() {
        let simulator = ClaimsSimulator::with_defaults();
        let rules = simulator.list_rules(None);
        let index = simulator.list_index_entries();

        simulator.create_rule(eligibility_draft("C-9", "EXTRA"));
        assert_eq!(simulator.seed_all(), 32);

        assert_eq!(simulator.list_rules(None), rules);
        assert_eq!(simulator.list_index_entries(), index);
    }

    #[test]
    fn test_reseed_resets_audit_log() {
        let simulator = ClaimsSimulator::with_defaults();
        for _ in 0..5 {
            simulator.resolve(Stage::Eligibility, &json!({}));
        }
        simulator.seed_all();
        let events = simulator.tail_events(1000);
        assert_eq!(events.last().unwrap().event_type, AuditEventType::Seeded);
        assert!(events.iter().all(|e| e.actor == ACTOR_SYSTEM));
    }

    #[test]
    fn test_tail_events_clamped() {
        let simulator = ClaimsSimulator::with_defaults();
        assert_eq!(simulator.tail_events(0).len(), 1);
        for _ in 0..1100 {
            simulator.resolve(Stage::Reconciliation, &json!({}));
        }
        assert_eq!(simulator.tail_events(5000).len(), 1000);
    }

    #[test]
    fn test_compute_composite_and_reference_examples() {
        let simulator = ClaimsSimulator::with_defaults();
        let report = simulator
            .compute_composite(Stage::Eligibility, &json!({"Claim": {"ID": "CLM-1"}}))
            .unwrap();
        assert!(report.computed_composite.is_none());
        assert_eq!(report.expected_fields, vec!["Claim.ID", "Claim.MemberID"]);
        assert_eq!(report.found_values["ID"], json!("CLM-1"));

        let examples = simulator.list_reference_examples(Some(Stage::Reconciliation));
        assert_eq!(examples.len(), 2);
        assert_eq!(examples[0].reference_example["Reconciliation"]["ReconID"], json!("RECON-OK-1"));
    }

    #[test]
    fn test_index_entries_dump() {
        let simulator = ClaimsSimulator::with_defaults();
        let snapshot = simulator.list_index_entries();
        let total: usize = snapshot.values().map(|entries| entries.len()).sum();
        assert_eq!(total, 32);

        let value = serde_json::to_value(&snapshot).unwrap();
        let entry = &value["eligibility"]["ID=CLM-ELG-0001||MemberID=784-1987-1234567-1"];
        assert_eq!(entry["outcome_sample"]["outcome_code"], json!("ELG_OK"));
    }

    #[test]
    fn test_lookup_remittance_synthetic_document() {
        let simulator = ClaimsSimulator::with_defaults();
        let outcome = simulator.lookup_remittance("CLM-PAID-1");
        assert!(!outcome.is_matched());
        assert_eq!(
            outcome.composite.unwrap().as_str(),
            "RemitID=CLM-PAID-1||ClaimRefID=CLM-PAID-1"
        );

        let rule = simulator.create_rule(
            RuleDraft::new(Stage::RemittanceTracking)
                .outcome(json!({"remit_id": "RA-X", "paid_amount": 10}))
                .reference_example(json!({"Remittance": {"RemitID": "CLM-X", "ClaimRefID": "CLM-X"}})),
        );
        let outcome = simulator.lookup_remittance("CLM-X");
        assert_eq!(outcome.rule_id, Some(rule.id));
    }

    #[test]
    fn test_concurrent_resolution_during_mutation() {
        let simulator = Arc::new(ClaimsSimulator::with_defaults());
        let writer = {
            let simulator = Arc::clone(&simulator);
            thread::spawn(move || {
                for i in 0..50 {
                    let rule = simulator.create_rule(eligibility_draft(&format!("C-{}", i), "TMP"));
                    simulator.delete_rule(&rule.id).unwrap();
                }
            })
        };
        let readers: Vec<_> = (0..4)
            .map(|_| {
                let simulator = Arc::clone(&simulator);
                thread::spawn(move || {
                    for _ in 0..100 {
                        assert!(simulator.resolve(Stage::Eligibility, &elg_ok_request()).is_matched());
                    }
                })
            })
            .collect();

        writer.join().unwrap();
        for reader in readers {
            reader.join().unwrap();
        }
        assert_eq!(simulator.rule_count(), 32);
    }
}
