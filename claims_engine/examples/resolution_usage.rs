// examples/resolution_usage.rs
//
// Walkthrough of seeding, resolving and administering the claims simulator

use claims_engine::{ClaimsSimulator, RuleDraft, SimulatorError, Stage};
use serde_json::json;

fn main() -> Result<(), SimulatorError> {
    println!("=== Claims Simulator Usage Examples ===\n");

    let simulator = ClaimsSimulator::with_defaults();
    println!("Seeded {} rules\n", simulator.rule_count());

    example_1_single_resolution(&simulator);
    example_2_batch_resolution(&simulator);
    example_3_rule_lifecycle(&simulator)?;
    example_4_diagnostics(&simulator)?;

    println!("\n=== All Examples Completed Successfully ===");
    Ok(())
}

// ============================================================================
// Example 1: Single Resolution
// ============================================================================

fn example_1_single_resolution(simulator: &ClaimsSimulator) {
    println!("--- Example 1: Single Resolution ---");

    let request = json!({
        "Header": {"SenderID": "HOSP-001"},
        "Claim": {"ID": "CLM-ELG-0001", "MemberID": "784-1987-1234567-1"}
    });
    let outcome = simulator.resolve(Stage::Eligibility, &request);

    println!("state: {:?}", outcome.state);
    println!("composite: {:?}", outcome.composite.as_ref().map(|k| k.as_str()));
    println!("body: {}\n", outcome.response.to_json());
}

// ============================================================================
// Example 2: Batch Resolution
// ============================================================================

fn example_2_batch_resolution(simulator: &ClaimsSimulator) {
    println!("--- Example 2: Batch Resolution ---");

    let batch = simulator.resolve_batch(
        Stage::PriorAuthorization,
        &[
            json!({"PriorAuthorizationRequest": {"RequestID": "PAR-0001"}}),
            json!({"PriorAuthorizationRequest": {"RequestID": "PAR-9999"}}),
            json!({"PriorAuthorizationRequest": {}}),
        ],
    );

    for (position, outcome) in batch.outcomes.iter().enumerate() {
        println!(
            "[{}] matched={} composite={:?}",
            position,
            outcome.response.matched,
            outcome.composite.as_ref().map(|k| k.as_str())
        );
    }
    println!();
}

// ============================================================================
// Example 3: Rule Lifecycle
// ============================================================================

fn example_3_rule_lifecycle(simulator: &ClaimsSimulator) -> Result<(), SimulatorError> {
    println!("--- Example 3: Rule Lifecycle ---");

    let rule = simulator.create_rule(
        RuleDraft::new(Stage::DenialManagement)
            .outcome(json!({"denial_management_status": "DEN_MGR_WRITE_OFF"}))
            .reference_example(json!({"Denial": {"ClaimRefID": "REF_DEN_WRITE_OFF"}})),
    );
    println!("created {}", rule.id);

    let updated = simulator.update_rule(
        &rule.id,
        RuleDraft::new(Stage::DenialManagement)
            .outcome(json!({"denial_management_status": "DEN_MGR_WRITE_OFF", "status_label": "Written off"}))
            .reference_example(json!({"Denial": {"ClaimRefID": "REF_DEN_WRITE_OFF"}}))
            .priority(50),
    )?;
    let outcome = simulator.resolve(
        Stage::DenialManagement,
        &json!({"Denial": {"ClaimRefID": "REF_DEN_WRITE_OFF"}}),
    );
    println!("updated {} -> {:?}", updated.id, outcome.response.summary);

    simulator.delete_rule(&rule.id)?;
    println!("deleted {}\n", rule.id);
    Ok(())
}

// ============================================================================
// Example 4: Diagnostics
// ============================================================================

fn example_4_diagnostics(simulator: &ClaimsSimulator) -> Result<(), SimulatorError> {
    println!("--- Example 4: Diagnostics ---");

    let report = simulator.compute_composite(Stage::Eligibility, &json!({"Claim": {"ID": "CLM-1"}}))?;
    println!("composite report: {:?}", report);

    for (stage, entries) in simulator.list_index_entries() {
        println!("{}: {} indexed keys", stage, entries.len());
    }

    for event in simulator.tail_events(5) {
        println!("#{} {} {:?}", event.seq, event.event_type.as_str(), event.stage);
    }
    Ok(())
}
