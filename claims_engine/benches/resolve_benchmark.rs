use claims_engine::{build_composite, ClaimsSimulator, Stage};
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use serde_json::json;

pub fn composite_bench(c: &mut Criterion) {
    let fields = vec!["Claim.ID".to_string(), "Claim.MemberID".to_string()];
    let direct = json!({"Claim": {"ID": "CLM-ELG-0001", "MemberID": "784-1987-1234567-1"}});
    let scattered = json!({
        "Header": {"SenderID": "HOSP-001", "ReceiverID": "PAYER-01"},
        "Claim": {"ID": "CLM-ELG-0001", "Activity": [{"Code": "30520"}, {"Code": "99214"}]},
        "Member": {"memberid": "784-1987-1234567-1"}
    });

    c.bench_function("composite_dotted_path", |b| {
        b.iter(|| build_composite(black_box(&direct), &fields))
    });
    c.bench_function("composite_search_fallback", |b| {
        b.iter(|| build_composite(black_box(&scattered), &fields))
    });
}

pub fn resolve_bench(c: &mut Criterion) {
    let simulator = ClaimsSimulator::with_defaults();
    let hit = json!({"Claim": {"ID": "CLM-ELG-0001", "MemberID": "784-1987-1234567-1"}});
    let miss = json!({"Claim": {"ID": "CLM-NONE", "MemberID": "784-1987-1234567-1"}});

    c.bench_function("resolve_match", |b| {
        b.iter(|| simulator.resolve(Stage::Eligibility, black_box(&hit)))
    });
    c.bench_function("resolve_index_miss", |b| {
        b.iter(|| simulator.resolve(Stage::Eligibility, black_box(&miss)))
    });
    c.bench_function("seed_all", |b| b.iter(|| simulator.seed_all()));
}

criterion_group!(benches, composite_bench, resolve_bench);
criterion_main!(benches);
