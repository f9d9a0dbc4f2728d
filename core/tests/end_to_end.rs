use dca_core::{
    assignment::HIGH_PERFORMANCE_THRESHOLD,
    case::Case,
    config::{DcaConfig, DEFAULT_SEED},
    engine::BatchEngine,
    ingest,
    roster::Roster,
    types::{RecoveryLikelihood, Specialty},
};
use std::fs;
use tempfile::TempDir;

// ── Test helpers ────────────────────────────────────────────────────────────

fn trained_engine(dir: &TempDir, seed: u64) -> BatchEngine {
    let _ = env_logger::builder().is_test(true).try_init();
    let mut config = DcaConfig::default_test(dir.path());
    config.seed = seed;
    let mut engine = BatchEngine::new(config, Roster::standard());
    let data = engine.generate_training_data(engine.config.sample_size).unwrap();
    engine.train(&data).expect("training succeeds");
    engine
}

fn reference_batch() -> Vec<Case> {
    vec![
        Case::new("C1", 500.0, 10, "Individual", "Excellent", 0, "North").unwrap(),
        Case::new("C2", 30_000.0, 200, "Enterprise", "Poor", 0, "West").unwrap(),
        Case::new("C3", 8000.0, 90, "SMB", "Fair", 0, "East").unwrap(),
    ]
}

// ── Tests ────────────────────────────────────────────────────────────────────

/// Three reference cases flow through predict → assign → summarize, and
/// every assignment is consistent with its predicted tier.
#[test]
fn reference_batch_is_processed_consistently() {
    let dir = TempDir::new().unwrap();
    let engine = trained_engine(&dir, DEFAULT_SEED);
    let roster = engine.roster();

    let batch = engine.process(&reference_batch()).unwrap();

    assert_eq!(batch.cases.len(), 3);
    assert_eq!(batch.summary.total_cases, 3);
    for (out, id) in batch.cases.iter().zip(["C1", "C2", "C3"]) {
        assert_eq!(out.case.case_id(), id, "row order must be preserved");
        let agency = roster.get(&out.dca_assigned).expect("assigned agency is on the roster");
        let likelihood = out.predicted_recovery.expect("processed cases are scored");

        match (out.case.region(), likelihood) {
            // North has a top performer; West's only agency takes everything.
            ("North", RecoveryLikelihood::High) => {
                assert!(agency.performance > HIGH_PERFORMANCE_THRESHOLD)
            }
            ("East", RecoveryLikelihood::Low) => assert_eq!(agency.specialty, Specialty::Low),
            (region, _) => assert_eq!(agency.region, region),
        }
    }

    let assigned: usize = batch.agency_stats.iter().map(|s| s.cases_assigned).sum();
    assert_eq!(assigned, 3);
}

/// A large, long-overdue case with a poor history is scored Low; a
/// small, fresh case with an excellent history is not.
#[test]
fn forest_separates_clear_cut_cases() {
    let dir = TempDir::new().unwrap();
    let engine = trained_engine(&dir, DEFAULT_SEED);

    let scored = engine.predict(&reference_batch()).unwrap();
    assert_eq!(scored[1].predicted_recovery, RecoveryLikelihood::Low);
    assert_ne!(scored[0].predicted_recovery, RecoveryLikelihood::Low);
}

/// Same seed, same data, same batch → identical processed output.
#[test]
fn processing_is_reproducible_for_a_seed() {
    let dir_a = TempDir::new().unwrap();
    let dir_b = TempDir::new().unwrap();
    let a = trained_engine(&dir_a, 7);
    let b = trained_engine(&dir_b, 7);

    let cases = a.generate_training_data(120).unwrap();
    let out_a = a.process(&cases).unwrap();
    let out_b = b.process(&cases).unwrap();

    assert_eq!(out_a.cases, out_b.cases);
    assert_eq!(out_a.agency_stats, out_b.agency_stats);
    assert_eq!(out_a.summary, out_b.summary);
}

/// Processing before training fails without writing anything.
#[test]
fn processing_requires_a_model() {
    let dir = TempDir::new().unwrap();
    let engine = BatchEngine::new(DcaConfig::default_test(dir.path()), Roster::standard());
    assert!(engine.process(&reference_batch()).is_err());
}

/// CSV in, CSV out: the full file-level flow.
#[test]
fn csv_round_trip_through_engine() {
    let dir = TempDir::new().unwrap();
    let engine = trained_engine(&dir, DEFAULT_SEED);

    let mut input = Vec::new();
    ingest::write_cases(&mut input, &reference_batch()).unwrap();
    let table = ingest::read_cases(input.as_slice()).unwrap();
    let batch = engine.process(table.cases()).unwrap();

    let mut out = Vec::new();
    ingest::write_assigned(&mut out, &table, &batch.cases, b',').unwrap();
    let text = String::from_utf8(out).unwrap();
    assert_eq!(text.lines().count(), 4, "header plus three rows");
    assert!(text.lines().next().unwrap().ends_with("dca_assigned"));
    assert!(text.lines().nth(1).unwrap().starts_with("C1,500,10,"));

    // Feeding the output back in replaces the result columns in place.
    let again = ingest::read_cases(text.as_bytes()).unwrap();
    let rerun = engine.process(again.cases()).unwrap();
    let mut out = Vec::new();
    ingest::write_assigned(&mut out, &again, &rerun.cases, b',').unwrap();
    let rerun_text = String::from_utf8(out).unwrap();
    assert_eq!(rerun_text.lines().next(), text.lines().next());
}

/// Partial config files fill the rest from defaults.
#[test]
fn config_loads_with_defaults() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("dca.json");
    fs::write(&path, r#"{ "seed": 9, "forest": { "n_trees": 5 } }"#).unwrap();

    let config = DcaConfig::load(&path).unwrap();
    assert_eq!(config.seed, 9);
    assert_eq!(config.forest.n_trees, 5);
    assert_eq!(config.forest.max_depth, 10);
    assert_eq!(config.test_fraction, 0.2);
    assert!(config.roster_path.is_none());
}

#[test]
fn config_rejects_bad_values() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("dca.json");
    fs::write(&path, r#"{ "test_fraction": 1.5 }"#).unwrap();
    assert!(DcaConfig::load(&path).is_err());

    assert!(DcaConfig::load(dir.path().join("absent.json")).is_err());
}

/// build() honors a configured roster file.
#[test]
fn build_uses_configured_roster() {
    let dir = TempDir::new().unwrap();
    let roster_path = dir.path().join("roster.json");
    fs::write(
        &roster_path,
        r#"{ "agencies": [ { "name": "Only", "region": "North", "specialty": "General", "performance": 0.5 } ] }"#,
    )
    .unwrap();

    let mut config = DcaConfig::default_test(dir.path());
    config.roster_path = Some(roster_path);
    let engine = BatchEngine::build(config).unwrap();

    assert_eq!(engine.roster().len(), 1);
    assert!(!engine.status().is_ready());
}
