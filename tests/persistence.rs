use std::{fs, sync::Arc};

use popsim::{
    render::{csv, html, ChartConfig},
    snapshot::{PersistenceError, SnapshotStore},
    RunParameters, SimulationEngine, SpeciesProfile,
};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tempfile::tempdir;

fn completed_run() -> popsim::SimulationOutcome {
    let profile = SpeciesProfile::new("House Mouse", 6.0, 5.0, 0.8, 2).unwrap();
    SimulationEngine::new(
        Arc::new(profile),
        RunParameters {
            initial_population: 10,
            simulation_years: 5,
        },
        ChaCha8Rng::seed_from_u64(42),
    )
    .with_seed(42)
    .run()
    .unwrap()
}

#[test]
fn saved_runs_survive_a_new_store() {
    let temp = tempdir().unwrap();
    let outcome = completed_run();
    {
        let store = SnapshotStore::open(temp.path()).unwrap();
        store.save("Mouse trial #1", &outcome).unwrap();
    }

    let reopened = SnapshotStore::open(temp.path()).unwrap();
    assert_eq!(reopened.list().unwrap(), vec!["Mouse_trial__1"]);
    let snapshot = reopened.load("Mouse trial #1").unwrap();
    assert_eq!(snapshot.outcome, outcome);
    assert_eq!(snapshot.outcome.seed, Some(42));
}

#[test]
fn one_corrupt_file_does_not_hide_the_others() {
    let temp = tempdir().unwrap();
    let store = SnapshotStore::open(temp.path()).unwrap();
    store.save("good", &completed_run()).unwrap();
    fs::write(temp.path().join("bad.json"), "[1, 2").unwrap();

    assert_eq!(store.list().unwrap(), vec!["bad", "good"]);
    assert!(store.load("good").is_ok());
    let err = store.load("bad").unwrap_err();
    assert!(matches!(err, PersistenceError::Corrupt { .. }));
    assert!(err.to_string().contains("bad"));
}

#[test]
fn missing_run_reports_not_found() {
    let temp = tempdir().unwrap();
    let store = SnapshotStore::open(temp.path().join("nested/simulations")).unwrap();
    let err = store.load("absent").unwrap_err();
    assert_eq!(err.to_string(), "simulation not found: absent");
}

#[test]
fn completed_run_exports_chart_and_csv() {
    let temp = tempdir().unwrap();
    let outcome = completed_run();

    let chart = html::write_chart(
        temp.path(),
        &outcome.history,
        outcome.profile.name(),
        &ChartConfig::default(),
    )
    .unwrap()
    .expect("chart written");
    assert!(chart.ends_with("House_Mouse_chart.html"));

    let csv_path = temp.path().join("mouse.csv");
    csv::write(&csv_path, &outcome.history).unwrap();
    let rows = fs::read_to_string(csv_path).unwrap();
    assert_eq!(rows.lines().count(), outcome.history.len() + 1);
    assert!(rows.starts_with("Year,TotalPopulation\n0,10\n"));
}
