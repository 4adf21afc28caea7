//! Rotation history survives restarts through the JSON file store

use pageforge::config::RotationSettings;
use pageforge::rotation::{HistoryStore, JsonFileStore, RotationEngine, RotationStrategy};
use std::fs;
use std::sync::Arc;
use tempfile::TempDir;

const CANDIDATES: [&str; 3] = ["opening-a", "opening-b", "opening-c"];

fn open(path: &std::path::Path, strategy: RotationStrategy) -> RotationEngine {
    RotationEngine::open(
        Arc::new(JsonFileStore::new(path)),
        RotationSettings::default(),
    )
    .unwrap()
    .with_strategy(strategy)
    .with_seed(7)
}

#[test]
fn test_usage_counts_survive_reopen() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("rotation").join("history.json");

    let engine = open(&path, RotationStrategy::LeastUsed);
    for _ in 0..6 {
        engine.select("intro", &CANDIDATES).unwrap();
    }
    engine.record_performance("intro", "opening-b", true);
    engine.record_fragment("opening-a");
    engine.flush().unwrap();
    assert!(path.exists());
    drop(engine);

    let reopened = open(&path, RotationStrategy::LeastUsed);
    let stats = reopened.category_stats("intro");
    assert_eq!(stats.total_uses, 6);
    for item in CANDIDATES {
        assert_eq!(stats.items[item].usage_count, 2);
    }
    assert_eq!(stats.items["opening-b"].successes, 1);
    assert_eq!(reopened.snapshot().fragments["opening-a"], 1);

    // Balance continues from the persisted counts
    reopened.select("intro", &CANDIDATES).unwrap();
    reopened.select("intro", &CANDIDATES).unwrap();
    reopened.select("intro", &CANDIDATES).unwrap();
    let stats = reopened.category_stats("intro");
    for item in CANDIDATES {
        assert_eq!(stats.items[item].usage_count, 3);
    }
}

#[test]
fn test_sequential_position_resumes() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("history.json");

    let engine = open(&path, RotationStrategy::Sequential);
    let first: Vec<usize> = (0..2)
        .map(|_| engine.select("cta", &CANDIDATES).unwrap().index)
        .collect();
    assert_eq!(first, vec![0, 1]);
    engine.flush().unwrap();

    let reopened = open(&path, RotationStrategy::Sequential);
    let next: Vec<usize> = (0..3)
        .map(|_| reopened.select("cta", &CANDIDATES).unwrap().index)
        .collect();
    assert_eq!(next, vec![2, 0, 1]);
}

#[test]
fn test_corrupted_history_is_backed_up_and_reset() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("history.json");
    fs::write(&path, "{ not valid json").unwrap();

    let engine = open(&path, RotationStrategy::LeastUsed);
    assert_eq!(engine.category_stats("intro").total_uses, 0);
    assert!(!path.exists());

    let backups: Vec<String> = fs::read_dir(temp_dir.path())
        .unwrap()
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.file_name().to_string_lossy().into_owned())
        .filter(|name| name.starts_with("history.json.corrupted."))
        .collect();
    assert_eq!(backups.len(), 1);

    engine.select("intro", &CANDIDATES).unwrap();
    engine.flush().unwrap();
    let history = JsonFileStore::new(&path).load().unwrap();
    assert_eq!(history.records.len(), 1);
}

#[test]
fn test_reset_category_persists() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("history.json");

    let engine = open(&path, RotationStrategy::LeastUsed);
    engine.select("intro", &CANDIDATES).unwrap();
    engine.select("cta", &CANDIDATES).unwrap();
    engine.flush().unwrap();
    drop(engine);

    let reopened = open(&path, RotationStrategy::LeastUsed);
    reopened.reset_category("intro");
    reopened.flush().unwrap();
    drop(reopened);

    let history = JsonFileStore::new(&path).load().unwrap();
    assert!(history.record("intro", "opening-a").is_none());
    assert_eq!(history.record("cta", "opening-a").unwrap().usage_count, 1);
}
