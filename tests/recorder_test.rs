//! Experiment Recorder Tests
//!
//! End-to-end behavior of `add`, run creation, and terminal transitions
//! through the public API.

use std::sync::atomic::{AtomicUsize, Ordering};

use trueno_runlog::chart::ChartTable;
use trueno_runlog::persist::{encode_tag, MemoryTagStore, TagPersistence, TagRecord};
use trueno_runlog::run::{
    DirectoryWorkspace, MemoryCatalog, MemoryWorkspace, RunCatalog, RunOptions, RunStatus,
    POSITIVE_ADJECTIVES, TREE_NAMES,
};
use trueno_runlog::value::{Histogram, StructuredValue};
use trueno_runlog::{Error, ExperimentRecorder};

fn named(name: &str) -> RunOptions {
    RunOptions::new().with_name(name).with_argv(vec!["train.py".to_string()])
}

fn recorder() -> ExperimentRecorder {
    let catalog = MemoryCatalog::new("/runs");
    ExperimentRecorder::in_memory(named("test-run"), &catalog, &MemoryWorkspace::new())
        .expect("create recorder")
}

// =============================================================================
// Run Creation Tests
// =============================================================================

#[test]
fn test_create_with_explicit_name() {
    let catalog = MemoryCatalog::new("/runs");
    let workspace = MemoryWorkspace::new();
    let rec = ExperimentRecorder::in_memory(
        named("baseline")
            .with_description("first attempt")
            .with_config(serde_json::json!({"lr": 0.001})),
        &catalog,
        &workspace,
    )
    .unwrap();

    let run = rec.run();
    assert_eq!(run.name(), "baseline");
    assert_eq!(run.description(), "first attempt");
    assert_eq!(run.config()["lr"], 0.001);
    assert_eq!(run.status(), RunStatus::Running);
    assert_eq!(run.experiment_id(), 1);
    assert_eq!(run.index(), 1);
    assert!(workspace.contains(run.logs_dir()));
    assert!(catalog.slot("baseline").is_some());
}

#[test]
fn test_create_explicit_name_collision_gets_suffix() {
    let catalog = MemoryCatalog::with_names("/runs", ["baseline", "baseline-1"]).unwrap();
    let rec =
        ExperimentRecorder::in_memory(named("baseline"), &catalog, &MemoryWorkspace::new())
            .unwrap();

    assert_eq!(rec.run().name(), "baseline-2");
    assert_eq!(rec.run().index(), 3);
}

#[test]
fn test_create_random_name() {
    let catalog = MemoryCatalog::with_names("/runs", ["a", "b"]).unwrap();
    let rec = ExperimentRecorder::in_memory(
        RunOptions::new().with_argv(vec![]),
        &catalog,
        &MemoryWorkspace::new(),
    )
    .unwrap();

    let parts: Vec<&str> = rec.run().name().split('-').collect();
    assert_eq!(parts.len(), 3);
    assert!(POSITIVE_ADJECTIVES.contains(&parts[0]));
    assert!(TREE_NAMES.contains(&parts[1]));
    assert_eq!(parts[2], "3");
}

#[test]
fn test_create_random_name_is_unique() {
    // 120 runs exist, so every generated candidate ends in -121: take them all.
    let mut taken = Vec::new();
    for adjective in POSITIVE_ADJECTIVES {
        for tree in TREE_NAMES {
            taken.push(format!("{adjective}-{tree}-121"));
        }
    }
    let catalog = MemoryCatalog::with_names("/runs", &taken).unwrap();
    assert_eq!(catalog.existing_names().unwrap().len(), 120);

    let rec = ExperimentRecorder::in_memory(
        RunOptions::new().with_argv(vec![]),
        &catalog,
        &MemoryWorkspace::new(),
    )
    .unwrap();

    let name = rec.run().name().to_string();
    assert!(!taken.contains(&name));
    assert!(name.ends_with("-122"));
    assert_eq!(catalog.len(), 121);
}

#[test]
fn test_create_rejects_bad_name() {
    let catalog = MemoryCatalog::new("/runs");
    let result = ExperimentRecorder::in_memory(named("a/b"), &catalog, &MemoryWorkspace::new());
    assert!(matches!(result, Err(Error::Config(_))));
    assert!(catalog.is_empty());
}

#[test]
fn test_create_on_disk() {
    let tmp = tempfile::tempdir().unwrap();
    let catalog = MemoryCatalog::new(tmp.path());
    let rec = ExperimentRecorder::create(
        named("disk"),
        &catalog,
        &DirectoryWorkspace,
        ChartTable::new(),
        MemoryTagStore::new(),
    )
    .unwrap();

    assert!(rec.run().logs_dir().is_dir());
    assert_eq!(rec.run().logs_dir(), tmp.path().join("disk").join("logs"));
}

// =============================================================================
// add() Tests
// =============================================================================

#[test]
fn test_add_running_aggregate() {
    let rec = recorder();
    for v in [0.9, 0.4, 1.3, 0.2] {
        assert!(rec.add("loss", v, None).unwrap().is_recorded());
    }

    let agg = rec.aggregate("loss").unwrap();
    assert_eq!(agg.count(), 4);
    assert_eq!(agg.max(), Some(1.3));
    assert_eq!(agg.min(), Some(0.2));
    assert_eq!(rec.steps("loss"), Some(vec![1, 2, 3, 4]));
}

#[test]
fn test_add_integers_and_text() {
    let rec = recorder();
    rec.add("epoch", 1_i32, None).unwrap();
    rec.add("epoch", 2_i64, None).unwrap();
    rec.add("epoch", "3", None).unwrap();

    let agg = rec.aggregate("epoch").unwrap();
    assert_eq!(agg.count(), 3);
    assert_eq!(agg.max(), Some(3.0));
}

#[test]
fn test_duplicate_step_leaves_tag_unchanged() {
    let rec = recorder();
    rec.add("acc", 0.5, Some(10)).unwrap();
    let before = rec.aggregate("acc").unwrap();

    let outcome = rec.add("acc", 0.99, Some(10)).unwrap();
    assert!(matches!(
        outcome.dropped_reason(),
        Some(Error::DuplicateStep { step: 10, .. })
    ));
    assert_eq!(rec.aggregate("acc").unwrap(), before);
    assert_eq!(rec.persistence().len(), 1);
}

#[test]
fn test_auto_step_collides_with_explicit_step() {
    let rec = recorder();
    rec.add("loss", 1.0, Some(2)).unwrap();
    // count is 1, so the auto step is 2: already taken
    let outcome = rec.add("loss", 0.5, None).unwrap();
    assert!(!outcome.is_recorded());
    assert_eq!(rec.aggregate("loss").unwrap().count(), 1);
}

#[test]
fn test_unresolvable_after_tag_exists_does_not_count() {
    let rec = recorder();
    rec.add("lr", 0.1, None).unwrap();

    let outcome = rec.add("lr", "not-a-number", None).unwrap();
    assert!(matches!(
        outcome.dropped_reason(),
        Some(Error::UnresolvableValue { .. })
    ));
    let nan = rec.add("lr", f64::NAN, None).unwrap();
    assert!(!nan.is_recorded());

    let agg = rec.aggregate("lr").unwrap();
    assert_eq!(agg.count(), 1);
    assert_eq!(agg.max(), Some(0.1));
    assert_eq!(agg.min(), Some(0.1));

    // The next good sample takes the next step, not one after the failures
    assert_eq!(rec.add("lr", 0.05, None).unwrap().step(), Some(2));
}

#[test]
fn test_first_add_unresolvable_creates_tag() {
    let rec = recorder();
    assert!(!rec.add("note", "hello", None).unwrap().is_recorded());
    assert_eq!(rec.tags(), vec!["note".to_string()]);
    assert_eq!(rec.aggregate("note").unwrap().count(), 0);
}

#[test]
fn test_errored_tag_drops_everything() {
    let rec = recorder();
    rec.add("mix", 1.0, None).unwrap();
    rec.add("mix", Histogram::new(vec![1.0]), None).unwrap();

    for step in 10..15 {
        let outcome = rec.add("mix", 2.0, Some(step)).unwrap();
        assert!(matches!(
            outcome.dropped_reason(),
            Some(Error::TagErrored { .. })
        ));
    }
    assert_eq!(rec.aggregate("mix").unwrap().count(), 1);
    // Other tags unaffected
    assert!(rec.add("other", 2.0, None).unwrap().is_recorded());
}

#[test]
fn test_structured_payload() {
    let rec = recorder();
    let first = rec
        .add("weights", Histogram::new(vec![1.0, 2.0, 3.0]), None)
        .unwrap();
    assert_eq!(first.step(), Some(1));

    let second = rec
        .add(
            "weights",
            StructuredValue::new(Histogram::new(vec![10.0])).with_step(7),
            None,
        )
        .unwrap();
    assert_eq!(second.step(), Some(7));

    let agg = rec.aggregate("weights").unwrap();
    assert_eq!(agg.max(), Some(10.0));
    assert_eq!(agg.min(), Some(2.0));
}

#[test]
fn test_persisted_record_uses_encoded_tag() {
    let rec = recorder();
    rec.add("train/loss", 0.8, None).unwrap();
    rec.add("train/loss", 0.6, None).unwrap();

    // In-memory key stays raw
    assert_eq!(rec.tags(), vec!["train/loss".to_string()]);

    let key = encode_tag("train/loss");
    assert_eq!(key, "train%2Floss");
    let records = rec.persistence().records(&key);
    assert_eq!(records.len(), 2);
    assert_eq!(records[1].tag(), "train%2Floss");
    assert_eq!(records[1].step(), 2);
    assert_eq!(records[1].sample_count(), 2);
    assert_eq!(records[1].summary().max, Some(0.8));
    assert_eq!(records[1].summary().min, Some(0.6));
}

struct FailingStore {
    attempts: AtomicUsize,
}

impl TagPersistence for FailingStore {
    fn save_tag(&self, _record: TagRecord) -> trueno_runlog::Result<()> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Err(Error::Persistence("disk full".to_string()))
    }
}

#[test]
fn test_persistence_failure_propagates() {
    let catalog = MemoryCatalog::new("/runs");
    let rec = ExperimentRecorder::create(
        named("broken"),
        &catalog,
        &MemoryWorkspace::new(),
        ChartTable::new(),
        FailingStore {
            attempts: AtomicUsize::new(0),
        },
    )
    .unwrap();

    let err = rec.add("loss", 1.0, None).unwrap_err();
    assert!(matches!(err, Error::Persistence(_)));
    assert!(!err.is_recoverable());
    assert_eq!(rec.persistence().attempts.load(Ordering::SeqCst), 1);
    // Dropped samples never reach persistence
    rec.add("loss", "x", None).unwrap();
    assert_eq!(rec.persistence().attempts.load(Ordering::SeqCst), 1);
}

/// Fails the first `failures` saves, then stores normally.
struct FlakyStore {
    failures: AtomicUsize,
    inner: MemoryTagStore,
}

impl TagPersistence for FlakyStore {
    fn save_tag(&self, record: TagRecord) -> trueno_runlog::Result<()> {
        let left = self.failures.load(Ordering::SeqCst);
        if left > 0 {
            self.failures.store(left - 1, Ordering::SeqCst);
            return Err(Error::Persistence("connection reset".to_string()));
        }
        self.inner.save_tag(record)
    }
}

#[test]
fn test_persistence_failure_leaves_tag_untouched() {
    let catalog = MemoryCatalog::new("/runs");
    let rec = ExperimentRecorder::create(
        named("flaky"),
        &catalog,
        &MemoryWorkspace::new(),
        ChartTable::new(),
        FlakyStore {
            failures: AtomicUsize::new(1),
            inner: MemoryTagStore::new(),
        },
    )
    .unwrap();

    assert!(matches!(
        rec.add("loss", 5.0, Some(1)),
        Err(Error::Persistence(_))
    ));
    let agg = rec.aggregate("loss").unwrap();
    assert_eq!(agg.count(), 0);
    assert!(agg.max().is_none());
    assert!(agg.min().is_none());
    assert_eq!(rec.steps("loss"), Some(vec![]));

    // Same step again now goes through
    let retry = rec.add("loss", 5.0, Some(1)).unwrap();
    assert_eq!(retry.step(), Some(1));
    let agg = rec.aggregate("loss").unwrap();
    assert_eq!(agg.count(), 1);
    assert_eq!(agg.max(), Some(5.0));

    let stored = rec.persistence().inner.records("loss");
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].sample_count(), 1);
}

#[test]
fn test_auto_step_not_consumed_by_persistence_failure() {
    let catalog = MemoryCatalog::new("/runs");
    let rec = ExperimentRecorder::create(
        named("flaky-auto"),
        &catalog,
        &MemoryWorkspace::new(),
        ChartTable::new(),
        FlakyStore {
            failures: AtomicUsize::new(2),
            inner: MemoryTagStore::new(),
        },
    )
    .unwrap();

    assert!(rec.add("acc", 0.1, None).is_err());
    assert!(rec.add("acc", 0.2, None).is_err());
    assert_eq!(rec.add("acc", 0.3, None).unwrap().step(), Some(1));
    assert_eq!(rec.steps("acc"), Some(vec![1]));
}

// =============================================================================
// Concurrency Tests
// =============================================================================

#[test]
fn test_concurrent_distinct_steps() {
    let rec = recorder();
    std::thread::scope(|scope| {
        for worker in 0..8_u64 {
            let rec = &rec;
            scope.spawn(move || {
                for i in 0..50_u64 {
                    let step = worker * 50 + i + 1;
                    rec.add("loss", step as f64, Some(step)).unwrap();
                }
            });
        }
    });

    let agg = rec.aggregate("loss").unwrap();
    assert_eq!(agg.count(), 400);
    assert_eq!(agg.min(), Some(1.0));
    assert_eq!(agg.max(), Some(400.0));
    assert_eq!(rec.persistence().len(), 400);
}

#[test]
fn test_concurrent_records_arrive_in_acceptance_order() {
    let rec = recorder();
    std::thread::scope(|scope| {
        for worker in 0..8_u64 {
            let rec = &rec;
            scope.spawn(move || {
                for i in 0..50_u64 {
                    let step = worker * 50 + i + 1;
                    rec.add("loss", step as f64, Some(step)).unwrap();
                }
            });
        }
    });

    // Each stored summary must cover exactly the samples accepted before it,
    // so the latest record carries the full count.
    let last = rec.persistence().last("loss").unwrap();
    assert_eq!(last.sample_count(), 400);
    assert_eq!(last.summary().count, 400);
    assert_eq!(last.summary().min, Some(1.0));
    assert_eq!(last.summary().max, Some(400.0));

    let mut counts: Vec<u64> = rec
        .persistence()
        .records("loss")
        .iter()
        .map(TagRecord::sample_count)
        .collect();
    counts.sort_unstable();
    assert_eq!(counts, (1..=400).collect::<Vec<u64>>());
}

#[test]
fn test_concurrent_same_step_accepted_once() {
    let rec = recorder();
    let accepted = AtomicUsize::new(0);
    std::thread::scope(|scope| {
        for worker in 0..16_i32 {
            let (rec, accepted) = (&rec, &accepted);
            scope.spawn(move || {
                if rec.add("acc", f64::from(worker), Some(1)).unwrap().is_recorded() {
                    accepted.fetch_add(1, Ordering::SeqCst);
                }
            });
        }
    });

    assert_eq!(accepted.load(Ordering::SeqCst), 1);
    assert_eq!(rec.aggregate("acc").unwrap().count(), 1);
}

// =============================================================================
// Lifecycle Tests
// =============================================================================

#[test]
fn test_success_transition() {
    let mut rec = recorder();
    let created = rec.run().create_time();
    rec.success().unwrap();

    assert_eq!(rec.run().status(), RunStatus::Success);
    assert!(rec.run().update_time() > created);
}

#[test]
fn test_fail_transition() {
    let mut rec = recorder();
    rec.fail().unwrap();
    assert_eq!(rec.run().status(), RunStatus::Failed);
    assert!(rec.run().update_time() > rec.run().create_time());
}

#[test]
fn test_second_transition_rejected() {
    let mut rec = recorder();
    rec.success().unwrap();
    let stamp = rec.run().update_time();

    assert!(matches!(
        rec.fail(),
        Err(Error::InvalidTransition { .. })
    ));
    assert!(rec.success().is_err());
    assert_eq!(rec.run().status(), RunStatus::Success);
    assert_eq!(rec.run().update_time(), stamp);
}

#[test]
fn test_snapshot_serialization() {
    let mut rec = recorder();
    rec.fail().unwrap();

    let json = serde_json::to_value(rec.snapshot()).unwrap();
    assert_eq!(json["name"], "test-run");
    assert_eq!(json["status"], -1);
    assert_eq!(json["argv"][0], "train.py");
    assert_eq!(json["index"], 1);
    assert!(json["create_time"].is_string());
    assert!(json.get("tags").is_none());
}
