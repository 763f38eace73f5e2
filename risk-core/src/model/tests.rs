//! Model lifecycle tests: cold start, retraining, persistence, concurrency

use std::collections::BTreeSet;
use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use super::*;
use crate::baseline::BaselineCatalog;
use crate::error::{RiskError, RiskResult};
use crate::features::{PatchStatus, TelemetryRecord};
use crate::risk::ReasonCode;

/// Counts saves on top of a real filesystem store
struct CountingStore {
    inner: FsModelStore,
    saves: AtomicUsize,
}

impl ModelStore for CountingStore {
    fn load(&self, device_type: &str) -> RiskResult<DeviceTypeModel> {
        self.inner.load(device_type)
    }

    fn save(&self, device_type: &str, model: &DeviceTypeModel) -> RiskResult<()> {
        self.saves.fetch_add(1, Ordering::SeqCst);
        self.inner.save(device_type, model)
    }

    fn exists(&self, device_type: &str) -> bool {
        self.inner.exists(device_type)
    }

    fn list_device_types(&self) -> RiskResult<BTreeSet<String>> {
        self.inner.list_device_types()
    }

    fn stamp(&self, device_type: &str) -> RiskResult<Option<ModelStamp>> {
        self.inner.stamp(device_type)
    }
}

struct Harness {
    trainer: Arc<Trainer>,
    predictor: Predictor,
    counters: Arc<ScoringCounters>,
}

fn params() -> TrainingParams {
    TrainingParams { contamination: 0.05, seed: 42, n_estimators: 100, max_samples: 256 }
}

fn harness(store: Arc<dyn ModelStore>) -> Harness {
    let locks = Arc::new(KeyedLocks::new());
    let cache = Arc::new(ModelCache::new());
    let counters = Arc::new(ScoringCounters::default());
    let trainer = Arc::new(Trainer::new(
        store.clone(),
        Arc::new(BaselineCatalog::builtin()),
        locks.clone(),
        cache.clone(),
        counters.clone(),
        params(),
    ));
    let predictor = Predictor::new(store, trainer.clone(), locks, cache, counters.clone());
    Harness { trainer, predictor, counters }
}

fn fs_harness(dir: &Path) -> Harness {
    harness(Arc::new(FsModelStore::new(dir)))
}

fn normal_glucose() -> TelemetryRecord {
    let mut r = TelemetryRecord::new("glu-001", "glucose_monitor");
    r.pkt_sec = 1.0;
    r.bytes_sec = 500.0;
    r.dest_count = 1;
    r.avg_payload = 200.0;
    r.protocol = "HTTPS".to_string();
    r.patch_status = PatchStatus::Patched;
    r.maintenance_days = 10;
    r
}

fn hostile_glucose() -> TelemetryRecord {
    let mut r = TelemetryRecord::new("glu-666", "glucose_monitor");
    r.pkt_sec = 200.0;
    r.bytes_sec = 80_000.0;
    r.dest_count = 6;
    r.avg_payload = 3000.0;
    r.protocol = "unknown".to_string();
    r.patch_status = PatchStatus::Unpatched;
    r.maintenance_days = 400;
    r
}

fn quiet_pool(device_type: &str, n: usize) -> Vec<TelemetryRecord> {
    (0..n)
        .map(|i| {
            let mut r = TelemetryRecord::new(&format!("dev-{}", i), device_type);
            r.pkt_sec = 1.0 + (i as f64) * 0.05;
            r.bytes_sec = 500.0 + (i as f64) * 3.0;
            r.dest_count = 1;
            r.avg_payload = 200.0 + (i as f64);
            r
        })
        .collect()
}

// ============================================================================
// COLD START + SCORING
// ============================================================================

#[test]
fn test_cold_start_normal_record_scores_low() {
    let dir = tempfile::tempdir().unwrap();
    let h = fs_harness(dir.path());

    let result = h.predictor.predict(&normal_glucose()).unwrap();

    assert_eq!(result.device_id, "glu-001");
    assert_eq!(result.device_type, "glucose_monitor");
    assert!(result.anomaly_score > 0.0 && result.anomaly_score < 1.0);
    assert!(!result.outlier);
    assert!(result.reasons.is_empty());
    assert!(result.risk_score < 50, "risk {}", result.risk_score);

    let stored = FsModelStore::new(dir.path()).load("glucose_monitor").unwrap();
    assert_eq!(stored.source, ModelSource::Baseline);
    assert_eq!(stored.sample_count, 3);
    assert_eq!(h.counters.snapshot().cold_starts, 1);
}

#[test]
fn test_hostile_record_fires_every_reason() {
    let dir = tempfile::tempdir().unwrap();
    let h = fs_harness(dir.path());

    let result = h.predictor.predict(&hostile_glucose()).unwrap();

    assert!(result.outlier);
    assert_eq!(result.reasons, ReasonCode::ALL.to_vec());
    assert!(result.anomaly_score > 0.5);
    assert!(result.risk_score >= 60, "risk {}", result.risk_score);
}

#[test]
fn test_hostile_outranks_normal() {
    let dir = tempfile::tempdir().unwrap();
    let h = fs_harness(dir.path());

    let normal = h.predictor.predict(&normal_glucose()).unwrap();
    let hostile = h.predictor.predict(&hostile_glucose()).unwrap();
    assert!(hostile.anomaly_score > normal.anomaly_score);
    assert!(hostile.risk_score > normal.risk_score);
}

#[test]
fn test_unknown_type_uses_fallback_under_own_key() {
    let dir = tempfile::tempdir().unwrap();
    let h = fs_harness(dir.path());

    let mut record = normal_glucose();
    record.device_type = "Smart Scale".to_string();
    let result = h.predictor.predict(&record).unwrap();
    assert_eq!(result.device_type, "Smart Scale");

    let store = FsModelStore::new(dir.path());
    assert!(store.exists("smart_scale"));
    assert!(!store.exists("patient_monitor"));
    assert_eq!(store.load("smart_scale").unwrap().sample_count, 2);
}

#[test]
fn test_second_prediction_reuses_model() {
    let dir = tempfile::tempdir().unwrap();
    let h = fs_harness(dir.path());

    h.predictor.predict(&normal_glucose()).unwrap();
    h.predictor.predict(&normal_glucose()).unwrap();

    let stats = h.counters.snapshot();
    assert_eq!(stats.cold_starts, 1);
    assert_eq!(stats.predictions, 2);
}

#[test]
fn test_persisted_model_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let first = fs_harness(dir.path()).predictor.predict(&normal_glucose()).unwrap();

    let restarted = fs_harness(dir.path());
    let second = restarted.predictor.predict(&normal_glucose()).unwrap();

    assert_eq!(first, second);
    assert_eq!(restarted.counters.snapshot().cold_starts, 0);
}

// ============================================================================
// TRAINING
// ============================================================================

#[test]
fn test_empty_pool_is_no_data_and_persists_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let h = fs_harness(dir.path());

    let outcome = h.trainer.train("ventilator", &[], None).unwrap();

    assert_eq!(outcome, TrainingOutcome::no_data());
    assert!(!FsModelStore::new(dir.path()).exists("ventilator"));
}

#[test]
fn test_thin_pool_falls_back_to_baseline() {
    let dir = tempfile::tempdir().unwrap();
    let h = fs_harness(dir.path());

    let outcome = h.trainer.train("glucose_monitor", &quiet_pool("glucose_monitor", 9), None).unwrap();

    assert_eq!(outcome.status, TrainingStatus::TrainedOnDefault);
    assert!(outcome.trained);
    assert_eq!(outcome.sample_count, 3);
}

#[test]
fn test_ten_normal_samples_train_on_history() {
    let dir = tempfile::tempdir().unwrap();
    let h = fs_harness(dir.path());

    let outcome = h.trainer.train("glucose_monitor", &quiet_pool("glucose_monitor", 10), None).unwrap();

    assert_eq!(outcome.status, TrainingStatus::Trained);
    assert_eq!(outcome.sample_count, 10);
    let stored = FsModelStore::new(dir.path()).load("glucose_monitor").unwrap();
    assert_eq!(stored.source, ModelSource::History);
}

#[test]
fn test_noisy_records_do_not_count_toward_minimum() {
    let dir = tempfile::tempdir().unwrap();
    let h = fs_harness(dir.path());

    let mut pool = quiet_pool("infusion_pump", 9);
    let mut noisy = TelemetryRecord::new("x", "infusion_pump");
    noisy.pkt_sec = 80.0;
    pool.push(noisy);

    let outcome = h.trainer.train("infusion_pump", &pool, None).unwrap();
    assert_eq!(outcome.status, TrainingStatus::TrainedOnDefault);
}

#[test]
fn test_retrain_replaces_cached_model() {
    let dir = tempfile::tempdir().unwrap();
    let h = fs_harness(dir.path());

    h.predictor.predict(&normal_glucose()).unwrap();
    h.trainer.train("glucose_monitor", &quiet_pool("glucose_monitor", 20), None).unwrap();

    let model = h.predictor.resolve("glucose_monitor").unwrap();
    assert_eq!(model.source, ModelSource::History);
    assert_eq!(model.sample_count, 20);
}

#[test]
fn test_invalid_contamination_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let h = fs_harness(dir.path());

    for bad in [0.0, 0.51, -0.1, f64::NAN] {
        let err = h.trainer.train("glucose_monitor", &quiet_pool("glucose_monitor", 12), Some(bad));
        assert!(matches!(err, Err(RiskError::InvalidContamination(_))));
    }
}

#[test]
fn test_training_is_deterministic_across_stores() {
    let a = tempfile::tempdir().unwrap();
    let b = tempfile::tempdir().unwrap();
    let pool = quiet_pool("ventilator", 15);

    fs_harness(a.path()).trainer.train("ventilator", &pool, None).unwrap();
    fs_harness(b.path()).trainer.train("ventilator", &pool, None).unwrap();

    let model_a = FsModelStore::new(a.path()).load("ventilator").unwrap();
    let model_b = FsModelStore::new(b.path()).load("ventilator").unwrap();
    assert_eq!(model_a.checksum, model_b.checksum);

    let sample = hostile_glucose().features();
    assert_eq!(model_a.decide(&sample), model_b.decide(&sample));
}

// ============================================================================
// FAILURE HANDLING
// ============================================================================

#[test]
fn test_corrupt_artifact_is_retrained() {
    let dir = tempfile::tempdir().unwrap();
    let store = FsModelStore::new(dir.path());
    fs::write(store.path_for("glucose_monitor"), b"{ not json").unwrap();

    let h = fs_harness(dir.path());
    h.predictor.predict(&normal_glucose()).unwrap();

    assert!(store.load("glucose_monitor").is_ok());
    assert_eq!(h.counters.snapshot().cold_starts, 1);
}

#[test]
fn test_tampered_forest_fails_checksum() {
    let dir = tempfile::tempdir().unwrap();
    fs_harness(dir.path()).predictor.predict(&normal_glucose()).unwrap();

    let store = FsModelStore::new(dir.path());
    let path = store.path_for("glucose_monitor");
    let mut json: serde_json::Value = serde_json::from_slice(&fs::read(&path).unwrap()).unwrap();
    json["forest"]["offset"] = serde_json::json!(0.123);
    fs::write(&path, serde_json::to_vec(&json).unwrap()).unwrap();

    assert!(matches!(store.load("glucose_monitor"), Err(RiskError::Corrupt(_))));
}

#[test]
fn test_artifact_under_wrong_key_is_retrained() {
    let dir = tempfile::tempdir().unwrap();
    let h = fs_harness(dir.path());
    h.predictor.predict(&normal_glucose()).unwrap();

    let store = FsModelStore::new(dir.path());
    fs::copy(store.path_for("glucose_monitor"), store.path_for("infusion_pump")).unwrap();
    assert!(matches!(store.load("infusion_pump"), Err(RiskError::Corrupt(k)) if k == "infusion_pump"));

    let mut pump = normal_glucose();
    pump.device_type = "infusion_pump".to_string();
    h.predictor.predict(&pump).unwrap();

    assert_eq!(store.load("infusion_pump").unwrap().device_type, "infusion_pump");
    assert_eq!(h.counters.snapshot().cold_starts, 2);
}

#[cfg(unix)]
#[test]
fn test_resave_changes_stamp_within_one_tick() {
    let dir = tempfile::tempdir().unwrap();
    fs_harness(dir.path()).predictor.predict(&normal_glucose()).unwrap();

    let store = FsModelStore::new(dir.path());
    let model = store.load("glucose_monitor").unwrap();
    let before = store.stamp("glucose_monitor").unwrap().unwrap();

    // Same bytes, so only the file identity can tell the versions apart
    store.save("glucose_monitor", &model).unwrap();
    let after = store.stamp("glucose_monitor").unwrap().unwrap();

    assert_eq!(before.len, after.len);
    assert_ne!(before, after);
}

#[test]
fn test_layout_mismatch_is_retrained() {
    let dir = tempfile::tempdir().unwrap();
    fs_harness(dir.path()).predictor.predict(&normal_glucose()).unwrap();

    let store = FsModelStore::new(dir.path());
    let path = store.path_for("glucose_monitor");
    let mut json: serde_json::Value = serde_json::from_slice(&fs::read(&path).unwrap()).unwrap();
    json["layout_hash"] = serde_json::json!(0);
    fs::write(&path, serde_json::to_vec(&json).unwrap()).unwrap();
    assert!(matches!(store.load("glucose_monitor"), Err(RiskError::LayoutMismatch { .. })));

    let h = fs_harness(dir.path());
    h.predictor.predict(&normal_glucose()).unwrap();
    assert!(store.load("glucose_monitor").is_ok());
}

#[test]
fn test_write_failure_propagates() {
    let dir = tempfile::tempdir().unwrap();
    let blocker = dir.path().join("models");
    fs::write(&blocker, b"not a directory").unwrap();

    let h = fs_harness(&blocker);
    let err = h.predictor.predict(&normal_glucose()).unwrap_err();
    assert!(matches!(err, RiskError::Io(_)));
}

// ============================================================================
// CONCURRENCY
// ============================================================================

#[test]
fn test_concurrent_cold_start_trains_once() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(CountingStore {
        inner: FsModelStore::new(dir.path()),
        saves: AtomicUsize::new(0),
    });
    let h = harness(store.clone());

    let results: Vec<ScoreResult> = std::thread::scope(|s| {
        let handles: Vec<_> = (0..8)
            .map(|_| s.spawn(|| h.predictor.predict(&normal_glucose()).unwrap()))
            .collect();
        handles.into_iter().map(|t| t.join().unwrap()).collect()
    });

    assert_eq!(store.saves.load(Ordering::SeqCst), 1);
    assert!(results.windows(2).all(|w| w[0] == w[1]));
    assert_eq!(h.counters.snapshot().predictions, 8);
}

#[test]
fn test_concurrent_types_do_not_block_each_other() {
    let dir = tempfile::tempdir().unwrap();
    let h = fs_harness(dir.path());
    let types = ["glucose_monitor", "infusion_pump", "ventilator", "patient_monitor"];

    std::thread::scope(|s| {
        for device_type in types {
            let predictor = &h.predictor;
            s.spawn(move || {
                let mut r = normal_glucose();
                r.device_type = device_type.to_string();
                predictor.predict(&r).unwrap();
            });
        }
    });

    let stored = FsModelStore::new(dir.path()).list_device_types().unwrap();
    assert_eq!(stored.len(), types.len());
}
