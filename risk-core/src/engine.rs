//! Scoring Engine - one handle over store, trainer, predictor and telemetry log
//!
//! Built once at startup and shared (`Arc<ScoringEngine>`) by the HTTP
//! service and the CLI. All methods are blocking; async callers should run
//! them on a blocking thread.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use crate::baseline::BaselineCatalog;
use crate::config::EngineConfig;
use crate::dataset::{distinct_device_types, TelemetryLog};
use crate::error::RiskResult;
use crate::features::TelemetryRecord;
use crate::model::forest::validate_contamination;
use crate::model::{
    normalize_key, FsModelStore, KeyedLocks, ModelCache, ModelStore, Predictor, ScoreResult, ScoringCounters,
    ScoringStats, Trainer, TrainingOutcome, TrainingParams,
};

pub struct ScoringEngine {
    config: EngineConfig,
    store: Arc<dyn ModelStore>,
    trainer: Arc<Trainer>,
    predictor: Predictor,
    counters: Arc<ScoringCounters>,
    telemetry: TelemetryLog,
}

impl ScoringEngine {
    /// Engine over the filesystem store in `config.model_dir`.
    ///
    /// Uses the baseline file at `config.baselines_path` if set, else the
    /// built-in catalog.
    pub fn new(config: EngineConfig) -> RiskResult<Self> {
        let catalog = match &config.baselines_path {
            Some(path) => BaselineCatalog::load(path)?,
            None => BaselineCatalog::builtin(),
        };
        Self::with_catalog(config, catalog)
    }

    pub fn with_catalog(config: EngineConfig, catalog: BaselineCatalog) -> RiskResult<Self> {
        let store: Arc<dyn ModelStore> = Arc::new(FsModelStore::new(&config.model_dir));
        Self::with_store(config, store, catalog)
    }

    /// Fails with `InvalidContamination` when the configured default is
    /// outside (0, 0.5].
    pub fn with_store(
        config: EngineConfig,
        store: Arc<dyn ModelStore>,
        catalog: BaselineCatalog,
    ) -> RiskResult<Self> {
        validate_contamination(config.contamination)?;

        let locks = Arc::new(KeyedLocks::new());
        let cache = Arc::new(ModelCache::new());
        let counters = Arc::new(ScoringCounters::default());

        let trainer = Arc::new(Trainer::new(
            store.clone(),
            Arc::new(catalog),
            locks.clone(),
            cache.clone(),
            counters.clone(),
            TrainingParams::from_config(&config),
        ));
        let predictor = Predictor::new(store.clone(), trainer.clone(), locks, cache, counters.clone());
        let telemetry = TelemetryLog::new(config.telemetry_dir());

        log::info!(
            "Scoring engine ready: models={}, telemetry={}",
            config.model_dir.display(),
            telemetry.dir().display()
        );

        Ok(Self { config, store, trainer, predictor, counters, telemetry })
    }

    // ========================================================================
    // SCORING
    // ========================================================================

    pub fn predict(&self, record: &TelemetryRecord) -> RiskResult<ScoreResult> {
        self.predictor.predict(record)
    }

    /// Append the raw record to the telemetry log, then score it.
    ///
    /// A log failure is reported but does not block scoring.
    pub fn ingest(&self, record: &TelemetryRecord) -> RiskResult<ScoreResult> {
        if let Err(e) = self.telemetry.append(record) {
            log::error!("Failed to record telemetry for {}: {}", record.device_id, e);
        }
        self.predict(record)
    }

    // ========================================================================
    // TRAINING
    // ========================================================================

    pub fn train(
        &self,
        device_type: &str,
        pool: &[TelemetryRecord],
        contamination: Option<f64>,
    ) -> RiskResult<TrainingOutcome> {
        self.trainer.train(device_type, pool, contamination)
    }

    /// Retrain every device type present in `pool`. Empty pool → empty map.
    pub fn retrain_all(
        &self,
        pool: &[TelemetryRecord],
        contamination: Option<f64>,
    ) -> RiskResult<BTreeMap<String, TrainingOutcome>> {
        let mut results = BTreeMap::new();
        for device_type in distinct_device_types(pool) {
            let outcome = self.trainer.train(&device_type, pool, contamination)?;
            results.insert(device_type, outcome);
        }
        Ok(results)
    }

    /// Retrain from the telemetry log: one type, or every type it contains
    pub fn retrain_from_log(
        &self,
        device_type: Option<&str>,
        contamination: Option<f64>,
    ) -> RiskResult<BTreeMap<String, TrainingOutcome>> {
        let pool = self.telemetry.load_pool()?;
        match device_type {
            Some(device_type) => {
                let outcome = self.trainer.train(device_type, &pool, contamination)?;
                Ok(BTreeMap::from([(normalize_key(device_type), outcome)]))
            }
            None => self.retrain_all(&pool, contamination),
        }
    }

    // ========================================================================
    // INTROSPECTION
    // ========================================================================

    pub fn list_models(&self) -> RiskResult<BTreeSet<String>> {
        self.store.list_device_types()
    }

    pub fn stats(&self) -> ScoringStats {
        self.counters.snapshot()
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn telemetry(&self) -> &TelemetryLog {
        &self.telemetry
    }

    pub fn trainer(&self) -> &Trainer {
        &self.trainer
    }

    pub fn predictor(&self) -> &Predictor {
        &self.predictor
    }
}
