//! Trainer - fits and commits per-device-type models
//!
//! Training selects a proxy-normal subset of the historical pool (records
//! below the packet-rate limit). Labels are ignored. When the subset is too
//! small, the device type's baseline is used instead.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::artifact::{DeviceTypeModel, ModelSource};
use super::forest::{validate_contamination, ForestParams};
use super::registry::{KeyedLocks, ModelCache};
use super::stats::ScoringCounters;
use super::store::{normalize_key, ModelStore};
use crate::baseline::BaselineCatalog;
use crate::config::EngineConfig;
use crate::constants::{MIN_NORMAL_SAMPLES, NORMAL_PKT_RATE_LIMIT};
use crate::error::RiskResult;
use crate::features::{FeatureVector, TelemetryRecord};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrainingStatus {
    NoData,
    Trained,
    TrainedOnDefault,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrainingOutcome {
    pub status: TrainingStatus,
    pub trained: bool,
    pub sample_count: usize,
}

impl TrainingOutcome {
    pub fn no_data() -> Self {
        Self { status: TrainingStatus::NoData, trained: false, sample_count: 0 }
    }

    fn fitted(status: TrainingStatus, sample_count: usize) -> Self {
        Self { status, trained: true, sample_count }
    }
}

/// Fit parameters shared by every training path
#[derive(Debug, Clone, Copy)]
pub struct TrainingParams {
    pub contamination: f64,
    pub seed: u64,
    pub n_estimators: usize,
    pub max_samples: usize,
}

impl TrainingParams {
    pub fn from_config(config: &EngineConfig) -> Self {
        Self {
            contamination: config.contamination,
            seed: config.seed,
            n_estimators: config.n_estimators,
            max_samples: config.max_samples,
        }
    }

    fn forest(&self, contamination: f64) -> ForestParams {
        ForestParams {
            n_estimators: self.n_estimators,
            max_samples: self.max_samples,
            contamination,
            seed: self.seed,
        }
    }
}

pub struct Trainer {
    store: Arc<dyn ModelStore>,
    catalog: Arc<BaselineCatalog>,
    locks: Arc<KeyedLocks>,
    cache: Arc<ModelCache>,
    counters: Arc<ScoringCounters>,
    params: TrainingParams,
}

impl Trainer {
    pub fn new(
        store: Arc<dyn ModelStore>,
        catalog: Arc<BaselineCatalog>,
        locks: Arc<KeyedLocks>,
        cache: Arc<ModelCache>,
        counters: Arc<ScoringCounters>,
        params: TrainingParams,
    ) -> Self {
        Self { store, catalog, locks, cache, counters, params }
    }

    pub fn params(&self) -> &TrainingParams {
        &self.params
    }

    /// Retrain `device_type` from a historical pool.
    ///
    /// An empty pool means no history at all: nothing is fitted or saved.
    pub fn train(
        &self,
        device_type: &str,
        pool: &[TelemetryRecord],
        contamination: Option<f64>,
    ) -> RiskResult<TrainingOutcome> {
        let contamination = contamination.unwrap_or(self.params.contamination);
        validate_contamination(contamination)?;

        let key = normalize_key(device_type);
        if pool.is_empty() {
            log::info!("Retrain '{}': no historical data", key);
            return Ok(TrainingOutcome::no_data());
        }

        let normal = proxy_normal_subset(&key, pool);

        let lock = self.locks.for_key(&key);
        let _guard = lock.lock();

        let outcome = if normal.len() < MIN_NORMAL_SAMPLES {
            log::info!(
                "Retrain '{}': {} proxy-normal samples (< {}), using baseline",
                key,
                normal.len(),
                MIN_NORMAL_SAMPLES
            );
            self.fit_baseline_locked(&key, contamination)?.1
        } else {
            self.fit_and_commit(&key, &normal, contamination, ModelSource::History)?;
            TrainingOutcome::fitted(TrainingStatus::Trained, normal.len())
        };

        self.counters.record_retrain();
        log::info!("Retrain '{}': {:?} ({} samples)", key, outcome.status, outcome.sample_count);
        Ok(outcome)
    }

    /// Fit `key` on its baseline (or the fallback) and commit it.
    ///
    /// Caller must hold the key's lock.
    pub(crate) fn fit_baseline_locked(
        &self,
        key: &str,
        contamination: f64,
    ) -> RiskResult<(Arc<DeviceTypeModel>, TrainingOutcome)> {
        let baseline = self.catalog.resolve(key);
        if baseline.is_fallback {
            log::info!("No baseline for '{}', using '{}'", key, baseline.key);
        }

        let model = self.fit_and_commit(key, baseline.rows, contamination, ModelSource::Baseline)?;
        let outcome = TrainingOutcome::fitted(TrainingStatus::TrainedOnDefault, baseline.rows.len());
        Ok((model, outcome))
    }

    fn fit_and_commit(
        &self,
        key: &str,
        rows: &[FeatureVector],
        contamination: f64,
        source: ModelSource,
    ) -> RiskResult<Arc<DeviceTypeModel>> {
        let model = DeviceTypeModel::fit(key, rows, &self.params.forest(contamination), source)?;
        self.store.save(key, &model)?;

        let model = Arc::new(model);
        let stamp = self.store.stamp(key)?;
        self.cache.insert(key, stamp, model.clone());
        Ok(model)
    }
}

/// Feature vectors of `key` records whose packet rate is below the limit
fn proxy_normal_subset(key: &str, pool: &[TelemetryRecord]) -> Vec<FeatureVector> {
    pool.iter()
        .filter(|r| normalize_key(r.device_type()) == key)
        .map(TelemetryRecord::features)
        .filter(|f| f.packets_per_sec() < NORMAL_PKT_RATE_LIMIT)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(device_type: &str, pkt: f64) -> TelemetryRecord {
        let mut r = TelemetryRecord::new("d", device_type);
        r.pkt_sec = pkt;
        r
    }

    #[test]
    fn test_proxy_subset_filters_type_and_rate() {
        let pool = vec![
            record("glucose_monitor", 1.0),
            record("Glucose Monitor", 9.99),
            record("glucose_monitor", 10.0),
            record("ventilator", 1.0),
        ];
        let subset = proxy_normal_subset("glucose_monitor", &pool);
        assert_eq!(subset.len(), 2);
    }

    #[test]
    fn test_proxy_subset_ignores_labels() {
        let mut labelled = record("infusion_pump", 0.3);
        labelled.is_anomaly = Some(true);
        let subset = proxy_normal_subset("infusion_pump", &[labelled]);
        assert_eq!(subset.len(), 1);
    }

    #[test]
    fn test_outcome_serialization() {
        let outcome = TrainingOutcome::fitted(TrainingStatus::TrainedOnDefault, 3);
        let json = serde_json::to_value(outcome).unwrap();
        assert_eq!(json["status"], "trained_on_default");
        assert_eq!(json["trained"], true);
        assert_eq!(json["sample_count"], 3);

        let none = serde_json::to_value(TrainingOutcome::no_data()).unwrap();
        assert_eq!(none["status"], "no_data");
        assert_eq!(none["trained"], false);
    }
}
