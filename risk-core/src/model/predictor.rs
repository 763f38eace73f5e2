//! Predictor - resolves a model and scores one telemetry record
//!
//! A device type's first prediction trains and persists a model from its
//! baseline (cold start). Resolution and cold-start training hold the key's
//! lock; scoring against a cached model does not.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::artifact::DeviceTypeModel;
use super::forest::Decision;
use super::registry::{KeyedLocks, ModelCache};
use super::stats::ScoringCounters;
use super::store::{normalize_key, ModelStore};
use super::trainer::Trainer;
use crate::constants::ANOMALY_SCORE_DIGITS;
use crate::error::RiskResult;
use crate::features::{extract_features, FeatureVector, TelemetryMeta, TelemetryRecord};
use crate::risk::{self, ReasonCode, RiskAssessment};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreResult {
    pub device_id: String,
    pub device_type: String,
    /// Logistic squash of the model margin. Not a calibrated probability.
    pub anomaly_score: f64,
    pub risk_score: u8,
    pub reasons: Vec<ReasonCode>,
    /// Raw model polarity, kept for audit
    pub outlier: bool,
}

pub struct Predictor {
    store: Arc<dyn ModelStore>,
    trainer: Arc<Trainer>,
    locks: Arc<KeyedLocks>,
    cache: Arc<ModelCache>,
    counters: Arc<ScoringCounters>,
}

impl Predictor {
    pub fn new(
        store: Arc<dyn ModelStore>,
        trainer: Arc<Trainer>,
        locks: Arc<KeyedLocks>,
        cache: Arc<ModelCache>,
        counters: Arc<ScoringCounters>,
    ) -> Self {
        Self { store, trainer, locks, cache, counters }
    }

    pub fn predict(&self, record: &TelemetryRecord) -> RiskResult<ScoreResult> {
        let device_type = record.device_type();
        let (features, meta) = extract_features(record);

        let model = self.resolve(device_type)?;
        let decision = model.decide(&features);
        let (anomaly_score, assessment) = assess(decision, &features, &meta);

        self.counters.record_prediction(decision.outlier);
        log::debug!(
            "Scored {} ({}): anomaly={} risk={} reasons={:?}",
            record.device_id,
            device_type,
            anomaly_score,
            assessment.risk_score,
            assessment.reasons
        );

        Ok(ScoreResult {
            device_id: record.device_id.clone(),
            device_type: device_type.to_string(),
            anomaly_score,
            risk_score: assessment.risk_score,
            reasons: assessment.reasons,
            outlier: decision.outlier,
        })
    }

    /// Model for `device_type`: cached, loaded, or trained from its baseline
    pub fn resolve(&self, device_type: &str) -> RiskResult<Arc<DeviceTypeModel>> {
        let key = normalize_key(device_type);

        if let Some(stamp) = self.store.stamp(&key)? {
            if let Some(model) = self.cache.get(&key, stamp) {
                return Ok(model);
            }
        }

        let lock = self.locks.for_key(&key);
        let _guard = lock.lock();

        // Another request may have resolved it while we waited
        if let Some(stamp) = self.store.stamp(&key)? {
            if let Some(model) = self.cache.get(&key, stamp) {
                return Ok(model);
            }

            match self.store.load(&key) {
                Ok(model) => {
                    log::info!(
                        "Loaded model '{}' ({:?}, {} samples, trained {})",
                        key,
                        model.source,
                        model.sample_count,
                        model.trained_at
                    );
                    let model = Arc::new(model);
                    self.cache.insert(&key, Some(stamp), model.clone());
                    return Ok(model);
                }
                Err(e) if e.is_recoverable_artifact() => {
                    log::warn!("Stored model for '{}' unusable: {}. Retraining from baseline.", key, e);
                }
                Err(e) => return Err(e),
            }
        }

        let contamination = self.trainer.params().contamination;
        let (model, outcome) = self.trainer.fit_baseline_locked(&key, contamination)?;
        self.counters.record_cold_start();
        log::info!(
            "Cold start for '{}': {:?} ({} samples)",
            key,
            outcome.status,
            outcome.sample_count
        );
        Ok(model)
    }
}

/// Risk is composed from the unrounded probability; only the published
/// score is rounded.
fn assess(decision: Decision, features: &FeatureVector, meta: &TelemetryMeta) -> (f64, RiskAssessment) {
    let p = anomaly_probability(decision.raw);
    let assessment = risk::compose(
        p,
        decision.outlier,
        features,
        &meta.protocol,
        meta.patch_status,
        meta.maintenance_days,
    );
    (publish_score(p), assessment)
}

/// `1 / (1 + e^raw)`, unrounded
pub fn anomaly_probability(raw: f64) -> f64 {
    if raw.is_nan() {
        return 0.5;
    }
    1.0 / (1.0 + raw.exp())
}

/// Published form of a probability: rounded and kept strictly inside (0, 1)
pub fn publish_score(p: f64) -> f64 {
    let scale = 10f64.powi(ANOMALY_SCORE_DIGITS);
    let floor = 1.0 / scale;

    let rounded = (p * scale).round_ties_even() / scale;
    if rounded.is_nan() {
        return 0.5;
    }
    rounded.clamp(floor, 1.0 - floor)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_anomaly_probability_midpoint() {
        assert_eq!(anomaly_probability(0.0), 0.5);
    }

    #[test]
    fn test_anomaly_probability_monotonic_decreasing() {
        let mut last = 1.0;
        for raw in [-0.9, -0.5, -0.1, 0.0, 0.1, 0.5, 0.9] {
            let p = anomaly_probability(raw);
            assert!(p < last);
            last = p;
        }
    }

    #[test]
    fn test_published_score_strictly_inside_unit_interval() {
        for raw in [-1e6, -50.0, 50.0, 1e6, f64::INFINITY, f64::NEG_INFINITY, f64::NAN] {
            let p = publish_score(anomaly_probability(raw));
            assert!(p > 0.0 && p < 1.0, "raw={} gave {}", raw, p);
        }
    }

    #[test]
    fn test_published_score_four_digits() {
        let p = anomaly_probability(-0.123_456);
        assert!(p > 0.5308 && p < 0.5309);
        assert_eq!(publish_score(p), 0.5308);
    }

    #[test]
    fn test_risk_uses_unrounded_probability() {
        // p = 0.35002857 publishes as 0.35 but 70 * p rounds to 25, not 24
        let raw = (1.0 / 0.350_028_57 - 1.0_f64).ln();
        let features = FeatureVector::new(1.0, 500.0, 1, 200.0);
        let meta = TelemetryMeta {
            protocol: "HTTPS".to_string(),
            patch_status: crate::features::PatchStatus::Patched,
            maintenance_days: 0,
        };

        let (anomaly_score, assessment) = assess(Decision { outlier: false, raw }, &features, &meta);

        assert_eq!(anomaly_score, 0.35);
        assert_eq!(assessment.risk_score, 25);
        assert!(assessment.reasons.is_empty());
    }
}
