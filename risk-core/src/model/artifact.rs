//! Device Type Model - persisted anomaly detector for one device type
//!
//! The artifact is self-describing: it records the feature layout it was
//! fitted with and a checksum of the forest, so stale or damaged files are
//! detected on load instead of silently scoring garbage.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::forest::{Decision, ForestParams, IsolationForest};
use crate::error::{RiskError, RiskResult};
use crate::features::{layout_hash, FeatureVector, FEATURE_VERSION};

/// Where the training rows came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelSource {
    History,
    Baseline,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceTypeModel {
    pub device_type: String,
    pub feature_version: u8,
    pub layout_hash: u32,
    pub contamination: f64,
    pub seed: u64,
    pub sample_count: usize,
    pub source: ModelSource,
    pub trained_at: DateTime<Utc>,
    pub checksum: String,
    forest: IsolationForest,
}

impl DeviceTypeModel {
    /// Fit a new model for `key` on `rows`
    pub fn fit(
        key: &str,
        rows: &[FeatureVector],
        params: &ForestParams,
        source: ModelSource,
    ) -> RiskResult<Self> {
        let forest = IsolationForest::fit(rows, params)?;
        let checksum = forest_checksum(&forest)?;

        Ok(Self {
            device_type: key.to_string(),
            feature_version: FEATURE_VERSION,
            layout_hash: layout_hash(),
            contamination: params.contamination,
            seed: params.seed,
            sample_count: rows.len(),
            source,
            trained_at: Utc::now(),
            checksum,
            forest,
        })
    }

    /// Evaluate one vector. The model is immutable; safe to share across threads.
    pub fn decide(&self, x: &FeatureVector) -> Decision {
        self.forest.decide(x)
    }

    /// Check layout compatibility and forest integrity
    pub fn verify(&self) -> RiskResult<()> {
        let current_hash = layout_hash();
        if self.feature_version != FEATURE_VERSION || self.layout_hash != current_hash {
            return Err(RiskError::LayoutMismatch {
                key: self.device_type.clone(),
                expected_version: FEATURE_VERSION,
                expected_hash: current_hash,
                actual_version: self.feature_version,
                actual_hash: self.layout_hash,
            });
        }

        if forest_checksum(&self.forest)? != self.checksum {
            return Err(RiskError::Corrupt(self.device_type.clone()));
        }

        Ok(())
    }
}

fn forest_checksum(forest: &IsolationForest) -> RiskResult<String> {
    let bytes = serde_json::to_vec(forest)?;
    Ok(hex::encode(Sha256::digest(&bytes)))
}
