//! Baseline Catalog - seed "normal" datasets per device type
//!
//! Used only when no adequate historical pool exists. The catalog is built
//! once at startup (built-in or from a JSON file) and injected into the
//! trainer; it is never mutated afterwards.
//!
//! `patient_monitor` doubles as the fallback for unrecognized device types.

#[cfg(test)]
mod tests;

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use crate::error::{RiskError, RiskResult};
use crate::features::{FeatureVector, FEATURE_COUNT};
use crate::model::store::normalize_key;

/// Device type whose baseline serves unknown types
pub const FALLBACK_DEVICE_TYPE: &str = "patient_monitor";

/// Immutable map of device type key → seed feature vectors
#[derive(Debug, Clone)]
pub struct BaselineCatalog {
    entries: BTreeMap<String, Vec<FeatureVector>>,
    fallback: Vec<FeatureVector>,
}

/// Which catalog entry served a lookup
#[derive(Debug, Clone, Copy)]
pub struct BaselineMatch<'a> {
    pub key: &'a str,
    pub rows: &'a [FeatureVector],
    pub is_fallback: bool,
}

impl BaselineCatalog {
    /// Built-in catalog shipped with the engine
    pub fn builtin() -> Self {
        let mut entries = BTreeMap::new();
        entries.insert(
            "glucose_monitor".to_string(),
            rows(&[
                [1.0, 500.0, 1.0, 200.0],
                [1.2, 520.0, 1.0, 210.0],
                [0.9, 480.0, 1.0, 190.0],
            ]),
        );
        entries.insert(
            "infusion_pump".to_string(),
            rows(&[
                [0.2, 120.0, 1.0, 80.0],
                [0.3, 150.0, 1.0, 90.0],
                [0.25, 130.0, 1.0, 85.0],
            ]),
        );
        entries.insert(
            "ventilator".to_string(),
            rows(&[
                [5.0, 2000.0, 1.0, 500.0],
                [4.8, 1900.0, 1.0, 480.0],
                [5.2, 2100.0, 1.0, 510.0],
            ]),
        );
        let fallback = rows(&[
            [2.0, 800.0, 1.0, 300.0],
            [2.2, 820.0, 1.0, 310.0],
        ]);
        entries.insert(FALLBACK_DEVICE_TYPE.to_string(), fallback.clone());
        Self { entries, fallback }
    }

    /// Build a catalog from raw rows; keys are normalized
    pub fn from_rows(raw: BTreeMap<String, Vec<[f64; FEATURE_COUNT]>>) -> RiskResult<Self> {
        let mut entries = BTreeMap::new();
        for (device_type, matrix) in raw {
            if matrix.is_empty() {
                return Err(RiskError::Catalog(format!(
                    "baseline for '{}' has no rows",
                    device_type
                )));
            }
            entries.insert(normalize_key(&device_type), rows(&matrix));
        }

        let fallback = entries.get(FALLBACK_DEVICE_TYPE).cloned().ok_or_else(|| {
            RiskError::Catalog(format!(
                "catalog must define the '{}' fallback",
                FALLBACK_DEVICE_TYPE
            ))
        })?;

        Ok(Self { entries, fallback })
    }

    /// Load a catalog from a JSON file of `{"type": [[pps, bps, dest, payload], ...]}`
    pub fn load(path: &Path) -> RiskResult<Self> {
        let data = fs::read(path)?;
        let raw: BTreeMap<String, Vec<[f64; FEATURE_COUNT]>> = serde_json::from_slice(&data)?;
        let catalog = Self::from_rows(raw)?;
        log::info!(
            "Loaded baseline catalog from {} ({} device types)",
            path.display(),
            catalog.entries.len()
        );
        Ok(catalog)
    }

    /// Baseline for a device type, or the fallback if the type is unknown
    pub fn resolve(&self, device_type: &str) -> BaselineMatch<'_> {
        let key = normalize_key(device_type);
        if let Some((key, rows)) = self.entries.get_key_value(&key) {
            return BaselineMatch { key, rows, is_fallback: false };
        }

        BaselineMatch {
            key: FALLBACK_DEVICE_TYPE,
            rows: &self.fallback,
            is_fallback: true,
        }
    }

    pub fn contains(&self, device_type: &str) -> bool {
        self.entries.contains_key(&normalize_key(device_type))
    }

    pub fn device_types(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }
}

impl Default for BaselineCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

fn rows(matrix: &[[f64; FEATURE_COUNT]]) -> Vec<FeatureVector> {
    matrix.iter().copied().map(FeatureVector::from_row).collect()
}
