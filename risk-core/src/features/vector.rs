//! Feature Vector - model input in layout order

use serde::{Deserialize, Serialize};

use super::layout::{
    FEATURE_COUNT, IDX_AVG_PAYLOAD, IDX_BYTES_PER_SEC, IDX_DESTINATIONS, IDX_PACKETS_PER_SEC,
};

/// Feature vector in the order defined by `FEATURE_LAYOUT`.
///
/// Values are always finite and non-negative; the destination count is
/// always a whole number.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; FEATURE_COUNT]", into = "[f64; FEATURE_COUNT]")]
pub struct FeatureVector {
    values: [f64; FEATURE_COUNT],
}

impl FeatureVector {
    pub fn new(
        packets_per_sec: f64,
        bytes_per_sec: f64,
        distinct_destinations: u32,
        avg_payload_size: f64,
    ) -> Self {
        let mut values = [0.0; FEATURE_COUNT];
        values[IDX_PACKETS_PER_SEC] = sanitize(packets_per_sec);
        values[IDX_BYTES_PER_SEC] = sanitize(bytes_per_sec);
        values[IDX_DESTINATIONS] = f64::from(distinct_destinations);
        values[IDX_AVG_PAYLOAD] = sanitize(avg_payload_size);
        Self { values }
    }

    /// Build from a raw row in layout order (baseline files, datasets)
    pub fn from_row(row: [f64; FEATURE_COUNT]) -> Self {
        let destinations = sanitize(row[IDX_DESTINATIONS]).trunc().min(f64::from(u32::MAX));
        Self::new(
            row[IDX_PACKETS_PER_SEC],
            row[IDX_BYTES_PER_SEC],
            destinations as u32,
            row[IDX_AVG_PAYLOAD],
        )
    }

    pub fn packets_per_sec(&self) -> f64 {
        self.values[IDX_PACKETS_PER_SEC]
    }

    pub fn bytes_per_sec(&self) -> f64 {
        self.values[IDX_BYTES_PER_SEC]
    }

    pub fn distinct_destinations(&self) -> u32 {
        self.values[IDX_DESTINATIONS] as u32
    }

    pub fn avg_payload_size(&self) -> f64 {
        self.values[IDX_AVG_PAYLOAD]
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.values
    }

    pub fn get(&self, index: usize) -> Option<f64> {
        self.values.get(index).copied()
    }
}

impl From<[f64; FEATURE_COUNT]> for FeatureVector {
    fn from(row: [f64; FEATURE_COUNT]) -> Self {
        Self::from_row(row)
    }
}

impl From<FeatureVector> for [f64; FEATURE_COUNT] {
    fn from(vector: FeatureVector) -> Self {
        vector.values
    }
}

/// Negative and non-finite readings become 0.0
fn sanitize(value: f64) -> f64 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        0.0
    }
}
