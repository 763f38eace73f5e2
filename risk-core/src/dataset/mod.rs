//! Dataset Module - raw telemetry persistence and the historical pool
//!
//! Every scored record is appended to a JSONL log with automatic rotation.
//! The same log is read back as the retraining pool.

pub mod synthetic;
pub mod writer;


use std::collections::BTreeSet;

pub use writer::{TelemetryLog, TelemetryLogStats};

use crate::features::TelemetryRecord;
use crate::model::normalize_key;

/// Distinct storage keys present in a pool
pub fn distinct_device_types(pool: &[TelemetryRecord]) -> BTreeSet<String> {
    pool.iter().map(|r| normalize_key(r.device_type())).collect()
}
