//! Model management request/response models

use std::collections::BTreeMap;

use risk_core::dataset::TelemetryLogStats;
use risk_core::TrainingOutcome;
use serde::{Deserialize, Serialize};

#[derive(Debug, Default, Deserialize)]
pub struct RetrainQuery {
    pub device_type: Option<String>,
    pub contamination: Option<f64>,
}

impl RetrainQuery {
    /// Requested device type; a blank value means "all"
    pub fn device_type(&self) -> Option<&str> {
        self.device_type.as_deref().map(str::trim).filter(|t| !t.is_empty())
    }
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum RetrainResponse {
    Single {
        status: &'static str,
        result: TrainingOutcome,
    },
    All {
        status: &'static str,
        results: BTreeMap<String, TrainingOutcome>,
    },
    NoData {
        status: &'static str,
    },
}

impl RetrainResponse {
    pub fn single(result: TrainingOutcome) -> Self {
        Self::Single { status: "ok", result }
    }

    pub fn all(results: BTreeMap<String, TrainingOutcome>) -> Self {
        if results.is_empty() {
            Self::NoData { status: "no_data" }
        } else {
            Self::All { status: "ok", results }
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ModelsResponse {
    pub models: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub predictions: u64,
    pub outliers: u64,
    pub cold_starts: u64,
    pub retrains: u64,
    pub known_models: usize,
    pub telemetry: TelemetryLogStats,
}
