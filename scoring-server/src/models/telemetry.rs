//! Telemetry request model

use risk_core::features::record::lenient_string;
use risk_core::TelemetryRecord;
use serde::{Deserialize, Deserializer};
use validator::Validate;

/// Body of `POST /ml/score`.
///
/// Numeric fields are coerced the same way as logged telemetry; only
/// `device_id` is mandatory.
#[derive(Debug, Deserialize, Validate)]
pub struct ScoreRequest {
    #[serde(default, deserialize_with = "trimmed")]
    #[validate(length(min = 1, message = "device_id is required"))]
    pub device_id: String,

    #[serde(flatten)]
    pub telemetry: TelemetryRecord,
}

impl ScoreRequest {
    pub fn into_record(self) -> TelemetryRecord {
        TelemetryRecord {
            device_id: self.device_id,
            ..self.telemetry
        }
    }
}

fn trimmed<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(lenient_string(deserializer)?.trim().to_string())
}
