//! Telemetry record - one observation from a device
//!
//! Payload fields are validated once at the boundary. Missing or malformed
//! values are coerced to defaults (0.0 / 0 / "unknown") rather than rejected,
//! so a (possibly low-quality) score can always be produced.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use super::vector::FeatureVector;
use crate::constants::UNKNOWN_DEVICE_TYPE;

/// Protocol value meaning "not identified"
pub const UNKNOWN_PROTOCOL: &str = "unknown";

// ============================================================================
// PATCH STATUS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PatchStatus {
    Patched,
    Unpatched,
    #[default]
    Unknown,
}

impl PatchStatus {
    /// Exact lowercase match; anything else is `Unknown`
    pub fn parse(value: &str) -> Self {
        match value {
            "patched" => PatchStatus::Patched,
            "unpatched" => PatchStatus::Unpatched,
            _ => PatchStatus::Unknown,
        }
    }

    pub fn is_patched(&self) -> bool {
        matches!(self, PatchStatus::Patched)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PatchStatus::Patched => "patched",
            PatchStatus::Unpatched => "unpatched",
            PatchStatus::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for PatchStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for PatchStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match Lenient::deserialize(deserializer)? {
            Lenient::Text(s) => PatchStatus::parse(&s),
            _ => PatchStatus::Unknown,
        })
    }
}

// ============================================================================
// TELEMETRY RECORD
// ============================================================================

/// Raw telemetry as received from (and persisted for) a device.
///
/// Field names follow the wire format of the ingestion API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TelemetryRecord {
    #[serde(deserialize_with = "lenient_string")]
    pub device_id: String,

    #[serde(deserialize_with = "lenient_device_type")]
    pub device_type: String,

    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "lenient_timestamp")]
    pub ts: Option<DateTime<Utc>>,

    #[serde(deserialize_with = "lenient_f64")]
    pub pkt_sec: f64,

    #[serde(deserialize_with = "lenient_f64")]
    pub bytes_sec: f64,

    #[serde(deserialize_with = "lenient_u32")]
    pub dest_count: u32,

    #[serde(deserialize_with = "lenient_f64")]
    pub avg_payload: f64,

    #[serde(deserialize_with = "lenient_protocol")]
    pub protocol: String,

    pub patch_status: PatchStatus,

    #[serde(deserialize_with = "lenient_u32")]
    pub maintenance_days: u32,

    /// Ground truth for audit only. Never used to select training data.
    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "lenient_label")]
    pub is_anomaly: Option<bool>,
}

impl Default for TelemetryRecord {
    fn default() -> Self {
        Self {
            device_id: String::new(),
            device_type: UNKNOWN_DEVICE_TYPE.to_string(),
            ts: None,
            pkt_sec: 0.0,
            bytes_sec: 0.0,
            dest_count: 0,
            avg_payload: 0.0,
            protocol: UNKNOWN_PROTOCOL.to_string(),
            patch_status: PatchStatus::Unknown,
            maintenance_days: 0,
            is_anomaly: None,
        }
    }
}

impl TelemetryRecord {
    pub fn new(device_id: &str, device_type: &str) -> Self {
        Self {
            device_id: device_id.to_string(),
            device_type: device_type.to_string(),
            ..Default::default()
        }
    }

    /// Device type, or `unknown` if blank
    pub fn device_type(&self) -> &str {
        let trimmed = self.device_type.trim();
        if trimmed.is_empty() {
            UNKNOWN_DEVICE_TYPE
        } else {
            trimmed
        }
    }

    pub fn features(&self) -> FeatureVector {
        FeatureVector::new(self.pkt_sec, self.bytes_sec, self.dest_count, self.avg_payload)
    }
}

// ============================================================================
// FEATURE EXTRACTION
// ============================================================================

/// Non-feature context consumed by the risk composer
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TelemetryMeta {
    pub protocol: String,
    pub patch_status: PatchStatus,
    pub maintenance_days: u32,
}

impl TelemetryMeta {
    pub fn is_unknown_protocol(&self) -> bool {
        self.protocol == UNKNOWN_PROTOCOL
    }
}

/// Split a record into its feature vector and scoring metadata
pub fn extract_features(record: &TelemetryRecord) -> (FeatureVector, TelemetryMeta) {
    let meta = TelemetryMeta {
        protocol: record.protocol.clone(),
        patch_status: record.patch_status,
        maintenance_days: record.maintenance_days,
    };
    (record.features(), meta)
}

// ============================================================================
// LENIENT DESERIALIZERS
// ============================================================================

#[derive(Deserialize)]
#[serde(untagged)]
enum Lenient {
    Number(f64),
    Text(String),
    Flag(bool),
    Other(serde::de::IgnoredAny),
}

impl Lenient {
    fn as_number(&self) -> f64 {
        let value = match self {
            Lenient::Number(n) => *n,
            Lenient::Text(s) => s.trim().parse().unwrap_or(0.0),
            Lenient::Flag(_) | Lenient::Other(_) => 0.0,
        };
        if value.is_finite() && value > 0.0 {
            value
        } else {
            0.0
        }
    }
}

pub fn lenient_f64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    Ok(Lenient::deserialize(deserializer)?.as_number())
}

pub fn lenient_u32<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u32, D::Error> {
    let value = Lenient::deserialize(deserializer)?.as_number();
    Ok(value.trunc().min(f64::from(u32::MAX)) as u32)
}

pub fn lenient_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(match Lenient::deserialize(deserializer)? {
        Lenient::Text(s) => s,
        Lenient::Number(n) => n.to_string(),
        _ => String::new(),
    })
}

fn or_unknown(value: String, fallback: &str) -> String {
    if value.trim().is_empty() {
        fallback.to_string()
    } else {
        value
    }
}

pub fn lenient_device_type<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(or_unknown(lenient_string(deserializer)?, UNKNOWN_DEVICE_TYPE))
}

/// Strings are kept verbatim; null or non-scalar values become `unknown`
pub fn lenient_protocol<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(match Lenient::deserialize(deserializer)? {
        Lenient::Text(s) => s,
        Lenient::Number(n) => n.to_string(),
        Lenient::Flag(_) | Lenient::Other(_) => UNKNOWN_PROTOCOL.to_string(),
    })
}

fn lenient_label<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<bool>, D::Error> {
    Ok(match Lenient::deserialize(deserializer)? {
        Lenient::Flag(b) => Some(b),
        Lenient::Number(n) => Some(n != 0.0),
        Lenient::Text(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" => Some(true),
            "false" | "0" | "no" => Some(false),
            _ => None,
        },
        Lenient::Other(_) => None,
    })
}

fn lenient_timestamp<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<DateTime<Utc>>, D::Error> {
    Ok(match Lenient::deserialize(deserializer)? {
        Lenient::Text(s) => parse_timestamp(&s),
        _ => None,
    })
}

/// RFC 3339, or a naive ISO timestamp taken as UTC
fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(value) {
        return Some(ts.with_timezone(&Utc));
    }
    chrono::NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}
