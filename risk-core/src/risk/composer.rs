//! Risk Composer - fuses model signal with patch and maintenance posture
//!
//! `risk = anomaly*70 + (1 - patched)*20 + min(1, days/365)*10`, clamped to
//! 0..=100 and rounded half-to-even.

use serde::{Deserialize, Serialize};

use super::reasons::ReasonCode;
use crate::constants::{
    ANOMALY_WEIGHT, HIGH_PKT_RATE, MAINTENANCE_SATURATION_DAYS, MAINTENANCE_WEIGHT,
    MANY_DESTINATIONS, PATCH_WEIGHT,
};
use crate::features::{FeatureVector, PatchStatus, UNKNOWN_PROTOCOL};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskAssessment {
    pub risk_score: u8,
    pub reasons: Vec<ReasonCode>,
}

pub fn compose(
    anomaly_score: f64,
    outlier: bool,
    features: &FeatureVector,
    protocol: &str,
    patch_status: PatchStatus,
    maintenance_days: u32,
) -> RiskAssessment {
    RiskAssessment {
        risk_score: risk_score(anomaly_score, patch_status, maintenance_days),
        reasons: reasons(outlier, features, protocol, patch_status),
    }
}

/// Reason codes in fixed order; each check fires at most once
pub fn reasons(
    outlier: bool,
    features: &FeatureVector,
    protocol: &str,
    patch_status: PatchStatus,
) -> Vec<ReasonCode> {
    let checks = [
        (ReasonCode::ModelOutlier, outlier),
        (ReasonCode::HighPktRate, features.packets_per_sec() > HIGH_PKT_RATE),
        (ReasonCode::ManyDestinations, features.distinct_destinations() > MANY_DESTINATIONS),
        (ReasonCode::UnknownProtocol, protocol == UNKNOWN_PROTOCOL),
        (ReasonCode::UnpatchedFirmware, !patch_status.is_patched()),
    ];

    checks
        .into_iter()
        .filter_map(|(reason, fired)| fired.then_some(reason))
        .collect()
}

pub fn risk_score(anomaly_score: f64, patch_status: PatchStatus, maintenance_days: u32) -> u8 {
    let patch_factor = if patch_status.is_patched() { 1.0 } else { 0.0 };
    let maintenance_factor = (f64::from(maintenance_days) / MAINTENANCE_SATURATION_DAYS).min(1.0);
    let anomaly = if anomaly_score.is_finite() { anomaly_score } else { 1.0 };

    let risk = anomaly * ANOMALY_WEIGHT
        + (1.0 - patch_factor) * PATCH_WEIGHT
        + maintenance_factor * MAINTENANCE_WEIGHT;

    risk.clamp(0.0, 100.0).round_ties_even() as u8
}
