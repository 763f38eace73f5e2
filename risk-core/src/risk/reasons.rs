//! Reason codes - discrete explanations attached to a score

use serde::{Deserialize, Serialize};

/// Why a score was elevated. Declaration order is evaluation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReasonCode {
    ModelOutlier,
    HighPktRate,
    ManyDestinations,
    UnknownProtocol,
    UnpatchedFirmware,
}

impl ReasonCode {
    pub const ALL: [ReasonCode; 5] = [
        ReasonCode::ModelOutlier,
        ReasonCode::HighPktRate,
        ReasonCode::ManyDestinations,
        ReasonCode::UnknownProtocol,
        ReasonCode::UnpatchedFirmware,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ReasonCode::ModelOutlier => "model_outlier",
            ReasonCode::HighPktRate => "high_pkt_rate",
            ReasonCode::ManyDestinations => "many_destinations",
            ReasonCode::UnknownProtocol => "unknown_protocol",
            ReasonCode::UnpatchedFirmware => "unpatched_firmware",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            ReasonCode::ModelOutlier => "Traffic outside the learned profile for this device type",
            ReasonCode::HighPktRate => "Packet rate above 50 packets/s",
            ReasonCode::ManyDestinations => "More than 3 distinct destinations",
            ReasonCode::UnknownProtocol => "Protocol could not be identified",
            ReasonCode::UnpatchedFirmware => "Firmware not confirmed patched",
        }
    }
}

impl std::fmt::Display for ReasonCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
