//! Feature Layout - Centralized Feature Definition
//!
//! **This file controls the feature schema shared by training and scoring.**
//!
//! ## Rules (NEVER break these):
//! 1. Add feature → increment FEATURE_VERSION
//! 2. Change order → increment FEATURE_VERSION
//! 3. Remove feature → increment FEATURE_VERSION
//!
//! Every persisted model carries the version and layout hash it was fitted
//! with; a mismatch on load means the model is stale.

use crc32fast::Hasher;
use serde::{Deserialize, Serialize};

/// Current feature layout version
pub const FEATURE_VERSION: u8 = 1;

/// Feature names in exact order they appear in the vector
pub const FEATURE_LAYOUT: &[&str] = &[
    "packets_per_sec",            // 0: Packets per second
    "bytes_per_sec",              // 1: Bytes per second
    "distinct_destination_count", // 2: Distinct destinations contacted
    "avg_payload_size",           // 3: Mean payload size in bytes
];

/// Total number of features
/// IMPORTANT: Must match FEATURE_LAYOUT.len()!
pub const FEATURE_COUNT: usize = 4;

pub const IDX_PACKETS_PER_SEC: usize = 0;
pub const IDX_BYTES_PER_SEC: usize = 1;
pub const IDX_DESTINATIONS: usize = 2;
pub const IDX_AVG_PAYLOAD: usize = 3;

// ============================================================================
// LAYOUT HASH
// ============================================================================

/// Compute CRC32 hash of the feature layout
pub fn layout_hash() -> u32 {
    let mut hasher = Hasher::new();
    hasher.update(&[FEATURE_VERSION]);

    for name in FEATURE_LAYOUT {
        hasher.update(name.as_bytes());
        hasher.update(&[0]);
    }

    hasher.finalize()
}

/// Layout information for status endpoints and logs
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutInfo {
    pub version: u8,
    pub hash: u32,
    pub feature_names: Vec<String>,
}

impl LayoutInfo {
    pub fn current() -> Self {
        Self {
            version: FEATURE_VERSION,
            hash: layout_hash(),
            feature_names: FEATURE_LAYOUT.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// Check if layout is compatible (same version, same hash)
pub fn is_layout_compatible(version: u8, hash: u32) -> bool {
    version == FEATURE_VERSION && hash == layout_hash()
}

/// Get feature name by index
pub fn feature_name(index: usize) -> Option<&'static str> {
    FEATURE_LAYOUT.get(index).copied()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feature_count() {
        assert_eq!(FEATURE_LAYOUT.len(), FEATURE_COUNT);
    }

    #[test]
    fn test_layout_hash_stable_and_non_zero() {
        assert_eq!(layout_hash(), layout_hash());
        assert_ne!(layout_hash(), 0);
    }

    #[test]
    fn test_layout_compatibility() {
        assert!(is_layout_compatible(FEATURE_VERSION, layout_hash()));
        assert!(!is_layout_compatible(FEATURE_VERSION + 1, layout_hash()));
        assert!(!is_layout_compatible(FEATURE_VERSION, layout_hash() ^ 1));
    }

    #[test]
    fn test_index_constants_match_names() {
        assert_eq!(feature_name(IDX_PACKETS_PER_SEC), Some("packets_per_sec"));
        assert_eq!(feature_name(IDX_DESTINATIONS), Some("distinct_destination_count"));
        assert_eq!(feature_name(IDX_AVG_PAYLOAD), Some("avg_payload_size"));
        assert_eq!(feature_name(FEATURE_COUNT), None);
    }
}
