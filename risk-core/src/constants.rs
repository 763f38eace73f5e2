//! Central Policy Constants
//!
//! Fixed scoring policy. Changing any of these is a policy change, not a
//! bug fix.

// ============================================================================
// TRAINING POLICY
// ============================================================================

/// Default expected fraction of anomalous samples in a training set
pub const DEFAULT_CONTAMINATION: f64 = 0.05;

/// Default seed for reproducible fits
pub const DEFAULT_SEED: u64 = 42;

/// Trees per forest
pub const DEFAULT_ESTIMATORS: usize = 100;

/// Upper bound on rows drawn per tree
pub const DEFAULT_MAX_SAMPLES: usize = 256;

/// Records below this packet rate are treated as normal when retraining.
// TODO: get domain-expert sign-off on this proxy and on MIN_NORMAL_SAMPLES.
pub const NORMAL_PKT_RATE_LIMIT: f64 = 10.0;

/// Minimum proxy-normal samples before a pool is trusted over the baseline
pub const MIN_NORMAL_SAMPLES: usize = 10;

/// Device type assumed when a record carries none
pub const UNKNOWN_DEVICE_TYPE: &str = "unknown";

// ============================================================================
// RISK POLICY
// ============================================================================

pub const ANOMALY_WEIGHT: f64 = 70.0;
pub const PATCH_WEIGHT: f64 = 20.0;
pub const MAINTENANCE_WEIGHT: f64 = 10.0;

/// Maintenance age at which the maintenance factor saturates
pub const MAINTENANCE_SATURATION_DAYS: f64 = 365.0;

pub const HIGH_PKT_RATE: f64 = 50.0;
pub const MANY_DESTINATIONS: u32 = 3;

/// Decimal digits kept in the published anomaly score
pub const ANOMALY_SCORE_DIGITS: i32 = 4;

/// App name (used for default data directories)
pub const APP_NAME: &str = "iomt-risk";
