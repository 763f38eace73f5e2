//! Engine configuration
//!
//! Defaults come from `constants.rs`; every field can be overridden from the
//! environment.

use std::env;
use std::path::PathBuf;

use crate::constants::{
    APP_NAME, DEFAULT_CONTAMINATION, DEFAULT_ESTIMATORS, DEFAULT_MAX_SAMPLES, DEFAULT_SEED,
};

/// Scoring engine configuration
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Directory holding one model artifact per device type
    pub model_dir: PathBuf,

    /// Directory holding the raw telemetry log
    pub data_dir: PathBuf,

    /// Default contamination for fits that don't specify one
    pub contamination: f64,

    /// Seed for every fit
    pub seed: u64,

    /// Trees per forest
    pub n_estimators: usize,

    /// Upper bound on rows drawn per tree
    pub max_samples: usize,

    /// Optional JSON file replacing the built-in baseline catalog
    pub baselines_path: Option<PathBuf>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        let root = default_root();
        Self {
            model_dir: root.join("models"),
            data_dir: root.join("data"),
            contamination: DEFAULT_CONTAMINATION,
            seed: DEFAULT_SEED,
            n_estimators: DEFAULT_ESTIMATORS,
            max_samples: DEFAULT_MAX_SAMPLES,
            baselines_path: None,
        }
    }
}

impl EngineConfig {
    /// Config rooted at a single directory (`models/` and `data/` below it)
    pub fn in_dir(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        Self {
            model_dir: root.join("models"),
            data_dir: root.join("data"),
            ..Default::default()
        }
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            model_dir: env::var("IOMT_MODEL_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.model_dir),

            data_dir: env::var("IOMT_DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.data_dir),

            contamination: env::var("IOMT_CONTAMINATION")
                .ok()
                .and_then(|c| parse_contamination(&c))
                .unwrap_or(defaults.contamination),

            seed: env::var("IOMT_SEED")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.seed),

            n_estimators: env::var("IOMT_ESTIMATORS")
                .ok()
                .and_then(|n| n.parse().ok())
                .filter(|n: &usize| *n > 0)
                .unwrap_or(defaults.n_estimators),

            max_samples: defaults.max_samples,

            baselines_path: env::var("IOMT_BASELINES_PATH").ok().map(PathBuf::from),
        }
    }

    /// Directory of the append-only telemetry log
    pub fn telemetry_dir(&self) -> PathBuf {
        self.data_dir.join("telemetry")
    }
}

/// Contamination override; unparsable or out-of-range values are ignored
fn parse_contamination(value: &str) -> Option<f64> {
    match value.trim().parse::<f64>() {
        Ok(c) if c.is_finite() && c > 0.0 && c <= 0.5 => Some(c),
        _ => {
            log::warn!("Ignoring IOMT_CONTAMINATION={:?}: expected a number in (0, 0.5]", value);
            None
        }
    }
}

fn default_root() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_NAME)
}
