//! Error types for the scoring core

use thiserror::Error;

pub type RiskResult<T> = Result<T, RiskError>;

#[derive(Debug, Error)]
pub enum RiskError {
    #[error("IO Error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization Error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("No model stored for device type '{0}'")]
    NotFound(String),

    #[error("Model layout mismatch for '{key}': expected v{expected_version} ({expected_hash:08x}), got v{actual_version} ({actual_hash:08x})")]
    LayoutMismatch {
        key: String,
        expected_version: u8,
        expected_hash: u32,
        actual_version: u8,
        actual_hash: u32,
    },

    #[error("Model artifact for '{0}' failed checksum verification")]
    Corrupt(String),

    #[error("Invalid contamination {0}: must be in (0, 0.5]")]
    InvalidContamination(f64),

    #[error("Cannot fit a model on an empty training set")]
    EmptyTrainingSet,

    #[error("Baseline catalog error: {0}")]
    Catalog(String),
}

impl RiskError {
    /// Stored artifact is unusable but can be replaced by retraining
    pub fn is_recoverable_artifact(&self) -> bool {
        matches!(
            self,
            RiskError::NotFound(_) | RiskError::LayoutMismatch { .. } | RiskError::Corrupt(_)
        )
    }
}
