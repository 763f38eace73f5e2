//! Model Module - per-device-type anomaly models
//!
//! # Lifecycle
//! - `Trainer` fits from the historical pool or the baseline catalog and
//!   commits to the `ModelStore`
//! - `Predictor` resolves a model (cache → store → cold-start fit) and
//!   scores one record
//!
//! Both share the per-key locks, so at most one fit + save per device type
//! runs at a time and a reader never sees a half-written artifact.

pub mod artifact;
pub mod forest;
pub mod predictor;
pub mod registry;
pub mod stats;
pub mod store;
pub mod trainer;

#[cfg(test)]
mod tests;

pub use artifact::{DeviceTypeModel, ModelSource};
pub use forest::{Decision, ForestParams, IsolationForest};
pub use predictor::{anomaly_probability, publish_score, Predictor, ScoreResult};
pub use registry::{KeyedLocks, ModelCache};
pub use stats::{ScoringCounters, ScoringStats};
pub use store::{normalize_key, FsModelStore, ModelStamp, ModelStore};
pub use trainer::{Trainer, TrainingOutcome, TrainingParams, TrainingStatus};
