//! IoMT Risk Core - Anomaly Model Lifecycle & Risk Composition
//!
//! Scores telemetry from networked medical devices against a per-device-type
//! anomaly model and fuses the result with patch/maintenance posture into a
//! bounded, explainable risk score.
//!
//! # Architecture
//! - `features`: fixed feature layout, `FeatureVector`, `TelemetryRecord`
//! - `baseline`: built-in seed datasets per device type
//! - `model`: isolation forest, model store, trainer, predictor
//! - `risk`: reason codes and risk composition
//! - `dataset`: append-only telemetry log (audit + retraining pool)
//! - `engine`: wiring of all of the above behind one handle
//!
//! # Failure Strategy
//! Unknown device types and thin training pools fall back to baselines.
//! Only model store failures surface as errors.

pub mod baseline;
pub mod config;
pub mod constants;
pub mod dataset;
pub mod engine;
pub mod error;
pub mod features;
pub mod model;
pub mod risk;

pub use config::EngineConfig;
pub use engine::ScoringEngine;
pub use error::{RiskError, RiskResult};
pub use features::{FeatureVector, PatchStatus, TelemetryRecord};
pub use model::{ScoreResult, ScoringStats, TrainingOutcome, TrainingStatus};
pub use risk::ReasonCode;
