//! Features Module - telemetry records and the model's feature vector
//!
//! The layout in `layout.rs` is the single source of truth for feature
//! order; training and prediction both go through `FeatureVector`.

pub mod layout;
pub mod record;
pub mod vector;


pub use layout::{layout_hash, LayoutInfo, FEATURE_COUNT, FEATURE_LAYOUT, FEATURE_VERSION};
pub use record::{extract_features, PatchStatus, TelemetryMeta, TelemetryRecord, UNKNOWN_PROTOCOL};
pub use vector::FeatureVector;
