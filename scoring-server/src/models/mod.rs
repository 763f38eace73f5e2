//! Request and response models

pub mod ml;
pub mod telemetry;

pub use ml::*;
pub use telemetry::*;
