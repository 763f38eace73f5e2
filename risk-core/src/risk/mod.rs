//! Risk Module - reason codes and risk composition

pub mod composer;
pub mod reasons;

pub use composer::{compose, RiskAssessment};
pub use reasons::ReasonCode;
