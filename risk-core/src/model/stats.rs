//! Scoring statistics

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

/// Counters shared by the predictor and trainer
#[derive(Debug, Default)]
pub struct ScoringCounters {
    predictions: AtomicU64,
    outliers: AtomicU64,
    cold_starts: AtomicU64,
    retrains: AtomicU64,
}

/// Point-in-time snapshot for status endpoints
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoringStats {
    pub predictions: u64,
    pub outliers: u64,
    pub cold_starts: u64,
    pub retrains: u64,
}

impl ScoringCounters {
    pub fn record_prediction(&self, outlier: bool) {
        self.predictions.fetch_add(1, Ordering::Relaxed);
        if outlier {
            self.outliers.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn record_cold_start(&self) {
        self.cold_starts.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_retrain(&self) {
        self.retrains.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> ScoringStats {
        ScoringStats {
            predictions: self.predictions.load(Ordering::Relaxed),
            outliers: self.outliers.load(Ordering::Relaxed),
            cold_starts: self.cold_starts.load(Ordering::Relaxed),
            retrains: self.retrains.load(Ordering::Relaxed),
        }
    }
}
