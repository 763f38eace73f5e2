//! Synthetic telemetry for demos and smoke tests
//!
//! Normal records jitter around the device type's baseline centroid.
//! Anomalous records are noisy, chatty, unpatched and stale, and carry
//! `is_anomaly = true` for offline evaluation only.

use chrono::{Duration, Utc};
use rand::Rng;

use crate::baseline::BaselineCatalog;
use crate::features::{FeatureVector, PatchStatus, TelemetryRecord, FEATURE_COUNT};
use crate::model::normalize_key;

/// Relative jitter applied to normal records
const JITTER: f64 = 0.3;

/// `n_normal` records followed by `n_anomalous`, one second apart
pub fn generate<R: Rng + ?Sized>(
    catalog: &BaselineCatalog,
    device_type: &str,
    n_normal: usize,
    n_anomalous: usize,
    rng: &mut R,
) -> Vec<TelemetryRecord> {
    let key = normalize_key(device_type);
    let centroid = centroid(catalog.resolve(&key).rows);
    let start = Utc::now();

    let mut records = Vec::with_capacity(n_normal + n_anomalous);

    for i in 0..n_normal {
        let mut r = TelemetryRecord::new(&format!("{}-{:04}", key, i), &key);
        r.ts = Some(start + Duration::seconds(i as i64));
        r.pkt_sec = jitter(rng, centroid.packets_per_sec());
        r.bytes_sec = jitter(rng, centroid.bytes_per_sec());
        r.dest_count = 1;
        r.avg_payload = jitter(rng, centroid.avg_payload_size());
        r.protocol = "HTTPS".to_string();
        r.patch_status = PatchStatus::Patched;
        r.maintenance_days = rng.gen_range(1..90);
        r.is_anomaly = Some(false);
        records.push(r);
    }

    for i in 0..n_anomalous {
        let mut r = TelemetryRecord::new(&format!("{}-anom-{:04}", key, i), &key);
        r.ts = Some(start + Duration::seconds((n_normal + i) as i64));
        r.pkt_sec = f64::from(rng.gen_range(60u32..300));
        r.bytes_sec = f64::from(rng.gen_range(20_000u32..120_000));
        r.dest_count = rng.gen_range(3..8);
        r.avg_payload = f64::from(rng.gen_range(800u32..5000));
        r.protocol = "unknown".to_string();
        r.patch_status = PatchStatus::Unpatched;
        r.maintenance_days = rng.gen_range(200..800);
        r.is_anomaly = Some(true);
        records.push(r);
    }

    records
}

fn centroid(rows: &[FeatureVector]) -> FeatureVector {
    let mut sum = [0.0; FEATURE_COUNT];
    for row in rows {
        for (acc, v) in sum.iter_mut().zip(row.as_slice()) {
            *acc += v;
        }
    }
    let n = rows.len().max(1) as f64;
    FeatureVector::from_row(sum.map(|s| s / n))
}

fn jitter<R: Rng + ?Sized>(rng: &mut R, center: f64) -> f64 {
    let factor = rng.gen_range(1.0 - JITTER..1.0 + JITTER);
    (center * factor * 1000.0).round() / 1000.0
}
