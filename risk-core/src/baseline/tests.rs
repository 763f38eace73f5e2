use std::collections::BTreeMap;

use super::{BaselineCatalog, FALLBACK_DEVICE_TYPE};
use crate::error::RiskError;

#[test]
fn test_builtin_types() {
    let catalog = BaselineCatalog::builtin();
    let types: Vec<_> = catalog.device_types().collect();
    assert_eq!(
        types,
        vec!["glucose_monitor", "infusion_pump", "patient_monitor", "ventilator"]
    );
}

#[test]
fn test_resolve_known_type() {
    let catalog = BaselineCatalog::builtin();
    let found = catalog.resolve("glucose_monitor");
    assert_eq!(found.key, "glucose_monitor");
    assert_eq!(found.rows.len(), 3);
    assert!(!found.is_fallback);
    assert_eq!(found.rows[0].bytes_per_sec(), 500.0);
}

#[test]
fn test_resolve_normalizes_spelling() {
    let catalog = BaselineCatalog::builtin();
    let found = catalog.resolve("Infusion Pump");
    assert_eq!(found.key, "infusion_pump");
    assert!(!found.is_fallback);
}

#[test]
fn test_unknown_type_falls_back_to_patient_monitor() {
    let catalog = BaselineCatalog::builtin();
    let found = catalog.resolve("smart_inhaler");
    assert_eq!(found.key, FALLBACK_DEVICE_TYPE);
    assert_eq!(found.rows.len(), 2);
    assert!(found.is_fallback);
}

#[test]
fn test_custom_catalog_requires_fallback() {
    let mut raw = BTreeMap::new();
    raw.insert("pacemaker".to_string(), vec![[0.1, 40.0, 1.0, 16.0]]);

    match BaselineCatalog::from_rows(raw) {
        Err(RiskError::Catalog(msg)) => assert!(msg.contains(FALLBACK_DEVICE_TYPE)),
        other => panic!("expected catalog error, got {:?}", other),
    }
}

#[test]
fn test_custom_catalog_rejects_empty_rows() {
    let mut raw = BTreeMap::new();
    raw.insert(FALLBACK_DEVICE_TYPE.to_string(), vec![[2.0, 800.0, 1.0, 300.0]]);
    raw.insert("pacemaker".to_string(), vec![]);

    assert!(matches!(BaselineCatalog::from_rows(raw), Err(RiskError::Catalog(_))));
}

#[test]
fn test_load_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("baselines.json");
    std::fs::write(
        &path,
        r#"{"Pacemaker": [[0.1, 40, 1, 16]], "patient_monitor": [[2, 800, 1, 300]]}"#,
    )
    .unwrap();

    let catalog = BaselineCatalog::load(&path).unwrap();
    assert!(catalog.contains("pacemaker"));
    assert!(!catalog.contains("glucose_monitor"));
    assert_eq!(catalog.resolve("PACEMAKER").rows[0].avg_payload_size(), 16.0);
}
