//! Model Store - one persisted artifact per normalized device type
//!
//! Keys are folded (lowercase, whitespace and path characters → `_`) so two
//! spellings of the same type deliberately share a model. Saves are atomic
//! overwrites: write a temporary sibling, fsync, rename.
//!
//! A `ModelStamp` carries the file's inode on unix, so a save always stamps
//! differently from the file it replaces, even within one mtime tick. Elsewhere the identity is 0 and a
//! same-length rewrite inside one tick can leave a cached model stale until
//! the next write.

use std::collections::BTreeSet;
use std::fs::{self, File};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;

use super::artifact::DeviceTypeModel;
use crate::constants::UNKNOWN_DEVICE_TYPE;
use crate::error::{RiskError, RiskResult};

const ARTIFACT_SUFFIX: &str = "_if.json";

/// Normalize a device type into a storage key
pub fn normalize_key(device_type: &str) -> String {
    let key: String = device_type
        .trim()
        .to_lowercase()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' || c == '-' { c } else { '_' })
        .collect();

    if key.is_empty() {
        UNKNOWN_DEVICE_TYPE.to_string()
    } else {
        key
    }
}

/// Identifies one written version of an artifact, for cache validation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModelStamp {
    pub modified_nanos: u128,
    pub len: u64,
    /// Inode on unix, 0 elsewhere
    pub identity: u64,
}

/// Persistent storage for device type models
pub trait ModelStore: Send + Sync {
    /// Load and verify; `NotFound` if no artifact exists
    fn load(&self, device_type: &str) -> RiskResult<DeviceTypeModel>;

    /// Atomically overwrite the artifact for `device_type`
    fn save(&self, device_type: &str, model: &DeviceTypeModel) -> RiskResult<()>;

    fn exists(&self, device_type: &str) -> bool;

    /// Keys of all persisted models
    fn list_device_types(&self) -> RiskResult<BTreeSet<String>>;

    /// Current stamp of the artifact, `None` if absent
    fn stamp(&self, device_type: &str) -> RiskResult<Option<ModelStamp>>;
}

// ============================================================================
// FILESYSTEM STORE
// ============================================================================

#[derive(Debug, Clone)]
pub struct FsModelStore {
    dir: PathBuf,
}

impl FsModelStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, device_type: &str) -> PathBuf {
        self.dir.join(format!("{}{}", normalize_key(device_type), ARTIFACT_SUFFIX))
    }
}

impl ModelStore for FsModelStore {
    fn load(&self, device_type: &str) -> RiskResult<DeviceTypeModel> {
        let key = normalize_key(device_type);
        let path = self.path_for(&key);

        let data = match fs::read(&path) {
            Ok(data) => data,
            Err(e) if e.kind() == ErrorKind::NotFound => return Err(RiskError::NotFound(key)),
            Err(e) => return Err(e.into()),
        };

        let model: DeviceTypeModel = match serde_json::from_slice(&data) {
            Ok(model) => model,
            Err(e) => {
                log::warn!("Model artifact {} is unreadable: {}", path.display(), e);
                return Err(RiskError::Corrupt(key));
            }
        };

        if model.device_type != key {
            log::warn!(
                "Model artifact {} belongs to {:?}, not {:?}",
                path.display(),
                model.device_type,
                key
            );
            return Err(RiskError::Corrupt(key));
        }

        model.verify()?;
        Ok(model)
    }

    fn save(&self, device_type: &str, model: &DeviceTypeModel) -> RiskResult<()> {
        fs::create_dir_all(&self.dir)?;

        let path = self.path_for(device_type);
        let tmp = self.dir.join(format!(
            ".{}.{}.tmp",
            normalize_key(device_type),
            uuid::Uuid::new_v4().simple()
        ));

        let json = serde_json::to_vec(model)?;
        let written = write_synced(&tmp, &json).and_then(|_| fs::rename(&tmp, &path));

        if let Err(e) = written {
            let _ = fs::remove_file(&tmp);
            log::error!("Failed to persist model {}: {}", path.display(), e);
            return Err(e.into());
        }

        log::debug!("Saved model {} ({} bytes)", path.display(), json.len());
        Ok(())
    }

    fn exists(&self, device_type: &str) -> bool {
        self.path_for(device_type).is_file()
    }

    fn list_device_types(&self) -> RiskResult<BTreeSet<String>> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(BTreeSet::new()),
            Err(e) => return Err(e.into()),
        };

        let mut keys = BTreeSet::new();
        for entry in entries {
            let name = entry?.file_name();
            let Some(name) = name.to_str() else { continue };
            if name.starts_with('.') {
                continue;
            }
            if let Some(key) = name.strip_suffix(ARTIFACT_SUFFIX) {
                keys.insert(key.to_string());
            }
        }
        Ok(keys)
    }

    fn stamp(&self, device_type: &str) -> RiskResult<Option<ModelStamp>> {
        let meta = match fs::metadata(self.path_for(device_type)) {
            Ok(meta) => meta,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let modified_nanos = meta
            .modified()?
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or(0);

        Ok(Some(ModelStamp { modified_nanos, len: meta.len(), identity: file_identity(&meta) }))
    }
}

#[cfg(unix)]
fn file_identity(meta: &fs::Metadata) -> u64 {
    use std::os::unix::fs::MetadataExt;
    meta.ino()
}

#[cfg(not(unix))]
fn file_identity(_meta: &fs::Metadata) -> u64 {
    0
}

fn write_synced(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut file = File::create(path)?;
    file.write_all(bytes)?;
    file.sync_all()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_key() {
        assert_eq!(normalize_key("Glucose Monitor"), "glucose_monitor");
        assert_eq!(normalize_key("glucose_monitor"), "glucose_monitor");
        assert_eq!(normalize_key("  Infusion\tPump "), "infusion_pump");
        assert_eq!(normalize_key("../../etc/passwd"), "______etc_passwd");
        assert_eq!(normalize_key("   "), "unknown");
    }

    #[test]
    fn test_spellings_share_path() {
        let store = FsModelStore::new("/tmp/models");
        assert_eq!(store.path_for("Patient Monitor"), store.path_for("patient_monitor"));
        assert!(store.path_for("Patient Monitor").ends_with("patient_monitor_if.json"));
    }

    #[test]
    fn test_missing_dir_lists_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsModelStore::new(dir.path().join("absent"));
        assert!(store.list_device_types().unwrap().is_empty());
        assert!(store.stamp("glucose_monitor").unwrap().is_none());
        assert!(matches!(store.load("glucose_monitor"), Err(RiskError::NotFound(k)) if k == "glucose_monitor"));
    }
}
