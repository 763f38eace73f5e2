//! Per-key write locks and the shared cache of resolved models
//!
//! Resolution-and-train and retrain for one device type are serialized by
//! the key's mutex. Cached models are immutable `Arc`s, so scoring against a
//! resolved model takes no lock beyond the brief cache read.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};

use super::artifact::DeviceTypeModel;
use super::store::ModelStamp;

/// Registry of one mutex per device type key
#[derive(Debug, Default)]
pub struct KeyedLocks {
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl KeyedLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// The write lock for `key`; lock it for the duration of a fit + save
    pub fn for_key(&self, key: &str) -> Arc<Mutex<()>> {
        self.locks.lock().entry(key.to_string()).or_default().clone()
    }
}

#[derive(Debug, Clone)]
struct CachedModel {
    stamp: Option<ModelStamp>,
    model: Arc<DeviceTypeModel>,
}

/// Resolved models keyed by device type, validated against store stamps
#[derive(Debug, Default)]
pub struct ModelCache {
    models: RwLock<HashMap<String, CachedModel>>,
}

impl ModelCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached model if it was loaded from (or saved as) the artifact at `stamp`
    pub fn get(&self, key: &str, stamp: ModelStamp) -> Option<Arc<DeviceTypeModel>> {
        self.models
            .read()
            .get(key)
            .filter(|cached| cached.stamp == Some(stamp))
            .map(|cached| cached.model.clone())
    }

    pub fn insert(&self, key: &str, stamp: Option<ModelStamp>, model: Arc<DeviceTypeModel>) {
        self.models
            .write()
            .insert(key.to_string(), CachedModel { stamp, model });
    }

    pub fn len(&self) -> usize {
        self.models.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
