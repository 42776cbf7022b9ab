//! Bundle loading and caching.
//!
//! One aggregate Bundle document is stored on disk per patient key. The store
//! caches parsed bundles and invalidates a cache entry when the underlying
//! file's modification time advances.
//!
//! Concurrency: axum serves requests concurrently, so the cache publishes
//! replacements atomically. A new bundle is fully built and wrapped in an
//! `Arc` before the map slot is swapped under the write guard; readers either
//! see the old document or the new one, never a partial construction.
//! Documents are immutable after construction, so no further locking is
//! needed.

use std::collections::HashMap;
use std::fs;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::SystemTime;

use fhir::{Bundle, BUNDLE_KEY_PREFIX};

use crate::config::{CoreConfig, BUNDLE_FILE_EXT};
use crate::error::{CoreError, CoreResult};

struct CacheEntry {
    bundle: Arc<Bundle>,
    /// Modification time of the source file when this entry was built.
    modified: SystemTime,
}

/// Pure bundle data operations - no API concerns.
///
/// Cheap to clone; clones share one cache. Independent stores (for example in
/// tests) get independent caches.
#[derive(Clone)]
pub struct BundleStore {
    cfg: Arc<CoreConfig>,
    cache: Arc<RwLock<HashMap<String, CacheEntry>>>,
}

impl BundleStore {
    /// Creates a new store with an empty cache.
    pub fn new(cfg: Arc<CoreConfig>) -> Self {
        Self {
            cfg,
            cache: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub fn config(&self) -> &CoreConfig {
        &self.cfg
    }

    /// List all known bundle keys from the data directory, sorted.
    ///
    /// Keys are the stems of `eps-*.json` files. An unreadable data directory
    /// degrades to an empty list rather than an error.
    pub fn available_patients(&self) -> Vec<String> {
        let mut keys = Vec::new();

        let entries = match fs::read_dir(self.cfg.data_dir()) {
            Ok(it) => it,
            Err(_) => return keys,
        };

        for entry in entries.flatten() {
            let path = entry.path();
            if !path.is_file() {
                continue;
            }
            if path.extension().and_then(|e| e.to_str()) != Some(BUNDLE_FILE_EXT) {
                continue;
            }
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            if stem.starts_with(BUNDLE_KEY_PREFIX) {
                keys.push(stem.to_string());
            }
        }

        keys.sort();
        keys
    }

    /// Load the bundle for a patient key, serving from cache when fresh.
    ///
    /// The source file's current modification time is compared against the
    /// cached one on every call; the bundle is re-read only when the key is
    /// new or the timestamp advanced. The whole document is replaced, never
    /// merged.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::UnknownPatient`] when no source file exists for
    /// the key; the error detail lists all known keys. I/O and parse failures
    /// surface as [`CoreError::FileRead`] / [`CoreError::Deserialization`].
    pub fn load(&self, patient_id: &str) -> CoreResult<Arc<Bundle>> {
        let path = self.cfg.bundle_path(patient_id);
        if !path.is_file() {
            return Err(CoreError::UnknownPatient {
                patient_id: patient_id.to_string(),
                available: self.available_patients(),
            });
        }

        let modified = fs::metadata(&path)
            .and_then(|meta| meta.modified())
            .map_err(CoreError::FileRead)?;

        {
            let cache = self.cache.read().unwrap_or_else(PoisonError::into_inner);
            if let Some(entry) = cache.get(patient_id) {
                if entry.modified >= modified {
                    return Ok(entry.bundle.clone());
                }
            }
        }

        tracing::debug!("loading bundle for {patient_id}");
        let text = fs::read_to_string(&path).map_err(CoreError::FileRead)?;
        let bundle: Bundle = serde_json::from_str(&text).map_err(CoreError::Deserialization)?;
        let bundle = Arc::new(bundle);

        // Publish the fully built document in one swap.
        self.cache
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(
                patient_id.to_string(),
                CacheEntry {
                    bundle: bundle.clone(),
                    modified,
                },
            );

        Ok(bundle)
    }
}
