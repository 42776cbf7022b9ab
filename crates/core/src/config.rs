//! Core runtime configuration.
//!
//! Configuration is resolved once at process startup and passed into core
//! services. Environment variables are never read during request handling,
//! which keeps behaviour consistent across multi-threaded runtimes and test
//! harnesses.

use std::path::{Path, PathBuf};

/// File extension of on-disk bundle documents.
pub const BUNDLE_FILE_EXT: &str = "json";

/// Core configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct CoreConfig {
    data_dir: PathBuf,
}

impl CoreConfig {
    /// Create a new `CoreConfig` rooted at the bundle data directory.
    pub fn new(data_dir: PathBuf) -> Self {
        Self { data_dir }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// On-disk path for one patient's bundle, by the `<key>.json` convention.
    pub fn bundle_path(&self, patient_id: &str) -> PathBuf {
        self.data_dir.join(format!("{patient_id}.{BUNDLE_FILE_EXT}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bundle_path_follows_key_naming_convention() {
        let cfg = CoreConfig::new(PathBuf::from("/srv/eps"));
        assert_eq!(
            cfg.bundle_path("eps-001"),
            PathBuf::from("/srv/eps/eps-001.json")
        );
    }
}
