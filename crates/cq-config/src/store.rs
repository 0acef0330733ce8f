//! Shared configuration snapshots.
//!
//! Compilations take an `Arc<Config>` snapshot when they start and use it until they finish.
//! A reload swaps the shared pointer; in-flight compilations keep the snapshot they took.

use std::{mem, path::PathBuf, sync::Arc};

use parking_lot::RwLock;

use crate::{Config, ConfigError};

/// Holds the current configuration and the files it was loaded from.
#[derive(Debug)]
pub struct ConfigStore {
    /// Current configuration.
    current: RwLock<Arc<Config>>,
    /// Files reloaded by [`ConfigStore::reload`], highest precedence first.
    files: Vec<PathBuf>,
}

impl ConfigStore {
    /// Creates a store around an already loaded configuration.
    pub fn new(config: Config) -> Self {
        Self {
            current: RwLock::new(Arc::new(config)),
            files: Vec::new(),
        }
    }

    /// Loads the given files and keeps them for later reloads.
    pub fn from_files(files: Vec<PathBuf>) -> Result<Self, ConfigError> {
        let config = Config::load_from_files(&files)?;
        Ok(Self {
            current: RwLock::new(Arc::new(config)),
            files,
        })
    }

    /// Returns the configuration files backing the store.
    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }

    /// Returns a consistent snapshot of the current configuration.
    pub fn snapshot(&self) -> Arc<Config> {
        Arc::clone(&self.current.read())
    }

    /// Re-reads the backing files and publishes the result.
    ///
    /// On error the previous configuration stays current.
    pub fn reload(&self) -> Result<Arc<Config>, ConfigError> {
        let config = Arc::new(Config::load_from_files(&self.files)?);
        *self.current.write() = Arc::clone(&config);
        Ok(config)
    }

    /// Publishes a new configuration, returning the one it replaced.
    pub fn replace(&self, config: Config) -> Arc<Config> {
        mem::replace(&mut *self.current.write(), Arc::new(config))
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;
    use crate::test_support::TestDir;

    #[test]
    fn snapshot_survives_reload() {
        let test_dir = TestDir::new();
        let path = test_dir.create_config_with_content("", "[relevance]\nmax_depth = 1\n");
        let store = ConfigStore::from_files(vec![path.clone()]).unwrap();

        let before = store.snapshot();
        fs::write(&path, "[relevance]\nmax_depth = 3\n").unwrap();
        store.reload().unwrap();

        assert_eq!(before.relevance.max_depth, 1);
        assert_eq!(store.snapshot().relevance.max_depth, 3);
    }

    #[test]
    fn failed_reload_keeps_previous_config() {
        let test_dir = TestDir::new();
        let path = test_dir.create_config_with_content("", "[relevance]\nmax_depth = 1\n");
        let store = ConfigStore::from_files(vec![path.clone()]).unwrap();

        fs::write(&path, "[relevance]\ncutoff_frequency = 7.0\n").unwrap();
        assert!(store.reload().is_err());
        assert_eq!(store.snapshot().relevance.max_depth, 1);
    }

    #[test]
    fn replace_returns_previous() {
        let store = ConfigStore::new(Config::default());
        let mut next = Config::default();
        next.engine.server_version = "8.0.0".into();

        let previous = store.replace(next);
        assert_ne!(previous.engine.server_version, "8.0.0");
        assert_eq!(store.snapshot().engine.server_version, "8.0.0");
    }
}
