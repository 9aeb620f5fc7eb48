//! TOML-backed configuration persistence.
//!
//! A missing file produces the default configuration and writes it
//! back, so first launch leaves a file the user can edit. Parse and
//! validation failures surface as [`ConfigError`].

use std::path::{Path, PathBuf};

use crate::config::Config;
use crate::error::ConfigError;

use super::data_dir;

pub struct ConfigStore {
    path: PathBuf,
}

impl ConfigStore {
    /// Store under the standard data directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the data directory cannot be created.
    pub fn new() -> crate::error::Result<Self> {
        Ok(Self {
            path: data_dir()?.join("config.toml"),
        })
    }

    /// Store at an explicit path.
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load from disk, or write and return the default.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be parsed or
    /// fails validation, or if the default cannot be written back.
    pub fn load(&self) -> Result<Config, ConfigError> {
        match std::fs::read_to_string(&self.path) {
            Ok(content) => {
                let config: Config =
                    toml::from_str(&content).map_err(|e| ConfigError::ParseFailed(e.to_string()))?;
                config.validate()?;
                Ok(config)
            }
            Err(_) => {
                let config = Config::default();
                self.save(&config)?;
                Ok(config)
            }
        }
    }

    /// Load from disk, falling back to defaults on any error.
    pub fn load_or_default(&self) -> Config {
        self.load().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "failed to load config, using defaults");
            Config::default()
        })
    }

    /// Persist to disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be serialized or written.
    pub fn save(&self, config: &Config) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(config).map_err(|e| ConfigError::SaveFailed {
            path: self.path.clone(),
            message: e.to_string(),
        })?;
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::SaveFailed {
                path: self.path.clone(),
                message: e.to_string(),
            })?;
        }
        std::fs::write(&self.path, content).map_err(|e| ConfigError::SaveFailed {
            path: self.path.clone(),
            message: e.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_in(dir: &tempfile::TempDir) -> ConfigStore {
        ConfigStore::with_path(dir.path().join("config.toml"))
    }

    #[test]
    fn missing_file_writes_defaults_back() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);

        let config = store.load().unwrap();
        assert_eq!(config.idle_threshold_secs, 180);
        assert!(store.path().exists());

        // A second load parses the file it just wrote.
        let again = store.load().unwrap();
        assert_eq!(again.tiers.len(), 2);
    }

    #[test]
    fn save_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);

        let mut config = Config::default();
        config.merge_window_secs = 120;
        config.tiers[0].name = "Blink".into();
        store.save(&config).unwrap();

        let loaded = store.load().unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn corrupt_file_is_a_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        std::fs::write(store.path(), "this is not [ toml").unwrap();

        assert!(matches!(store.load(), Err(ConfigError::ParseFailed(_))));
        assert_eq!(store.load_or_default().idle_threshold_secs, 180);
    }

    #[test]
    fn invalid_values_fail_validation_on_load() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        let mut config = Config::default();
        config.tiers[0].active_interval_secs = 0;
        store.save(&config).unwrap();

        assert!(matches!(
            store.load(),
            Err(ConfigError::InvalidValue { .. })
        ));
    }
}
