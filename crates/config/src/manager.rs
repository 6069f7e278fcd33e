//! Config manager: resolves the platform config path and wraps persistence

use crate::persistence::ConfigPersistence;
use crate::{Config, ConfigError, ConfigResult};
use directories::ProjectDirs;
use std::path::PathBuf;

/// Loads and saves the config at its platform-specific location
pub struct ConfigManager {
    persistence: ConfigPersistence,
}

impl ConfigManager {
    /// Creates a manager using the XDG (or platform equivalent) config dir
    pub fn new() -> ConfigResult<Self> {
        let dirs =
            ProjectDirs::from("", "", "fleetsync").ok_or(ConfigError::NoConfigDirectory)?;
        let path = dirs.config_dir().join("fleetsync.toml");
        Ok(Self::with_path(path))
    }

    /// Creates a manager for an explicit config file path
    pub fn with_path(path: PathBuf) -> Self {
        Self {
            persistence: ConfigPersistence::new(path),
        }
    }

    pub fn path(&self) -> &std::path::Path {
        self.persistence.path()
    }

    /// Loads the config, falling back to defaults when the file is absent
    pub fn load(&self) -> ConfigResult<Config> {
        self.persistence.load()
    }

    pub fn save(&self, config: &Config) -> ConfigResult<()> {
        self.persistence.save(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_with_path_round_trip() {
        let dir = tempdir().unwrap();
        let manager = ConfigManager::with_path(dir.path().join("nested/fleetsync.toml"));

        let config = Config::default();
        manager.save(&config).unwrap();
        assert_eq!(manager.load().unwrap(), config);
    }
}
