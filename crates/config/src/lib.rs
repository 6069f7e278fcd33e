// crates/config/src/lib.rs
//! FleetSync configuration
//!
//! TOML file at the platform config dir, with atomic writes and
//! defaults for every field so a missing or partial file still yields a
//! working setup. Sections cover the remote services, the local store,
//! and reconciliation behavior.

mod error;
mod manager;
mod persistence;
mod settings;

pub use error::{ConfigError, ConfigResult};
pub use manager::ConfigManager;
pub use persistence::ConfigPersistence;
pub use settings::{RemoteConfig, StoreConfig, SyncConfig};

use serde::{Deserialize, Serialize};

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Remote service endpoints and timing
    pub remote: RemoteConfig,

    /// Local store settings
    pub store: StoreConfig,

    /// Reconciliation pass behavior
    pub sync: SyncConfig,
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validates every section
    pub fn validate(&self) -> ConfigResult<()> {
        self.remote
            .validate()
            .and_then(|()| self.store.validate())
            .map_err(ConfigError::ValidationError)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            remote: RemoteConfig::default(),
            store: StoreConfig::default(),
            sync: SyncConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let config: Config = toml::from_str("[remote]\nretry_attempts = 5\n").unwrap();
        assert_eq!(config.remote.retry_attempts, 5);
        assert_eq!(config.store, StoreConfig::default());
    }
}
