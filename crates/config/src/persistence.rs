//! File system persistence for configuration
//!
//! Reads and writes the TOML config file with atomic writes so the file
//! is never left half-written, and treats a missing file as "use
//! defaults" rather than an error.

use crate::{Config, ConfigError, ConfigResult};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Handles configuration file persistence
pub struct ConfigPersistence {
    config_path: PathBuf,
}

impl ConfigPersistence {
    /// Creates a new persistence handler for the given config file path
    pub fn new(config_path: PathBuf) -> Self {
        Self { config_path }
    }

    pub fn path(&self) -> &Path {
        &self.config_path
    }

    /// Loads configuration from file
    ///
    /// A missing file yields the default config. An empty or corrupted
    /// file is an error, not a silent reset.
    pub fn load(&self) -> ConfigResult<Config> {
        if !self.config_path.exists() {
            log::info!(
                "Config file not found at {}, using defaults",
                self.config_path.display()
            );
            return Ok(Config::default());
        }

        let contents =
            fs::read_to_string(&self.config_path).map_err(|e| ConfigError::ReadError {
                path: self.config_path.clone(),
                source: e,
            })?;

        if contents.trim().is_empty() {
            return Err(ConfigError::ReadError {
                path: self.config_path.clone(),
                source: std::io::Error::new(
                    std::io::ErrorKind::InvalidData,
                    "Config file is empty or contains only whitespace",
                ),
            });
        }

        let config: Config = toml::from_str(&contents).map_err(|e| ConfigError::ParseError {
            path: self.config_path.clone(),
            source: e,
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Saves configuration to file atomically
    ///
    /// Serializes to a temp file in the target directory, then renames
    /// over the old file.
    pub fn save(&self, config: &Config) -> ConfigResult<()> {
        config.validate()?;

        let parent = self
            .config_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        fs::create_dir_all(&parent).map_err(|e| ConfigError::WriteError {
            path: parent.clone(),
            source: e,
        })?;

        let toml_string = toml::to_string_pretty(config)?;

        let mut temp = NamedTempFile::new_in(&parent).map_err(|e| ConfigError::WriteError {
            path: self.config_path.clone(),
            source: e,
        })?;
        temp.write_all(toml_string.as_bytes())
            .map_err(|e| ConfigError::WriteError {
                path: self.config_path.clone(),
                source: e,
            })?;
        temp.persist(&self.config_path)
            .map_err(|e| ConfigError::WriteError {
                path: self.config_path.clone(),
                source: e.error,
            })?;

        log::debug!("Saved config to {}", self.config_path.display());
        Ok(())
    }
}
