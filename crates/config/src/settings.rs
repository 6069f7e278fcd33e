//! Configuration sections
//!
//! One section per concern: remote endpoints, local store, and the
//! behavior of reconciliation passes. Every field has a default so a
//! missing file or a partial file still produces a working config.

use serde::{Deserialize, Serialize};

/// Base URLs and timing for the three backend services
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RemoteConfig {
    /// Infrastructure service (stations, lines, line stations)
    pub infra_base_url: String,
    /// Dynamics service (rides, vehicles)
    pub dynamics_base_url: String,
    /// Profile service (drivers, passengers)
    pub profiles_base_url: String,
    /// Timeout for collection fetches, in seconds
    pub collection_timeout_secs: u64,
    /// Timeout for single-record calls, in seconds
    pub record_timeout_secs: u64,
    /// Total attempts per remote call, including the first
    pub retry_attempts: u32,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            infra_base_url: "http://localhost:9000".to_string(),
            dynamics_base_url: "http://localhost:9080".to_string(),
            profiles_base_url: "http://localhost:9082".to_string(),
            collection_timeout_secs: 30,
            record_timeout_secs: 10,
            retry_attempts: 3,
        }
    }
}

impl RemoteConfig {
    pub fn validate(&self) -> Result<(), String> {
        for (name, url) in [
            ("infra_base_url", &self.infra_base_url),
            ("dynamics_base_url", &self.dynamics_base_url),
            ("profiles_base_url", &self.profiles_base_url),
        ] {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(format!("{name} must start with http:// or https://"));
            }
            if url.ends_with('/') {
                return Err(format!("{name} must not end with a slash"));
            }
        }
        if self.retry_attempts == 0 {
            return Err("retry_attempts must be at least 1".to_string());
        }
        if self.collection_timeout_secs == 0 || self.record_timeout_secs == 0 {
            return Err("timeouts must be positive".to_string());
        }
        Ok(())
    }
}

/// Local SQLite store settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct StoreConfig {
    /// Database file path (relative paths resolve against the working dir)
    pub database_path: String,
    /// Maximum number of pooled connections
    pub max_connections: u32,
    /// Enable Write-Ahead Logging
    pub enable_wal: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            database_path: "fleetsync.db".to_string(),
            max_connections: 10,
            enable_wal: true,
        }
    }
}

impl StoreConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.database_path.trim().is_empty() {
            return Err("database_path must not be empty".to_string());
        }
        if self.max_connections == 0 {
            return Err("max_connections must be at least 1".to_string());
        }
        Ok(())
    }
}

/// Reconciliation pass behavior
///
/// Sweeping deletes local records whose remote counterpart disappeared.
/// It is only safe for entity kinds whose collection is fetched in full,
/// so each kind carries its own switch. Incremental fetch sends the
/// stored watermark as an `updatedSince` filter; a pass that fetched
/// incrementally never sweeps, whatever these switches say.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SyncConfig {
    pub sweep_stations: bool,
    pub sweep_lines: bool,
    pub sweep_line_stations: bool,
    pub sweep_vehicles: bool,
    pub sweep_profiles: bool,
    pub sweep_rides: bool,
    /// Use watermark-filtered fetches where the service supports them
    pub incremental_fetch: bool,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            sweep_stations: false,
            sweep_lines: true,
            sweep_line_stations: true,
            sweep_vehicles: false,
            sweep_profiles: false,
            sweep_rides: false,
            incremental_fetch: false,
        }
    }
}
