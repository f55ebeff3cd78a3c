//! Configuration loading
//!
//! Settings are resolved in priority order:
//! 1. Explicit path passed by the caller (highest priority)
//! 2. `ONGI_CONFIG` environment variable
//! 3. Platform config directory (`<config_dir>/ongi/config.toml`)
//!
//! A missing config file is not an error: every setting has a compiled
//! default so a bare deployment starts with a usable configuration.

use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Top-level configuration for the Ongi core services
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct OngiConfig {
    /// SQLite database file path (None = platform data directory)
    pub database_path: Option<PathBuf>,
    pub hub: HubSettings,
    pub matching: MatchingSettings,
    pub sessions: SessionSettings,
}

/// Broadcast hub tuning
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HubSettings {
    /// Capacity of each client's bounded outbound queue. A broadcast that
    /// finds this queue full disconnects the client.
    pub client_queue_capacity: usize,
    /// Capacity of the register/unregister/broadcast control queues.
    pub control_queue_capacity: usize,
}

impl Default for HubSettings {
    fn default() -> Self {
        Self {
            client_queue_capacity: 256,
            control_queue_capacity: 256,
        }
    }
}

/// Batch similarity tuning
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MatchingSettings {
    /// Worker count for batch similarity; 0 = available parallelism.
    pub workers: usize,
}

impl Default for MatchingSettings {
    fn default() -> Self {
        Self { workers: 0 }
    }
}

/// Guest session maintenance
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SessionSettings {
    /// Seconds between expiry sweeps.
    pub sweep_period_secs: u64,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            sweep_period_secs: 3600,
        }
    }
}

impl OngiConfig {
    /// Load configuration following the priority order above.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }

        if let Ok(path) = std::env::var("ONGI_CONFIG") {
            return Self::from_file(Path::new(&path));
        }

        if let Some(path) = default_config_path() {
            if path.exists() {
                return Self::from_file(&path);
            }
        }

        Ok(Self::default())
    }

    /// Parse a TOML config file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("cannot read {}: {}", path.display(), e)))?;
        toml::from_str(&content)
            .map_err(|e| Error::Config(format!("cannot parse {}: {}", path.display(), e)))
    }

    /// Resolve the database file path, falling back to the platform data
    /// directory.
    pub fn database_path(&self) -> PathBuf {
        if let Some(path) = &self.database_path {
            return path.clone();
        }
        dirs::data_local_dir()
            .map(|d| d.join("ongi").join("ongi.db"))
            .unwrap_or_else(|| PathBuf::from("./ongi.db"))
    }
}

fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("ongi").join("config.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_are_usable() {
        let config = OngiConfig::default();
        assert_eq!(config.hub.client_queue_capacity, 256);
        assert_eq!(config.hub.control_queue_capacity, 256);
        assert_eq!(config.matching.workers, 0);
        assert_eq!(config.sessions.sweep_period_secs, 3600);
    }

    #[test]
    fn partial_file_keeps_defaults_for_missing_sections() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(
            file,
            "database_path = \"/tmp/ongi-test.db\"\n\n[hub]\nclient_queue_capacity = 8"
        )
        .unwrap();

        let config = OngiConfig::from_file(&path).unwrap();
        assert_eq!(config.database_path(), PathBuf::from("/tmp/ongi-test.db"));
        assert_eq!(config.hub.client_queue_capacity, 8);
        // untouched sections fall back to defaults
        assert_eq!(config.hub.control_queue_capacity, 256);
        assert_eq!(config.sessions.sweep_period_secs, 3600);
    }

    #[test]
    fn malformed_file_is_a_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "hub = 12").unwrap();

        let err = OngiConfig::from_file(&path).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
