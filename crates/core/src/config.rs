//! Service configuration
//!
//! TOML config file with defaults for every field. The daemon loads this
//! once at startup; everything else receives plain values.

use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Top-level configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub database: DatabaseConfig,
    pub sweeper: SweeperConfig,
}

/// Database location
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Path to the SQLite file; defaults to the platform data directory
    pub path: Option<PathBuf>,
}

/// Auto-expiry sweeper settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SweeperConfig {
    pub enabled: bool,
    /// Seconds between sweep ticks
    pub interval_secs: u64,
    /// Minutes an open ticket may exist before it is force-closed
    pub ttl_minutes: i64,
}

impl Default for SweeperConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_secs: 60,
            ttl_minutes: 60,
        }
    }
}

impl SweeperConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs.max(1))
    }

    pub fn ttl(&self) -> chrono::Duration {
        chrono::Duration::minutes(self.ttl_minutes.max(1))
    }
}

impl Config {
    /// Load configuration from the given file, or from the default
    /// location if `path` is `None`. A missing default file yields the
    /// built-in defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => {
                let default = Self::default_config_path()?;
                if !default.exists() {
                    return Ok(Self::default());
                }
                default
            }
        };

        let raw = std::fs::read_to_string(&path)?;
        Self::parse(&raw)
    }

    /// Parse configuration from a TOML string
    pub fn parse(raw: &str) -> Result<Self> {
        toml::from_str(raw).map_err(|e| Error::Config(e.to_string()))
    }

    /// Resolve the database file path, falling back to the platform
    /// data directory
    pub fn database_path(&self) -> Result<PathBuf> {
        if let Some(path) = &self.database.path {
            return Ok(path.clone());
        }
        Ok(Self::project_dirs()?.data_dir().join("squadup.db"))
    }

    fn default_config_path() -> Result<PathBuf> {
        Ok(Self::project_dirs()?.config_dir().join("squadup.toml"))
    }

    fn project_dirs() -> Result<ProjectDirs> {
        ProjectDirs::from("gg", "squadup", "squadup").ok_or_else(|| {
            Error::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "could not determine data directory",
            ))
        })
    }
}
