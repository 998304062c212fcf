use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Engine tunables, read from `config.toml`. Every field has a default so a
/// partial (or absent) file is fine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Worker threads used by the size scanner.
    pub scan_workers: usize,
    /// Number of newest prefetch files kept by the trim strategy.
    pub prefetch_keep: usize,
    /// Service stopped around the update-cache wipe.
    pub update_service: String,
    pub recycle_bin_timeout_secs: u64,
    pub service_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            scan_workers: 4,
            prefetch_keep: 128,
            update_service: "wuauserv".to_string(),
            recycle_bin_timeout_secs: 60,
            service_timeout_secs: 30,
        }
    }
}

impl Config {
    /// `<config dir>/reclaim/config.toml`, if the platform has a config dir.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("reclaim").join("config.toml"))
    }

    /// Load from an explicit file. The file must exist.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load the explicit file if given, otherwise the default location.
    /// A missing default file yields defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }
        match Self::default_path() {
            Some(path) if path.is_file() => Self::from_file(&path),
            _ => Ok(Self::default()),
        }
    }

    pub fn recycle_bin_timeout(&self) -> Duration {
        Duration::from_secs(self.recycle_bin_timeout_secs)
    }

    pub fn service_timeout(&self) -> Duration {
        Duration::from_secs(self.service_timeout_secs)
    }
}
