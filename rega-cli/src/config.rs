//! Client configuration.
//!
//! Read from `rega.toml` in the platform config directory (or the path given
//! with `--config`):
//!
//! ```toml
//! data_path = "/var/lib/rega/rega.db"
//!
//! [remote]
//! base_url = "https://hub.example.org"
//! timeout_secs = 30
//!
//! [sync]
//! device_name = "Tablet 3"
//! ```

use anyhow::{Context, Result};
use rega_sync::SyncConfig;
use rega_sync::remote::HttpStoreConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

const APP_DIR_NAME: &str = "rega";
const CONFIG_FILE_NAME: &str = "rega.toml";
const DB_FILE_NAME: &str = "rega.db";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    /// Location of the local replica.
    pub data_path: PathBuf,
    pub remote: HttpStoreConfig,
    pub sync: SyncConfig,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            data_path: default_data_path(),
            remote: HttpStoreConfig::default(),
            sync: SyncConfig::default(),
        }
    }
}

fn default_data_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR_NAME)
        .join(DB_FILE_NAME)
}

impl CliConfig {
    /// `rega.toml` in the platform config directory.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join(APP_DIR_NAME).join(CONFIG_FILE_NAME))
    }

    /// Loads the configuration.
    ///
    /// An explicit path must exist. The default location may be absent, in
    /// which case defaults are used.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        match explicit {
            Some(path) => Self::load_file(path),
            None => match Self::default_path() {
                Some(path) if path.exists() => Self::load_file(&path),
                _ => Ok(Self::default()),
            },
        }
    }

    pub fn load_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        Self::from_toml(&content)
            .with_context(|| format!("Invalid config {}", path.display()))
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Writes the configuration, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, toml::to_string_pretty(self)?)
            .with_context(|| format!("Failed to write config {}", path.display()))
    }
}
