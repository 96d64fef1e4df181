//! CLI configuration.

use anyhow::Result;
use serde::Deserialize;
use std::path::PathBuf;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,
    /// Cache TTL convention for callers that write through the store.
    #[serde(default = "default_ttl_hours")]
    pub default_ttl_hours: u32,
    /// How long an armed wipe stays valid.
    #[serde(default = "default_confirm_window_secs")]
    pub confirm_window_secs: u64,
    /// Age cutoff used by `purge telemetry` when none is given.
    #[serde(default = "default_telemetry_retention_days")]
    pub telemetry_retention_days: u32,
}

fn default_db_path() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("marketscope")
        .join("store.db")
}

fn default_ttl_hours() -> u32 {
    marketscope_core::DEFAULT_TTL_HOURS
}

fn default_confirm_window_secs() -> u64 {
    30
}

fn default_telemetry_retention_days() -> u32 {
    90
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            default_ttl_hours: default_ttl_hours(),
            confirm_window_secs: default_confirm_window_secs(),
            telemetry_retention_days: default_telemetry_retention_days(),
        }
    }
}

impl Config {
    /// Load config from a specific file path.
    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Load config from the default location or fall back to defaults.
    pub fn load() -> Result<Self> {
        let config_path = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("marketscope")
            .join("config.toml");
        if config_path.exists() {
            return Self::load_from(&config_path);
        }

        Ok(Config::default())
    }
}
