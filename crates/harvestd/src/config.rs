//! Configuration management for harvestd.
//!
//! Loads settings from /etc/harvestd/config.toml (overridable through the
//! HARVESTD_CONFIG environment variable) or falls back to defaults.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::{info, warn};

/// Config file path.
pub const CONFIG_PATH: &str = "/etc/harvestd/config.toml";

/// Daemon configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Address the HTTP server binds to.
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// Path of the SQLite ledger database.
    #[serde(default = "default_db_path")]
    pub db_path: String,

    /// Default leaderboard size.
    #[serde(default = "default_ranking_limit")]
    pub ranking_limit: i64,
}

fn default_bind_addr() -> String {
    // Localhost only; fronting proxies handle external exposure.
    "127.0.0.1:7860".to_string()
}

fn default_db_path() -> String {
    harvest_core::ledger::LEDGER_DB_PATH.to_string()
}

fn default_ranking_limit() -> i64 {
    harvest_core::service::DEFAULT_RANKING_LIMIT
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            db_path: default_db_path(),
            ranking_limit: default_ranking_limit(),
        }
    }
}

impl Config {
    /// Load the config file, falling back to defaults when it is missing.
    pub fn load() -> Result<Self> {
        let path = std::env::var("HARVESTD_CONFIG").unwrap_or_else(|_| CONFIG_PATH.to_string());
        Self::load_from(Path::new(&path))
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            warn!(
                "Config file {} not found, using defaults",
                path.display()
            );
            return Ok(Self::default());
        }

        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        let config: Config = toml::from_str(&raw)
            .with_context(|| format!("failed to parse config file {}", path.display()))?;

        info!("Loaded config from {}", path.display());
        Ok(config)
    }
}
