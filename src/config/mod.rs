//! # Configuration Management Module
//!
//! Luxhouse reads one TOML file at startup. It is organized into sections:
//!
//! - [`StorageConfig`] - where the sled database with player records lives
//! - [`LoggingConfig`] - log level and optional log file
//! - `hub` - the transit hub waypoint (a [`MapPoint`])
//! - `houses` - the house catalog, one table per [`HouseDefinition`]
//!
//! Missing `hub` and `houses` sections fall back to the shipped world, so a minimal
//! file only needs `[storage]` and `[logging]`.
//!
//! ```toml
//! [storage]
//! data_dir = "./data"
//!
//! [logging]
//! level = "info"
//! file = "luxhouse.log"
//! ```
//!
//! The catalog is built from the configuration once, via [`Config::catalog`], and then
//! passed by reference to every ledger.

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tokio::fs;

use crate::housing::catalog::{default_houses, default_hub, HouseCatalog};
use crate::housing::errors::LeaseError;
use crate::housing::types::{HouseDefinition, MapPoint};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub storage: StorageConfig,
    pub logging: LoggingConfig,
    #[serde(default = "default_hub")]
    pub hub: MapPoint,
    #[serde(default = "default_houses")]
    pub houses: Vec<HouseDefinition>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub data_dir: String,
    /// Optional override for the sled database path; defaults to `<data_dir>/houses`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub db_path: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub file: Option<String>,
}

impl LoggingConfig {
    /// Parsed `level`; unknown values fall back to info.
    pub fn level_filter(&self) -> log::LevelFilter {
        match self.level.to_ascii_lowercase().as_str() {
            "off" => log::LevelFilter::Off,
            "error" => log::LevelFilter::Error,
            "warn" | "warning" => log::LevelFilter::Warn,
            "debug" => log::LevelFilter::Debug,
            "trace" => log::LevelFilter::Trace,
            _ => log::LevelFilter::Info,
        }
    }
}

impl Config {
    /// Load configuration from a file
    pub async fn load(path: &str) -> Result<Self> {
        let content = fs::read_to_string(path)
            .await
            .map_err(|e| anyhow!("Failed to read config file {}: {}", path, e))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| anyhow!("Failed to parse config file {}: {}", path, e))?;

        Ok(config)
    }

    /// Create a default configuration file
    pub async fn create_default(path: &str) -> Result<()> {
        let config = Config::default();
        let content = toml::to_string_pretty(&config)
            .map_err(|e| anyhow!("Failed to serialize default config: {}", e))?;

        fs::write(path, content)
            .await
            .map_err(|e| anyhow!("Failed to write config file {}: {}", path, e))?;

        Ok(())
    }

    /// Build the immutable house catalog described by this configuration.
    pub fn catalog(&self) -> Result<HouseCatalog, LeaseError> {
        HouseCatalog::new(self.houses.clone(), self.hub.clone())
    }

    pub fn store_path(&self) -> PathBuf {
        match &self.storage.db_path {
            Some(path) => PathBuf::from(path),
            None => PathBuf::from(&self.storage.data_dir).join("houses"),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            storage: StorageConfig {
                data_dir: "./data".to_string(),
                db_path: None,
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                file: Some("luxhouse.log".to_string()),
            },
            hub: default_hub(),
            houses: default_houses(),
        }
    }
}
