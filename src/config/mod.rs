//! Configuration management for basket
//!
//! Handles the ~/.basket/ directory structure and config.toml

mod logging;

pub use logging::LoggingConfig;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::models::DEFAULT_UNIT;

/// Where collections are persisted
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// One JSON file per collection under `data/`
    #[default]
    Json,
    /// Key-value table in `db/basket.db`
    Sqlite,
}

impl std::fmt::Display for Backend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Backend::Json => write!(f, "json"),
            Backend::Sqlite => write!(f, "sqlite"),
        }
    }
}

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub backend: Backend,
    #[serde(default = "default_unit")]
    pub default_unit: String,
    #[serde(default)]
    pub logging: LoggingConfig,
}

fn default_unit() -> String {
    DEFAULT_UNIT.to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backend: Backend::default(),
            default_unit: default_unit(),
            logging: LoggingConfig::default(),
        }
    }
}

/// Returns the path to the basket home directory
///
/// `BASKET_HOME` overrides the default of ~/.basket
pub fn basket_home() -> Result<PathBuf> {
    if let Some(home) = std::env::var_os("BASKET_HOME") {
        return Ok(PathBuf::from(home));
    }
    let home = dirs::home_dir().context("Could not determine home directory")?;
    Ok(home.join(".basket"))
}

/// Returns paths to all basket directories
#[derive(Debug, Clone)]
pub struct BasketPaths {
    pub root: PathBuf,
    pub config: PathBuf,
    pub data: PathBuf,
    pub db: PathBuf,
    pub db_file: PathBuf,
    pub exports: PathBuf,
}

impl BasketPaths {
    pub fn new() -> Result<Self> {
        Ok(Self::at(basket_home()?))
    }

    /// Layout rooted at an arbitrary directory
    pub fn at(root: impl AsRef<Path>) -> Self {
        let root = root.as_ref().to_path_buf();
        Self {
            config: root.join("config.toml"),
            data: root.join("data"),
            db: root.join("db"),
            db_file: root.join("db/basket.db"),
            exports: root.join("exports"),
            root,
        }
    }

    /// Create all directories if they don't exist
    pub fn ensure_dirs(&self) -> Result<()> {
        fs::create_dir_all(&self.root).context("Failed to create basket root")?;
        fs::create_dir_all(&self.data).context("Failed to create data directory")?;
        fs::create_dir_all(&self.db).context("Failed to create db directory")?;
        fs::create_dir_all(&self.exports).context("Failed to create exports directory")?;
        Ok(())
    }

    /// Check if basket has been initialized
    pub fn is_initialized(&self) -> bool {
        self.config.exists()
    }
}

/// Load configuration from disk, falling back to defaults when absent
pub fn load_config(paths: &BasketPaths) -> Result<Config> {
    if !paths.config.exists() {
        return Ok(Config::default());
    }
    let content = fs::read_to_string(&paths.config).context("Failed to read config.toml")?;
    toml::from_str(&content).context("Failed to parse config.toml")
}

/// Save configuration to disk
pub fn save_config(paths: &BasketPaths, config: &Config) -> Result<()> {
    let content = toml::to_string_pretty(config).context("Failed to serialize config")?;
    fs::write(&paths.config, content).context("Failed to write config.toml")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: Config = toml::from_str("backend = \"sqlite\"\n").unwrap();
        assert_eq!(config.backend, Backend::Sqlite);
        assert_eq!(config.default_unit, "pcs");
        assert_eq!(config.logging.level, "warn");
    }

    #[test]
    fn test_config_round_trip_on_disk() -> Result<()> {
        let temp = TempDir::new()?;
        let paths = BasketPaths::at(temp.path());
        paths.ensure_dirs()?;
        assert!(!paths.is_initialized());

        let mut config = Config::default();
        config.default_unit = "kg".to_string();
        save_config(&paths, &config)?;

        assert!(paths.is_initialized());
        let loaded = load_config(&paths)?;
        assert_eq!(loaded.default_unit, "kg");
        assert_eq!(loaded.backend, Backend::Json);
        Ok(())
    }
}
