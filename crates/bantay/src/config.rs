//! Configuration management.
//!
//! Configuration loading and validation using figment, supporting a TOML
//! config file, environment variables, and defaults.

use std::path::PathBuf;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::model::AreaFilter;

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "config.toml";

/// Default data directory name.
const DATA_DIR_NAME: &str = "bantay";

/// Default fallback cache database file name.
const CACHE_FILE_NAME: &str = "fallback.db";

/// Application configuration.
///
/// Loaded from (in order of precedence, highest first):
/// 1. Environment variables (prefixed with `BANTAY_`)
/// 2. TOML config file at `~/.config/bantay/config.toml`
/// 3. Default values
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Fallback cache configuration.
    pub cache: CacheConfig,
    /// Snapshot defaults.
    pub snapshot: SnapshotConfig,
}

/// Fallback cache configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Path to the snapshot database file.
    /// Defaults to `~/.local/share/bantay/fallback.db`
    pub database_path: Option<PathBuf>,
}

/// Default scoping for snapshot computations.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SnapshotConfig {
    /// Default municipality filter. None means all municipalities.
    pub municipality: Option<String>,
    /// Default barangay filter. None means all barangays.
    pub barangay: Option<String>,
}

impl Config {
    /// Load configuration from all sources.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load configuration with an optional custom config path.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load_from(config_path: Option<PathBuf>) -> Result<Self> {
        let config_file = config_path.unwrap_or_else(Self::default_config_path);

        let figment = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(&config_file).nested())
            .merge(Env::prefixed("BANTAY_").split("_"));

        let config: Config = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Get the default configuration file path.
    #[must_use]
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from(".config"))
            .join(DATA_DIR_NAME)
            .join(CONFIG_FILE_NAME)
    }

    /// Get the default data directory path.
    #[must_use]
    pub fn default_data_dir() -> PathBuf {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from(".local/share"))
            .join(DATA_DIR_NAME)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid.
    pub fn validate(&self) -> Result<()> {
        if let Some(m) = &self.snapshot.municipality {
            if m.trim().is_empty() {
                return Err(Error::ConfigValidation {
                    message: "snapshot.municipality must not be blank".to_string(),
                });
            }
        }
        if let Some(b) = &self.snapshot.barangay {
            if b.trim().is_empty() {
                return Err(Error::ConfigValidation {
                    message: "snapshot.barangay must not be blank".to_string(),
                });
            }
        }
        Ok(())
    }

    /// Get the fallback cache path, resolving defaults if not set.
    #[must_use]
    pub fn cache_path(&self) -> PathBuf {
        self.cache
            .database_path
            .clone()
            .unwrap_or_else(|| Self::default_data_dir().join(CACHE_FILE_NAME))
    }

    /// The configured default area filter.
    #[must_use]
    pub fn default_filter(&self) -> AreaFilter {
        AreaFilter {
            municipality: self.snapshot.municipality.clone(),
            barangay: self.snapshot.barangay.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.cache.database_path.is_none());
        assert!(config.snapshot.municipality.is_none());
        assert!(config.snapshot.barangay.is_none());
    }

    #[test]
    fn test_validate_valid_config() {
        let config = Config::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_blank_municipality() {
        let mut config = Config::default();
        config.snapshot.municipality = Some("  ".to_string());

        let result = config.validate();
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("municipality"));
    }

    #[test]
    fn test_validate_blank_barangay() {
        let mut config = Config::default();
        config.snapshot.barangay = Some(String::new());

        let result = config.validate();
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("barangay"));
    }

    #[test]
    fn test_cache_path_default() {
        let config = Config::default();
        assert!(config.cache_path().to_string_lossy().contains("fallback.db"));
    }

    #[test]
    fn test_cache_path_custom() {
        let mut config = Config::default();
        config.cache.database_path = Some(PathBuf::from("/custom/path/cache.db"));
        assert_eq!(config.cache_path(), PathBuf::from("/custom/path/cache.db"));
    }

    #[test]
    fn test_default_filter() {
        let mut config = Config::default();
        assert!(config.default_filter().is_unfiltered());

        config.snapshot.municipality = Some("Camalig".to_string());
        let filter = config.default_filter();
        assert_eq!(filter.municipality.as_deref(), Some("Camalig"));
        assert!(filter.barangay.is_none());
    }

    #[test]
    fn test_default_config_path() {
        let path = Config::default_config_path();
        assert!(path.to_string_lossy().contains("bantay"));
        assert!(path.to_string_lossy().contains("config.toml"));
    }

    #[test]
    fn test_default_data_dir() {
        let path = Config::default_data_dir();
        assert!(path.to_string_lossy().contains("bantay"));
    }

    #[test]
    fn test_load_nonexistent_config() {
        // Loading from a nonexistent path should work (uses defaults).
        let result = Config::load_from(Some(PathBuf::from("/nonexistent/config.toml")));
        assert!(result.is_ok());
        assert_eq!(result.unwrap(), Config::default());
    }

    #[test]
    fn test_config_serialize() {
        let config = Config::default();
        let json = serde_json::to_string(&config).unwrap();
        assert!(json.contains("database_path"));
        assert!(json.contains("municipality"));
    }

    #[test]
    fn test_config_deserialize_partial() {
        let json = r#"{"snapshot": {"municipality": "Camalig"}}"#;
        let config: Config = serde_json::from_str(json).unwrap();
        assert_eq!(config.snapshot.municipality.as_deref(), Some("Camalig"));
        assert!(config.cache.database_path.is_none());
    }
}
