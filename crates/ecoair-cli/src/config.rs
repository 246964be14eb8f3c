//! Configuration file management.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use ecoair_store::{BackendChoice, StoreConfig};
use serde::{Deserialize, Serialize};

use crate::cli::OutputFormat;

/// Configuration file structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Default output format
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<OutputFormat>,

    /// Disable colored output
    #[serde(default)]
    pub no_color: bool,

    /// Storage location, backend and retention limits
    #[serde(default)]
    pub storage: StoreConfig,
}

impl Config {
    /// Get the config file path
    pub fn path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("ecoair")
            .join("config.toml")
    }

    /// Load config from the default path, or return default if not found
    pub fn load() -> Self {
        Self::load_from(&Self::path())
    }

    /// Load config from `path`, or return default if missing or unreadable
    pub fn load_from(path: &Path) -> Self {
        if path.exists() {
            match fs::read_to_string(path) {
                Ok(content) => match toml::from_str(&content) {
                    Ok(config) => return config,
                    Err(e) => {
                        eprintln!("Warning: Failed to parse config: {}", e);
                    }
                },
                Err(e) => {
                    eprintln!("Warning: Failed to read config: {}", e);
                }
            }
        }
        Self::default()
    }

    /// Save config to `path`
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }
        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(path, content)
            .with_context(|| format!("Failed to write config: {}", path.display()))?;
        Ok(())
    }

    /// Storage settings with command-line overrides applied.
    pub fn store_config(
        &self,
        data_dir: Option<PathBuf>,
        backend: Option<BackendChoice>,
    ) -> StoreConfig {
        let mut storage = self.storage.clone();
        if let Some(dir) = data_dir {
            storage.data_dir = Some(dir);
        }
        if let Some(backend) = backend {
            storage.backend = backend;
        }
        storage
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_file_gives_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert!(config.format.is_none());
        assert!(!config.no_color);
        assert_eq!(config.storage, StoreConfig::default());
    }

    #[test]
    fn test_partial_storage_section() {
        let config: Config = toml::from_str(
            r#"
            format = "json"

            [storage]
            backend = "key_value"

            [storage.limits]
            max_favorites = 5
            "#,
        )
        .unwrap();

        assert_eq!(config.format, Some(OutputFormat::Json));
        assert_eq!(config.storage.backend, BackendChoice::KeyValue);
        assert_eq!(config.storage.limits.max_favorites, 5);
        assert_eq!(config.storage.limits.search_history_cap, 50);
        assert_eq!(config.storage.namespace, "ecoair");
    }

    #[test]
    fn test_overrides_win_over_file() {
        let config = Config {
            storage: StoreConfig::at("/from/file"),
            ..Default::default()
        };

        let storage = config.store_config(
            Some(PathBuf::from("/from/flag")),
            Some(BackendChoice::Relational),
        );
        assert_eq!(storage.data_dir, Some(PathBuf::from("/from/flag")));
        assert_eq!(storage.backend, BackendChoice::Relational);

        let untouched = config.store_config(None, None);
        assert_eq!(untouched.data_dir, Some(PathBuf::from("/from/file")));
        assert_eq!(untouched.backend, BackendChoice::Auto);
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let mut config = Config {
            no_color: true,
            ..Default::default()
        };
        config.storage.limits.cache_ttl_minutes = 5;

        config.save_to(&path).unwrap();
        let loaded = Config::load_from(&path);
        assert!(loaded.no_color);
        assert_eq!(loaded.storage.limits.cache_ttl_minutes, 5);
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let loaded = Config::load_from(&dir.path().join("absent.toml"));
        assert!(!loaded.no_color);
    }
}
