use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{AppError, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Base URL of the hosted store, e.g. "https://xyzcompany.example.co"
    #[serde(default)]
    pub backend_url: String,

    /// Anonymous API key; sent as both `apikey` and bearer token.
    #[serde(default)]
    pub api_key: String,

    #[serde(default = "default_table_name")]
    pub table_name: String,

    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,
}

fn default_table_name() -> String {
    "articles".to_string()
}

fn default_poll_interval() -> u64 {
    30
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backend_url: String::new(),
            api_key: String::new(),
            table_name: default_table_name(),
            poll_interval_secs: default_poll_interval(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path())
    }

    fn load_from(config_path: &Path) -> Result<Self> {
        if config_path.exists() {
            let content = std::fs::read_to_string(config_path)?;
            let config: Config = toml::from_str(&content)?;
            Ok(config)
        } else {
            let config = Config::default();
            config.save_to(config_path)?;
            Ok(config)
        }
    }

    fn save_to(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| AppError::Config(e.to_string()))?;
        std::fs::write(config_path, content)?;
        Ok(())
    }

    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("article-shelf")
            .join("config.toml")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_creates_default_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let config = Config::load_from(&path).unwrap();
        assert!(path.exists());
        assert_eq!(config.table_name, "articles");
        assert_eq!(config.poll_interval_secs, 30);
        assert!(config.backend_url.is_empty());
    }

    #[test]
    fn round_trip_preserves_fields() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let config = Config {
            backend_url: "https://store.example.co".to_string(),
            api_key: "anon-key".to_string(),
            table_name: "superbase_articles".to_string(),
            poll_interval_secs: 10,
        };
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.backend_url, config.backend_url);
        assert_eq!(loaded.api_key, config.api_key);
        assert_eq!(loaded.table_name, config.table_name);
        assert_eq!(loaded.poll_interval_secs, 10);
    }

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "backend_url = \"https://store.example.co\"\n").unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.backend_url, "https://store.example.co");
        assert_eq!(config.table_name, "articles");
        assert_eq!(config.poll_interval_secs, 30);
    }
}
