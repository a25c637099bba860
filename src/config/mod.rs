//! Configuration management
//!
//! This module handles loading and parsing configuration for the Pressnote server.
//! Configuration is read from a `config.yml` file; a missing file or missing
//! optional values fall back to sensible defaults.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,
    /// Database configuration
    #[serde(default)]
    pub database: DatabaseConfig,
    /// News feed configuration
    #[serde(default)]
    pub news: NewsConfig,
    /// Authentication configuration
    #[serde(default)]
    pub auth: AuthConfig,
}

impl Config {
    /// Load configuration from a YAML file.
    ///
    /// A missing file is not an error: defaults are used so the server can
    /// start with zero configuration.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::info!("No config file at {:?}, using defaults", path);
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        let config: Config = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", path))?;
        Ok(config)
    }
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host address to bind to
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// SQLite database file path, or `:memory:` for an in-memory database
    #[serde(default = "default_database_url")]
    pub url: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: default_database_url(),
        }
    }
}

fn default_database_url() -> String {
    "data/pressnote.db".to_string()
}

/// News feed configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewsConfig {
    /// Maximum number of articles shown on the home page
    #[serde(default = "default_home_page_size")]
    pub home_page_size: i64,
}

impl Default for NewsConfig {
    fn default() -> Self {
        Self {
            home_page_size: default_home_page_size(),
        }
    }
}

fn default_home_page_size() -> i64 {
    10
}

/// Authentication configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Session lifetime in days
    #[serde(default = "default_session_expiration_days")]
    pub session_expiration_days: i64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            session_expiration_days: default_session_expiration_days(),
        }
    }
}

fn default_session_expiration_days() -> i64 {
    7
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.database.url, "data/pressnote.db");
        assert_eq!(config.news.home_page_size, 10);
        assert_eq!(config.auth.session_expiration_days, 7);
    }

    #[test]
    fn test_partial_yaml_uses_defaults() {
        let yaml = "server:\n  port: 9000\n";
        let config: Config = serde_yaml::from_str(yaml).expect("Failed to parse config");
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.news.home_page_size, 10);
    }

    #[test]
    fn test_config_roundtrip() {
        let config = Config::default();
        let yaml = serde_yaml::to_string(&config).expect("Failed to serialize config");
        let parsed: Config = serde_yaml::from_str(&yaml).expect("Failed to deserialize config");
        assert_eq!(parsed.news.home_page_size, config.news.home_page_size);
        assert_eq!(parsed.database.url, config.database.url);
    }

    #[test]
    fn test_load_missing_file_returns_defaults() {
        let config =
            Config::load(Path::new("/nonexistent/config.yml")).expect("Load should not fail");
        assert_eq!(config.server.port, 8080);
    }
}
