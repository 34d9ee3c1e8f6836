//! Application configuration with layered loading.
//!
//! This module provides configuration management using figment for layered
//! configuration loading from multiple sources:
//!
//! 1. Environment variables (URL_CACHE_*)
//! 2. TOML config file (if URL_CACHE_CONFIG_FILE set)
//! 3. Built-in defaults

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

mod validation;

pub use validation::ConfigError;

/// Application configuration with layered loading.
///
/// Loading precedence (highest wins):
/// 1. Environment variables (URL_CACHE_*)
/// 2. TOML config file (if URL_CACHE_CONFIG_FILE set)
/// 3. Built-in defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Object-store bucket new entries are written to.
    ///
    /// Set via URL_CACHE_BUCKET environment variable.
    #[serde(default = "default_bucket")]
    pub bucket: String,

    /// Metadata table holding one record per cached URL.
    ///
    /// Set via URL_CACHE_TABLE environment variable.
    #[serde(default = "default_table")]
    pub table: String,

    /// Path to the SQLite database backing both stores.
    ///
    /// Set via URL_CACHE_DB_PATH environment variable.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// User-Agent string for origin requests.
    ///
    /// Set via URL_CACHE_USER_AGENT environment variable.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// HTTP request timeout in milliseconds.
    ///
    /// Set via URL_CACHE_TIMEOUT_MS environment variable.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Maximum number of redirects followed per request.
    ///
    /// Set via URL_CACHE_MAX_REDIRECTS environment variable.
    #[serde(default = "default_max_redirects")]
    pub max_redirects: usize,
}

fn default_bucket() -> String {
    "url-cache".into()
}

fn default_table() -> String {
    "url-cache".into()
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./url-cache.sqlite")
}

fn default_user_agent() -> String {
    "url-cache/0.1".into()
}

fn default_timeout_ms() -> u64 {
    20_000
}

fn default_max_redirects() -> usize {
    10
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bucket: default_bucket(),
            table: default_table(),
            db_path: default_db_path(),
            user_agent: default_user_agent(),
            timeout_ms: default_timeout_ms(),
            max_redirects: default_max_redirects(),
        }
    }
}

impl AppConfig {
    /// Timeout as Duration for use with reqwest/tokio.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// Priority (highest wins):
    /// 1. Environment variables prefixed with `URL_CACHE_`
    /// 2. TOML file from `URL_CACHE_CONFIG_FILE` (if set)
    /// 3. Built-in defaults via `Default::default()`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - Configuration file cannot be read
    /// - Environment variables cannot be parsed
    /// - Validation fails after loading
    pub fn load() -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Ok(config_path) = std::env::var("URL_CACHE_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment = figment.merge(Env::prefixed("URL_CACHE_").map(|key| key.as_str().to_lowercase().into()));

        Self::extract(figment)
    }

    /// Load configuration from a TOML string layered over the defaults.
    pub fn from_toml(toml: &str) -> Result<Self, ConfigError> {
        Self::extract(Figment::from(Serialized::defaults(Self::default())).merge(Toml::string(toml)))
    }

    fn extract(figment: Figment) -> Result<Self, ConfigError> {
        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.bucket, "url-cache");
        assert_eq!(config.table, "url-cache");
        assert_eq!(config.db_path, PathBuf::from("./url-cache.sqlite"));
        assert_eq!(config.user_agent, "url-cache/0.1");
        assert_eq!(config.timeout_ms, 20_000);
        assert_eq!(config.max_redirects, 10);
    }

    #[test]
    fn test_timeout_duration() {
        let config = AppConfig::default();
        assert_eq!(config.timeout(), Duration::from_millis(20_000));
    }

    #[test]
    fn test_from_toml_overrides_defaults() {
        let config = AppConfig::from_toml(
            r#"
            bucket = "assets.example"
            table = "UrlCache"
            timeout_ms = 5000
            "#,
        )
        .unwrap();
        assert_eq!(config.bucket, "assets.example");
        assert_eq!(config.table, "UrlCache");
        assert_eq!(config.timeout_ms, 5000);
        assert_eq!(config.user_agent, "url-cache/0.1");
    }

    #[test]
    fn test_from_toml_rejects_invalid_values() {
        let result = AppConfig::from_toml(r#"bucket = "Bad_Bucket""#);
        assert!(matches!(result, Err(ConfigError::Invalid { field, .. }) if field == "bucket"));
    }

    #[test]
    fn test_from_toml_rejects_wrong_types() {
        let result = AppConfig::from_toml(r#"timeout_ms = "soon""#);
        assert!(matches!(result, Err(ConfigError::LoadFailed(_))));
    }
}
