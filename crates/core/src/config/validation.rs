//! Configuration validation rules.
//!
//! This module provides validation logic for `AppConfig` values
//! after they have been loaded from environment, files, or defaults.

use crate::config::AppConfig;
use thiserror::Error;

/// Configuration validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    LoadFailed(String),

    #[error("invalid configuration: {field} - {reason}")]
    Invalid { field: String, reason: String },

    #[error("missing required configuration: {field} ({hint})")]
    Missing { field: String, hint: String },
}

impl AppConfig {
    /// Validate configuration values after loading.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Missing` if `bucket` or `table` is empty, and
    /// `ConfigError::Invalid` if:
    /// - `bucket` is not 3-63 chars of lowercase letters, digits, `.` or `-`,
    ///   starting and ending with a letter or digit
    /// - `table` is not 3-255 chars of letters, digits, `_`, `.` or `-`
    /// - `timeout_ms` is less than 100ms or exceeds 5 minutes
    /// - `max_redirects` exceeds 20
    /// - `user_agent` is empty
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.bucket.is_empty() {
            return Err(ConfigError::Missing { field: "bucket".into(), hint: "Set URL_CACHE_BUCKET".into() });
        }
        validate_bucket(&self.bucket)?;

        if self.table.is_empty() {
            return Err(ConfigError::Missing { field: "table".into(), hint: "Set URL_CACHE_TABLE".into() });
        }
        validate_table(&self.table)?;

        if self.timeout_ms < 100 {
            return Err(ConfigError::Invalid { field: "timeout_ms".into(), reason: "must be at least 100ms".into() });
        }
        if self.timeout_ms > 300_000 {
            return Err(ConfigError::Invalid {
                field: "timeout_ms".into(),
                reason: "must not exceed 5 minutes (300000ms)".into(),
            });
        }

        if self.max_redirects > 20 {
            return Err(ConfigError::Invalid { field: "max_redirects".into(), reason: "must not exceed 20".into() });
        }

        if self.user_agent.is_empty() {
            return Err(ConfigError::Invalid { field: "user_agent".into(), reason: "must not be empty".into() });
        }

        Ok(())
    }
}

fn validate_bucket(bucket: &str) -> Result<(), ConfigError> {
    let invalid = |reason: &str| ConfigError::Invalid { field: "bucket".into(), reason: reason.into() };

    if !(3..=63).contains(&bucket.len()) {
        return Err(invalid("must be 3-63 characters"));
    }
    if !bucket
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '.' || c == '-')
    {
        return Err(invalid("only lowercase letters, digits, '.' and '-' are allowed"));
    }
    let edge_ok = |c: Option<char>| c.is_some_and(|c| c.is_ascii_lowercase() || c.is_ascii_digit());
    if !edge_ok(bucket.chars().next()) || !edge_ok(bucket.chars().last()) {
        return Err(invalid("must start and end with a letter or digit"));
    }

    Ok(())
}

fn validate_table(table: &str) -> Result<(), ConfigError> {
    if !(3..=255).contains(&table.len()) {
        return Err(ConfigError::Invalid { field: "table".into(), reason: "must be 3-255 characters".into() });
    }
    if !table
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.' || c == '-')
    {
        return Err(ConfigError::Invalid {
            field: "table".into(),
            reason: "only letters, digits, '_', '.' and '-' are allowed".into(),
        });
    }

    Ok(())
}
