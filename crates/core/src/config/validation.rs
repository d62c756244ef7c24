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
    /// Returns `ConfigError::Invalid` if:
    /// - `timeout_ms` is less than 100ms or exceeds 5 minutes
    /// - either TTL is not positive
    /// - `compress_threshold` is 0
    /// - `batch_cap` is outside [1, 1000]
    /// - `max_search_limit` is 0
    /// - `max_attempts` is 0 or `window_seconds` is 0
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.timeout_ms < 100 {
            return Err(ConfigError::Invalid { field: "timeout_ms".into(), reason: "must be at least 100ms".into() });
        }
        if self.timeout_ms > 300_000 {
            return Err(ConfigError::Invalid {
                field: "timeout_ms".into(),
                reason: "must not exceed 5 minutes (300000ms)".into(),
            });
        }

        if self.entity_ttl_secs <= 0 {
            return Err(ConfigError::Invalid { field: "entity_ttl_secs".into(), reason: "must be positive".into() });
        }
        if self.search_ttl_secs <= 0 {
            return Err(ConfigError::Invalid { field: "search_ttl_secs".into(), reason: "must be positive".into() });
        }

        if self.compress_threshold == 0 {
            return Err(ConfigError::Invalid {
                field: "compress_threshold".into(),
                reason: "must be greater than 0".into(),
            });
        }

        if self.batch_cap == 0 || self.batch_cap > 1000 {
            return Err(ConfigError::Invalid { field: "batch_cap".into(), reason: "must be within [1, 1000]".into() });
        }

        if self.max_search_limit == 0 {
            return Err(ConfigError::Invalid {
                field: "max_search_limit".into(),
                reason: "must be greater than 0".into(),
            });
        }

        if self.max_attempts == 0 {
            return Err(ConfigError::Invalid { field: "max_attempts".into(), reason: "must be at least 1".into() });
        }
        if self.window_seconds == 0 {
            return Err(ConfigError::Invalid { field: "window_seconds".into(), reason: "must be positive".into() });
        }

        if self.similar_keyword_count == 0 {
            tracing::warn!("similar_keyword_count is 0; similar-job resolution will always be empty");
        }

        Ok(())
    }
}
