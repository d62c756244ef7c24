//! Application configuration with layered loading.
//!
//! This module provides configuration management using figment for layered
//! configuration loading from multiple sources:
//!
//! 1. Environment variables (CHOMMIE_*)
//! 2. TOML config file (if CHOMMIE_CONFIG_FILE set)
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
/// 1. Environment variables (CHOMMIE_*)
/// 2. TOML config file (if CHOMMIE_CONFIG_FILE set)
/// 3. Built-in defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Base URL of the hosted data service REST endpoint.
    ///
    /// Set via CHOMMIE_STORE_BASE_URL environment variable.
    /// Required only when the REST backend is constructed.
    #[serde(default)]
    pub store_base_url: Option<String>,

    /// API key for the hosted data service.
    ///
    /// Set via CHOMMIE_STORE_API_KEY environment variable.
    #[serde(default)]
    pub store_api_key: Option<String>,

    /// Path to the SQLite cache database.
    ///
    /// Set via CHOMMIE_DB_PATH environment variable.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// Store request timeout in milliseconds.
    ///
    /// Set via CHOMMIE_TIMEOUT_MS environment variable.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Retry attempts for transient store failures.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Initial backoff between retries in milliseconds; doubles per attempt.
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,

    /// TTL for individual entity lookups, in seconds.
    #[serde(default = "default_entity_ttl_secs")]
    pub entity_ttl_secs: i64,

    /// TTL for composite search/trending results, in seconds.
    #[serde(default = "default_search_ttl_secs")]
    pub search_ttl_secs: i64,

    /// Serialized size above which cache values are compressed, in bytes.
    #[serde(default = "default_compress_threshold")]
    pub compress_threshold: usize,

    /// Hard ceiling on search result size regardless of caller request.
    #[serde(default = "default_max_search_limit")]
    pub max_search_limit: usize,

    /// Maximum identifiers per batched in-set store request.
    #[serde(default = "default_batch_cap")]
    pub batch_cap: usize,

    /// Keywords used when resolving similar jobs.
    #[serde(default = "default_similar_keyword_count")]
    pub similar_keyword_count: usize,

    /// Failed attempts tolerated before an actor is locked out.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Lockout window length in seconds.
    #[serde(default = "default_window_seconds")]
    pub window_seconds: u64,
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./chommie-cache.sqlite")
}

fn default_timeout_ms() -> u64 {
    10_000
}

fn default_max_retries() -> u32 {
    2
}

fn default_retry_backoff_ms() -> u64 {
    200
}

fn default_entity_ttl_secs() -> i64 {
    1800
}

fn default_search_ttl_secs() -> i64 {
    300
}

fn default_compress_threshold() -> usize {
    4096
}

fn default_max_search_limit() -> usize {
    100
}

fn default_batch_cap() -> usize {
    500
}

fn default_similar_keyword_count() -> usize {
    3
}

fn default_max_attempts() -> u32 {
    5
}

fn default_window_seconds() -> u64 {
    900
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            store_base_url: None,
            store_api_key: None,
            db_path: default_db_path(),
            timeout_ms: default_timeout_ms(),
            max_retries: default_max_retries(),
            retry_backoff_ms: default_retry_backoff_ms(),
            entity_ttl_secs: default_entity_ttl_secs(),
            search_ttl_secs: default_search_ttl_secs(),
            compress_threshold: default_compress_threshold(),
            max_search_limit: default_max_search_limit(),
            batch_cap: default_batch_cap(),
            similar_keyword_count: default_similar_keyword_count(),
            max_attempts: default_max_attempts(),
            window_seconds: default_window_seconds(),
        }
    }
}

impl AppConfig {
    /// Timeout as Duration for use with reqwest/tokio.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Lockout window as Duration.
    pub fn window(&self) -> Duration {
        Duration::from_secs(self.window_seconds)
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// Priority (highest wins):
    /// 1. Environment variables prefixed with `CHOMMIE_`
    /// 2. TOML file from `CHOMMIE_CONFIG_FILE` (if set)
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

        if let Ok(config_path) = std::env::var("CHOMMIE_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment = figment.merge(
            Env::prefixed("CHOMMIE_")
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        );

        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }

    /// Check that a store base URL is configured (for deferred validation).
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Missing` if no base URL is set.
    pub fn require_store_base_url(&self) -> Result<&str, ConfigError> {
        self.store_base_url.as_deref().ok_or_else(|| ConfigError::Missing {
            field: "store_base_url".into(),
            hint: "Set CHOMMIE_STORE_BASE_URL environment variable".into(),
        })
    }
}
