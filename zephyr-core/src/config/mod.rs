//! Configuration management
//!
//! Registry and runtime settings: defaults, an optional JSON file, then the
//! `ZE_*` environment.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::debug;

use crate::common::env::{self, Environment};
use crate::common::{ZephyrError, ZephyrResult};

pub const DEFAULT_API_BASE_URL: &str = "https://api.zephyr-cloud.io";
pub const DEFAULT_TOKEN_EXCHANGE_PATH: &str = "/v2/auth/server-token/exchange";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Build-time registry settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ZephyrConfig {
    pub api_base_url: String,
    pub token_exchange_path: String,
    pub request_timeout_secs: u64,
    pub manifest_filename: String,
}

impl Default for ZephyrConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            token_exchange_path: DEFAULT_TOKEN_EXCHANGE_PATH.to_string(),
            request_timeout_secs: DEFAULT_TIMEOUT_SECS,
            manifest_filename: zephyr_protocol::MANIFEST_FILENAME.to_string(),
        }
    }
}

impl ZephyrConfig {
    /// Defaults overlaid by the environment
    pub fn from_env(environment: &Environment) -> ZephyrResult<Self> {
        let mut config = Self::default();
        config.apply_env(environment)?;
        Ok(config)
    }

    /// Read a JSON config file, then overlay the environment.
    ///
    /// Fields missing from the file keep their defaults.
    pub fn load(path: &Path, environment: &Environment) -> ZephyrResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ZephyrError::invalid_config(format!("Failed to read config {:?}: {}", path, e))
        })?;
        let mut config: ZephyrConfig = serde_json::from_str(&content).map_err(|e| {
            ZephyrError::invalid_config(format!("Failed to parse config {:?}: {}", path, e))
        })?;
        debug!("Loaded config from {:?}", path);
        config.apply_env(environment)?;
        Ok(config)
    }

    fn apply_env(&mut self, environment: &Environment) -> ZephyrResult<()> {
        if let Some(base) = environment.get(env::ZE_API) {
            self.api_base_url = base.to_string();
        }
        if let Some(raw) = environment.get(env::ZE_API_TIMEOUT_SECS) {
            self.request_timeout_secs = raw.parse().map_err(|_| {
                ZephyrError::invalid_config(format!(
                    "{} must be a whole number of seconds, got '{}'",
                    env::ZE_API_TIMEOUT_SECS,
                    raw
                ))
            })?;
        }
        self.validate()
    }

    pub fn validate(&self) -> ZephyrResult<()> {
        let base = url::Url::parse(&self.api_base_url).map_err(|e| {
            ZephyrError::invalid_config(format!("Invalid API base URL '{}': {}", self.api_base_url, e))
        })?;
        if !matches!(base.scheme(), "http" | "https") {
            return Err(ZephyrError::invalid_config(format!(
                "API base URL must be http(s): {}",
                self.api_base_url
            )));
        }
        if self.request_timeout_secs == 0 {
            return Err(ZephyrError::invalid_config("Request timeout cannot be zero"));
        }
        Ok(())
    }

    /// Base URL without a trailing slash
    pub fn api_base(&self) -> &str {
        self.api_base_url.trim_end_matches('/')
    }

    pub fn token_exchange_url(&self) -> String {
        format!(
            "{}/{}",
            self.api_base(),
            self.token_exchange_path.trim_start_matches('/')
        )
    }
}

/// Runtime manifest client settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestClientConfig {
    /// Absolute URL of the consumer's `zephyr-manifest.json`
    pub manifest_url: String,
    /// The consumer's own application uid, used as the cache key
    pub application_uid: String,
    pub timeout: Duration,
}

impl ManifestClientConfig {
    pub fn new(manifest_url: impl Into<String>, application_uid: impl Into<String>) -> Self {
        Self {
            manifest_url: manifest_url.into(),
            application_uid: application_uid.into(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}
