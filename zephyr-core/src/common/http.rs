//! HTTP Client Utilities
//!
//! One place to build the reqwest client used for registry, token exchange
//! and manifest requests.

use std::time::Duration;

use super::error::ZephyrError;

const USER_AGENT: &str = concat!("zephyr-core/", env!("CARGO_PKG_VERSION"));

/// Client with the crate user agent and a whole-request timeout
pub fn create_http_client_with_timeout(timeout: Duration) -> Result<reqwest::Client, ZephyrError> {
    reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(USER_AGENT)
        .build()
        .map_err(|e| ZephyrError::invalid_config(format!("Failed to build HTTP client: {}", e)))
}
