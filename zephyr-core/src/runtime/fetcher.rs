//! Manifest Fetcher
//!
//! Transport seam for the runtime client; the default fetches over HTTP.

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

use crate::common::{create_http_client_with_timeout, ZephyrError, ZephyrResult};
use zephyr_protocol::{Manifest, ProtocolError};

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("manifest request to {url} failed: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("manifest request to {url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("manifest from {url} is invalid: {source}")]
    Invalid {
        url: String,
        #[source]
        source: ProtocolError,
    },

    #[error("{0}")]
    Other(String),
}

#[async_trait]
pub trait ManifestFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<Manifest, FetchError>;
}

pub struct HttpManifestFetcher {
    http: reqwest::Client,
}

impl HttpManifestFetcher {
    pub fn new(timeout: Duration) -> ZephyrResult<Self> {
        if timeout.is_zero() {
            return Err(ZephyrError::invalid_config("Manifest timeout cannot be zero"));
        }
        Ok(Self {
            http: create_http_client_with_timeout(timeout)?,
        })
    }

    pub fn with_client(http: reqwest::Client) -> Self {
        Self { http }
    }
}

#[async_trait]
impl ManifestFetcher for HttpManifestFetcher {
    async fn fetch(&self, url: &str) -> Result<Manifest, FetchError> {
        debug!("Fetching manifest from {}", url);

        // A refresh must see the latest deploy, not an intermediary's copy
        let response = self
            .http
            .get(url)
            .header(reqwest::header::CACHE_CONTROL, "no-cache")
            .send()
            .await
            .map_err(|source| FetchError::Http {
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.text().await.map_err(|source| FetchError::Http {
            url: url.to_string(),
            source,
        })?;

        Manifest::from_json(&body).map_err(|source| FetchError::Invalid {
            url: url.to_string(),
            source,
        })
    }
}
