//! Server Token Exchange
//!
//! Trades a long-lived `ZE_SERVER_TOKEN` plus the acting user's email for a
//! short-lived access token.

use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::common::{ZephyrError, ZephyrResult};

#[derive(Serialize)]
struct ExchangeRequest<'a> {
    server_token: &'a str,
    user_email: &'a str,
}

#[derive(Deserialize)]
struct ExchangeResponse {
    #[serde(alias = "token")]
    access_token: String,
}

pub struct ServerTokenExchange {
    http: reqwest::Client,
    url: String,
}

impl ServerTokenExchange {
    pub fn new(http: reqwest::Client, url: impl Into<String>) -> Self {
        Self {
            http,
            url: url.into(),
        }
    }

    /// POST the server token and return the access token.
    ///
    /// **SECURITY:** secrets travel in the request body only and are never
    /// logged.
    pub async fn exchange(&self, server_token: &str, user_email: &str) -> ZephyrResult<String> {
        info!("Exchanging server token for {}", user_email);

        let response = self
            .http
            .post(&self.url)
            .json(&ExchangeRequest {
                server_token,
                user_email,
            })
            .send()
            .await
            .map_err(|e| ZephyrError::token_exchange_failed(format!("HTTP request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read error response".to_string());
            error!("Token exchange returned HTTP {}", status);
            return Err(ZephyrError::token_exchange_failed(format!(
                "HTTP {} error: {}",
                status, body
            )));
        }

        let parsed: ExchangeResponse = response.json().await.map_err(|e| {
            ZephyrError::token_exchange_failed(format!("Invalid token exchange response: {}", e))
        })?;

        if parsed.access_token.trim().is_empty() {
            return Err(ZephyrError::token_exchange_failed("Empty access_token in response"));
        }

        Ok(parsed.access_token)
    }
}
