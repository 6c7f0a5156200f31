//! Registry Auth
//!
//! Finds the bearer token for registry calls. Order: explicit option, then
//! `ZE_SECRET_TOKEN` / `ZE_AUTH_TOKEN` / `ZE_TOKEN`, then a server-token
//! exchange.

pub mod exchange;

use std::fmt;
use tracing::{debug, info};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::common::env::{self, Environment, TOKEN_VARS};
use crate::common::{ZephyrError, ZephyrResult};

pub use exchange::ServerTokenExchange;

/// Where a token came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenSource {
    Explicit,
    Environment(&'static str),
    ServerTokenExchange,
}

/// Bearer token, wiped from memory on drop
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct AuthToken {
    value: String,
    #[zeroize(skip)]
    source: TokenSource,
}

// Custom Debug implementation that redacts the token
impl fmt::Debug for AuthToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthToken")
            .field("value", &"[REDACTED]")
            .field("source", &self.source)
            .finish()
    }
}

impl AuthToken {
    pub fn new(value: impl Into<String>, source: TokenSource) -> Self {
        Self {
            value: value.into(),
            source,
        }
    }

    pub fn expose(&self) -> &str {
        &self.value
    }

    pub fn source(&self) -> &TokenSource {
        &self.source
    }
}

pub struct TokenResolver {
    environment: Environment,
    exchange: ServerTokenExchange,
}

impl TokenResolver {
    pub fn new(environment: Environment, exchange: ServerTokenExchange) -> Self {
        Self {
            environment,
            exchange,
        }
    }

    /// Resolve a token, preferring `explicit`.
    ///
    /// Fails when no source yields a token; callers only ask when a registry
    /// call is actually needed.
    pub async fn resolve(&self, explicit: Option<&str>) -> ZephyrResult<AuthToken> {
        if let Some(token) = explicit.map(str::trim).filter(|t| !t.is_empty()) {
            debug!("Using explicitly configured auth token");
            return Ok(AuthToken::new(token, TokenSource::Explicit));
        }

        if let Some((name, token)) = self.environment.first_of(&TOKEN_VARS) {
            debug!("Using auth token from {}", name);
            return Ok(AuthToken::new(token, TokenSource::Environment(name)));
        }

        if let Some(server_token) = self.environment.get(env::ZE_SERVER_TOKEN) {
            let email = self
                .environment
                .get(env::ZE_USER_EMAIL)
                .ok_or_else(ZephyrError::missing_user_email)?;
            let token = self.exchange.exchange(server_token, email).await?;
            info!("Obtained access token through server token exchange");
            return Ok(AuthToken::new(token, TokenSource::ServerTokenExchange));
        }

        Err(ZephyrError::missing_auth_token())
    }
}
