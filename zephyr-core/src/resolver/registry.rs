//! Registry Client
//!
//! `GET {base}/resolve/{application_uid}/{version}` against the home registry.

use serde::Deserialize;
use tracing::{debug, error};

use crate::auth::AuthToken;
use crate::common::{ZephyrError, ZephyrResult};
use zephyr_protocol::{public_path_of, ResolvedRemote};

#[derive(Debug, Deserialize)]
struct ResolveEnvelope {
    value: Option<RegistryResolution>,
}

/// The registry's view of one deployed remote
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegistryResolution {
    #[serde(default)]
    pub application_uid: Option<String>,
    #[serde(default)]
    pub remote_entry_url: Option<String>,
    #[serde(default)]
    pub default_url: Option<String>,
    #[serde(default)]
    pub public_path: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
}

impl RegistryResolution {
    /// Turn the registry answer into a [`ResolvedRemote`] named `name`.
    ///
    /// Falls back to the requested uid/version when the registry omits them;
    /// a missing or non-absolute entry URL is an error.
    pub fn into_remote(
        self,
        name: &str,
        requested_uid: &str,
        requested_version: &str,
    ) -> ZephyrResult<ResolvedRemote> {
        let raw_url = self
            .remote_entry_url
            .or(self.default_url)
            .filter(|url| !url.trim().is_empty())
            .ok_or_else(|| ZephyrError::invalid_resolution(requested_uid, "no remote_entry_url"))?;

        let entry = absolute_url(&raw_url).ok_or_else(|| {
            ZephyrError::invalid_resolution(
                requested_uid,
                format!("'{}' is not an absolute URL", raw_url),
            )
        })?;

        let public_path = match self.public_path.filter(|p| !p.trim().is_empty()) {
            Some(path) => entry
                .join(&normalize_protocol_relative(&path))
                .map(|u| u.to_string())
                .map_err(|e| {
                    ZephyrError::invalid_resolution(
                        requested_uid,
                        format!("bad public_path '{}': {}", path, e),
                    )
                })?,
            None => public_path_of(entry.as_str()),
        };

        Ok(ResolvedRemote {
            name: name.to_string(),
            application_uid: self
                .application_uid
                .unwrap_or_else(|| requested_uid.to_string()),
            remote_entry_url: entry.to_string(),
            public_path,
            version: self
                .version
                .unwrap_or_else(|| requested_version.to_string()),
        })
    }
}

/// `//host/path` → `https://host/path`; anything else untouched
pub fn normalize_protocol_relative(url: &str) -> String {
    match url.strip_prefix("//") {
        Some(rest) => format!("https://{}", rest),
        None => url.to_string(),
    }
}

/// Parse `raw` as an absolute, scheme-qualified URL
pub fn absolute_url(raw: &str) -> Option<url::Url> {
    url::Url::parse(&normalize_protocol_relative(raw.trim()))
        .ok()
        .filter(|url| !url.cannot_be_a_base())
}

pub struct RegistryClient {
    http: reqwest::Client,
    base_url: String,
}

impl RegistryClient {
    pub fn new(http: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn resolve_url(&self, application_uid: &str, version: &str) -> String {
        format!(
            "{}/resolve/{}/{}",
            self.base_url,
            urlencoding::encode(application_uid),
            urlencoding::encode(version)
        )
    }

    pub async fn resolve(
        &self,
        application_uid: &str,
        version: &str,
        token: &AuthToken,
    ) -> ZephyrResult<RegistryResolution> {
        let url = self.resolve_url(application_uid, version);
        debug!("Resolving {}@{} via {}", application_uid, version, url);

        let response = self
            .http
            .get(&url)
            .bearer_auth(token.expose())
            .send()
            .await
            .map_err(|e| ZephyrError::registry_unreachable(format!("GET {} failed: {}", url, e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read error response".to_string());
            error!("Registry returned HTTP {} for {}@{}", status, application_uid, version);
            return Err(ZephyrError::resolution_failed(
                application_uid,
                version,
                format!("HTTP {}: {}", status, body),
            ));
        }

        let envelope: ResolveEnvelope = response
            .json()
            .await
            .map_err(|e| ZephyrError::invalid_resolution(application_uid, e.to_string()))?;

        envelope
            .value
            .ok_or_else(|| ZephyrError::invalid_resolution(application_uid, "response has no value"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_url_encodes_segments() {
        let client = RegistryClient::new(reqwest::Client::new(), "https://api.example.dev/");
        assert_eq!(
            client.resolve_url("cart.shop.acme", "^1.0.0 || 2"),
            "https://api.example.dev/resolve/cart.shop.acme/%5E1.0.0%20%7C%7C%202"
        );
    }

    #[test]
    fn test_into_remote_derives_public_path() {
        let resolution = RegistryResolution {
            remote_entry_url: Some("//cdn.acme.dev/cart/7/remoteEntry.js".to_string()),
            version: Some("1.2.7".to_string()),
            ..Default::default()
        };
        let remote = resolution.into_remote("cart", "cart.shop.acme", "^1.2.0").unwrap();
        assert_eq!(remote.remote_entry_url, "https://cdn.acme.dev/cart/7/remoteEntry.js");
        assert_eq!(remote.public_path, "https://cdn.acme.dev/cart/7/");
        assert_eq!(remote.application_uid, "cart.shop.acme");
        assert_eq!(remote.version, "1.2.7");
    }

    #[test]
    fn test_into_remote_uses_default_url_and_relative_public_path() {
        let resolution = RegistryResolution {
            default_url: Some("https://cart.acme.dev/remoteEntry.js".to_string()),
            public_path: Some("/static/".to_string()),
            ..Default::default()
        };
        let remote = resolution.into_remote("cart", "cart.shop.acme", "latest").unwrap();
        assert_eq!(remote.public_path, "https://cart.acme.dev/static/");
        assert_eq!(remote.version, "latest");
    }

    #[test]
    fn test_into_remote_rejects_relative_url() {
        let resolution = RegistryResolution {
            remote_entry_url: Some("/cart/remoteEntry.js".to_string()),
            ..Default::default()
        };
        assert!(resolution.into_remote("cart", "cart.shop.acme", "1").is_err());
        assert!(RegistryResolution::default()
            .into_remote("cart", "cart.shop.acme", "1")
            .is_err());
    }
}
