//! Remote Resolver
//!
//! Build-time resolution of [`DependencyDescriptor`]s into concrete deployed
//! remotes. Every descriptor is resolved concurrently; `abort_on_error`
//! decides whether one failure sinks the whole call.

pub mod context;
pub mod registry;

use futures::future::{join_all, try_join_all};
use std::path::PathBuf;
use std::time::Duration;
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

use crate::auth::{AuthToken, ServerTokenExchange, TokenResolver};
use crate::common::{create_http_client_with_timeout, Environment, ZephyrError, ZephyrResult};
use crate::config::ZephyrConfig;
use crate::descriptor::{is_literal_url, WORKSPACE_WILDCARD};
use zephyr_protocol::{public_path_of, DependencyDescriptor, ResolvedRemote};

pub use context::{
    application_uid_for, is_fully_qualified, qualify_application_uid, sanitize_uid_segment,
    AppContext,
};
pub use registry::{RegistryClient, RegistryResolution};

#[derive(Debug, Clone)]
pub struct ResolveOptions {
    /// Reject the whole call on the first failure (default) instead of
    /// dropping the failed descriptor
    pub abort_on_error: bool,
    /// Token to use before looking at the environment
    pub auth_token: Option<String>,
}

impl Default for ResolveOptions {
    fn default() -> Self {
        Self {
            abort_on_error: true,
            auth_token: None,
        }
    }
}

pub struct RemoteResolver {
    registry: RegistryClient,
    tokens: TokenResolver,
    environment: Environment,
    workdir: PathBuf,
    context: OnceCell<Option<AppContext>>,
}

impl RemoteResolver {
    /// `workdir` is where org/project are looked up (git remote, package.json)
    pub fn new(
        config: &ZephyrConfig,
        environment: Environment,
        workdir: impl Into<PathBuf>,
    ) -> ZephyrResult<Self> {
        config.validate()?;
        let http = create_http_client_with_timeout(Duration::from_secs(config.request_timeout_secs))?;

        Ok(Self {
            registry: RegistryClient::new(http.clone(), config.api_base()),
            tokens: TokenResolver::new(
                environment.clone(),
                ServerTokenExchange::new(http, config.token_exchange_url()),
            ),
            environment,
            workdir: workdir.into(),
            context: OnceCell::new(),
        })
    }

    /// Pin an org/project instead of discovering it
    pub fn with_context(self, context: AppContext) -> Self {
        Self {
            context: OnceCell::new_with(Some(Some(context))),
            ..self
        }
    }

    /// Org/project, discovered once per resolver
    pub async fn context(&self) -> Option<&AppContext> {
        self.context
            .get_or_init(|| AppContext::resolve(&self.environment, &self.workdir))
            .await
            .as_ref()
    }

    /// Resolve `descriptors` against the home registry.
    ///
    /// Descriptors from other registries are skipped; literal URLs resolve
    /// without a network call.
    pub async fn resolve_remote_dependencies(
        &self,
        descriptors: &[DependencyDescriptor],
        options: &ResolveOptions,
    ) -> ZephyrResult<Vec<ResolvedRemote>> {
        let needs_network = descriptors
            .iter()
            .any(|d| d.is_home_registry() && !is_literal_url(&d.version));

        let token = if needs_network {
            Some(self.tokens.resolve(options.auth_token.as_deref()).await)
        } else {
            None
        };
        let token = token.as_ref();

        let resolved: Vec<ResolvedRemote> = if options.abort_on_error {
            try_join_all(descriptors.iter().map(|d| self.resolve_one(d, token)))
                .await?
                .into_iter()
                .flatten()
                .collect()
        } else {
            let outcomes = join_all(descriptors.iter().map(|d| self.resolve_one(d, token))).await;
            descriptors
                .iter()
                .zip(outcomes)
                .filter_map(|(descriptor, outcome)| match outcome {
                    Ok(remote) => remote,
                    Err(e) => {
                        warn!("Skipping remote {}: {}", descriptor.key, e);
                        None
                    }
                })
                .collect()
        };

        info!(
            "Resolved {} of {} remote dependencies",
            resolved.len(),
            descriptors.len()
        );
        Ok(resolved)
    }

    /// `Ok(None)` when the descriptor is not ours to resolve
    async fn resolve_one(
        &self,
        descriptor: &DependencyDescriptor,
        token: Option<&ZephyrResult<AuthToken>>,
    ) -> ZephyrResult<Option<ResolvedRemote>> {
        if !descriptor.is_home_registry() {
            info!(
                "Skipping {}: registry '{}' is not resolvable",
                descriptor.key, descriptor.registry
            );
            return Ok(None);
        }

        if is_literal_url(&descriptor.version) {
            return direct_remote(descriptor).map(Some);
        }

        let application_uid = if is_fully_qualified(&descriptor.app_uid) {
            descriptor.app_uid.clone()
        } else {
            qualify_application_uid(&descriptor.app_uid, self.context().await)?
        };

        let token = match token {
            Some(Ok(token)) => token,
            Some(Err(e)) => return Err(e.clone()),
            None => return Err(ZephyrError::missing_auth_token()),
        };

        let version = normalize_version(&descriptor.version);
        let remote = self
            .registry
            .resolve(&application_uid, version, token)
            .await?
            .into_remote(&descriptor.key, &application_uid, version)?;

        debug!(
            "Resolved {} to {} ({})",
            descriptor.key, remote.remote_entry_url, remote.version
        );
        Ok(Some(remote))
    }
}

/// `workspace:*` becomes `*`; everything else is sent as declared
pub fn normalize_version(version: &str) -> &str {
    if version == WORKSPACE_WILDCARD {
        "*"
    } else {
        version
    }
}

/// Remote for a descriptor whose version is already a URL
fn direct_remote(descriptor: &DependencyDescriptor) -> ZephyrResult<ResolvedRemote> {
    let url = registry::absolute_url(&descriptor.version).ok_or_else(|| {
        ZephyrError::invalid_resolution(
            &descriptor.app_uid,
            format!("'{}' is not an absolute URL", descriptor.version),
        )
    })?;
    let url = url.to_string();

    Ok(ResolvedRemote {
        name: descriptor.key.clone(),
        application_uid: descriptor.app_uid.clone(),
        public_path: public_path_of(&url),
        version: url.clone(),
        remote_entry_url: url,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::env;
    use crate::common::ErrorCode;
    use crate::descriptor::parse_dependency;
    use httpmock::prelude::*;
    use serde_json::json;

    fn resolver(base: &str, pairs: Vec<(&str, &str)>) -> RemoteResolver {
        let config = ZephyrConfig {
            api_base_url: base.to_string(),
            ..Default::default()
        };
        let tmp = std::env::temp_dir();
        RemoteResolver::new(&config, Environment::from_pairs(pairs), tmp)
            .unwrap()
            .with_context(AppContext::new("acme", "shop"))
    }

    async fn mock_resolution(server: &MockServer, uid: &str, version: &str, url: &str) {
        let path = format!("/resolve/{}/{}", uid, version);
        let url = url.to_string();
        server
            .mock_async(move |when, then| {
                when.method(GET)
                    .path(path)
                    .header("authorization", "Bearer secret");
                then.status(200).json_body(json!({
                    "value": {
                        "application_uid": uid,
                        "remote_entry_url": url,
                        "version": "1.2.3"
                    }
                }));
            })
            .await;
    }

    #[tokio::test]
    async fn test_resolves_through_registry() {
        let server = MockServer::start_async().await;
        mock_resolution(&server, "cart.shop.acme", "latest", "https://cdn.acme.dev/cart/remoteEntry.js").await;

        let resolver = resolver(&server.base_url(), vec![(env::ZE_SECRET_TOKEN, "secret")]);
        let descriptors = vec![parse_dependency("cart", "latest")];
        let remotes = resolver
            .resolve_remote_dependencies(&descriptors, &ResolveOptions::default())
            .await
            .unwrap();

        assert_eq!(
            remotes,
            vec![ResolvedRemote {
                name: "cart".to_string(),
                application_uid: "cart.shop.acme".to_string(),
                remote_entry_url: "https://cdn.acme.dev/cart/remoteEntry.js".to_string(),
                public_path: "https://cdn.acme.dev/cart/".to_string(),
                version: "1.2.3".to_string(),
            }]
        );
    }

    #[tokio::test]
    async fn test_workspace_wildcard_is_sent_as_star() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET).path_contains("/resolve/checkout.shop.acme/");
                then.status(200).json_body(json!({
                    "value": { "remote_entry_url": "https://cdn.acme.dev/checkout/remoteEntry.js" }
                }));
            })
            .await;

        let resolver = resolver(&server.base_url(), vec![(env::ZE_TOKEN, "secret")]);
        let descriptors = vec![parse_dependency("checkout", "workspace:*")];
        let remotes = resolver
            .resolve_remote_dependencies(&descriptors, &ResolveOptions::default())
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(remotes[0].version, "*");
        assert_eq!(
            resolver.registry.resolve_url("checkout.shop.acme", normalize_version("workspace:*")),
            format!("{}/resolve/checkout.shop.acme/%2A", server.base_url())
        );
    }

    #[tokio::test]
    async fn test_partial_failure_policy() {
        let server = MockServer::start_async().await;
        mock_resolution(&server, "cart.shop.acme", "1.0.0", "https://cdn.acme.dev/cart/remoteEntry.js").await;
        mock_resolution(&server, "search.shop.acme", "1.0.0", "https://cdn.acme.dev/search/remoteEntry.js").await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/resolve/orders.shop.acme/1.0.0");
                then.status(404).body("not deployed");
            })
            .await;

        let resolver = resolver(&server.base_url(), vec![(env::ZE_SECRET_TOKEN, "secret")]);
        let descriptors = vec![
            parse_dependency("cart", "1.0.0"),
            parse_dependency("orders", "1.0.0"),
            parse_dependency("search", "1.0.0"),
        ];

        let lenient = ResolveOptions {
            abort_on_error: false,
            ..Default::default()
        };
        let remotes = resolver
            .resolve_remote_dependencies(&descriptors, &lenient)
            .await
            .unwrap();
        let names: Vec<_> = remotes.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["cart", "search"]);

        let err = resolver
            .resolve_remote_dependencies(&descriptors, &ResolveOptions::default())
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::ResolutionFailed);
    }

    #[tokio::test]
    async fn test_url_and_foreign_descriptors_need_no_network() {
        let resolver = resolver("http://127.0.0.1:9", vec![]);
        let descriptors = vec![
            parse_dependency("cart", "//cdn.acme.dev/cart/remoteEntry.js"),
            parse_dependency("ui", "npm:design-system@2.0.0"),
        ];

        let remotes = resolver
            .resolve_remote_dependencies(&descriptors, &ResolveOptions::default())
            .await
            .unwrap();

        assert_eq!(remotes.len(), 1);
        assert_eq!(remotes[0].remote_entry_url, "https://cdn.acme.dev/cart/remoteEntry.js");
        assert_eq!(remotes[0].public_path, "https://cdn.acme.dev/cart/");
    }

    #[tokio::test]
    async fn test_missing_token_is_fatal_by_default() {
        let resolver = resolver("http://127.0.0.1:9", vec![]);
        let descriptors = vec![
            parse_dependency("cart", "1.0.0"),
            parse_dependency("direct", "https://cdn.acme.dev/direct/remoteEntry.js"),
        ];

        let err = resolver
            .resolve_remote_dependencies(&descriptors, &ResolveOptions::default())
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::MissingAuthToken);

        let lenient = ResolveOptions {
            abort_on_error: false,
            ..Default::default()
        };
        let remotes = resolver
            .resolve_remote_dependencies(&descriptors, &lenient)
            .await
            .unwrap();
        assert_eq!(remotes.len(), 1);
        assert_eq!(remotes[0].name, "direct");
    }

    #[tokio::test]
    async fn test_explicit_token_option() {
        let server = MockServer::start_async().await;
        mock_resolution(&server, "cart.other.org", "2.0.0", "https://cdn.other.org/cart/remoteEntry.js").await;

        let resolver = resolver(&server.base_url(), vec![(env::ZE_TOKEN, "wrong")]);
        let options = ResolveOptions {
            auth_token: Some("secret".to_string()),
            ..Default::default()
        };
        let remotes = resolver
            .resolve_remote_dependencies(&[parse_dependency("cart", "zephyr:cart.other.org@2.0.0")], &options)
            .await
            .unwrap();
        assert_eq!(remotes[0].application_uid, "cart.other.org");
    }
}
