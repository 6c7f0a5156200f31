//! Runtime Plugin
//!
//! Hook the federation runtime calls before loading a remote container.
//! Swaps the statically configured entry URL for the one in the current
//! manifest. Every failure path returns the request untouched.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::debug;

use super::client::ManifestClient;
use super::overrides::SessionOverrides;
use crate::descriptor::is_literal_url;
use zephyr_protocol::Manifest;

/// A remote as declared in the host's static federation config
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteDeclaration {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
    pub entry: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestOptions {
    #[serde(default)]
    pub remotes: Vec<RemoteDeclaration>,
}

/// Arguments of a module load, `id` being `"remoteName/exposedModule"`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BeforeRequestArgs {
    pub id: String,
    #[serde(default)]
    pub options: RequestOptions,
}

impl BeforeRequestArgs {
    /// Everything before the first `/` of the request id
    pub fn remote_name(&self) -> &str {
        self.id.split('/').next().unwrap_or_default()
    }
}

#[async_trait]
pub trait FederationRuntimePlugin: Send + Sync {
    fn name(&self) -> &str;

    async fn before_request(&self, args: BeforeRequestArgs) -> BeforeRequestArgs;
}

pub struct ZephyrRuntimePlugin {
    client: Arc<ManifestClient>,
    overrides: Arc<SessionOverrides>,
    /// Declared remote name or alias -> manifest dependency key
    remote_table: OnceCell<HashMap<String, String>>,
}

impl ZephyrRuntimePlugin {
    pub const NAME: &'static str = "zephyr-runtime-plugin";

    pub fn new(client: Arc<ManifestClient>, overrides: Arc<SessionOverrides>) -> Self {
        Self {
            client,
            overrides,
            remote_table: OnceCell::new(),
        }
    }

    pub fn overrides(&self) -> &Arc<SessionOverrides> {
        &self.overrides
    }

    pub async fn refresh(&self) -> Option<Arc<Manifest>> {
        self.client.refresh().await
    }

    pub async fn get_current_manifest(&self) -> Option<Arc<Manifest>> {
        self.client.get_current_manifest().await
    }

    /// Index of the declared remote to rewrite and its new entry URL
    async fn resolve_entry(&self, args: &BeforeRequestArgs) -> Option<(usize, String)> {
        let remote_name = args.remote_name();
        if remote_name.is_empty() {
            return None;
        }

        let manifest = self.client.get_current_manifest().await?;
        let table = self
            .remote_table
            .get_or_init(|| async { build_remote_table(&args.options.remotes, &manifest) })
            .await;

        let dependency_key = table.get(remote_name)?;
        let dependency = manifest.remote(dependency_key)?;

        let index = args.options.remotes.iter().position(|remote| {
            remote.name == remote_name || remote.alias.as_deref() == Some(remote_name)
        })?;

        let url = match self.overrides.get(&dependency.application_uid).await {
            Some(url) => {
                debug!(
                    "Using session override for {}: {}",
                    dependency.application_uid, url
                );
                url
            }
            None => dependency.remote_entry_url.clone(),
        };

        Some((index, strip_versioned_prefix(&url).to_string()))
    }
}

#[async_trait]
impl FederationRuntimePlugin for ZephyrRuntimePlugin {
    fn name(&self) -> &str {
        Self::NAME
    }

    async fn before_request(&self, mut args: BeforeRequestArgs) -> BeforeRequestArgs {
        let resolved = self.resolve_entry(&args).await;
        match resolved {
            Some((index, url)) => {
                debug!("Rewriting entry for {} to {}", args.id, url);
                args.options.remotes[index].entry = url;
                args
            }
            None => args,
        }
    }
}

/// Map every declared name and alias that matches a manifest key exactly
fn build_remote_table(
    remotes: &[RemoteDeclaration],
    manifest: &Manifest,
) -> HashMap<String, String> {
    let mut table = HashMap::new();

    for remote in remotes {
        let key = std::iter::once(remote.name.as_str())
            .chain(remote.alias.as_deref())
            .find(|candidate| manifest.dependencies.contains_key(*candidate));

        if let Some(key) = key {
            table.insert(remote.name.clone(), key.to_string());
            if let Some(alias) = &remote.alias {
                table.insert(alias.clone(), key.to_string());
            }
        }
    }

    debug!("Built remote table with {} entries", table.len());
    table
}

/// `name@https://...` -> `https://...`, splitting at the first `@` that
/// introduces a URL. Plain URLs are returned as-is.
fn strip_versioned_prefix(url: &str) -> &str {
    if is_literal_url(url) {
        return url;
    }

    url.match_indices('@')
        .map(|(at, _)| &url[at + 1..])
        .find(|rest| is_literal_url(rest))
        .unwrap_or(url)
}
