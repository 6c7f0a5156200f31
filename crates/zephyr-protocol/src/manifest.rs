//! Manifest Types
//!
//! Rust structs matching the `zephyr-manifest.json` document a build publishes
//! next to its assets.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::ProtocolError;
use crate::remote::ResolvedRemote;

/// Manifest schema version
pub const MANIFEST_VERSION: &str = "1.0.0";

/// Well-known file name the manifest is written to and served from
pub const MANIFEST_FILENAME: &str = "zephyr-manifest.json";

/// Snapshot of the remotes one consuming application resolved at build time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    pub version: String,
    pub timestamp: String,
    pub application_uid: String,
    #[serde(default)]
    pub dependencies: BTreeMap<String, ManifestDependency>,
}

/// One entry of `dependencies`; the remote name is the map key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestDependency {
    pub application_uid: String,
    pub remote_entry_url: String,
    pub public_path: String,
    pub version: String,
}

impl From<&ResolvedRemote> for ManifestDependency {
    fn from(remote: &ResolvedRemote) -> Self {
        Self {
            application_uid: remote.application_uid.clone(),
            remote_entry_url: remote.remote_entry_url.clone(),
            public_path: remote.public_path.clone(),
            version: remote.version.clone(),
        }
    }
}

impl Manifest {
    /// Parse and validate a manifest document.
    pub fn from_json(content: &str) -> Result<Self, ProtocolError> {
        let manifest: Manifest = serde_json::from_str(content)?;
        manifest.validate()?;
        Ok(manifest)
    }

    pub fn to_json_pretty(&self) -> Result<String, ProtocolError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Look up a dependency and rebuild it as a [`ResolvedRemote`].
    pub fn remote(&self, name: &str) -> Option<ResolvedRemote> {
        self.dependencies.get(name).map(|dep| ResolvedRemote {
            name: name.to_string(),
            application_uid: dep.application_uid.clone(),
            remote_entry_url: dep.remote_entry_url.clone(),
            public_path: dep.public_path.clone(),
            version: dep.version.clone(),
        })
    }

    pub fn remotes(&self) -> Vec<ResolvedRemote> {
        self.dependencies
            .keys()
            .filter_map(|name| self.remote(name))
            .collect()
    }

    /// Validate manifest structure
    pub fn validate(&self) -> Result<(), ProtocolError> {
        if self.application_uid.trim().is_empty() {
            return Err(ProtocolError::MissingApplicationUid);
        }

        for (name, dep) in &self.dependencies {
            if dep.application_uid.trim().is_empty() {
                return Err(ProtocolError::MissingDependencyUid { name: name.clone() });
            }
            if !is_absolute_url(&dep.remote_entry_url) {
                return Err(ProtocolError::RelativeEntryUrl {
                    name: name.clone(),
                    url: dep.remote_entry_url.clone(),
                });
            }
        }

        Ok(())
    }
}

fn is_absolute_url(value: &str) -> bool {
    url::Url::parse(value)
        .map(|url| !url.cannot_be_a_base())
        .unwrap_or(false)
}
