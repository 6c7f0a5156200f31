//! Manifest Builder
//!
//! Aggregates one build's resolved remotes into an immutable [`Manifest`].

use chrono::{DateTime, SecondsFormat, Utc};
use std::collections::BTreeMap;
use tracing::warn;

use zephyr_protocol::{Manifest, ManifestDependency, ResolvedRemote, MANIFEST_VERSION};

pub struct ManifestBuilder {
    application_uid: String,
    timestamp: DateTime<Utc>,
    version: String,
    remotes: Vec<ResolvedRemote>,
}

impl ManifestBuilder {
    pub fn new(application_uid: impl Into<String>) -> Self {
        Self {
            application_uid: application_uid.into(),
            timestamp: Utc::now(),
            version: MANIFEST_VERSION.to_string(),
            remotes: Vec::new(),
        }
    }

    /// Build time; defaults to now
    pub fn timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    pub fn remotes(mut self, remotes: impl IntoIterator<Item = ResolvedRemote>) -> Self {
        self.remotes.extend(remotes);
        self
    }

    pub fn build(self) -> Manifest {
        let mut dependencies = BTreeMap::new();

        for remote in &self.remotes {
            if dependencies
                .insert(remote.name.clone(), ManifestDependency::from(remote))
                .is_some()
            {
                warn!("Remote {} resolved twice, keeping the last resolution", remote.name);
            }
        }

        Manifest {
            version: self.version,
            timestamp: self.timestamp.to_rfc3339_opts(SecondsFormat::Millis, true),
            application_uid: self.application_uid,
            dependencies,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn remote(name: &str, version: &str) -> ResolvedRemote {
        ResolvedRemote {
            name: name.to_string(),
            application_uid: format!("{}.shop.acme", name),
            remote_entry_url: format!("https://cdn.acme.dev/{}/{}/remoteEntry.js", name, version),
            public_path: format!("https://cdn.acme.dev/{}/{}/", name, version),
            version: version.to_string(),
        }
    }

    #[test]
    fn test_build_aggregates_remotes() {
        let timestamp = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();
        let manifest = ManifestBuilder::new("host.shop.acme")
            .timestamp(timestamp)
            .remotes(vec![remote("cart", "1.0.0"), remote("search", "2.1.0")])
            .build();

        assert_eq!(manifest.version, MANIFEST_VERSION);
        assert_eq!(manifest.timestamp, "2026-03-01T12:00:00.000Z");
        assert_eq!(manifest.application_uid, "host.shop.acme");
        assert_eq!(manifest.remote("cart"), Some(remote("cart", "1.0.0")));
        assert_eq!(manifest.remote("search"), Some(remote("search", "2.1.0")));
    }

    #[test]
    fn test_duplicate_names_keep_last() {
        let manifest = ManifestBuilder::new("host.shop.acme")
            .remotes(vec![remote("cart", "1.0.0"), remote("cart", "1.1.0")])
            .build();
        assert_eq!(manifest.dependencies.len(), 1);
        assert_eq!(manifest.dependencies["cart"].version, "1.1.0");
    }
}
