//! Manifest Diff
//!
//! Finds remotes whose entry URL moved between two manifests.

use std::sync::Arc;

use zephyr_protocol::Manifest;

/// One remote whose `remote_entry_url` changed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteChange {
    pub remote_name: String,
    pub old_url: String,
    pub new_url: String,
    pub manifest: Arc<Manifest>,
}

/// Remotes present in both manifests with a different entry URL.
///
/// Added and removed remotes are not reported. Order follows the new
/// manifest's dependency keys.
pub fn diff_manifests(old: &Manifest, new: &Arc<Manifest>) -> Vec<RemoteChange> {
    new.dependencies
        .iter()
        .filter_map(|(name, current)| {
            let before = old.dependencies.get(name)?;
            (before.remote_entry_url != current.remote_entry_url).then(|| RemoteChange {
                remote_name: name.clone(),
                old_url: before.remote_entry_url.clone(),
                new_url: current.remote_entry_url.clone(),
                manifest: Arc::clone(new),
            })
        })
        .collect()
}
