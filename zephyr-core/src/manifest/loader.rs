//! Manifest Loader
//!
//! Reads a manifest written by a previous build back from disk.

use std::fs;
use std::path::Path;
use tracing::info;

use crate::common::{ZephyrError, ZephyrResult};
use zephyr_protocol::Manifest;

const MAX_MANIFEST_BYTES: u64 = 1_000_000;

pub fn load_manifest_file(path: &Path) -> ZephyrResult<Manifest> {
    // Check file size (max 1MB)
    let metadata = fs::metadata(path)
        .map_err(|e| ZephyrError::manifest_io(format!("Failed to stat {:?}: {}", path, e)))?;
    if metadata.len() > MAX_MANIFEST_BYTES {
        return Err(ZephyrError::manifest_invalid(format!(
            "Manifest {:?} too large (max 1MB)",
            path
        )));
    }

    let content = fs::read_to_string(path)
        .map_err(|e| ZephyrError::manifest_io(format!("Failed to read {:?}: {}", path, e)))?;

    let manifest = Manifest::from_json(&content)?;

    info!(
        "Loaded manifest for {} ({} remotes)",
        manifest.application_uid,
        manifest.dependencies.len()
    );
    Ok(manifest)
}
