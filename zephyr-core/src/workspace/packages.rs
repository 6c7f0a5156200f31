//! Workspace Package Index
//!
//! Scans the packages selected by the workspace globs and indexes their
//! declared versions by package name.

use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::{Component, Path};
use tracing::{debug, warn};

use super::config::PackageGlobs;

#[derive(Debug, Deserialize)]
struct PackageManifest {
    name: Option<String>,
    version: Option<String>,
}

/// Package name → declared version
pub fn scan_packages(root: &Path, globs: &PackageGlobs) -> HashMap<String, String> {
    let mut index = HashMap::new();
    let escaped_root = glob::Pattern::escape(&root.to_string_lossy());

    for include in &globs.include {
        let pattern = format!("{}/{}/package.json", escaped_root, include);
        let paths = match glob::glob(&pattern) {
            Ok(paths) => paths,
            Err(e) => {
                warn!("Ignoring invalid workspace glob '{}': {}", include, e);
                continue;
            }
        };

        for manifest_path in paths.flatten() {
            let Some(dir) = manifest_path.parent() else {
                continue;
            };
            let relative = dir.strip_prefix(root).unwrap_or(dir);

            if is_vendored(relative) || globs.is_excluded(relative) {
                continue;
            }

            match read_package(&manifest_path) {
                Some((name, version)) => {
                    if let Some(existing) = index.get(&name) {
                        if existing != &version {
                            warn!(
                                "Package {} is declared twice in the workspace, keeping {}",
                                name, existing
                            );
                        }
                        continue;
                    }
                    debug!("Indexed workspace package {}@{}", name, version);
                    index.insert(name, version);
                }
                None => debug!("Skipping unnamed or unversioned package {:?}", manifest_path),
            }
        }
    }

    index
}

fn is_vendored(relative: &Path) -> bool {
    relative
        .components()
        .any(|c| matches!(c, Component::Normal(part) if part == "node_modules"))
}

fn read_package(path: &Path) -> Option<(String, String)> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => {
            warn!("Failed to read {:?}: {}", path, e);
            return None;
        }
    };

    match serde_json::from_str::<PackageManifest>(&content) {
        Ok(PackageManifest {
            name: Some(name),
            version: Some(version),
        }) => Some((name, version)),
        Ok(_) => None,
        Err(e) => {
            warn!("Failed to parse {:?}: {}", path, e);
            None
        }
    }
}
