//! Workspace Metadata
//!
//! Rewrites `workspace:*` and `catalog:` placeholders using the monorepo the
//! build runs in. Lookups are best effort: a miss keeps the placeholder and
//! leaves the final say to the registry.

pub mod config;
pub mod packages;

use once_cell::sync::{Lazy, OnceCell};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{debug, warn};

use crate::common::find_upwards;
use crate::descriptor::parser::{CATALOG_PREFIX, WORKSPACE_WILDCARD};

pub use config::{PackageGlobs, WorkspaceConfig, WORKSPACE_FILE};

/// Rewrites a symbolic version for one package.
///
/// Implementations never fail; unknown placeholders come back unchanged.
pub trait VersionResolver: Send + Sync {
    fn resolve_version(&self, package_name: &str, version: &str) -> String;
}

/// Resolver for builds outside any workspace
pub struct PassThrough;

impl VersionResolver for PassThrough {
    fn resolve_version(&self, _package_name: &str, version: &str) -> String {
        version.to_string()
    }
}

/// One resolver per workspace root for the whole process
static SHARED: Lazy<Mutex<HashMap<PathBuf, Arc<WorkspaceResolver>>>> =
    Lazy::new(|| Mutex::new(HashMap::new()));

/// Workspace-backed [`VersionResolver`].
///
/// The workspace file and the package index are each read at most once per
/// instance.
pub struct WorkspaceResolver {
    root: Option<PathBuf>,
    config: OnceCell<Option<WorkspaceConfig>>,
    packages: OnceCell<HashMap<String, String>>,
}

impl WorkspaceResolver {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: Some(root.into()),
            config: OnceCell::new(),
            packages: OnceCell::new(),
        }
    }

    /// Resolver with no workspace; every lookup misses
    pub fn detached() -> Self {
        Self {
            root: None,
            config: OnceCell::new(),
            packages: OnceCell::new(),
        }
    }

    /// Use the nearest ancestor of `start` holding `pnpm-workspace.yaml`
    pub fn discover(start: &Path) -> Self {
        match find_upwards(start, WORKSPACE_FILE) {
            Some(root) => {
                debug!("Using workspace root {:?}", root);
                Self::new(root)
            }
            None => {
                debug!("No {} above {:?}", WORKSPACE_FILE, start);
                Self::detached()
            }
        }
    }

    /// Process-wide resolver for the workspace above `start`.
    ///
    /// Builds in the same workspace share one instance, so the workspace file
    /// and package index are read once per process. Outside a workspace a
    /// fresh detached resolver is returned.
    pub fn shared(start: &Path) -> Arc<Self> {
        let Some(root) = find_upwards(start, WORKSPACE_FILE) else {
            debug!("No {} above {:?}", WORKSPACE_FILE, start);
            return Arc::new(Self::detached());
        };

        let mut shared = SHARED.lock().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(shared.entry(root).or_insert_with_key(|root| {
            debug!("Using workspace root {:?}", root);
            Arc::new(Self::new(root.clone()))
        }))
    }

    pub fn root(&self) -> Option<&Path> {
        self.root.as_deref()
    }

    pub fn config(&self) -> Option<&WorkspaceConfig> {
        self.config
            .get_or_init(|| {
                let root = self.root.as_ref()?;
                match WorkspaceConfig::load(&root.join(WORKSPACE_FILE)) {
                    Ok(config) => Some(config),
                    Err(e) => {
                        warn!("Workspace lookups disabled: {}", e);
                        None
                    }
                }
            })
            .as_ref()
    }

    /// Package name → version for every package the workspace globs select
    pub fn package_versions(&self) -> &HashMap<String, String> {
        self.packages.get_or_init(|| match (self.root.as_ref(), self.config()) {
            (Some(root), Some(config)) => packages::scan_packages(root, &config.package_globs()),
            _ => HashMap::new(),
        })
    }

    /// Substitute `catalog:<name>` for `package_name`'s range in that catalog
    pub fn resolve_catalog(&self, package_name: &str, reference: &str) -> String {
        let catalog_name = reference.strip_prefix(CATALOG_PREFIX).unwrap_or(reference);

        match self
            .config()
            .and_then(|config| config.catalog_entry(catalog_name, package_name))
        {
            Some(range) => {
                debug!("Resolved {} from catalog {} to {}", package_name, reference, range);
                range.to_string()
            }
            None => {
                warn!(
                    "No entry for {} in {}, keeping the reference as is",
                    package_name, reference
                );
                reference.to_string()
            }
        }
    }

    /// Substitute `workspace:*` for the sibling package's declared version
    pub fn resolve_workspace(&self, package_name: &str, version: &str) -> String {
        match self.package_versions().get(package_name) {
            Some(found) => {
                debug!("Resolved workspace package {} to {}", package_name, found);
                found.clone()
            }
            None => {
                warn!(
                    "No workspace package named {}, keeping {}",
                    package_name, version
                );
                version.to_string()
            }
        }
    }
}

impl VersionResolver for WorkspaceResolver {
    fn resolve_version(&self, package_name: &str, version: &str) -> String {
        if version == WORKSPACE_WILDCARD {
            self.resolve_workspace(package_name, version)
        } else if version.starts_with(CATALOG_PREFIX) {
            self.resolve_catalog(package_name, version)
        } else {
            version.to_string()
        }
    }
}
