//! Workspace Config
//!
//! Typed view of `pnpm-workspace.yaml`.

use serde::{Deserialize, Deserializer};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::warn;

use crate::common::{ZephyrError, ZephyrResult};

pub const WORKSPACE_FILE: &str = "pnpm-workspace.yaml";

/// Name `catalog:` resolves to when no catalog name is given
pub const DEFAULT_CATALOG: &str = "default";

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct WorkspaceConfig {
    /// Package globs; `!`-prefixed entries exclude
    #[serde(default, deserialize_with = "null_as_default")]
    pub packages: Vec<String>,
    /// The default catalog (`catalog:` / `catalog:default`)
    #[serde(default, deserialize_with = "null_as_default")]
    pub catalog: BTreeMap<String, String>,
    /// Named catalogs: catalog name → package name → version range
    #[serde(default, deserialize_with = "null_as_default")]
    pub catalogs: BTreeMap<String, BTreeMap<String, String>>,
}

/// A key with no value (`packages:`) parses as YAML null
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

impl WorkspaceConfig {
    pub fn from_yaml(content: &str) -> Result<Self, serde_yaml::Error> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(content)
    }

    pub fn load(path: &Path) -> ZephyrResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ZephyrError::invalid_config(format!("Failed to read {:?}: {}", path, e))
        })?;
        Self::from_yaml(&content).map_err(|e| {
            ZephyrError::invalid_config(format!("Failed to parse {:?}: {}", path, e))
        })
    }

    /// Version range for `package` in `catalog_name`
    pub fn catalog_entry(&self, catalog_name: &str, package: &str) -> Option<&str> {
        let name = if catalog_name.is_empty() { DEFAULT_CATALOG } else { catalog_name };

        if name == DEFAULT_CATALOG {
            if let Some(range) = self.catalog.get(package) {
                return Some(range);
            }
        }

        self.catalogs
            .get(name)
            .and_then(|catalog| catalog.get(package))
            .map(String::as_str)
    }

    /// Split `packages` into include globs and compiled exclude patterns
    pub fn package_globs(&self) -> PackageGlobs {
        let mut globs = PackageGlobs::default();

        for entry in &self.packages {
            let entry = entry.trim();
            if let Some(excluded) = entry.strip_prefix('!') {
                match glob::Pattern::new(excluded.trim_end_matches('/')) {
                    Ok(pattern) => globs.exclude.push(pattern),
                    Err(e) => warn!("Ignoring invalid workspace exclude '{}': {}", entry, e),
                }
            } else if !entry.is_empty() {
                globs.include.push(entry.trim_end_matches('/').to_string());
            }
        }

        globs
    }
}

#[derive(Debug, Clone, Default)]
pub struct PackageGlobs {
    pub include: Vec<String>,
    pub exclude: Vec<glob::Pattern>,
}

impl PackageGlobs {
    /// Whether a package directory (relative to the workspace root) is excluded
    pub fn is_excluded(&self, relative_dir: &Path) -> bool {
        let manifest = relative_dir.join("package.json");
        self.exclude
            .iter()
            .any(|pattern| pattern.matches_path(relative_dir) || pattern.matches_path(&manifest))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const YAML: &str = r#"
packages:
  - "apps/*"
  - "libs/**"
  - "!libs/**/fixtures/**"
catalog:
  react: ^18.2.0
catalogs:
  frontend:
    cart: ^3.1.0
  legacy:
    react: ^16.14.0
"#;

    #[test]
    fn test_parses_packages_and_catalogs() {
        let config = WorkspaceConfig::from_yaml(YAML).unwrap();
        assert_eq!(config.packages.len(), 3);
        assert_eq!(config.catalog_entry("frontend", "cart"), Some("^3.1.0"));
        assert_eq!(config.catalog_entry("legacy", "react"), Some("^16.14.0"));
        assert_eq!(config.catalog_entry("frontend", "react"), None);
        assert_eq!(config.catalog_entry("missing-catalog", "cart"), None);
    }

    #[test]
    fn test_default_catalog() {
        let config = WorkspaceConfig::from_yaml(YAML).unwrap();
        assert_eq!(config.catalog_entry("", "react"), Some("^18.2.0"));
        assert_eq!(config.catalog_entry("default", "react"), Some("^18.2.0"));
    }

    #[test]
    fn test_package_globs_split() {
        let config = WorkspaceConfig::from_yaml(YAML).unwrap();
        let globs = config.package_globs();
        assert_eq!(globs.include, vec!["apps/*", "libs/**"]);
        assert!(globs.is_excluded(Path::new("libs/ui/fixtures/demo")));
        assert!(!globs.is_excluded(Path::new("libs/ui/button")));
    }

    #[test]
    fn test_keys_without_values_are_empty() {
        let config =
            WorkspaceConfig::from_yaml("packages:\ncatalog:\n  react: ^18.2.0\ncatalogs:\n").unwrap();
        assert!(config.packages.is_empty());
        assert!(config.catalogs.is_empty());
        assert_eq!(config.catalog_entry("", "react"), Some("^18.2.0"));
        assert!(config.package_globs().include.is_empty());
    }

    #[test]
    fn test_empty_file_is_default() {
        assert_eq!(WorkspaceConfig::from_yaml("\n").unwrap(), WorkspaceConfig::default());
    }
}
