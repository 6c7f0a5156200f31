//! Dependency Descriptors
//!
//! Turns a `zephyr:dependencies` table into [`DependencyDescriptor`]s:
//! shape validation, platform selection, symbolic version rewriting, parsing.

pub mod parser;

use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::{debug, warn};

use crate::common::{ZephyrError, ZephyrResult};
use crate::workspace::VersionResolver;
use zephyr_protocol::DependencyDescriptor;

pub use parser::{is_literal_url, is_symbolic_version, parse_dependency, WORKSPACE_WILDCARD};

/// The accepted shapes of one dependency value
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum DependencyValue {
    /// `"cart": "zephyr:cart@^1.0.0"`
    Scalar(String),
    /// `"cart": { "ios": "...", "android": "..." }`
    PerPlatform(BTreeMap<String, String>),
}

impl DependencyValue {
    pub fn from_json(key: &str, raw: &Value) -> ZephyrResult<Self> {
        DependencyValue::deserialize(raw).map_err(|_| ZephyrError::invalid_dependency_value(key, raw))
    }

    /// Specifier for `platform`. `Ok(None)` when the platform has no entry.
    pub fn select(&self, key: &str, platform: Option<&str>) -> ZephyrResult<Option<String>> {
        match self {
            DependencyValue::Scalar(value) => Ok(Some(value.clone())),
            DependencyValue::PerPlatform(values) => {
                let platform = platform.ok_or_else(|| ZephyrError::platform_required(key))?;
                Ok(values.get(platform).cloned())
            }
        }
    }
}

/// Build descriptors from a `zephyr:dependencies` JSON object.
///
/// Fails only on a contract violation: a non-object table, a value outside
/// [`DependencyValue`], or a per-platform value with no target platform.
pub fn collect_descriptors(
    dependencies: &Value,
    platform: Option<&str>,
    versions: &dyn VersionResolver,
) -> ZephyrResult<Vec<DependencyDescriptor>> {
    let table = dependencies
        .as_object()
        .ok_or_else(|| ZephyrError::invalid_dependency_value("zephyr:dependencies", dependencies))?;

    let mut descriptors = Vec::with_capacity(table.len());

    for (key, raw) in table {
        let value = DependencyValue::from_json(key, raw)?;

        let Some(specifier) = value.select(key, platform)? else {
            warn!(
                "Dependency {} has no entry for platform {}, skipping",
                key,
                platform.unwrap_or_default()
            );
            continue;
        };

        // A bare `catalog:` specifier would otherwise be read as a registry prefix
        let specifier = if specifier.starts_with(parser::CATALOG_PREFIX) {
            versions.resolve_version(key, &specifier)
        } else {
            specifier
        };

        let mut descriptor = parse_dependency(key, &specifier);
        if is_symbolic_version(&descriptor.version) {
            descriptor.version = versions.resolve_version(&descriptor.app_uid, &descriptor.version);
        }

        debug!(
            "Collected dependency {} -> {}:{}@{}",
            descriptor.key, descriptor.registry, descriptor.app_uid, descriptor.version
        );
        descriptors.push(descriptor);
    }

    Ok(descriptors)
}
