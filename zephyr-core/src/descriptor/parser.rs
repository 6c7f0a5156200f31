//! Dependency specifier parsing
//!
//! Purely structural: every string parses, nothing is looked up.

use zephyr_protocol::{DependencyDescriptor, HOME_REGISTRY};

/// Wildcard marker that must never be split into registry and reference
pub const WORKSPACE_WILDCARD: &str = "workspace:*";

/// Prefix of a catalog reference (`catalog:<name>`)
pub const CATALOG_PREFIX: &str = "catalog:";

/// Parse `value`, declared under the local alias `key`.
///
/// ```ignore
/// let dep = parse_dependency("local-name", "zephyr:remote-app@beta");
/// assert_eq!(dep.app_uid, "remote-app");
/// assert_eq!(dep.version, "beta");
/// ```
pub fn parse_dependency(key: &str, value: &str) -> DependencyDescriptor {
    let (registry, reference) = split_registry(value);

    // Last `@` so scoped names like `@org/@scope/app@beta` keep their `@`s
    let (app_uid, version) = match reference.rfind('@') {
        Some(idx) if idx > 0 => (&reference[..idx], &reference[idx + 1..]),
        Some(_) => (key, &reference[1..]),
        None => (key, reference),
    };

    DependencyDescriptor {
        key: key.to_string(),
        registry: registry.to_string(),
        app_uid: app_uid.to_string(),
        version: version.to_string(),
    }
}

fn split_registry(value: &str) -> (&str, &str) {
    if value == WORKSPACE_WILDCARD || is_literal_url(value) {
        return (HOME_REGISTRY, value);
    }

    match value.split_once(':') {
        Some((registry, reference)) => (registry, reference),
        None => (HOME_REGISTRY, value),
    }
}

/// True for `http://`, `https://`, `file://` and protocol-relative `//` URLs
pub fn is_literal_url(value: &str) -> bool {
    value.starts_with("http://")
        || value.starts_with("https://")
        || value.starts_with("file://")
        || value.starts_with("//")
}

/// `workspace:*` or any `catalog:` reference
pub fn is_symbolic_version(version: &str) -> bool {
    version == WORKSPACE_WILDCARD || version.starts_with(CATALOG_PREFIX)
}
