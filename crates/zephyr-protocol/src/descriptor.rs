use serde::{Deserialize, Serialize};

/// Registry name every unprefixed specifier belongs to.
pub const HOME_REGISTRY: &str = "zephyr";

/// A parsed dependency specifier.
///
/// `key` is the local alias the consumer uses for the remote, `app_uid` the
/// remote application it points at and `version` whatever was requested:
/// a semver, a range, a tag, a `workspace:*`/`catalog:` placeholder or a URL.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DependencyDescriptor {
    pub key: String,
    pub registry: String,
    pub app_uid: String,
    pub version: String,
}

impl DependencyDescriptor {
    pub fn is_home_registry(&self) -> bool {
        self.registry == HOME_REGISTRY
    }
}
