//! Zephyr federation core
//!
//! Build time: parse `zephyr:dependencies`, resolve symbolic versions from the
//! workspace, resolve remotes against the registry and write the manifest.
//! Run time: fetch the manifest once per application and point the
//! federation runtime at the URLs it names.

pub mod auth;
pub mod common;
pub mod config;
pub mod descriptor;
pub mod manifest;
pub mod resolver;
pub mod runtime;
pub mod workspace;

use std::path::Path;

pub use common::{Environment, ErrorCode, ZephyrError, ZephyrResult};
pub use config::{ManifestClientConfig, ZephyrConfig};
pub use descriptor::{collect_descriptors, parse_dependency, DependencyValue};
pub use manifest::{FileManifestWriter, ManifestBuilder, ManifestWriter};
pub use resolver::{application_uid_for, AppContext, RemoteResolver, ResolveOptions};
pub use runtime::{
    FederationRuntimePlugin, ManifestCache, ManifestClient, ManifestObserver, RemoteChange,
    SessionOverrides, ZephyrRuntimePlugin,
};
pub use workspace::{VersionResolver, WorkspaceResolver};
pub use zephyr_protocol::{DependencyDescriptor, Manifest, ManifestDependency, ResolvedRemote};

/// Resolve `descriptors` with configuration taken from the process
/// environment, discovering org/project from `workdir`.
pub async fn resolve_remote_dependencies(
    descriptors: &[DependencyDescriptor],
    workdir: &Path,
    options: &ResolveOptions,
) -> ZephyrResult<Vec<ResolvedRemote>> {
    let environment = Environment::from_process();
    let config = ZephyrConfig::from_env(&environment)?;
    RemoteResolver::new(&config, environment, workdir)?
        .resolve_remote_dependencies(descriptors, options)
        .await
}
