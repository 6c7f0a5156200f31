//! Runtime
//!
//! Consumer-side half: the shared manifest cache, the single-flight manifest
//! client and the federation plugin that rewrites remote entry URLs.

pub mod cache;
pub mod client;
pub mod diff;
pub mod fetcher;
pub mod overrides;
pub mod plugin;

pub use cache::{CacheState, ManifestCache};
pub use client::{ManifestClient, ManifestObserver};
pub use diff::{diff_manifests, RemoteChange};
pub use fetcher::{FetchError, HttpManifestFetcher, ManifestFetcher};
pub use overrides::SessionOverrides;
pub use plugin::{
    BeforeRequestArgs, FederationRuntimePlugin, RemoteDeclaration, RequestOptions,
    ZephyrRuntimePlugin,
};
