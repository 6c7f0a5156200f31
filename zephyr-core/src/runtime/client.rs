//! Manifest Client
//!
//! Fetches the consumer's runtime manifest once, serves it from the shared
//! cache afterwards, and reports remote URL changes when a refresh lands.

use futures::FutureExt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::cache::{FetchTicket, Lookup, ManifestCache, SharedFetch};
use super::diff::{diff_manifests, RemoteChange};
use super::fetcher::{FetchError, HttpManifestFetcher, ManifestFetcher};
use crate::common::ZephyrResult;
use crate::config::ManifestClientConfig;
use zephyr_protocol::Manifest;

const CHANGE_CHANNEL_CAPACITY: usize = 64;

/// Callbacks for manifest lifecycle events. All methods default to no-ops.
pub trait ManifestObserver: Send + Sync {
    /// A refresh produced a manifest with at least one moved remote
    fn on_manifest_change(&self, _new: &Manifest, _old: &Manifest) {}

    /// Fired once per remote whose entry URL moved
    fn on_remote_change(&self, _change: &RemoteChange) {}

    fn on_manifest_error(&self, _error: &FetchError) {}
}

pub struct ManifestClient {
    config: ManifestClientConfig,
    cache: Arc<ManifestCache>,
    fetcher: Arc<dyn ManifestFetcher>,
    observers: Vec<Arc<dyn ManifestObserver>>,
    changes: broadcast::Sender<RemoteChange>,
    // Last fetch generation this client reported, 0 before any
    reported_error: AtomicU64,
    reported_change: AtomicU64,
}

impl ManifestClient {
    pub fn new(
        config: ManifestClientConfig,
        cache: Arc<ManifestCache>,
        fetcher: Arc<dyn ManifestFetcher>,
    ) -> Self {
        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Self {
            config,
            cache,
            fetcher,
            observers: Vec::new(),
            changes,
            reported_error: AtomicU64::new(0),
            reported_change: AtomicU64::new(0),
        }
    }

    /// Client backed by [`HttpManifestFetcher`]
    pub fn http(config: ManifestClientConfig, cache: Arc<ManifestCache>) -> ZephyrResult<Self> {
        let fetcher = HttpManifestFetcher::new(config.timeout)?;
        Ok(Self::new(config, cache, Arc::new(fetcher)))
    }

    pub fn with_observer(mut self, observer: Arc<dyn ManifestObserver>) -> Self {
        self.observers.push(observer);
        self
    }

    pub fn application_uid(&self) -> &str {
        &self.config.application_uid
    }

    pub fn cache(&self) -> &Arc<ManifestCache> {
        &self.cache
    }

    /// Stream of remote changes, one message per moved remote
    pub fn subscribe(&self) -> broadcast::Receiver<RemoteChange> {
        self.changes.subscribe()
    }

    /// Cached manifest, or the result of the single shared fetch.
    ///
    /// Returns `None` when the fetch fails; the error goes to observers.
    pub async fn get_current_manifest(&self) -> Option<Arc<Manifest>> {
        let lookup = self
            .cache
            .lookup(&self.config.application_uid, || self.start_fetch())
            .await;

        match lookup {
            Lookup::Cached(manifest) => Some(manifest),
            Lookup::Join(ticket) => self.complete(&ticket).await,
        }
    }

    /// Re-fetch the manifest, bypassing the cached value.
    ///
    /// A refresh issued while a fetch is running joins it. Each client
    /// diffs against the previous manifest and notifies its observers once
    /// per fetch, however many of its callers awaited it.
    pub async fn refresh(&self) -> Option<Arc<Manifest>> {
        let ticket = self
            .cache
            .refresh(&self.config.application_uid, || self.start_fetch())
            .await;
        if !ticket.initiated {
            debug!(
                "Refresh for {} joined fetch #{}",
                self.config.application_uid, ticket.generation
            );
        }

        let manifest = self.complete(&ticket).await?;

        if let Some(previous) = ticket.previous.as_deref() {
            if self.first_report(&self.reported_change, ticket.generation) {
                self.notify_changes(previous, &manifest);
            }
        }

        Some(manifest)
    }

    /// Refresh on a fixed interval until the handle is aborted
    pub fn spawn_update_poller(self: Arc<Self>, interval: Duration) -> JoinHandle<()> {
        info!(
            "Polling manifest for {} every {:?}",
            self.config.application_uid, interval
        );

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            // First tick completes immediately
            ticker.tick().await;

            loop {
                ticker.tick().await;
                if self.refresh().await.is_none() {
                    debug!("Manifest poll for {} failed", self.config.application_uid);
                }
            }
        })
    }

    fn start_fetch(&self) -> SharedFetch {
        let fetcher = Arc::clone(&self.fetcher);
        let url = self.config.manifest_url.clone();
        debug!("Starting manifest fetch from {}", url);

        async move {
            fetcher
                .fetch(&url)
                .await
                .map(Arc::new)
                .map_err(Arc::new)
        }
        .boxed()
        .shared()
    }

    async fn complete(&self, ticket: &FetchTicket) -> Option<Arc<Manifest>> {
        let outcome = ticket.fetch.clone().await;
        self.cache
            .settle(&self.config.application_uid, ticket.generation, &outcome)
            .await;

        match outcome {
            Ok(manifest) => Some(manifest),
            Err(err) => {
                if self.first_report(&self.reported_error, ticket.generation) {
                    warn!(
                        "Failed to fetch manifest for {}: {}",
                        self.config.application_uid, err
                    );
                    for observer in &self.observers {
                        observer.on_manifest_error(&err);
                    }
                }
                None
            }
        }
    }

    /// True for the first caller on this client to report `generation`
    fn first_report(&self, reported: &AtomicU64, generation: u64) -> bool {
        reported.swap(generation, Ordering::AcqRel) != generation
    }

    fn notify_changes(&self, previous: &Manifest, current: &Arc<Manifest>) {
        let changes = diff_manifests(previous, current);
        if changes.is_empty() {
            return;
        }

        info!(
            "Manifest for {} changed: {} remote(s) moved",
            self.config.application_uid,
            changes.len()
        );

        for observer in &self.observers {
            observer.on_manifest_change(current, previous);
        }

        for change in changes {
            for observer in &self.observers {
                observer.on_remote_change(&change);
            }
            // No subscribers is fine
            let _ = self.changes.send(change);
        }
    }
}
