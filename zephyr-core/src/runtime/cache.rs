//! Manifest Cache
//!
//! Per-application cache shared by every client and plugin that is handed the
//! same instance. Each entry is a small state machine:
//!
//! ```text
//! Empty ──fetch──▶ Fetching ──ok──▶ Ready
//!                     │      ──err─▶ Failed
//! Ready | Failed ──refresh──▶ Fetching      (Fetching is joined, never replaced)
//! ```

use futures::future::{BoxFuture, Shared};
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

use super::fetcher::FetchError;
use zephyr_protocol::Manifest;

pub type FetchOutcome = Result<Arc<Manifest>, Arc<FetchError>>;
pub type SharedFetch = Shared<BoxFuture<'static, FetchOutcome>>;

/// A fetch every concurrent caller awaits
#[derive(Clone)]
pub struct InFlight {
    generation: u64,
    fetch: SharedFetch,
    /// Manifest that was cached when a refresh started this fetch
    previous: Option<Arc<Manifest>>,
}

#[derive(Clone)]
pub enum CacheState {
    Empty,
    Fetching(InFlight),
    Ready(Arc<Manifest>),
    Failed(Arc<FetchError>),
}

impl fmt::Debug for CacheState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheState::Empty => write!(f, "Empty"),
            CacheState::Fetching(in_flight) => write!(f, "Fetching(#{})", in_flight.generation),
            CacheState::Ready(manifest) => write!(f, "Ready({})", manifest.timestamp),
            CacheState::Failed(err) => write!(f, "Failed({})", err),
        }
    }
}

/// Handle on a fetch a caller should await
pub struct FetchTicket {
    pub(crate) generation: u64,
    pub(crate) fetch: SharedFetch,
    pub(crate) previous: Option<Arc<Manifest>>,
    /// This caller moved the entry into `Fetching`
    pub(crate) initiated: bool,
}

impl From<(&InFlight, bool)> for FetchTicket {
    fn from((in_flight, initiated): (&InFlight, bool)) -> Self {
        Self {
            generation: in_flight.generation,
            fetch: in_flight.fetch.clone(),
            previous: in_flight.previous.clone(),
            initiated,
        }
    }
}

pub enum Lookup {
    Cached(Arc<Manifest>),
    Join(FetchTicket),
}

pub struct ManifestCache {
    entries: Mutex<HashMap<String, CacheState>>,
    generations: AtomicU64,
}

impl ManifestCache {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            generations: AtomicU64::new(1),
        }
    }

    /// Cached manifest, if the entry is `Ready`
    pub async fn get(&self, application_uid: &str) -> Option<Arc<Manifest>> {
        match self.entries.lock().await.get(application_uid) {
            Some(CacheState::Ready(manifest)) => Some(Arc::clone(manifest)),
            _ => None,
        }
    }

    /// Store a manifest; replaces whatever the entry held
    pub async fn set(&self, application_uid: &str, manifest: Arc<Manifest>) {
        self.entries
            .lock()
            .await
            .insert(application_uid.to_string(), CacheState::Ready(manifest));
    }

    /// Drop a cached manifest or failure. An in-flight fetch is kept.
    pub async fn clear(&self, application_uid: &str) {
        let mut entries = self.entries.lock().await;
        if let Some(state) = entries.get_mut(application_uid) {
            if !matches!(state, CacheState::Fetching(_)) {
                *state = CacheState::Empty;
            }
        }
    }

    pub async fn state(&self, application_uid: &str) -> CacheState {
        self.entries
            .lock()
            .await
            .get(application_uid)
            .cloned()
            .unwrap_or(CacheState::Empty)
    }

    /// Cached manifest, the in-flight fetch, or a new fetch built by `start`
    pub(crate) async fn lookup(
        &self,
        application_uid: &str,
        start: impl FnOnce() -> SharedFetch,
    ) -> Lookup {
        let mut entries = self.entries.lock().await;
        let state = entries
            .entry(application_uid.to_string())
            .or_insert(CacheState::Empty);

        match state {
            CacheState::Ready(manifest) => return Lookup::Cached(Arc::clone(manifest)),
            CacheState::Fetching(in_flight) => {
                debug!("Joining in-flight manifest fetch for {}", application_uid);
                return Lookup::Join(FetchTicket::from((&*in_flight, false)));
            }
            CacheState::Empty | CacheState::Failed(_) => {}
        }

        let in_flight = self.begin(start, None);
        let ticket = FetchTicket::from((&in_flight, true));
        *state = CacheState::Fetching(in_flight);
        Lookup::Join(ticket)
    }

    /// Force a fetch, joining one that is already running
    pub(crate) async fn refresh(
        &self,
        application_uid: &str,
        start: impl FnOnce() -> SharedFetch,
    ) -> FetchTicket {
        let mut entries = self.entries.lock().await;
        let state = entries
            .entry(application_uid.to_string())
            .or_insert(CacheState::Empty);

        let previous = match state {
            CacheState::Fetching(in_flight) => {
                debug!("Refresh joins in-flight manifest fetch for {}", application_uid);
                return FetchTicket::from((&*in_flight, false));
            }
            CacheState::Ready(manifest) => Some(Arc::clone(manifest)),
            CacheState::Empty | CacheState::Failed(_) => None,
        };

        let in_flight = self.begin(start, previous);
        let ticket = FetchTicket::from((&in_flight, true));
        *state = CacheState::Fetching(in_flight);
        ticket
    }

    /// Record the outcome of fetch `generation`.
    ///
    /// Returns `false` when another caller already settled it or the entry
    /// has moved on.
    pub(crate) async fn settle(
        &self,
        application_uid: &str,
        generation: u64,
        outcome: &FetchOutcome,
    ) -> bool {
        let mut entries = self.entries.lock().await;
        let Some(state) = entries.get_mut(application_uid) else {
            return false;
        };
        match state {
            CacheState::Fetching(in_flight) if in_flight.generation == generation => {}
            _ => return false,
        }

        *state = match outcome {
            Ok(manifest) => CacheState::Ready(Arc::clone(manifest)),
            Err(err) => CacheState::Failed(Arc::clone(err)),
        };
        true
    }

    fn begin(
        &self,
        start: impl FnOnce() -> SharedFetch,
        previous: Option<Arc<Manifest>>,
    ) -> InFlight {
        InFlight {
            generation: self.generations.fetch_add(1, Ordering::Relaxed),
            fetch: start(),
            previous,
        }
    }
}

impl Default for ManifestCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::FutureExt;

    fn manifest(timestamp: &str) -> Arc<Manifest> {
        Arc::new(Manifest {
            version: "1.0.0".to_string(),
            timestamp: timestamp.to_string(),
            application_uid: "host.shop.acme".to_string(),
            dependencies: Default::default(),
        })
    }

    fn ready_fetch(manifest: Arc<Manifest>) -> SharedFetch {
        async move { Ok(manifest) }.boxed().shared()
    }

    #[tokio::test]
    async fn test_get_set_clear() {
        let cache = ManifestCache::new();
        assert!(cache.get("host.shop.acme").await.is_none());

        cache.set("host.shop.acme", manifest("a")).await;
        assert_eq!(cache.get("host.shop.acme").await.unwrap().timestamp, "a");

        cache.clear("host.shop.acme").await;
        assert!(cache.get("host.shop.acme").await.is_none());
        assert!(matches!(cache.state("host.shop.acme").await, CacheState::Empty));
    }

    #[tokio::test]
    async fn test_concurrent_lookups_share_one_fetch() {
        let cache = ManifestCache::new();
        let first = cache.lookup("host.shop.acme", || ready_fetch(manifest("a"))).await;
        let second = cache
            .lookup("host.shop.acme", || panic!("second lookup must join"))
            .await;

        let (Lookup::Join(first), Lookup::Join(second)) = (first, second) else {
            panic!("expected both lookups to join a fetch");
        };
        assert!(first.initiated);
        assert!(!second.initiated);
        assert_eq!(first.generation, second.generation);
    }

    #[tokio::test]
    async fn test_clear_keeps_in_flight_fetch() {
        let cache = ManifestCache::new();
        let _ = cache.lookup("host.shop.acme", || ready_fetch(manifest("a"))).await;
        cache.clear("host.shop.acme").await;
        assert!(matches!(cache.state("host.shop.acme").await, CacheState::Fetching(_)));
    }

    #[tokio::test]
    async fn test_settle_only_once_per_generation() {
        let cache = ManifestCache::new();
        let lookup = cache.lookup("host.shop.acme", || ready_fetch(manifest("a"))).await;
        let Lookup::Join(ticket) = lookup else {
            panic!("expected a fetch");
        };
        let outcome = ticket.fetch.clone().await;

        assert!(cache.settle("host.shop.acme", ticket.generation, &outcome).await);
        assert!(!cache.settle("host.shop.acme", ticket.generation, &outcome).await);
        assert!(matches!(cache.state("host.shop.acme").await, CacheState::Ready(_)));
    }

    #[tokio::test]
    async fn test_refresh_remembers_previous_manifest() {
        let cache = ManifestCache::new();
        cache.set("host.shop.acme", manifest("a")).await;

        let ticket = cache.refresh("host.shop.acme", || ready_fetch(manifest("b"))).await;
        assert!(ticket.initiated);
        assert_eq!(ticket.previous.unwrap().timestamp, "a");
        assert!(cache.get("host.shop.acme").await.is_none());

        let joined = cache
            .refresh("host.shop.acme", || panic!("refresh must join the running fetch"))
            .await;
        assert!(!joined.initiated);
    }
}
