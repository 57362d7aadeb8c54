//! In-memory link cache with expiry-aware reads and change notification.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use futures::{Stream as FuturesStream, StreamExt};
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;
use tracing::debug;

use super::{CacheKey, CachedLinks};
use crate::model::{Stream, Subtitle};

/// Outcome of a cache probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheLookup {
    /// Entry present with at least one usable stream (expired ones removed).
    Hit(CachedLinks),
    /// Entry present but every stream has expired.
    Stale,
    Miss,
}

impl CacheLookup {
    /// Collapse to the public read contract: stale entries read as absent.
    pub fn into_option(self) -> Option<CachedLinks> {
        match self {
            Self::Hit(links) => Some(links),
            Self::Stale | Self::Miss => None,
        }
    }
}

/// Read counters for measuring cache effectiveness.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub entries: usize,
    pub hits: u64,
    pub stale_hits: u64,
    pub misses: u64,
}

struct Inner {
    entries: DashMap<CacheKey, CachedLinks>,
    revision: watch::Sender<u64>,
    hits: AtomicU64,
    stale_hits: AtomicU64,
    misses: AtomicU64,
}

/// Process-lifetime store of resolved links.
///
/// Every value is indexed twice: under its own key and under the key's
/// film-only form. Expiry is evaluated on read; nothing is evicted in the
/// background. Cloning is cheap and clones share the same store.
#[derive(Clone)]
pub struct LinkCacheRepository {
    inner: Arc<Inner>,
}

impl LinkCacheRepository {
    pub fn new() -> Self {
        let (revision, _) = watch::channel(0);
        Self {
            inner: Arc::new(Inner {
                entries: DashMap::new(),
                revision,
                hits: AtomicU64::new(0),
                stale_hits: AtomicU64::new(0),
                misses: AtomicU64::new(0),
            }),
        }
    }

    /// Insert or overwrite `links` under `key` and `key.film_only()`.
    pub fn store_cache(&self, key: &CacheKey, links: CachedLinks) {
        debug!(%key, streams = links.streams.len(), "storing cached links");
        if !key.is_film_only() {
            self.inner.entries.insert(key.film_only(), links.clone());
        }
        self.inner.entries.insert(key.clone(), links);
        self.notify();
    }

    /// Stored value with expired streams filtered out, or `None`.
    pub fn get_cache(&self, key: &CacheKey) -> Option<CachedLinks> {
        self.lookup(key).into_option()
    }

    /// Like [`get_cache`](Self::get_cache) but tells stale entries apart from misses.
    pub fn lookup(&self, key: &CacheKey) -> CacheLookup {
        self.lookup_at(key, Utc::now())
    }

    pub fn lookup_at(&self, key: &CacheKey, now: DateTime<Utc>) -> CacheLookup {
        let result = match self.inner.entries.get(key) {
            None => CacheLookup::Miss,
            Some(entry) => entry
                .valid_at(now)
                .map_or(CacheLookup::Stale, CacheLookup::Hit),
        };

        let counter = match &result {
            CacheLookup::Hit(_) => &self.inner.hits,
            CacheLookup::Stale => &self.inner.stale_hits,
            CacheLookup::Miss => &self.inner.misses,
        };
        counter.fetch_add(1, Ordering::Relaxed);

        if result == CacheLookup::Stale {
            debug!(%key, "cache entry present but every stream expired");
        }
        result
    }

    /// Append a stream to an existing entry, skipping URLs already present.
    ///
    /// Absent keys are left untouched. Returns `true` if anything changed.
    pub fn add_stream(&self, key: &CacheKey, stream: Stream) -> bool {
        self.modify(key, |links| links.push_stream(stream.clone()))
    }

    /// Append a subtitle, skipping URL + language pairs already present.
    pub fn add_subtitle(&self, key: &CacheKey, subtitle: Subtitle) -> bool {
        self.modify(key, |links| links.push_subtitle(subtitle.clone()))
    }

    /// Replace the watch id of the entry under `key`, and of the film-only
    /// entry when it mirrors the same value.
    ///
    /// Absent keys are left untouched. Returns `true` if anything changed.
    pub fn set_watch_id(&self, key: &CacheKey, watch_id: &str) -> bool {
        let previous = match self.inner.entries.get_mut(key) {
            Some(mut entry) if entry.watch_id != watch_id => {
                std::mem::replace(&mut entry.watch_id, watch_id.to_string())
            }
            _ => return false,
        };

        if !key.is_film_only() {
            if let Some(mut film_entry) = self.inner.entries.get_mut(&key.film_only()) {
                if film_entry.watch_id == previous {
                    film_entry.watch_id = watch_id.to_string();
                }
            }
        }

        self.notify();
        true
    }

    /// Remove both `key` and `key.film_only()`.
    pub fn remove_cache(&self, key: &CacheKey) {
        let removed = self.inner.entries.remove(key).is_some();
        let removed_film = self.inner.entries.remove(&key.film_only()).is_some();
        if removed || removed_film {
            debug!(%key, "removed cached links");
            self.notify();
        }
    }

    /// Current value for `key` now and after every change to the store.
    ///
    /// The first item is emitted immediately. `default` stands in for a
    /// missing entry; both are expiry-filtered, so an entry without usable
    /// streams is emitted as `None`.
    pub fn observe_cache(
        &self,
        key: CacheKey,
        default: CachedLinks,
    ) -> impl FuturesStream<Item = Option<CachedLinks>> + Send + 'static {
        let inner = Arc::clone(&self.inner);
        WatchStream::new(self.inner.revision.subscribe()).map(move |_| {
            let now = Utc::now();
            match inner.entries.get(&key) {
                Some(entry) => entry.valid_at(now),
                None => default.valid_at(now),
            }
        })
    }

    /// Full copy of the store, emitted now and after every change.
    pub fn observe_all(
        &self,
    ) -> impl FuturesStream<Item = HashMap<CacheKey, CachedLinks>> + Send + 'static {
        let inner = Arc::clone(&self.inner);
        WatchStream::new(self.inner.revision.subscribe()).map(move |_| snapshot_of(&inner))
    }

    /// Copy of every physical entry, expired ones included.
    pub fn snapshot(&self) -> HashMap<CacheKey, CachedLinks> {
        snapshot_of(&self.inner)
    }

    /// Empty the whole store.
    pub fn clear(&self) {
        self.inner.entries.clear();
        debug!("link cache cleared");
        self.notify();
    }

    pub fn len(&self) -> usize {
        self.inner.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.entries.is_empty()
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.len(),
            hits: self.inner.hits.load(Ordering::Relaxed),
            stale_hits: self.inner.stale_hits.load(Ordering::Relaxed),
            misses: self.inner.misses.load(Ordering::Relaxed),
        }
    }

    /// Apply `f` to the entry under `key`, then to the film-only entry if it
    /// still mirrors the same watch id.
    ///
    /// Each entry is mutated under its own shard write guard, so concurrent
    /// appends to one key never lose an update.
    fn modify(&self, key: &CacheKey, mut f: impl FnMut(&mut CachedLinks) -> bool) -> bool {
        let (mut changed, watch_id) = match self.inner.entries.get_mut(key) {
            Some(mut entry) => (f(&mut entry), entry.watch_id.clone()),
            None => return false,
        };

        if !key.is_film_only() {
            if let Some(mut film_entry) = self.inner.entries.get_mut(&key.film_only()) {
                if film_entry.watch_id == watch_id {
                    changed |= f(&mut film_entry);
                }
            }
        }

        if changed {
            self.notify();
        }
        changed
    }

    fn notify(&self) {
        self.inner.revision.send_modify(|revision| *revision += 1);
    }
}

fn snapshot_of(inner: &Inner) -> HashMap<CacheKey, CachedLinks> {
    inner
        .entries
        .iter()
        .map(|entry| (entry.key().clone(), entry.value().clone()))
        .collect()
}

impl Default for LinkCacheRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for LinkCacheRepository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LinkCacheRepository")
            .field("entries", &self.len())
            .finish_non_exhaustive()
    }
}
