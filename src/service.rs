//! Cache-first link resolution.
//!
//! [`LinkResolver`] is the entry point consumers use: it owns the provider
//! list and the [`LinkCacheRepository`], replays cached results when they are
//! still usable, and otherwise runs a provider while recording every item it
//! delivers.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use futures::{Stream as FuturesStream, StreamExt};
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use crate::cache::{CacheKey, CacheLookup, CachedLinks, LinkCacheRepository};
use crate::config::ReelConfig;
use crate::error::{Result, SourceError};
use crate::extractor::{LinkSink, SourceEvent};
use crate::http_client::AcceleratedClient;
use crate::model::{Episode, Film, FilmInfo, FilmType, SearchResults, Stream, Subtitle};
use crate::provider::{FanOutReport, FlixHqProvider, SourceProvider};

/// Outcome of one [`LinkResolver::resolve`] call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub key: CacheKey,
    /// Items were replayed from the cache; no provider ran.
    pub from_cache: bool,
    /// Streams delivered to the sink.
    pub streams: usize,
    /// Subtitles delivered to the sink.
    pub subtitles: usize,
    /// Fan-out summary, when a provider ran.
    pub report: Option<FanOutReport>,
}

impl Resolution {
    /// No server produced a stream. Distinct from a resolution error.
    pub fn is_unavailable(&self) -> bool {
        self.streams == 0
    }
}

/// Forwards items downstream and appends them to the cache entry.
struct CachingSink<'a> {
    cache: &'a LinkCacheRepository,
    key: &'a CacheKey,
    downstream: &'a dyn LinkSink,
    streams: AtomicUsize,
    subtitles: AtomicUsize,
}

impl<'a> CachingSink<'a> {
    fn new(cache: &'a LinkCacheRepository, key: &'a CacheKey, downstream: &'a dyn LinkSink) -> Self {
        Self {
            cache,
            key,
            downstream,
            streams: AtomicUsize::new(0),
            subtitles: AtomicUsize::new(0),
        }
    }

    fn counts(&self) -> (usize, usize) {
        (
            self.streams.load(Ordering::Relaxed),
            self.subtitles.load(Ordering::Relaxed),
        )
    }
}

impl LinkSink for CachingSink<'_> {
    fn on_link(&self, stream: Stream) {
        self.cache.add_stream(self.key, stream.clone());
        self.streams.fetch_add(1, Ordering::Relaxed);
        self.downstream.on_link(stream);
    }

    fn on_subtitle(&self, subtitle: Subtitle) {
        self.cache.add_subtitle(self.key, subtitle.clone());
        self.subtitles.fetch_add(1, Ordering::Relaxed);
        self.downstream.on_subtitle(subtitle);
    }
}

/// Providers plus the shared link cache.
pub struct LinkResolver {
    providers: Vec<Arc<dyn SourceProvider>>,
    cache: LinkCacheRepository,
}

impl LinkResolver {
    pub fn new(cache: LinkCacheRepository) -> Self {
        Self {
            providers: Vec::new(),
            cache,
        }
    }

    /// Resolver with every built-in provider, configured from `config`.
    pub fn from_config(config: &ReelConfig) -> anyhow::Result<Self> {
        let client = Arc::new(AcceleratedClient::with_config(&config.http)?);
        Ok(Self::new(LinkCacheRepository::new())
            .with_provider(FlixHqProvider::new(&config.flixhq, client)))
    }

    #[must_use]
    pub fn with_provider(mut self, provider: impl SourceProvider + 'static) -> Self {
        self.providers.push(Arc::new(provider));
        self
    }

    pub fn cache(&self) -> &LinkCacheRepository {
        &self.cache
    }

    pub fn provider_names(&self) -> Vec<&'static str> {
        self.providers.iter().map(|p| p.name()).collect()
    }

    /// Provider registered as `id`.
    pub fn provider(&self, id: &str) -> Result<Arc<dyn SourceProvider>> {
        self.providers
            .iter()
            .find(|p| p.name() == id)
            .cloned()
            .ok_or_else(|| SourceError::UnknownProvider(id.to_string()))
    }

    pub async fn search(&self, provider_id: &str, query: &str, page: u32) -> Result<SearchResults> {
        self.provider(provider_id)?.search(query, page).await
    }

    pub async fn film_info(
        &self,
        provider_id: &str,
        film_id: &str,
        film_type: FilmType,
    ) -> Result<FilmInfo> {
        self.provider(provider_id)?
            .get_film_info(film_id, film_type)
            .await
    }

    fn key_for(film: &Film, episode: Option<&Episode>) -> CacheKey {
        CacheKey::create(&film.id, &film.provider_id, episode)
    }

    /// Usable cached links, expired streams removed.
    pub fn get_cached_links(&self, film: &Film, episode: Option<&Episode>) -> Option<CachedLinks> {
        self.cache.get_cache(&Self::key_for(film, episode))
    }

    /// Cached links for the title, now and after every cache change.
    pub fn observe_cached_links(
        &self,
        film: &Film,
        episode: Option<&Episode>,
    ) -> impl FuturesStream<Item = Option<CachedLinks>> + Send + 'static {
        self.cache
            .observe_cache(Self::key_for(film, episode), CachedLinks::empty())
    }

    pub fn remove_cached_links(&self, film: &Film, episode: Option<&Episode>) {
        self.cache.remove_cache(&Self::key_for(film, episode));
    }

    pub fn clear_cache(&self) {
        self.cache.clear();
    }

    /// Deliver every stream and subtitle for `film` (or one `episode`) to `sink`.
    ///
    /// Usable cached links are replayed without touching the network.
    /// Otherwise an empty entry is seeded and filled as the provider's
    /// extractors report in, so a dropped or cancelled call keeps whatever
    /// arrived before it stopped.
    ///
    /// # Errors
    ///
    /// Unknown provider, or a failure the provider reports for the whole
    /// request (see [`SourceError::is_resolution_failure`]). A run that
    /// finds nothing is `Ok` with [`Resolution::is_unavailable`] set.
    #[instrument(skip(self, film, episode, sink), fields(film = %film.id, provider = %film.provider_id))]
    pub async fn resolve(
        &self,
        film: &Film,
        episode: Option<&Episode>,
        sink: &dyn LinkSink,
    ) -> Result<Resolution> {
        let provider = self.provider(&film.provider_id)?;
        let key = Self::key_for(film, episode);

        match self.cache.lookup(&key) {
            CacheLookup::Hit(links) => {
                debug!(%key, streams = links.streams.len(), "replaying cached links");
                return Ok(replay(key, links, sink));
            }
            CacheLookup::Stale => debug!(%key, "cached links expired, resolving again"),
            CacheLookup::Miss => {}
        }

        let watch_id = episode
            .and_then(|e| e.id.clone())
            .unwrap_or_else(|| key.to_string());
        self.cache
            .store_cache(&key, CachedLinks::new(watch_id, provider.name()));

        let caching = CachingSink::new(&self.cache, &key, sink);
        let outcome = provider
            .get_source_links(&film.id, key.episode(), &caching)
            .await;
        let (streams, subtitles) = caching.counts();

        match outcome {
            Ok(report) => {
                if !report.watch_id.is_empty() {
                    self.cache.set_watch_id(&key, &report.watch_id);
                }
                info!(streams, subtitles, watch_id = %report.watch_id, "resolution finished");
                Ok(Resolution {
                    key,
                    from_cache: false,
                    streams,
                    subtitles,
                    report: Some(report),
                })
            }
            Err(e) => {
                if streams == 0 {
                    self.cache.remove_cache(&key);
                }
                Err(e)
            }
        }
    }

    /// [`resolve`](Self::resolve) that stops when `token` is cancelled.
    ///
    /// Items delivered before cancellation stay cached.
    pub async fn resolve_with_cancel(
        &self,
        film: &Film,
        episode: Option<&Episode>,
        sink: &dyn LinkSink,
        token: &CancellationToken,
    ) -> Result<Resolution> {
        tokio::select! {
            biased;
            () = token.cancelled() => {
                info!(film = %film.id, "resolution cancelled");
                Err(SourceError::Cancelled)
            }
            result = self.resolve(film, episode, sink) => result,
        }
    }

    /// [`resolve`](Self::resolve) as a stream of events.
    ///
    /// The stream ends when resolution finishes; a request-level failure is
    /// its last item. Resolution runs on its own task, so dropping the
    /// stream early still lets the cache fill.
    pub fn resolve_events(
        self: &Arc<Self>,
        film: Film,
        episode: Option<Episode>,
    ) -> impl FuturesStream<Item = Result<SourceEvent>> + Send + 'static {
        let (tx, rx) = mpsc::unbounded_channel::<SourceEvent>();
        let resolver = Arc::clone(self);
        let task =
            tokio::spawn(async move { resolver.resolve(&film, episode.as_ref(), &tx).await });

        let outcome = futures::stream::once(task).filter_map(|joined| async move {
            match joined {
                Ok(Ok(_)) => None,
                Ok(Err(e)) => Some(Err(e)),
                Err(e) => {
                    warn!("resolution task ended abnormally: {}", e);
                    Some(Err(SourceError::Cancelled))
                }
            }
        });

        UnboundedReceiverStream::new(rx).map(Ok).chain(outcome)
    }
}

fn replay(key: CacheKey, links: CachedLinks, sink: &dyn LinkSink) -> Resolution {
    let streams = links.streams.len();
    let subtitles = links.subtitles.len();
    for stream in links.streams {
        sink.on_link(stream);
    }
    for subtitle in links.subtitles {
        sink.on_subtitle(subtitle);
    }
    Resolution {
        key,
        from_cache: true,
        streams,
        subtitles,
        report: None,
    }
}
