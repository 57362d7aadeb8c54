//! Server extractors.
//!
//! An [`Extractor`] turns one hosting server's embed URL into playable
//! streams and subtitle tracks. Results are pushed into a [`LinkSink`] as
//! they are found, so a consumer can start playback before every server
//! has answered.
//!
//! # Architecture
//!
//! - [`Extractor`]: async trait implemented once per hosting server
//! - [`ExtractorRegistry`]: ordered, name-keyed set of extractors a provider trusts
//! - [`LinkSink`]: push interface for results (callbacks or a channel)

pub mod direct;
pub mod rabbit;

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::mpsc::UnboundedSender;
use url::Url;

use crate::model::{Stream, Subtitle};

pub use direct::DirectExtractor;
pub use rabbit::RabbitExtractor;

/// Receiver of resolved items.
///
/// Implementations must tolerate calls from many extractors at once.
pub trait LinkSink: Send + Sync {
    fn on_link(&self, stream: Stream);
    fn on_subtitle(&self, subtitle: Subtitle);
}

/// One resolved item, for channel-based consumers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceEvent {
    Link(Stream),
    Subtitle(Subtitle),
}

impl LinkSink for UnboundedSender<SourceEvent> {
    fn on_link(&self, stream: Stream) {
        // A dropped receiver means nobody is listening any more.
        let _ = self.send(SourceEvent::Link(stream));
    }

    fn on_subtitle(&self, subtitle: Subtitle) {
        let _ = self.send(SourceEvent::Subtitle(subtitle));
    }
}

/// Sink built from two closures.
pub struct CallbackSink<L, S> {
    on_link: L,
    on_subtitle: S,
}

impl<L, S> CallbackSink<L, S>
where
    L: Fn(Stream) + Send + Sync,
    S: Fn(Subtitle) + Send + Sync,
{
    pub fn new(on_link: L, on_subtitle: S) -> Self {
        Self {
            on_link,
            on_subtitle,
        }
    }
}

impl<L, S> LinkSink for CallbackSink<L, S>
where
    L: Fn(Stream) + Send + Sync,
    S: Fn(Subtitle) + Send + Sync,
{
    fn on_link(&self, stream: Stream) {
        (self.on_link)(stream);
    }

    fn on_subtitle(&self, subtitle: Subtitle) {
        (self.on_subtitle)(subtitle);
    }
}

/// Resolves a hosting server's embed URL into streams and subtitles.
#[async_trait]
pub trait Extractor: Send + Sync {
    /// Server name as shown by source sites (e.g., `"UpCloud"`).
    fn name(&self) -> &str;

    /// Returns `true` if this extractor handles servers labelled `server_name`.
    fn handles(&self, server_name: &str) -> bool {
        self.name().eq_ignore_ascii_case(server_name.trim())
    }

    /// Extract from `url`, pushing each item into `sink` in discovery order.
    ///
    /// `media_id` and `episode_id` identify the title on the source site for
    /// extractors whose hosts need them.
    async fn extract(
        &self,
        url: &str,
        media_id: &str,
        episode_id: &str,
        sink: &dyn LinkSink,
    ) -> Result<()>;
}

/// Expiry carried by a signed media URL's `expires` query parameter.
pub(crate) fn expiry_from_url(url: &str) -> Option<DateTime<Utc>> {
    let parsed = Url::parse(url).ok()?;
    parsed
        .query_pairs()
        .find(|(key, _)| key == "expires")
        .and_then(|(_, value)| value.parse::<i64>().ok())
        .and_then(|secs| DateTime::from_timestamp(secs, 0))
}

/// Ordered set of extractors, looked up by server name.
///
/// Lookup order is registration order. First match wins.
#[derive(Clone, Default)]
pub struct ExtractorRegistry {
    extractors: Vec<Arc<dyn Extractor>>,
}

impl ExtractorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with(mut self, extractor: impl Extractor + 'static) -> Self {
        self.register(extractor);
        self
    }

    pub fn register(&mut self, extractor: impl Extractor + 'static) {
        self.extractors.push(Arc::new(extractor));
    }

    /// Extractor responsible for `server_name`, if any.
    pub fn find(&self, server_name: &str) -> Option<Arc<dyn Extractor>> {
        self.extractors
            .iter()
            .find(|extractor| extractor.handles(server_name))
            .cloned()
    }

    pub fn supports(&self, server_name: &str) -> bool {
        self.extractors.iter().any(|e| e.handles(server_name))
    }

    pub fn names(&self) -> Vec<&str> {
        self.extractors.iter().map(|e| e.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.extractors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.extractors.is_empty()
    }
}

impl std::fmt::Debug for ExtractorRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}
