//! `reel` - media source resolution with a link cache
//!
//! # Features
//!
//! - **Providers**: scrape a streaming catalog for titles, seasons, episodes and hosting servers
//! - **Extractors**: turn a hosting server's embed URL into playable streams and subtitles
//! - **Parallel fan-out**: every supported server is resolved at once, failures stay isolated
//! - **Identity cache**: sequential episodes of one show skip the season/episode lookups
//! - **Link cache**: expiry-aware, observable store of resolved links
//!
//! # Example
//!
//! ```rust,no_run
//! use reel::{Episode, LinkResolver, ReelConfig, SourceEvent};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let resolver = LinkResolver::from_config(&ReelConfig::load()?)?;
//!     let results = resolver.search("flixhq", "dark", 1).await?;
//!     let film = results.results[0].clone().into_film("flixhq");
//!
//!     let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel::<SourceEvent>();
//!     let resolution = resolver.resolve(&film, Some(&Episode::new(1, 1)), &tx).await?;
//!     drop(tx);
//!     while let Some(event) = rx.recv().await {
//!         println!("{event:?}");
//!     }
//!     println!("{} streams", resolution.streams);
//!     Ok(())
//! }
//! ```

pub mod cache;
pub mod config;
pub mod error;
pub mod extractor;
pub mod fingerprint;
pub mod http_client;
pub mod model;
pub mod provider;
pub mod service;

#[cfg(test)]
pub(crate) mod testing;

pub use cache::{CacheKey, CacheLookup, CacheStats, CachedLinks, LinkCacheRepository};
pub use config::{FlixHqConfig, HttpConfig, ReelConfig};
pub use error::{Result, SourceError};
pub use extractor::{CallbackSink, Extractor, ExtractorRegistry, LinkSink, SourceEvent};
pub use fingerprint::{chrome_profile, firefox_profile, random_profile, BrowserProfile, RequestKind};
pub use http_client::{AcceleratedClient, Fetch};
pub use model::{
    Episode, EpisodeRef, Film, FilmInfo, FilmType, Flag, SearchItem, SearchResults, Season, Stream,
    Subtitle,
};
pub use provider::{FanOutReport, FlixHqProvider, SourceProvider};
pub use service::{LinkResolver, Resolution};

/// Version of reel
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
