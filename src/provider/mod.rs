//! Source providers.
//!
//! A [`SourceProvider`] knows one third-party site: how to search it, read
//! title metadata, find an episode's identity and list the hosting servers
//! that carry it. Turning a server into streams is delegated to the
//! [`Extractor`](crate::extractor::Extractor)s the provider trusts, via
//! [`fan_out`].

pub mod flixhq;
pub mod identity;

use std::future::Future;

use async_trait::async_trait;
use futures::future::join_all;
use tracing::{debug, warn};

use crate::error::Result;
use crate::extractor::{ExtractorRegistry, LinkSink};
use crate::model::{EpisodeRef, FilmInfo, FilmType, SearchResults};

pub use flixhq::FlixHqProvider;
pub use identity::{EpisodeEntry, EpisodeIndex, IdentityCache};

/// A candidate hosting server listed on a source page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerRef {
    /// Site-native server link id.
    pub id: String,
    /// Display name, matched against extractor names.
    pub name: String,
}

impl ServerRef {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// What happened across one fan-out.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FanOutReport {
    /// Site identifier of the title or episode the servers were listed for.
    pub watch_id: String,
    /// Servers with a matching extractor that were dispatched.
    pub attempted: usize,
    /// Dispatched servers whose extractor finished without error.
    pub succeeded: usize,
    /// Servers dropped because no extractor handles them.
    pub unsupported: usize,
}

impl FanOutReport {
    pub fn failed(&self) -> usize {
        self.attempted - self.succeeded
    }
}

/// Trait for per-site scraping providers.
#[async_trait]
pub trait SourceProvider: Send + Sync {
    /// Short provider id used in cache keys (e.g., `"flixhq"`).
    fn name(&self) -> &'static str;

    /// Extractors this provider dispatches to, in preference order.
    fn supported_extractors(&self) -> &ExtractorRegistry;

    /// Search the provider's catalog.
    async fn search(&self, query: &str, page: u32) -> Result<SearchResults>;

    /// Metadata for one title. Repeated calls for the same title are memoized.
    async fn get_film_info(&self, film_id: &str, film_type: FilmType) -> Result<FilmInfo>;

    /// Find every stream and subtitle for a film, or one episode of a show.
    ///
    /// Items are pushed into `sink` as extractors find them. Only failures
    /// that affect the whole request (identity resolution, the server list)
    /// are returned as errors; each server fails on its own.
    async fn get_source_links(
        &self,
        film_id: &str,
        episode: Option<EpisodeRef>,
        sink: &dyn LinkSink,
    ) -> Result<FanOutReport>;
}

/// Resolve every supported server concurrently and run its extractor.
///
/// Servers without a matching extractor are dropped without error. For the
/// rest, `resolve_embed` turns the server into an embed URL and the matching
/// extractor pushes its results into `sink`. A failing branch is logged and
/// does not affect the others. Dropping the returned future cancels every
/// branch still in flight.
pub async fn fan_out<F, Fut>(
    registry: &ExtractorRegistry,
    servers: Vec<ServerRef>,
    media_id: &str,
    episode_id: &str,
    sink: &dyn LinkSink,
    resolve_embed: F,
) -> FanOutReport
where
    F: Fn(ServerRef) -> Fut,
    Fut: Future<Output = anyhow::Result<String>>,
{
    let mut report = FanOutReport {
        watch_id: episode_id.to_string(),
        ..FanOutReport::default()
    };
    let mut branches = Vec::new();

    for server in servers {
        let Some(extractor) = registry.find(&server.name) else {
            debug!(server = %server.name, "no extractor for server, skipping");
            report.unsupported += 1;
            continue;
        };

        let embed = resolve_embed(server.clone());
        branches.push(async move {
            let outcome = async {
                let url = embed.await?;
                debug!(server = %server.name, %url, "dispatching to extractor");
                extractor.extract(&url, media_id, episode_id, sink).await
            }
            .await;
            (server.name, outcome)
        });
    }

    report.attempted = branches.len();
    for (server, outcome) in join_all(branches).await {
        match outcome {
            Ok(()) => report.succeeded += 1,
            Err(e) => warn!("Server {} failed: {:#}", server, e),
        }
    }

    report
}
