//! Provider for FlixHQ-layout streaming catalogs.
//!
//! Endpoints (relative to the configured base URL):
//!
//! | Purpose          | Path                                   |
//! |------------------|----------------------------------------|
//! | search           | `/search/{slug}?page={n}`              |
//! | title page       | `/{film_id}`                           |
//! | season index     | `/ajax/v2/tv/seasons/{show_id}`        |
//! | episode list     | `/ajax/v2/season/episodes/{season_id}` |
//! | episode servers  | `/ajax/v2/episode/servers/{episode_id}`|
//! | movie servers    | `/ajax/movie/episodes/{movie_id}`      |
//! | embed link       | `/ajax/sources/{server_id}`            |
//!
//! Film ids look like `movie/watch-heat-19736`; the trailing number is the
//! site's numeric media id.

use std::sync::{Arc, LazyLock};

use anyhow::Context;
use async_trait::async_trait;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use serde::Deserialize;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument};

use super::identity::{EpisodeEntry, EpisodeIndex, IdentityCache};
use super::{fan_out, FanOutReport, ServerRef, SourceProvider};
use crate::config::FlixHqConfig;
use crate::error::{Result, SourceError};
use crate::extractor::{DirectExtractor, ExtractorRegistry, LinkSink, RabbitExtractor};
use crate::fingerprint::RequestKind;
use crate::http_client::Fetch;
use crate::model::{EpisodeRef, Film, FilmInfo, FilmType, SearchItem, SearchResults, Season};

/// Provider id used in cache keys.
pub const PROVIDER_ID: &str = "flixhq";

fn css(selector: &str) -> Selector {
    Selector::parse(selector).expect("static selector is valid")
}

static SEARCH_ITEM: LazyLock<Selector> = LazyLock::new(|| css("div.flw-item"));
static SEARCH_LINK: LazyLock<Selector> = LazyLock::new(|| css(".film-name a, .film-poster a"));
static SEARCH_POSTER: LazyLock<Selector> = LazyLock::new(|| css("img.film-poster-img"));
static SEARCH_INFO: LazyLock<Selector> = LazyLock::new(|| css(".fd-infor .fdi-item"));
static SEARCH_TYPE: LazyLock<Selector> = LazyLock::new(|| css(".fd-infor .fdi-type"));
static NEXT_PAGE: LazyLock<Selector> = LazyLock::new(|| css(r#".pagination a[title="Next"]"#));

static TITLE: LazyLock<Selector> = LazyLock::new(|| css(".heading-name"));
static DESCRIPTION: LazyLock<Selector> = LazyLock::new(|| css(".description"));
static ROW_LINE: LazyLock<Selector> = LazyLock::new(|| css(".elements .row-line"));
static ANCHOR: LazyLock<Selector> = LazyLock::new(|| css("a"));
static SPAN: LazyLock<Selector> = LazyLock::new(|| css("span"));

static SEASON_LINK: LazyLock<Selector> = LazyLock::new(|| css(".dropdown-menu a[data-id]"));
static EPISODE_LINK: LazyLock<Selector> = LazyLock::new(|| css(".nav .nav-item a[data-id]"));
static SERVER_LINK: LazyLock<Selector> =
    LazyLock::new(|| css(".nav .nav-item a[data-linkid], .nav .nav-item a[data-id]"));

static SEASON_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)season\s*(\d+)").expect("static regex is valid"));
static EPISODE_LABEL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*(?:eps?|episode)\s*(\d+)\s*:?\s*(.*)$").expect("static regex is valid")
});
static YEAR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(19|20)\d{2}\b").expect("static regex is valid"));

/// FlixHQ-layout catalog scraper.
pub struct FlixHqProvider {
    base_url: String,
    client: Arc<dyn Fetch>,
    extractors: ExtractorRegistry,
    identity: Mutex<IdentityCache>,
    info_memo: Mutex<Option<(String, FilmType, FilmInfo)>>,
}

impl FlixHqProvider {
    /// Provider trusting the `UpCloud`, `Vidcloud` and `Direct` servers.
    pub fn new(config: &FlixHqConfig, client: Arc<dyn Fetch>) -> Self {
        let extractors = ExtractorRegistry::new()
            .with(RabbitExtractor::upcloud(client.clone()))
            .with(RabbitExtractor::vidcloud(client.clone()))
            .with(DirectExtractor::default());
        Self::with_extractors(config, client, extractors)
    }

    pub fn with_extractors(
        config: &FlixHqConfig,
        client: Arc<dyn Fetch>,
        extractors: ExtractorRegistry,
    ) -> Self {
        Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            client,
            extractors,
            identity: Mutex::new(IdentityCache::new()),
            info_memo: Mutex::new(None),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn get(&self, url: &str, kind: RequestKind) -> Result<String> {
        self.client
            .get_text(url, kind, Some(&self.base_url))
            .await
            .map_err(|e| SourceError::http(url, e))
    }

    /// `movie/watch-heat-19736` from a bare id or a full title URL.
    fn normalize_id<'a>(&self, film_id: &'a str) -> &'a str {
        let id = film_id.trim();
        id.strip_prefix(self.base_url.as_str())
            .unwrap_or(id)
            .trim_matches('/')
    }

    /// Ask the site which embed URL a server plays from.
    async fn resolve_embed(&self, server: ServerRef) -> anyhow::Result<String> {
        let url = format!("{}/ajax/sources/{}", self.base_url, server.id);
        let body = self
            .client
            .get_text(&url, RequestKind::Ajax, Some(&self.base_url))
            .await
            .with_context(|| format!("{}: embed lookup failed", server.name))?;
        let embed: EmbedLink = serde_json::from_str(&body)
            .with_context(|| format!("{}: invalid embed payload", server.name))?;
        Ok(embed.link)
    }
}

#[derive(Debug, Deserialize)]
struct EmbedLink {
    link: String,
}

#[async_trait]
impl EpisodeIndex for FlixHqProvider {
    async fn fetch_seasons(&self, show_id: &str) -> Result<Vec<Season>> {
        let url = format!("{}/ajax/v2/tv/seasons/{show_id}", self.base_url);
        let html = self.get(&url, RequestKind::Ajax).await?;
        Ok(parse_seasons(&html))
    }

    async fn fetch_episodes(&self, _show_id: &str, season: &Season) -> Result<Vec<EpisodeEntry>> {
        let url = format!("{}/ajax/v2/season/episodes/{}", self.base_url, season.id);
        let html = self.get(&url, RequestKind::Ajax).await?;
        Ok(parse_episodes(&html))
    }
}

#[async_trait]
impl SourceProvider for FlixHqProvider {
    fn name(&self) -> &'static str {
        PROVIDER_ID
    }

    fn supported_extractors(&self) -> &ExtractorRegistry {
        &self.extractors
    }

    #[instrument(skip(self))]
    async fn search(&self, query: &str, page: u32) -> Result<SearchResults> {
        let page = page.max(1);
        let slug = slugify(query);
        if slug.is_empty() {
            return Ok(SearchResults {
                page,
                ..SearchResults::default()
            });
        }

        let url = format!(
            "{}/search/{}?page={page}",
            self.base_url,
            urlencoding::encode(&slug)
        );
        let html = self.get(&url, RequestKind::Document).await?;
        let results = parse_search(&html, page);
        debug!(hits = results.results.len(), "search complete");
        Ok(results)
    }

    #[instrument(skip(self))]
    async fn get_film_info(&self, film_id: &str, film_type: FilmType) -> Result<FilmInfo> {
        let id = self.normalize_id(film_id);
        if let Some((memo_id, memo_type, info)) = &*self.info_memo.lock().await {
            if memo_id == id && *memo_type == film_type {
                debug!("film info memo hit");
                return Ok(info.clone());
            }
        }

        let url = format!("{}/{id}", self.base_url);
        let html = self.get(&url, RequestKind::Document).await?;
        let mut info = parse_film_info(&html, &url, id, film_type)?;
        if film_type == FilmType::TvShow {
            info.seasons = self.fetch_seasons(&media_id(id)?).await?;
        }

        *self.info_memo.lock().await = Some((id.to_string(), film_type, info.clone()));
        Ok(info)
    }

    #[instrument(skip(self, sink))]
    async fn get_source_links(
        &self,
        film_id: &str,
        episode: Option<EpisodeRef>,
        sink: &dyn LinkSink,
    ) -> Result<FanOutReport> {
        let media_id = media_id(self.normalize_id(film_id))?;
        let (episode_id, servers_url) = match episode {
            Some(episode) => {
                let episode_id = self
                    .identity
                    .lock()
                    .await
                    .resolve(self, &media_id, episode)
                    .await?;
                let url = format!("{}/ajax/v2/episode/servers/{episode_id}", self.base_url);
                (episode_id, url)
            }
            None => {
                let url = format!("{}/ajax/movie/episodes/{media_id}", self.base_url);
                (media_id.clone(), url)
            }
        };

        let html = self.get(&servers_url, RequestKind::Ajax).await?;
        let servers = parse_servers(&html);
        debug!(count = servers.len(), "server list");

        let report = fan_out(&self.extractors, servers, &media_id, &episode_id, sink, |server| {
            self.resolve_embed(server)
        })
        .await;
        info!(
            attempted = report.attempted,
            succeeded = report.succeeded,
            unsupported = report.unsupported,
            "source fan-out finished"
        );
        Ok(report)
    }
}

/// Trailing numeric media id of a film id.
fn media_id(film_id: &str) -> Result<String> {
    film_id
        .rsplit('-')
        .next()
        .filter(|tail| !tail.is_empty() && tail.bytes().all(|b| b.is_ascii_digit()))
        .map(str::to_string)
        .ok_or_else(|| SourceError::parse(film_id, "film id has no numeric media id"))
}

/// `"The Dark Knight!"` -> `"the-dark-knight"`.
fn slugify(query: &str) -> String {
    let lowered = query.to_lowercase();
    let mut slug = String::with_capacity(lowered.len());
    for c in lowered.chars() {
        if c.is_alphanumeric() {
            slug.push(c);
        } else if !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
    }
    slug.trim_end_matches('-').to_string()
}

fn text_of(element: ElementRef<'_>) -> String {
    element
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

fn parse_search(html: &str, page: u32) -> SearchResults {
    let document = Html::parse_document(html);
    let results = document
        .select(&SEARCH_ITEM)
        .filter_map(parse_search_item)
        .collect();

    SearchResults {
        page,
        has_next_page: document.select(&NEXT_PAGE).next().is_some(),
        results,
    }
}

fn parse_search_item(item: ElementRef<'_>) -> Option<SearchItem> {
    let link = item.select(&SEARCH_LINK).next()?;
    let id = link.value().attr("href")?.trim_matches('/').to_string();
    let title = link
        .value()
        .attr("title")
        .map(str::to_string)
        .unwrap_or_else(|| text_of(link));

    let type_label = item.select(&SEARCH_TYPE).next().map(text_of);
    let film_type = if id.starts_with("tv/") || type_label.as_deref() == Some("TV") {
        FilmType::TvShow
    } else {
        FilmType::Movie
    };

    let year = item
        .select(&SEARCH_INFO)
        .map(text_of)
        .find_map(|text| text.parse::<u32>().ok().filter(|y| (1900..=2100).contains(y)));

    let poster_url = item.select(&SEARCH_POSTER).next().and_then(|img| {
        img.value()
            .attr("data-src")
            .or_else(|| img.value().attr("src"))
            .map(str::to_string)
    });

    Some(SearchItem {
        id,
        title,
        film_type,
        year,
        poster_url,
    })
}

fn parse_film_info(html: &str, url: &str, film_id: &str, film_type: FilmType) -> Result<FilmInfo> {
    let document = Html::parse_document(html);
    let title = document
        .select(&TITLE)
        .next()
        .map(text_of)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| SourceError::parse(url, "title heading missing"))?;

    let description = document
        .select(&DESCRIPTION)
        .next()
        .map(text_of)
        .filter(|d| !d.is_empty());

    let mut genres = Vec::new();
    let mut year = None;
    for row in document.select(&ROW_LINE) {
        let text = text_of(row);
        if text.starts_with("Genre") {
            genres.extend(row.select(&ANCHOR).map(text_of));
        } else if text.starts_with("Released") {
            year = YEAR.find(&text).and_then(|m| m.as_str().parse().ok());
        }
    }

    let poster_url = document.select(&SEARCH_POSTER).next().and_then(|img| {
        img.value().attr("src").map(str::to_string)
    });

    Ok(FilmInfo {
        film: Film {
            id: film_id.to_string(),
            provider_id: PROVIDER_ID.to_string(),
            title,
            film_type,
            year,
            poster_url,
        },
        description,
        genres,
        seasons: Vec::new(),
    })
}

fn parse_seasons(html: &str) -> Vec<Season> {
    let fragment = Html::parse_fragment(html);
    fragment
        .select(&SEASON_LINK)
        .enumerate()
        .filter_map(|(index, link)| {
            let id = link.value().attr("data-id")?.to_string();
            let name = text_of(link);
            let number = SEASON_NUMBER
                .captures(&name)
                .and_then(|c| c[1].parse().ok())
                .unwrap_or_else(|| u32::try_from(index + 1).unwrap_or(u32::MAX));
            Some(Season { number, id, name })
        })
        .collect()
}

fn parse_episodes(html: &str) -> Vec<EpisodeEntry> {
    let fragment = Html::parse_fragment(html);
    fragment
        .select(&EPISODE_LINK)
        .filter_map(|link| {
            let id = link.value().attr("data-id")?.to_string();
            let label = link
                .value()
                .attr("title")
                .map(str::to_string)
                .unwrap_or_else(|| text_of(link));
            let (number, title) = match EPISODE_LABEL.captures(&label) {
                Some(c) => (
                    c[1].parse().ok(),
                    Some(c[2].trim().to_string()).filter(|t| !t.is_empty()),
                ),
                None => (None, Some(label.clone()).filter(|t| !t.is_empty())),
            };
            Some(EpisodeEntry {
                number,
                id,
                title,
            })
        })
        .collect()
}

fn parse_servers(html: &str) -> Vec<ServerRef> {
    let fragment = Html::parse_fragment(html);
    fragment
        .select(&SERVER_LINK)
        .filter_map(|link| {
            let attrs = link.value();
            let id = attrs.attr("data-linkid").or_else(|| attrs.attr("data-id"))?;
            let name = link
                .select(&SPAN)
                .next()
                .map(text_of)
                .filter(|n| !n.is_empty())
                .or_else(|| {
                    attrs
                        .attr("title")
                        .map(|t| t.trim().trim_start_matches("Server").trim().to_string())
                })?;
            Some(ServerRef::new(id, name))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractor::SourceEvent;
    use crate::testing::flixhq_site::{provider, servers_html, BASE, SEASONS, SEASON_ONE, UPCLOUD_SOURCES};
    use crate::testing::RouteFetch;

    const SEARCH_HTML: &str = r#"
        <div class="film_list-wrap">
          <div class="flw-item">
            <div class="film-poster">
              <img class="film-poster-img" data-src="https://img.test/heat.jpg">
              <a href="/movie/watch-heat-19736" title="Heat"></a>
            </div>
            <div class="film-detail">
              <h2 class="film-name"><a href="/movie/watch-heat-19736" title="Heat">Heat</a></h2>
              <div class="fd-infor">
                <span class="fdi-item">1995</span>
                <span class="fdi-item fdi-duration">170m</span>
                <span class="float-right fdi-type">Movie</span>
              </div>
            </div>
          </div>
          <div class="flw-item">
            <div class="film-detail">
              <h2 class="film-name"><a href="/tv/watch-dark-17890" title="Dark">Dark</a></h2>
              <div class="fd-infor">
                <span class="fdi-item">SS 3</span>
                <span class="float-right fdi-type">TV</span>
              </div>
            </div>
          </div>
        </div>
        <ul class="pagination"><li class="page-item"><a title="Next" href="?page=2">›</a></li></ul>
    "#;

    const DARK_PAGE: &str = r#"
        <h2 class="heading-name"><a href="/tv/watch-dark-17890">Dark</a></h2>
        <div class="description">
            A family saga with a supernatural twist.
        </div>
        <div class="elements">
          <div class="row-line"><span class="type"><strong>Released: </strong></span> 2017-12-01</div>
          <div class="row-line"><span class="type"><strong>Genre: </strong></span>
            <a href="/genre/drama" title="Drama">Drama</a>, <a href="/genre/mystery" title="Mystery">Mystery</a>
          </div>
        </div>
    "#;

    fn collect(mut rx: tokio::sync::mpsc::UnboundedReceiver<SourceEvent>) -> Vec<SourceEvent> {
        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        events
    }

    #[test]
    fn default_registry_order() {
        let fetch = Arc::new(RouteFetch::new());
        assert_eq!(
            provider(&fetch).supported_extractors().names(),
            ["UpCloud", "Vidcloud", "Direct"]
        );
    }

    #[test]
    fn slugs_collapse_punctuation() {
        assert_eq!(slugify("The Dark Knight!"), "the-dark-knight");
        assert_eq!(slugify("  Léon: the professional "), "léon-the-professional");
        assert_eq!(slugify("?!"), "");
    }

    #[test]
    fn media_id_is_trailing_number() {
        assert_eq!(media_id("movie/watch-heat-19736").unwrap(), "19736");
        assert!(media_id("movie/watch-heat").is_err());
    }

    #[test]
    fn parses_search_page() {
        let results = parse_search(SEARCH_HTML, 1);
        assert!(results.has_next_page);
        assert_eq!(results.results.len(), 2);

        let heat = &results.results[0];
        assert_eq!(heat.id, "movie/watch-heat-19736");
        assert_eq!(heat.title, "Heat");
        assert_eq!(heat.film_type, FilmType::Movie);
        assert_eq!(heat.year, Some(1995));
        assert_eq!(heat.poster_url.as_deref(), Some("https://img.test/heat.jpg"));

        let dark = &results.results[1];
        assert_eq!(dark.film_type, FilmType::TvShow);
        assert_eq!(dark.year, None);
    }

    #[test]
    fn parses_episode_and_server_lists() {
        let episodes = parse_episodes(SEASON_ONE);
        assert_eq!(episodes.len(), 4);
        assert_eq!(episodes[2].number, Some(3));
        assert_eq!(episodes[2].id, "9003");
        assert_eq!(episodes[2].title.as_deref(), Some("Past and Present"));

        let seasons = parse_seasons(SEASONS);
        assert_eq!(seasons[1].number, 2);
        assert_eq!(seasons[1].id, "502");

        let servers = parse_servers(&servers_html("data-linkid"));
        assert_eq!(
            servers,
            [
                ServerRef::new("11", "UpCloud"),
                ServerRef::new("12", "Vidcloud"),
                ServerRef::new("13", "MixDrop")
            ]
        );
    }

    #[tokio::test]
    async fn search_hits_slugged_url() {
        let fetch = Arc::new(RouteFetch::new().route(&format!("{BASE}/search/heat?page=1"), SEARCH_HTML));
        let results = provider(&fetch).search("Heat", 0).await.unwrap();
        assert_eq!(results.page, 1);
        assert_eq!(results.results[0].title, "Heat");
    }

    #[tokio::test]
    async fn film_info_is_memoized_per_title() {
        let page = format!("{BASE}/tv/watch-dark-17890");
        let seasons = format!("{BASE}/ajax/v2/tv/seasons/17890");
        let fetch = Arc::new(RouteFetch::new().route(&page, DARK_PAGE).route(&seasons, SEASONS));
        let provider = provider(&fetch);

        let info = provider
            .get_film_info("tv/watch-dark-17890", FilmType::TvShow)
            .await
            .unwrap();
        assert_eq!(info.film.title, "Dark");
        assert_eq!(info.film.year, Some(2017));
        assert_eq!(info.genres, ["Drama", "Mystery"]);
        assert_eq!(info.seasons.len(), 2);
        assert_eq!(
            info.description.as_deref(),
            Some("A family saga with a supernatural twist.")
        );

        let again = provider
            .get_film_info(&format!("{BASE}/tv/watch-dark-17890/"), FilmType::TvShow)
            .await
            .unwrap();
        assert_eq!(again, info);
        assert_eq!(fetch.hits(&page), 1);
        assert_eq!(fetch.hits(&seasons), 1);
    }

    #[tokio::test]
    async fn film_info_memo_is_keyed_by_type() {
        let page = format!("{BASE}/tv/watch-dark-17890");
        let seasons = format!("{BASE}/ajax/v2/tv/seasons/17890");
        let fetch = Arc::new(RouteFetch::new().route(&page, DARK_PAGE).route(&seasons, SEASONS));
        let provider = provider(&fetch);

        let as_movie = provider
            .get_film_info("tv/watch-dark-17890", FilmType::Movie)
            .await
            .unwrap();
        assert!(as_movie.seasons.is_empty());

        let as_show = provider
            .get_film_info("tv/watch-dark-17890", FilmType::TvShow)
            .await
            .unwrap();
        assert_eq!(as_show.seasons.len(), 2);
        assert_eq!(fetch.hits(&page), 2);
    }

    #[tokio::test]
    async fn movie_fan_out_isolates_failing_server() {
        let fetch = Arc::new(
            RouteFetch::new()
                .route(&format!("{BASE}/ajax/movie/episodes/19736"), &servers_html("data-linkid"))
                .route(
                    &format!("{BASE}/ajax/sources/11"),
                    r#"{"type":"iframe","link":"https://rabbit.test/v2/embed-4/abc?z="}"#,
                )
                .route("https://rabbit.test/ajax/v2/embed-4/getSources?id=abc", UPCLOUD_SOURCES),
        );
        let (tx, rx) = tokio::sync::mpsc::unbounded_channel::<SourceEvent>();

        let report = provider(&fetch)
            .get_source_links("movie/watch-heat-19736", None, &tx)
            .await
            .unwrap();

        // Vidcloud's embed lookup 404s; MixDrop has no extractor.
        assert_eq!(report.attempted, 2);
        assert_eq!(report.succeeded, 1);
        assert_eq!(report.unsupported, 1);
        assert_eq!(report.watch_id, "19736");
        assert_eq!(fetch.hits(&format!("{BASE}/ajax/sources/13")), 0);

        let events = collect(rx);
        assert_eq!(events.len(), 2);
        assert!(matches!(&events[0], SourceEvent::Link(s) if s.url == "https://cdn.test/hls/master.m3u8"));
        assert!(matches!(&events[1], SourceEvent::Subtitle(t) if t.language == "English"));
    }

    #[tokio::test]
    async fn sequential_episodes_reuse_identity() {
        let seasons = format!("{BASE}/ajax/v2/tv/seasons/17890");
        let episodes = format!("{BASE}/ajax/v2/season/episodes/501");
        let fetch = Arc::new(
            RouteFetch::new()
                .route(&seasons, SEASONS)
                .route(&episodes, SEASON_ONE)
                .route(&format!("{BASE}/ajax/v2/episode/servers/9003"), &servers_html("data-id"))
                .route(&format!("{BASE}/ajax/v2/episode/servers/9004"), &servers_html("data-id")),
        );
        let provider = provider(&fetch);
        let (tx, _rx) = tokio::sync::mpsc::unbounded_channel::<SourceEvent>();

        for number in [3, 4] {
            provider
                .get_source_links("tv/watch-dark-17890", Some(EpisodeRef::new(1, number)), &tx)
                .await
                .unwrap();
        }

        assert_eq!(fetch.hits(&seasons), 1);
        assert_eq!(fetch.hits(&episodes), 1);
        assert_eq!(fetch.hits(&format!("{BASE}/ajax/v2/episode/servers/9004")), 1);
    }

    #[tokio::test]
    async fn unknown_episode_is_a_resolution_failure() {
        let fetch = Arc::new(
            RouteFetch::new()
                .route(&format!("{BASE}/ajax/v2/tv/seasons/17890"), SEASONS)
                .route(&format!("{BASE}/ajax/v2/season/episodes/501"), SEASON_ONE),
        );
        let (tx, _rx) = tokio::sync::mpsc::unbounded_channel::<SourceEvent>();

        let err = provider(&fetch)
            .get_source_links("tv/watch-dark-17890", Some(EpisodeRef::new(1, 40)), &tx)
            .await
            .unwrap_err();
        assert!(err.is_resolution_failure());
    }

    #[tokio::test]
    async fn episode_beyond_the_listing_is_not_found() {
        // Numbering starts at 0, so position 3 would land on "Eps 2".
        let offset_season = r#"
            <ul class="nav">
              <li class="nav-item"><a data-id="8000" title="Eps 0: Pilot">Episode 0</a></li>
              <li class="nav-item"><a data-id="8001" title="Eps 1">Episode 1</a></li>
              <li class="nav-item"><a data-id="8002" title="Eps 2">Episode 2</a></li>
            </ul>
        "#;
        let fetch = Arc::new(
            RouteFetch::new()
                .route(&format!("{BASE}/ajax/v2/tv/seasons/17890"), SEASONS)
                .route(&format!("{BASE}/ajax/v2/season/episodes/501"), offset_season),
        );
        let (tx, _rx) = tokio::sync::mpsc::unbounded_channel::<SourceEvent>();

        let err = provider(&fetch)
            .get_source_links("tv/watch-dark-17890", Some(EpisodeRef::new(1, 3)), &tx)
            .await
            .unwrap_err();
        assert!(matches!(err, SourceError::EpisodeNotFound { season: 1, episode: 3, .. }));
        assert_eq!(fetch.hits(&format!("{BASE}/ajax/v2/episode/servers/8002")), 0);
    }

    #[tokio::test]
    async fn server_list_failure_is_a_request_error() {
        let fetch = Arc::new(RouteFetch::new());
        let (tx, _rx) = tokio::sync::mpsc::unbounded_channel::<SourceEvent>();
        let err = provider(&fetch)
            .get_source_links("movie/watch-heat-19736", None, &tx)
            .await
            .unwrap_err();
        assert!(matches!(err, SourceError::Http { .. }));
    }
}
