//! Extractor for `embed-N` players that expose a JSON `getSources` endpoint.
//!
//! Used by the `UpCloud` and `Vidcloud` servers. The embed page at
//! `https://host/v2/embed-4/{id}?z=` is backed by
//! `https://host/ajax/v2/embed-4/getSources?id={id}`, which returns the
//! stream list and caption tracks.

use std::collections::BTreeMap;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use url::Url;

use super::{expiry_from_url, Extractor, LinkSink};
use crate::fingerprint::RequestKind;
use crate::http_client::Fetch;
use crate::model::{Flag, Stream, Subtitle};

/// `getSources` extractor registered under a server name.
pub struct RabbitExtractor {
    name: String,
    client: Arc<dyn Fetch>,
}

impl RabbitExtractor {
    pub fn new(name: impl Into<String>, client: Arc<dyn Fetch>) -> Self {
        Self {
            name: name.into(),
            client,
        }
    }

    /// `UpCloud` server.
    pub fn upcloud(client: Arc<dyn Fetch>) -> Self {
        Self::new("UpCloud", client)
    }

    /// `Vidcloud` server.
    pub fn vidcloud(client: Arc<dyn Fetch>) -> Self {
        Self::new("Vidcloud", client)
    }
}

#[async_trait]
impl Extractor for RabbitExtractor {
    fn name(&self) -> &str {
        &self.name
    }

    async fn extract(
        &self,
        url: &str,
        _media_id: &str,
        _episode_id: &str,
        sink: &dyn LinkSink,
    ) -> Result<()> {
        let embed = EmbedUrl::parse(url)?;
        let sources_url = embed.sources_url();
        tracing::debug!(server = %self.name, %sources_url, "fetching sources");

        let body = self
            .client
            .get_text(&sources_url, RequestKind::Ajax, Some(url))
            .await
            .with_context(|| format!("{}: failed to fetch sources", self.name))?;
        let payload: SourcesPayload = serde_json::from_str(&body)
            .with_context(|| format!("{}: failed to parse sources payload", self.name))?;

        let sources = match payload.sources {
            Sources::Plain(sources) => sources,
            Sources::Encrypted(payload) => bail!(
                "{}: encrypted source payload ({} bytes) is not supported",
                self.name,
                payload.len()
            ),
        };
        if sources.is_empty() {
            bail!("{}: no sources for {}", self.name, embed.id);
        }

        let referer = BTreeMap::from([("Referer".to_string(), embed.origin.clone())]);
        for source in sources {
            let quality = source.label.as_deref().unwrap_or("auto");
            let mut stream = Stream::new(format!("{} · {quality}", self.name), &source.file)
                .with_flag(Flag::Headers(referer.clone()));
            if let Some(kind) = &source.kind {
                stream = stream.with_description(kind.clone());
            }
            if let Some(at) = expiry_from_url(&source.file) {
                stream = stream.with_flag(Flag::Expires(at));
            }
            sink.on_link(stream);
        }

        for track in payload.tracks.into_iter().filter(Track::is_subtitle) {
            let language = track.label.unwrap_or_else(|| "Unknown".to_string());
            sink.on_subtitle(Subtitle::new(language, track.file));
        }

        Ok(())
    }
}

/// Parsed `https://host/<prefix...>/embed-N/<id>` URL.
#[derive(Debug, PartialEq, Eq)]
struct EmbedUrl {
    origin: String,
    prefix: String,
    id: String,
}

impl EmbedUrl {
    fn parse(url: &str) -> Result<Self> {
        let parsed = Url::parse(url).with_context(|| format!("invalid embed URL: {url}"))?;
        let segments: Vec<&str> = parsed
            .path_segments()
            .map(|s| s.filter(|seg| !seg.is_empty()).collect())
            .unwrap_or_default();

        let Some((id, prefix)) = segments.split_last() else {
            bail!("embed URL has no id: {url}");
        };
        if !prefix.last().is_some_and(|seg| seg.starts_with("embed-")) {
            bail!("not an embed-N URL: {url}");
        }

        Ok(Self {
            origin: parsed.origin().ascii_serialization(),
            prefix: prefix.join("/"),
            id: (*id).to_string(),
        })
    }

    fn sources_url(&self) -> String {
        format!(
            "{}/ajax/{}/getSources?id={}",
            self.origin, self.prefix, self.id
        )
    }
}

#[derive(Debug, Deserialize)]
struct SourcesPayload {
    sources: Sources,
    #[serde(default)]
    tracks: Vec<Track>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Sources {
    Plain(Vec<Source>),
    Encrypted(String),
}

#[derive(Debug, Deserialize)]
struct Source {
    file: String,
    #[serde(rename = "type")]
    kind: Option<String>,
    label: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Track {
    file: String,
    label: Option<String>,
    kind: Option<String>,
}

impl Track {
    fn is_subtitle(track: &Track) -> bool {
        matches!(track.kind.as_deref(), Some("captions" | "subtitles"))
    }
}
