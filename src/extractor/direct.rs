//! Pass-through extractor for servers whose embed link already is a media file.

use anyhow::{bail, Result};
use async_trait::async_trait;

use super::{expiry_from_url, Extractor, LinkSink};
use crate::model::{Flag, Stream};

const MEDIA_EXTENSIONS: &[&str] = &[".m3u8", ".mpd", ".mp4", ".mkv", ".webm"];

/// Emits the embed URL itself as the only stream.
pub struct DirectExtractor {
    name: String,
}

impl DirectExtractor {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    /// Returns `true` if `url` points at a playable file or manifest.
    pub fn is_media_url(url: &str) -> bool {
        let path = url.split(['?', '#']).next().unwrap_or(url).to_lowercase();
        MEDIA_EXTENSIONS.iter().any(|ext| path.ends_with(ext))
    }
}

impl Default for DirectExtractor {
    fn default() -> Self {
        Self::new("Direct")
    }
}

#[async_trait]
impl Extractor for DirectExtractor {
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
        if !Self::is_media_url(url) {
            bail!("{}: not a direct media URL: {url}", self.name);
        }

        let mut stream = Stream::new(self.name.clone(), url);
        if let Some(at) = expiry_from_url(url) {
            stream = stream.with_flag(Flag::Expires(at));
        }
        sink.on_link(stream);
        Ok(())
    }
}
