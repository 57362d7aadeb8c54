//! Resolved streams and subtitles for one title or episode.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::{Stream, Subtitle};

/// Value stored in the link cache.
///
/// Order of `streams` and `subtitles` is arrival order. An instance whose
/// streams are all expired is treated as absent by every read path.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedLinks {
    /// Identifies the resolved title or episode on the source site.
    pub watch_id: String,
    pub provider_id: String,
    pub streams: Vec<Stream>,
    pub subtitles: Vec<Subtitle>,
}

impl CachedLinks {
    pub fn new(watch_id: impl Into<String>, provider_id: impl Into<String>) -> Self {
        Self {
            watch_id: watch_id.into(),
            provider_id: provider_id.into(),
            streams: Vec::new(),
            subtitles: Vec::new(),
        }
    }

    /// The empty value used as the default for observers.
    pub fn empty() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_streams(mut self, streams: impl IntoIterator<Item = Stream>) -> Self {
        for stream in streams {
            self.push_stream(stream);
        }
        self
    }

    #[must_use]
    pub fn with_subtitles(mut self, subtitles: impl IntoIterator<Item = Subtitle>) -> Self {
        for subtitle in subtitles {
            self.push_subtitle(subtitle);
        }
        self
    }

    /// Append unless a stream with the same URL is already present.
    ///
    /// Returns `true` if the stream was added.
    pub fn push_stream(&mut self, stream: Stream) -> bool {
        if self.streams.iter().any(|s| s.same_link(&stream)) {
            return false;
        }
        self.streams.push(stream);
        true
    }

    /// Append unless the same URL + language pair is already present.
    pub fn push_subtitle(&mut self, subtitle: Subtitle) -> bool {
        if self.subtitles.iter().any(|s| s.same_track(&subtitle)) {
            return false;
        }
        self.subtitles.push(subtitle);
        true
    }

    /// Number of streams still usable at `now`.
    pub fn valid_stream_count(&self, now: DateTime<Utc>) -> usize {
        self.streams.iter().filter(|s| !s.is_expired_at(now)).count()
    }

    /// Copy with expired streams removed, or `None` if nothing usable remains.
    pub fn valid_at(&self, now: DateTime<Utc>) -> Option<CachedLinks> {
        let streams: Vec<Stream> = self
            .streams
            .iter()
            .filter(|s| !s.is_expired_at(now))
            .cloned()
            .collect();

        if streams.is_empty() {
            return None;
        }

        Some(CachedLinks {
            watch_id: self.watch_id.clone(),
            provider_id: self.provider_id.clone(),
            streams,
            subtitles: self.subtitles.clone(),
        })
    }
}
