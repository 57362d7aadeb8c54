//! Catalog and media types shared by providers, extractors and the cache.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Whether a title is a single film or an episodic show.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilmType {
    Movie,
    TvShow,
}

/// A title as known to one provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Film {
    /// Site-native identifier (e.g. `"movie/watch-heat-19736"`).
    pub id: String,
    /// Provider that issued `id`.
    pub provider_id: String,
    pub title: String,
    pub film_type: FilmType,
    pub year: Option<u32>,
    pub poster_url: Option<String>,
}

/// Season/episode coordinates, independent of any site identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EpisodeRef {
    pub season: u32,
    pub number: u32,
}

impl EpisodeRef {
    pub fn new(season: u32, number: u32) -> Self {
        Self { season, number }
    }
}

impl std::fmt::Display for EpisodeRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "S{:02}E{:02}", self.season, self.number)
    }
}

/// A single episode of a show.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Episode {
    /// Site-native episode identifier, when already known.
    pub id: Option<String>,
    pub title: Option<String>,
    pub season: u32,
    pub number: u32,
}

impl Episode {
    pub fn new(season: u32, number: u32) -> Self {
        Self {
            id: None,
            title: None,
            season,
            number,
        }
    }

    pub fn coordinates(&self) -> EpisodeRef {
        EpisodeRef::new(self.season, self.number)
    }
}

/// A season entry from a show's season index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Season {
    pub number: u32,
    /// Site-native season identifier.
    pub id: String,
    pub name: String,
}

/// Full metadata for a title.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilmInfo {
    pub film: Film,
    pub description: Option<String>,
    pub genres: Vec<String>,
    /// Empty for movies.
    pub seasons: Vec<Season>,
}

/// One search hit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchItem {
    pub id: String,
    pub title: String,
    pub film_type: FilmType,
    pub year: Option<u32>,
    pub poster_url: Option<String>,
}

impl SearchItem {
    pub fn into_film(self, provider_id: &str) -> Film {
        Film {
            id: self.id,
            provider_id: provider_id.to_string(),
            title: self.title,
            film_type: self.film_type,
            year: self.year,
            poster_url: self.poster_url,
        }
    }
}

/// A page of search hits.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResults {
    pub page: u32,
    pub has_next_page: bool,
    pub results: Vec<SearchItem>,
}

/// Extra properties attached to a [`Stream`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Flag {
    /// The URL stops working at the given instant.
    Expires(DateTime<Utc>),
    /// Request headers the player must send with every request.
    Headers(BTreeMap<String, String>),
}

/// A playable media URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stream {
    pub url: String,
    /// Display name, usually the server and quality (e.g. `"UpCloud · auto"`).
    pub name: String,
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub flags: Vec<Flag>,
}

impl Stream {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            name: name.into(),
            description: None,
            flags: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_flag(mut self, flag: Flag) -> Self {
        self.flags.push(flag);
        self
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Earliest expiry among the stream's flags.
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.flags
            .iter()
            .filter_map(|flag| match flag {
                Flag::Expires(at) => Some(*at),
                _ => None,
            })
            .min()
    }

    /// A stream is expired once an `Expires` timestamp is at or before `now`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at().is_some_and(|at| at <= now)
    }

    /// Streams are the same link when their URLs match.
    pub fn same_link(&self, other: &Stream) -> bool {
        self.url == other.url
    }
}

/// A subtitle track.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subtitle {
    pub url: String,
    pub language: String,
}

impl Subtitle {
    pub fn new(language: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            language: language.into(),
        }
    }

    /// Subtitles are the same track when both URL and language match.
    pub fn same_track(&self, other: &Subtitle) -> bool {
        self.url == other.url && self.language == other.language
    }
}
