//! Error taxonomy for source resolution.
//!
//! Only failures that affect a whole request live here. Per-server failures
//! (embed resolution, extractor execution) are `anyhow` errors that the
//! fan-out logs and drops.

use thiserror::Error;

/// Failures surfaced to the caller of a provider or the link resolver.
#[derive(Error, Debug)]
pub enum SourceError {
    #[error("request to {url} failed: {source}")]
    Http {
        url: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("unexpected page structure at {url}: {reason}")]
    Parse { url: String, reason: String },

    #[error("season {season} not found for show {show_id}")]
    SeasonNotFound { show_id: String, season: u32 },

    #[error("episode {episode} of season {season} not found for show {show_id}")]
    EpisodeNotFound {
        show_id: String,
        season: u32,
        episode: u32,
    },

    #[error("could not look up episodes of show {show_id}: {source}")]
    IdentityLookup {
        show_id: String,
        #[source]
        source: Box<SourceError>,
    },

    #[error("no provider registered as '{0}'")]
    UnknownProvider(String),

    #[error("resolution cancelled")]
    Cancelled,
}

impl SourceError {
    /// Build an [`SourceError::Http`] from a failed fetch.
    pub fn http(url: impl Into<String>, source: anyhow::Error) -> Self {
        Self::Http {
            url: url.into(),
            source,
        }
    }

    /// Build an [`SourceError::Parse`] for a page that did not have the expected shape.
    pub fn parse(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Parse {
            url: url.into(),
            reason: reason.into(),
        }
    }

    /// `true` when the title or episode itself could not be located.
    ///
    /// Consumers use this to tell "couldn't find this episode at all" apart
    /// from transport problems.
    pub fn is_resolution_failure(&self) -> bool {
        matches!(
            self,
            Self::SeasonNotFound { .. }
                | Self::EpisodeNotFound { .. }
                | Self::IdentityLookup { .. }
                | Self::Parse { .. }
        )
    }

    /// Attribute a transport failure to the identity lookup of `show_id`.
    ///
    /// Not-found errors already name the show and pass through unchanged.
    pub fn in_identity_lookup(self, show_id: &str) -> Self {
        match self {
            Self::Http { .. } => Self::IdentityLookup {
                show_id: show_id.to_string(),
                source: Box::new(self),
            },
            other => other,
        }
    }
}

pub type Result<T> = std::result::Result<T, SourceError>;
