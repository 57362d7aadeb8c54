//! Canonical identity of a cached resolution.

use serde::{Deserialize, Serialize};

use crate::model::{Episode, EpisodeRef};

/// `(film, provider, optional episode)` tuple identifying one resolution.
///
/// The episode is stored as plain season/number coordinates, so two
/// [`Episode`] values describing the same episode produce equal keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CacheKey {
    film_id: String,
    provider_id: String,
    episode: Option<EpisodeRef>,
}

impl CacheKey {
    /// The single constructor for cache keys.
    pub fn create(
        film_id: impl Into<String>,
        provider_id: impl Into<String>,
        episode: Option<&Episode>,
    ) -> Self {
        Self {
            film_id: film_id.into(),
            provider_id: provider_id.into(),
            episode: episode.map(Episode::coordinates),
        }
    }

    pub fn film_id(&self) -> &str {
        &self.film_id
    }

    pub fn provider_id(&self) -> &str {
        &self.provider_id
    }

    pub fn episode(&self) -> Option<EpisodeRef> {
        self.episode
    }

    /// The same key without its episode component.
    #[must_use]
    pub fn film_only(&self) -> Self {
        Self {
            film_id: self.film_id.clone(),
            provider_id: self.provider_id.clone(),
            episode: None,
        }
    }

    pub fn is_film_only(&self) -> bool {
        self.episode.is_none()
    }
}

impl std::fmt::Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}@{}", self.film_id, self.provider_id)?;
        if let Some(episode) = self.episode {
            write!(f, "#{episode}")?;
        }
        Ok(())
    }
}
