//! Single-slot cache of the most recently resolved show.
//!
//! Resolving an episode's site identifier takes two lookups: the show's
//! season index, then the chosen season's episode list. Sequential playback
//! asks for neighbouring episodes of the same show, so the last show's
//! seasons and the last season's episodes are kept and reused.
//!
//! State transitions:
//!
//! - different show: everything is discarded and both lists are fetched
//! - same show, episode not in the loaded season: only episodes are fetched
//! - same show, episode already loaded: no network traffic
//!
//! A fetch that fails, or returns an empty list, never replaces state.

use async_trait::async_trait;
use tracing::debug;

use crate::error::{Result, SourceError};
use crate::model::{EpisodeRef, Season};

/// One row of a season's episode list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EpisodeEntry {
    /// Number parsed from the listing label; `None` when the label had none.
    pub number: Option<u32>,
    /// Site-native episode identifier.
    pub id: String,
    pub title: Option<String>,
}

/// Where the identity cache gets its lists from.
#[async_trait]
pub trait EpisodeIndex: Send + Sync {
    async fn fetch_seasons(&self, show_id: &str) -> Result<Vec<Season>>;
    async fn fetch_episodes(&self, show_id: &str, season: &Season) -> Result<Vec<EpisodeEntry>>;
}

#[derive(Debug, Clone)]
struct LoadedSeason {
    number: u32,
    episodes: Vec<EpisodeEntry>,
}

/// Everything known about one show.
#[derive(Debug, Clone)]
struct ShowIdentity {
    show_id: String,
    seasons: Vec<Season>,
    loaded: Option<LoadedSeason>,
}

impl ShowIdentity {
    fn cached_episode(&self, episode: EpisodeRef) -> Option<String> {
        let loaded = self.loaded.as_ref().filter(|l| l.number == episode.season)?;
        pick_episode(&loaded.episodes, episode.number)
    }

    fn season(&self, number: u32) -> Option<&Season> {
        self.seasons.iter().find(|s| s.number == number)
    }
}

/// Match on the listed number. Position is only consulted for an entry
/// whose label carried no number.
fn pick_episode(episodes: &[EpisodeEntry], number: u32) -> Option<String> {
    episodes
        .iter()
        .find(|e| e.number == Some(number))
        .or_else(|| {
            episodes
                .get(usize::try_from(number).ok()?.checked_sub(1)?)
                .filter(|e| e.number.is_none())
        })
        .map(|e| e.id.clone())
}

/// Last-show identity cache. Owned by a single provider.
#[derive(Debug, Default)]
pub struct IdentityCache {
    slot: Option<ShowIdentity>,
}

impl IdentityCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Show currently held, if any.
    pub fn show_id(&self) -> Option<&str> {
        self.slot.as_ref().map(|s| s.show_id.as_str())
    }

    /// Season number whose episode list is currently held.
    pub fn loaded_season(&self) -> Option<u32> {
        self.slot.as_ref()?.loaded.as_ref().map(|l| l.number)
    }

    pub fn clear(&mut self) {
        self.slot = None;
    }

    /// Site identifier of `episode` in `show_id`, fetching only what is missing.
    ///
    /// # Errors
    ///
    /// [`SourceError::SeasonNotFound`] or [`SourceError::EpisodeNotFound`]
    /// when the lists do not contain the coordinates.
    /// [`SourceError::IdentityLookup`] when a fetch failed in transit.
    pub async fn resolve(
        &mut self,
        index: &dyn EpisodeIndex,
        show_id: &str,
        episode: EpisodeRef,
    ) -> Result<String> {
        // Taken out for the duration of the call. A dropped future leaves
        // the cache empty rather than half-updated.
        let mut state = match self.slot.take() {
            Some(state) if state.show_id == show_id => state,
            previous => {
                if let Some(previous) = previous {
                    debug!(previous = %previous.show_id, show = %show_id, "show changed, discarding identity");
                }
                let seasons = index
                    .fetch_seasons(show_id)
                    .await
                    .map_err(|e| e.in_identity_lookup(show_id))?;
                if seasons.is_empty() {
                    return Err(SourceError::SeasonNotFound {
                        show_id: show_id.to_string(),
                        season: episode.season,
                    });
                }
                ShowIdentity {
                    show_id: show_id.to_string(),
                    seasons,
                    loaded: None,
                }
            }
        };

        let result = Self::resolve_in(&mut state, index, episode).await;
        self.slot = Some(state);
        result
    }

    async fn resolve_in(
        state: &mut ShowIdentity,
        index: &dyn EpisodeIndex,
        episode: EpisodeRef,
    ) -> Result<String> {
        if let Some(id) = state.cached_episode(episode) {
            debug!(show = %state.show_id, %episode, "identity cache hit");
            return Ok(id);
        }

        let season = state
            .season(episode.season)
            .cloned()
            .ok_or_else(|| SourceError::SeasonNotFound {
                show_id: state.show_id.clone(),
                season: episode.season,
            })?;

        let episodes = index
            .fetch_episodes(&state.show_id, &season)
            .await
            .map_err(|e| e.in_identity_lookup(&state.show_id))?;
        let not_found = || SourceError::EpisodeNotFound {
            show_id: state.show_id.clone(),
            season: episode.season,
            episode: episode.number,
        };
        if episodes.is_empty() {
            return Err(not_found());
        }

        let id = pick_episode(&episodes, episode.number).ok_or_else(not_found)?;
        state.loaded = Some(LoadedSeason {
            number: episode.season,
            episodes,
        });
        Ok(id)
    }
}
