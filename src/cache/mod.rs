//! Link cache: canonical keys, cached values and the repository.

pub mod key;
pub mod links;
pub mod repository;

pub use key::CacheKey;
pub use links::CachedLinks;
pub use repository::{CacheLookup, CacheStats, LinkCacheRepository};
