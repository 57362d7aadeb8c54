//! Integration tests for the link cache through the public API.

use chrono::{DateTime, Duration, Utc};
use futures::StreamExt;
use reel::{CacheKey, CachedLinks, Episode, Flag, LinkCacheRepository, Stream, Subtitle};

fn stream(name: &str) -> Stream {
    Stream::new(name, format!("https://cdn.test/{name}.m3u8"))
}

fn expired(name: &str) -> Stream {
    stream(name).with_flag(Flag::Expires(DateTime::<Utc>::UNIX_EPOCH))
}

fn episode_key(season: u32, number: u32) -> CacheKey {
    CacheKey::create("tv/watch-dark-17890", "flixhq", Some(&Episode::new(season, number)))
}

// ─── Store and read ──────────────────────────────────────────────────────────

#[test]
fn stored_value_is_readable_under_both_keys() {
    let cache = LinkCacheRepository::new();
    let key = episode_key(1, 2);
    let links = CachedLinks::new("ep-2", "flixhq")
        .with_streams([stream("a"), expired("old"), stream("b")])
        .with_subtitles([Subtitle::new("English", "https://cc.test/en.vtt")]);

    cache.store_cache(&key, links);

    let read = cache.get_cache(&key).unwrap();
    assert_eq!(read.streams, [stream("a"), stream("b")]);
    assert_eq!(read.subtitles.len(), 1);
    assert_eq!(cache.get_cache(&key.film_only()), Some(read));
}

#[test]
fn film_only_scenario_appends_and_dedupes() {
    let cache = LinkCacheRepository::new();
    let key = CacheKey::create("f1", "p1", None);
    cache.store_cache(
        &key,
        CachedLinks::new("f1", "p1").with_streams([stream("A"), stream("B")]),
    );

    let read = CacheKey::create("f1", "p1", None);
    assert_eq!(cache.get_cache(&read).unwrap().streams, [stream("A"), stream("B")]);

    assert!(cache.add_stream(&key, stream("C")));
    assert!(!cache.add_stream(&key, stream("A")));
    assert_eq!(
        cache.get_cache(&read).unwrap().streams,
        [stream("A"), stream("B"), stream("C")]
    );
}

#[test]
fn duplicate_url_with_different_name_is_stored_once() {
    let cache = LinkCacheRepository::new();
    let key = episode_key(1, 1);
    cache.store_cache(&key, CachedLinks::new("ep-1", "flixhq"));

    cache.add_stream(&key, Stream::new("UpCloud · auto", "https://cdn.test/x.m3u8"));
    cache.add_stream(&key, Stream::new("Vidcloud · auto", "https://cdn.test/x.m3u8"));

    assert_eq!(cache.get_cache(&key).unwrap().streams.len(), 1);
}

// ─── Expiry ──────────────────────────────────────────────────────────────────

#[test]
fn expired_streams_are_filtered_on_read() {
    let cache = LinkCacheRepository::new();
    let key = episode_key(2, 1);
    cache.store_cache(
        &key,
        CachedLinks::new("ep", "flixhq").with_streams([expired("old"), stream("fresh")]),
    );
    assert_eq!(cache.get_cache(&key).unwrap().streams, [stream("fresh")]);
}

#[test]
fn all_expired_reads_as_absent_but_entry_remains() {
    let cache = LinkCacheRepository::new();
    let key = episode_key(2, 2);
    cache.store_cache(&key, CachedLinks::new("ep", "flixhq").with_streams([expired("old")]));

    assert_eq!(cache.get_cache(&key), None);
    assert_eq!(cache.get_cache(&key.film_only()), None);
    assert!(cache.snapshot().contains_key(&key));
}

#[test]
fn expiry_boundary_is_inclusive() {
    let cache = LinkCacheRepository::new();
    let key = episode_key(3, 1);
    let at = Utc::now() + Duration::hours(1);
    cache.store_cache(
        &key,
        CachedLinks::new("ep", "flixhq").with_streams([stream("a").with_flag(Flag::Expires(at))]),
    );

    assert!(cache.lookup_at(&key, at - Duration::seconds(1)).into_option().is_some());
    assert!(cache.lookup_at(&key, at).into_option().is_none());
}

// ─── Removal ─────────────────────────────────────────────────────────────────

#[test]
fn remove_drops_episode_and_film_only_entries() {
    let cache = LinkCacheRepository::new();
    let key = episode_key(1, 5);
    cache.store_cache(&key, CachedLinks::new("ep", "flixhq").with_streams([stream("a")]));

    cache.remove_cache(&key);

    assert_eq!(cache.get_cache(&key), None);
    assert_eq!(cache.get_cache(&key.film_only()), None);
    assert!(cache.is_empty());
}

// ─── Observation ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn observer_sees_absence_then_value() {
    let cache = LinkCacheRepository::new();
    let key = episode_key(1, 1);
    let mut updates = Box::pin(cache.observe_cache(key.clone(), CachedLinks::empty()));

    assert_eq!(updates.next().await, Some(None));

    cache.store_cache(&key, CachedLinks::new("ep", "flixhq").with_streams([stream("a")]));
    let value = updates.next().await.unwrap().unwrap();
    assert_eq!(value.streams, [stream("a")]);
}

#[tokio::test]
async fn observer_of_expired_entry_starts_with_absence() {
    let cache = LinkCacheRepository::new();
    let key = episode_key(1, 1);
    cache.store_cache(&key, CachedLinks::new("ep", "flixhq").with_streams([expired("old")]));

    let mut updates = Box::pin(cache.observe_cache(key.clone(), CachedLinks::empty()));
    assert_eq!(updates.next().await, Some(None));

    cache.add_stream(&key, stream("fresh"));
    let value = updates.next().await.unwrap().unwrap();
    assert_eq!(value.streams, [stream("fresh")]);
}

#[tokio::test]
async fn observer_default_is_used_for_missing_entry() {
    let cache = LinkCacheRepository::new();
    let fallback = CachedLinks::new("placeholder", "flixhq").with_streams([stream("a")]);
    let mut updates = Box::pin(cache.observe_cache(episode_key(9, 9), fallback.clone()));
    assert_eq!(updates.next().await, Some(Some(fallback)));
}
