//! Cache layer for policy documents, search pages and (optionally) decisions.
//!
//! This crate is intentionally boring:
//! - a small [`CacheStore`] trait over JSON values with per-entry TTLs
//! - an in-memory store backed by `moka`
//! - the key scheme and glob-based invalidation patterns
//! - [`with_cache`], which never lets a cache failure fail the caller
//! - [`Fence`], which keeps a slow read from refilling a key a writer just invalidated

#![forbid(unsafe_code)]

pub mod keys;
mod memory;

pub use memory::{CacheStats, MemoryCache};

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;
use std::sync::{PoisonError, RwLock};
use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("invalid invalidation pattern '{pattern}': {reason}")]
    Pattern { pattern: String, reason: String },
    #[error("cache backend unavailable: {0}")]
    Unavailable(String),
}

/// Key/value cache over JSON values.
///
/// Implementations must be shareable across threads; the service holds one behind an `Arc`.
pub trait CacheStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<JsonValue>, CacheError>;

    fn set(&self, key: &str, value: JsonValue, ttl: Duration) -> Result<(), CacheError>;

    /// Remove every key matching the glob `pattern`; returns how many were removed.
    fn invalidate_pattern(&self, pattern: &str) -> Result<usize, CacheError>;
}

/// TTLs and capacity for each class of key. A zero TTL disables caching for that class.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CachePolicy {
    pub policy_ttl: Duration,
    pub list_ttl: Duration,
    pub cache_results: bool,
    pub result_ttl: Duration,
    pub max_entries: u64,
}

impl Default for CachePolicy {
    fn default() -> Self {
        Self {
            policy_ttl: Duration::from_secs(300),
            list_ttl: Duration::from_secs(60),
            cache_results: false,
            result_ttl: Duration::from_secs(30),
            max_entries: 10_000,
        }
    }
}

/// Loader output plus whether it came from the cache.
#[derive(Clone, Debug, PartialEq)]
pub struct Cached<T> {
    pub data: T,
    pub hit: bool,
}

/// Read-through helper.
///
/// Cache errors and undecodable entries are logged and treated as misses; only the
/// loader's own error reaches the caller.
pub fn with_cache<T, E, F>(
    cache: &dyn CacheStore,
    key: &str,
    ttl: Duration,
    loader: F,
) -> Result<Cached<T>, E>
where
    T: Serialize + DeserializeOwned,
    F: FnOnce() -> Result<T, E>,
{
    read_through(cache, None, key, ttl, loader)
}

/// [`with_cache`], but the fill is dropped when `fence` saw an invalidation after
/// the lookup started.
pub fn with_fenced_cache<T, E, F>(
    cache: &dyn CacheStore,
    fence: &Fence,
    key: &str,
    ttl: Duration,
    loader: F,
) -> Result<Cached<T>, E>
where
    T: Serialize + DeserializeOwned,
    F: FnOnce() -> Result<T, E>,
{
    read_through(cache, Some(fence), key, ttl, loader)
}

fn read_through<T, E, F>(
    cache: &dyn CacheStore,
    fence: Option<&Fence>,
    key: &str,
    ttl: Duration,
    loader: F,
) -> Result<Cached<T>, E>
where
    T: Serialize + DeserializeOwned,
    F: FnOnce() -> Result<T, E>,
{
    if ttl.is_zero() {
        return loader().map(|data| Cached { data, hit: false });
    }

    let seen = fence.map(Fence::epoch);
    match cache.get(key) {
        Ok(Some(value)) => match serde_json::from_value::<T>(value) {
            Ok(data) => return Ok(Cached { data, hit: true }),
            Err(err) => {
                tracing::warn!(key, error = %err, "discarding undecodable cache entry");
            }
        },
        Ok(None) => {}
        Err(err) => {
            tracing::warn!(key, error = %err, "cache read failed; loading directly");
        }
    }

    let data = loader()?;
    let value = match serde_json::to_value(&data) {
        Ok(value) => value,
        Err(err) => {
            tracing::warn!(key, error = %err, "value not cacheable");
            return Ok(Cached { data, hit: false });
        }
    };
    let fill = || {
        if let Err(err) = cache.set(key, value, ttl) {
            tracing::warn!(key, error = %err, "cache write failed");
        }
    };
    match fence.zip(seen) {
        Some((fence, seen)) => {
            if !fence.fill_if_current(seen, fill) {
                tracing::debug!(key, "invalidated during load; not caching");
            }
        }
        None => fill(),
    }
    Ok(Cached { data, hit: false })
}

/// Orders cache fills against invalidations.
///
/// Writers run their invalidation inside [`Fence::invalidate`], which bumps an epoch
/// under the write lock. A fenced fill compares the epoch it saw before loading with
/// the current one under the read lock and only writes when nothing was invalidated
/// in between. A fill that lands before the bump is removed by the invalidation itself.
#[derive(Debug, Default)]
pub struct Fence {
    epoch: RwLock<u64>,
}

impl Fence {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn epoch(&self) -> u64 {
        *self.epoch.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Bump the epoch and run `invalidate` while no fenced fill can write.
    pub fn invalidate<R>(&self, invalidate: impl FnOnce() -> R) -> R {
        let mut epoch = self.epoch.write().unwrap_or_else(PoisonError::into_inner);
        *epoch += 1;
        invalidate()
    }

    /// Run `fill` only if the epoch still equals `seen`. Returns whether it ran.
    pub fn fill_if_current(&self, seen: u64, fill: impl FnOnce()) -> bool {
        let epoch = self.epoch.read().unwrap_or_else(PoisonError::into_inner);
        if *epoch != seen {
            return false;
        }
        fill();
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct BrokenCache;

    impl CacheStore for BrokenCache {
        fn get(&self, _key: &str) -> Result<Option<JsonValue>, CacheError> {
            Err(CacheError::Unavailable("connection refused".into()))
        }

        fn set(&self, _key: &str, _value: JsonValue, _ttl: Duration) -> Result<(), CacheError> {
            Err(CacheError::Unavailable("connection refused".into()))
        }

        fn invalidate_pattern(&self, _pattern: &str) -> Result<usize, CacheError> {
            Err(CacheError::Unavailable("connection refused".into()))
        }
    }

    #[test]
    fn second_read_is_a_hit() {
        let cache = MemoryCache::new(100);
        let calls = AtomicUsize::new(0);
        let load = || -> Result<JsonValue, ()> {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok(json!({ "id": "p1" }))
        };

        let first = with_cache(&cache, "policy:p1:default", Duration::from_secs(60), load)
            .expect("load");
        let second = with_cache(&cache, "policy:p1:default", Duration::from_secs(60), load)
            .expect("load");

        assert!(!first.hit);
        assert!(second.hit);
        assert_eq!(second.data, json!({ "id": "p1" }));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn zero_ttl_bypasses_cache() {
        let cache = MemoryCache::new(100);
        for _ in 0..2 {
            let out = with_cache(&cache, "k", Duration::ZERO, || Ok::<_, ()>(1u32)).expect("load");
            assert!(!out.hit);
        }
        assert_eq!(cache.stats().hits + cache.stats().misses, 0);
    }

    #[test]
    fn broken_cache_falls_through_to_loader() {
        let out = with_cache(&BrokenCache, "k", Duration::from_secs(5), || Ok::<_, ()>("fresh".to_string()))
            .expect("loader result");
        assert_eq!(out.data, "fresh");
        assert!(!out.hit);
    }

    #[test]
    fn undecodable_entry_is_reloaded() {
        let cache = MemoryCache::new(100);
        cache
            .set("k", json!("not a number"), Duration::from_secs(60))
            .expect("set");
        let out = with_cache(&cache, "k", Duration::from_secs(60), || Ok::<_, ()>(7u32))
            .expect("load");
        assert_eq!(out.data, 7);
        assert!(!out.hit);
    }

    #[test]
    fn loader_errors_propagate_and_are_not_cached() {
        let cache = MemoryCache::new(100);
        let err = with_cache(&cache, "k", Duration::from_secs(60), || {
            Err::<u32, _>("storage down")
        })
        .expect_err("loader error");
        assert_eq!(err, "storage down");
        assert_eq!(cache.get("k").expect("get"), None);
    }

    #[test]
    fn fenced_fill_is_dropped_after_an_invalidation() {
        let cache = MemoryCache::new(100);
        let fence = Fence::new();
        let ttl = Duration::from_secs(60);

        let out = with_fenced_cache(&cache, &fence, "policy:p1:default", ttl, || {
            // a writer commits and invalidates while this load is in flight
            fence
                .invalidate(|| cache.invalidate_pattern("policy:p1:*"))
                .expect("invalidate");
            Ok::<_, ()>(json!({ "version": 1 }))
        })
        .expect("load");

        assert_eq!(out.data, json!({ "version": 1 }));
        assert_eq!(cache.get("policy:p1:default").expect("get"), None);
    }

    #[test]
    fn fenced_fill_is_kept_without_an_invalidation() {
        let cache = MemoryCache::new(100);
        let fence = Fence::new();
        fence.invalidate(|| ());

        with_fenced_cache(&cache, &fence, "k", Duration::from_secs(60), || Ok::<_, ()>(3u32))
            .expect("load");
        assert_eq!(cache.get("k").expect("get"), Some(json!(3)));
    }

    #[test]
    fn fill_if_current_compares_epochs() {
        let fence = Fence::new();
        let seen = fence.epoch();
        assert!(fence.fill_if_current(seen, || ()));
        fence.invalidate(|| ());
        assert_eq!(fence.epoch(), seen + 1);
        assert!(!fence.fill_if_current(seen, || ()));
    }
}
