use globset::GlobBuilder;
use moka::Expiry;
use moka::sync::Cache;
use serde_json::Value as JsonValue;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use crate::{CacheError, CacheStore};

#[derive(Clone)]
struct Entry {
    value: Arc<JsonValue>,
    ttl: Duration,
}

/// Each entry lives for the TTL it was written with.
struct PerEntryTtl;

impl Expiry<String, Entry> for PerEntryTtl {
    fn expire_after_create(
        &self,
        _key: &String,
        value: &Entry,
        _created_at: Instant,
    ) -> Option<Duration> {
        Some(value.ttl)
    }
}

/// Bounded in-process cache with per-entry TTLs.
pub struct MemoryCache {
    inner: Cache<String, Entry>,
    hits: AtomicU64,
    misses: AtomicU64,
    invalidations: AtomicU64,
}

impl MemoryCache {
    pub fn new(max_entries: u64) -> Self {
        let inner = Cache::builder()
            .max_capacity(max_entries)
            .expire_after(PerEntryTtl)
            .build();
        Self {
            inner,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            invalidations: AtomicU64::new(0),
        }
    }

    pub fn stats(&self) -> CacheStats {
        let hits = self.hits.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);
        let total = hits + misses;
        let hit_rate = if total > 0 {
            (hits as f64 / total as f64) * 100.0
        } else {
            0.0
        };
        CacheStats {
            entry_count: self.inner.entry_count(),
            hits,
            misses,
            hit_rate,
            invalidations: self.invalidations.load(Ordering::Relaxed),
        }
    }
}

impl Default for MemoryCache {
    fn default() -> Self {
        Self::new(10_000)
    }
}

impl CacheStore for MemoryCache {
    fn get(&self, key: &str) -> Result<Option<JsonValue>, CacheError> {
        match self.inner.get(key) {
            Some(entry) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                Ok(Some(entry.value.as_ref().clone()))
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                Ok(None)
            }
        }
    }

    fn set(&self, key: &str, value: JsonValue, ttl: Duration) -> Result<(), CacheError> {
        if ttl.is_zero() {
            return Ok(());
        }
        self.inner.insert(
            key.to_string(),
            Entry {
                value: Arc::new(value),
                ttl,
            },
        );
        Ok(())
    }

    fn invalidate_pattern(&self, pattern: &str) -> Result<usize, CacheError> {
        let matcher = GlobBuilder::new(pattern)
            .literal_separator(false)
            .backslash_escape(true)
            .build()
            .map_err(|e| CacheError::Pattern {
                pattern: pattern.to_string(),
                reason: e.to_string(),
            })?
            .compile_matcher();

        let doomed: Vec<Arc<String>> = self
            .inner
            .iter()
            .filter(|(key, _)| matcher.is_match(key.as_str()))
            .map(|(key, _)| key)
            .collect();
        for key in &doomed {
            self.inner.invalidate(key.as_str());
        }

        self.invalidations
            .fetch_add(doomed.len() as u64, Ordering::Relaxed);
        tracing::debug!(pattern, removed = doomed.len(), "cache invalidated");
        Ok(doomed.len())
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct CacheStats {
    pub entry_count: u64,
    pub hits: u64,
    pub misses: u64,
    pub hit_rate: f64,
    pub invalidations: u64,
}
