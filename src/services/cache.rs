//! Time-bounded response cache.
//!
//! Handlers receive the cache through `AppState` as an
//! `Arc<dyn ResponseCache>`; nothing here is global. The default
//! implementation is a bounded moka cache with a TTL chosen per entry.

use moka::sync::Cache;
use moka::Expiry;
use serde_json::Value;
use std::time::{Duration, Instant};

/// Injectable cache for serialised endpoint responses.
pub trait ResponseCache: Send + Sync {
    /// Return the cached value for `key`, unless it has expired.
    fn get(&self, key: &str) -> Option<Value>;

    /// Store `value` under `key` for `ttl`, replacing any previous entry.
    fn set(&self, key: String, value: Value, ttl: Duration);
}

#[derive(Debug, Clone)]
struct CachedResponse {
    value: Value,
    ttl: Duration,
}

/// Expires each entry after the TTL it was stored with.
struct PerEntryTtl;

impl Expiry<String, CachedResponse> for PerEntryTtl {
    fn expire_after_create(
        &self,
        _key: &String,
        value: &CachedResponse,
        _created_at: Instant,
    ) -> Option<Duration> {
        Some(value.ttl)
    }

    fn expire_after_update(
        &self,
        _key: &String,
        value: &CachedResponse,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        Some(value.ttl)
    }
}

/// moka-backed `ResponseCache`.
pub struct MokaResponseCache {
    cache: Cache<String, CachedResponse>,
}

impl std::fmt::Debug for MokaResponseCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MokaResponseCache")
            .field("entries", &self.cache.entry_count())
            .finish()
    }
}

impl MokaResponseCache {
    pub fn new(max_entries: u64) -> Self {
        let cache = Cache::builder()
            .max_capacity(max_entries)
            .expire_after(PerEntryTtl)
            .build();
        Self { cache }
    }
}

impl ResponseCache for MokaResponseCache {
    fn get(&self, key: &str) -> Option<Value> {
        let hit = self.cache.get(key).map(|entry| entry.value);
        tracing::debug!(key, hit = hit.is_some(), "response cache lookup");
        hit
    }

    fn set(&self, key: String, value: Value, ttl: Duration) {
        self.cache.insert(key, CachedResponse { value, ttl });
    }
}

/// Build a cache key from an endpoint name and its normalised parameters.
pub fn cache_key(endpoint: &str, parts: &[&str]) -> String {
    format!("{}:{}", endpoint, parts.join("|"))
}
