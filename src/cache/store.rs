//! Cache gateway and its in-process implementation.

use std::sync::RwLock;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use bytes::Bytes;
use lru::LruCache;
use thiserror::Error;

use super::config::CacheConfig;
use super::lock::{rw_read, rw_write};

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache backend unavailable: {0}")]
    Unavailable(String),
    #[error("cached payload could not be decoded: {0}")]
    Codec(#[from] serde_json::Error),
}

/// Key/value store with per-entry expiry. Last write wins.
#[async_trait]
pub trait CacheGateway: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<Bytes>, CacheError>;

    async fn set(&self, key: &str, value: Bytes, ttl: Duration) -> Result<(), CacheError>;

    async fn delete(&self, key: &str) -> Result<(), CacheError>;
}

#[derive(Clone)]
struct Entry {
    value: Bytes,
    expires_at: Instant,
}

/// LRU-bounded map; expired entries are dropped lazily on read.
pub struct MemoryCache {
    entries: RwLock<LruCache<String, Entry>>,
}

impl MemoryCache {
    pub fn new(config: &CacheConfig) -> Self {
        Self {
            entries: RwLock::new(LruCache::new(config.capacity_non_zero())),
        }
    }

    pub fn len(&self) -> usize {
        rw_read(&self.entries, "memory_cache.len").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, key: &str) -> bool {
        rw_read(&self.entries, "memory_cache.contains")
            .peek(key)
            .is_some_and(|entry| entry.expires_at > Instant::now())
    }
}

#[async_trait]
impl CacheGateway for MemoryCache {
    async fn get(&self, key: &str) -> Result<Option<Bytes>, CacheError> {
        let mut entries = rw_write(&self.entries, "memory_cache.get");
        let Some(entry) = entries.get(key) else {
            return Ok(None);
        };
        if entry.expires_at <= Instant::now() {
            entries.pop(key);
            return Ok(None);
        }
        Ok(Some(entry.value.clone()))
    }

    async fn set(&self, key: &str, value: Bytes, ttl: Duration) -> Result<(), CacheError> {
        let entry = Entry {
            value,
            expires_at: Instant::now() + ttl,
        };
        rw_write(&self.entries, "memory_cache.set").put(key.to_string(), entry);
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        rw_write(&self.entries, "memory_cache.delete").pop(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cache(capacity: usize) -> MemoryCache {
        MemoryCache::new(&CacheConfig {
            capacity,
            ..Default::default()
        })
    }

    #[tokio::test]
    async fn set_get_delete() {
        let cache = cache(4);
        let ttl = Duration::from_secs(60);

        assert!(cache.get("menu:m1").await.unwrap().is_none());
        cache
            .set("menu:m1", Bytes::from_static(b"{}"), ttl)
            .await
            .unwrap();
        assert_eq!(
            cache.get("menu:m1").await.unwrap(),
            Some(Bytes::from_static(b"{}"))
        );

        cache.delete("menu:m1").await.unwrap();
        assert!(cache.get("menu:m1").await.unwrap().is_none());
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn expired_entries_read_as_missing() {
        let cache = cache(4);
        cache
            .set("menu:m1", Bytes::from_static(b"1"), Duration::ZERO)
            .await
            .unwrap();
        assert!(!cache.contains("menu:m1"));
        assert!(cache.get("menu:m1").await.unwrap().is_none());
        assert_eq!(cache.len(), 0);
    }

    #[tokio::test]
    async fn least_recently_used_entry_is_evicted() {
        let cache = cache(2);
        let ttl = Duration::from_secs(60);
        cache.set("a", Bytes::from_static(b"a"), ttl).await.unwrap();
        cache.set("b", Bytes::from_static(b"b"), ttl).await.unwrap();
        cache.get("a").await.unwrap();
        cache.set("c", Bytes::from_static(b"c"), ttl).await.unwrap();

        assert!(cache.contains("a"));
        assert!(!cache.contains("b"));
        assert!(cache.contains("c"));
    }

    #[tokio::test]
    async fn last_write_wins() {
        let cache = cache(2);
        let ttl = Duration::from_secs(60);
        cache.set("k", Bytes::from_static(b"1"), ttl).await.unwrap();
        cache.set("k", Bytes::from_static(b"2"), ttl).await.unwrap();
        assert_eq!(cache.get("k").await.unwrap(), Some(Bytes::from_static(b"2")));
    }
}
