//! Typed, fault-tolerant facade over a [`CacheGateway`].
//!
//! Backend failures never reach callers: a failed read is a miss and a failed
//! write or delete is logged. Entry expiry bounds any staleness this leaves behind.
//!
//! Read-through fills are guarded by per-key generations: a reader captures the
//! generation before going to the store, and the fill is dropped when an
//! invalidation of that key ran in between.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use metrics::counter;
use serde::{Serialize, de::DeserializeOwned};
use tokio::sync::Mutex;
use tracing::{debug, warn};

use super::config::CacheConfig;
use super::keys::CacheKey;
use super::store::{CacheError, CacheGateway};

pub(crate) const METRIC_CACHE_HIT: &str = "menuboard_cache_hit_total";
pub(crate) const METRIC_CACHE_MISS: &str = "menuboard_cache_miss_total";
pub(crate) const METRIC_CACHE_INVALIDATE: &str = "menuboard_cache_invalidate_total";
pub(crate) const METRIC_CACHE_ERROR: &str = "menuboard_cache_error_total";

const SOURCE: &str = "menuboard::cache";
const GENERATION_STRIPES: usize = 64;

/// Invalidation count of a key's stripe, captured before a store read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Generation(u64);

#[derive(Clone)]
pub struct CacheClient {
    gateway: Option<Arc<dyn CacheGateway>>,
    ttl: Duration,
    generations: Arc<[Mutex<u64>]>,
}

impl CacheClient {
    pub fn new(gateway: Arc<dyn CacheGateway>, config: &CacheConfig) -> Self {
        Self {
            gateway: config.is_enabled().then_some(gateway),
            ttl: config.ttl(),
            generations: new_stripes(),
        }
    }

    /// Every read misses and every write is a no-op.
    pub fn disabled() -> Self {
        Self {
            gateway: None,
            ttl: Duration::ZERO,
            generations: new_stripes(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.gateway.is_some()
    }

    pub async fn get_json<T: DeserializeOwned>(&self, key: &CacheKey) -> Option<T> {
        let gateway = self.gateway.as_ref()?;
        let rendered = key.to_string();

        let decoded = match gateway.get(&rendered).await {
            Ok(Some(bytes)) => serde_json::from_slice::<T>(&bytes).map_err(CacheError::from),
            Ok(None) => {
                counter!(METRIC_CACHE_MISS, "family" => key.family()).increment(1);
                return None;
            }
            Err(err) => Err(err),
        };

        match decoded {
            Ok(value) => {
                counter!(METRIC_CACHE_HIT, "family" => key.family()).increment(1);
                debug!(target = SOURCE, key = %rendered, "cache hit");
                Some(value)
            }
            Err(err) => {
                self.report("get", &rendered, &err);
                counter!(METRIC_CACHE_MISS, "family" => key.family()).increment(1);
                None
            }
        }
    }

    pub async fn put_json<T: Serialize + ?Sized>(&self, key: &CacheKey, value: &T) {
        let Some(gateway) = self.gateway.as_ref() else {
            return;
        };
        let rendered = key.to_string();

        let payload = match serde_json::to_vec(value) {
            Ok(payload) => Bytes::from(payload),
            Err(err) => {
                self.report("set", &rendered, &CacheError::from(err));
                return;
            }
        };

        if let Err(err) = gateway.set(&rendered, payload, self.ttl).await {
            self.report("set", &rendered, &err);
        }
    }

    pub async fn generation(&self, key: &CacheKey) -> Generation {
        Generation(*self.stripe(&key.to_string()).lock().await)
    }

    /// Store a value read from the store, unless `key` was invalidated since `seen`
    /// was captured.
    pub async fn fill_json<T: Serialize + ?Sized>(
        &self,
        key: &CacheKey,
        value: &T,
        seen: Generation,
    ) {
        if self.gateway.is_none() {
            return;
        }
        let rendered = key.to_string();
        let current = self.stripe(&rendered).lock().await;
        if Generation(*current) != seen {
            debug!(target = SOURCE, key = %rendered, "dropping fill raced by invalidation");
            return;
        }
        self.put_json(key, value).await;
        drop(current);
    }

    /// Delete each key, returning how many deletes the backend acknowledged.
    pub async fn invalidate<'a>(&self, keys: impl IntoIterator<Item = &'a CacheKey>) -> usize {
        let Some(gateway) = self.gateway.as_ref() else {
            return 0;
        };

        let mut deleted = 0;
        for key in keys {
            let rendered = key.to_string();
            *self.stripe(&rendered).lock().await += 1;
            match gateway.delete(&rendered).await {
                Ok(()) => {
                    deleted += 1;
                    counter!(METRIC_CACHE_INVALIDATE, "family" => key.family()).increment(1);
                }
                Err(err) => self.report("delete", &rendered, &err),
            }
        }
        deleted
    }

    fn stripe(&self, rendered: &str) -> &Mutex<u64> {
        let mut hasher = DefaultHasher::new();
        rendered.hash(&mut hasher);
        &self.generations[(hasher.finish() as usize) % self.generations.len()]
    }

    fn report(&self, op: &'static str, key: &str, err: &CacheError) {
        counter!(METRIC_CACHE_ERROR, "op" => op).increment(1);
        warn!(
            target = SOURCE,
            op,
            key,
            error = %err,
            "Cache operation failed; continuing without cache"
        );
    }
}

fn new_stripes() -> Arc<[Mutex<u64>]> {
    (0..GENERATION_STRIPES).map(|_| Mutex::new(0)).collect()
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    use super::*;
    use crate::cache::store::MemoryCache;

    struct FailingGateway {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl CacheGateway for FailingGateway {
        async fn get(&self, _key: &str) -> Result<Option<Bytes>, CacheError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(CacheError::Unavailable("connection refused".into()))
        }

        async fn set(&self, _key: &str, _value: Bytes, _ttl: Duration) -> Result<(), CacheError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(CacheError::Unavailable("connection refused".into()))
        }

        async fn delete(&self, _key: &str) -> Result<(), CacheError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(CacheError::Unavailable("connection refused".into()))
        }
    }

    #[tokio::test]
    async fn roundtrips_json_values() {
        let config = CacheConfig::default();
        let client = CacheClient::new(Arc::new(MemoryCache::new(&config)), &config);
        let key = CacheKey::menu("m1");

        assert_eq!(client.get_json::<Vec<String>>(&key).await, None);
        client.put_json(&key, &vec!["a".to_string()]).await;
        assert_eq!(
            client.get_json::<Vec<String>>(&key).await,
            Some(vec!["a".to_string()])
        );

        assert_eq!(client.invalidate([&key]).await, 1);
        assert_eq!(client.get_json::<Vec<String>>(&key).await, None);
    }

    #[tokio::test]
    async fn fill_is_dropped_after_an_invalidation() {
        let config = CacheConfig::default();
        let store = Arc::new(MemoryCache::new(&config));
        let client = CacheClient::new(store.clone(), &config);
        let key = CacheKey::menu("m1");

        let seen = client.generation(&key).await;
        client.invalidate([&key]).await;
        client.fill_json(&key, &"stale", seen).await;
        assert!(!store.contains("menu:m1"));

        let seen = client.generation(&key).await;
        client.fill_json(&key, &"fresh", seen).await;
        assert_eq!(
            client.get_json::<String>(&key).await.as_deref(),
            Some("fresh")
        );
    }

    #[tokio::test]
    async fn undecodable_payload_is_a_miss() {
        let config = CacheConfig::default();
        let client = CacheClient::new(Arc::new(MemoryCache::new(&config)), &config);
        let key = CacheKey::menu("m1");

        client.put_json(&key, "not a number").await;
        assert_eq!(client.get_json::<u32>(&key).await, None);
    }

    #[tokio::test]
    async fn backend_failures_are_swallowed() {
        let gateway = Arc::new(FailingGateway {
            calls: AtomicUsize::new(0),
        });
        let client = CacheClient::new(gateway.clone(), &CacheConfig::default());
        let key = CacheKey::menu("m1");

        assert_eq!(client.get_json::<u32>(&key).await, None);
        client.put_json(&key, &1_u32).await;
        assert_eq!(client.invalidate([&key]).await, 0);
        assert_eq!(gateway.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn disabled_client_never_touches_a_backend() {
        let config = CacheConfig {
            enabled: false,
            ..Default::default()
        };
        let gateway = Arc::new(FailingGateway {
            calls: AtomicUsize::new(0),
        });
        let client = CacheClient::new(gateway.clone(), &config);

        assert!(!client.is_enabled());
        assert_eq!(client.get_json::<u32>(&CacheKey::menu("m1")).await, None);
        assert_eq!(gateway.calls.load(Ordering::SeqCst), 0);
        assert!(!CacheClient::disabled().is_enabled());
    }
}
