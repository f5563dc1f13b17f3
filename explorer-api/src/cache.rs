//! LRU response cache with a per-entry TTL.
//!
//! Keys are `"{network}/..."` so that a new block on one network refreshes
//! only that network's entries.

use std::future::Future;
use std::num::NonZeroUsize;
use std::time::{Duration, Instant};

use lru::LruCache;
use serde_json::Value;
use tokio::sync::Mutex;
use tracing::debug;

use crate::error::ApiError;

struct Entry {
    value: Value,
    expires_at: Instant,
}

pub struct ResponseCache {
    entries: Mutex<LruCache<String, Entry>>,
    ttl: Duration,
}

impl ResponseCache {
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
            ttl,
        }
    }

    pub async fn get(&self, key: &str) -> Option<Value> {
        let mut entries = self.entries.lock().await;
        let fresh = entries
            .get(key)
            .map(|entry| (entry.expires_at > Instant::now(), entry.value.clone()));
        match fresh {
            Some((true, value)) => Some(value),
            Some((false, _)) => {
                entries.pop(key);
                None
            }
            None => None,
        }
    }

    pub async fn insert(&self, key: String, value: Value) {
        let entry = Entry {
            value,
            expires_at: Instant::now() + self.ttl,
        };
        self.entries.lock().await.put(key, entry);
    }

    /// Cached value for `key`, or the result of `compute` which is then
    /// cached. Errors are never cached. The lock is not held while computing.
    pub async fn get_or_compute<F, Fut>(&self, key: &str, compute: F) -> Result<Value, ApiError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Value, ApiError>>,
    {
        if let Some(value) = self.get(key).await {
            debug!("Cache hit for {}", key);
            return Ok(value);
        }
        let value = compute().await?;
        self.insert(key.to_string(), value.clone()).await;
        Ok(value)
    }

    /// Drop every entry whose key starts with `prefix`. Returns how many
    /// entries were removed.
    pub async fn refresh(&self, prefix: &str) -> usize {
        let mut entries = self.entries.lock().await;
        let stale: Vec<String> = entries
            .iter()
            .filter(|(key, _)| key.starts_with(prefix))
            .map(|(key, _)| key.clone())
            .collect();
        for key in &stale {
            entries.pop(key);
        }
        debug!("Refreshed {} cache entries under {}", stale.len(), prefix);
        stale.len()
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_compute_runs_once_until_refresh() {
        let cache = ResponseCache::new(16, Duration::from_secs(60));
        let mut calls = 0;

        for _ in 0..3 {
            let value = cache
                .get_or_compute("testnet/a", || {
                    calls += 1;
                    async { Ok(json!(1)) }
                })
                .await
                .unwrap();
            assert_eq!(value, json!(1));
        }
        assert_eq!(calls, 1);

        cache.insert("mainnet/a".to_string(), json!(2)).await;
        assert_eq!(cache.refresh("testnet/").await, 1);
        assert_eq!(cache.get("testnet/a").await, None);
        assert_eq!(cache.get("mainnet/a").await, Some(json!(2)));
    }

    #[tokio::test]
    async fn test_expired_entries_are_dropped() {
        let cache = ResponseCache::new(16, Duration::ZERO);
        cache.insert("testnet/a".to_string(), json!(1)).await;
        assert_eq!(cache.get("testnet/a").await, None);
        assert_eq!(cache.len().await, 0);
    }

    #[tokio::test]
    async fn test_errors_are_not_cached() {
        let cache = ResponseCache::new(16, Duration::from_secs(60));
        let result = cache
            .get_or_compute("testnet/b", || async { Err(ApiError::BadRequest("nope".into())) })
            .await;
        assert!(result.is_err());
        assert_eq!(cache.len().await, 0);
    }

    #[tokio::test]
    async fn test_capacity_evicts_least_recent() {
        let cache = ResponseCache::new(2, Duration::from_secs(60));
        cache.insert("a".to_string(), json!(1)).await;
        cache.insert("b".to_string(), json!(2)).await;
        cache.get("a").await;
        cache.insert("c".to_string(), json!(3)).await;
        assert_eq!(cache.get("b").await, None);
        assert_eq!(cache.get("a").await, Some(json!(1)));
    }
}
