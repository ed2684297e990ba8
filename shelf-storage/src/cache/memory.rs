//! In-memory cache backend.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use shelf_core::{CacheError, ShelfResult};
use tokio::sync::RwLock;

use super::key::CacheKey;
use super::traits::{CacheBackend, CacheStats, Cacheable};

#[derive(Debug, Default)]
struct Entries {
    map: HashMap<CacheKey, (serde_json::Value, DateTime<Utc>)>,
    epoch: u64,
}

/// Process-wide cache backend holding JSON-encoded entries.
///
/// The epoch lives under the same lock as the entries, so a conditional `put`
/// and a `delete` are totally ordered.
#[derive(Debug, Default)]
pub struct InMemoryCacheBackend {
    entries: RwLock<Entries>,
    hits: AtomicU64,
    misses: AtomicU64,
    invalidations: AtomicU64,
}

impl InMemoryCacheBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn contains(&self, key: &CacheKey) -> bool {
        self.entries.read().await.map.contains_key(key)
    }
}

#[async_trait]
impl CacheBackend for InMemoryCacheBackend {
    async fn get<T: Cacheable>(&self, key: &CacheKey) -> ShelfResult<Option<(T, DateTime<Utc>)>> {
        let entry = self.entries.read().await.map.get(key).cloned();
        let Some((value, cached_at)) = entry else {
            self.misses.fetch_add(1, Ordering::Relaxed);
            return Ok(None);
        };

        let entity = serde_json::from_value(value).map_err(|e| CacheError::Serialization {
            key: key.to_string(),
            reason: e.to_string(),
        })?;
        self.hits.fetch_add(1, Ordering::Relaxed);
        Ok(Some((entity, cached_at)))
    }

    async fn epoch(&self) -> ShelfResult<u64> {
        Ok(self.entries.read().await.epoch)
    }

    async fn put<T: Cacheable>(
        &self,
        entity: &T,
        cached_at: DateTime<Utc>,
        epoch: u64,
    ) -> ShelfResult<bool> {
        let key = entity.cache_key();
        let value = serde_json::to_value(entity).map_err(|e| CacheError::Serialization {
            key: key.to_string(),
            reason: e.to_string(),
        })?;

        let mut entries = self.entries.write().await;
        if entries.epoch != epoch {
            return Ok(false);
        }
        entries.map.insert(key, (value, cached_at));
        Ok(true)
    }

    async fn delete(&self, key: &CacheKey) -> ShelfResult<bool> {
        let mut entries = self.entries.write().await;
        entries.epoch += 1;
        let removed = entries.map.remove(key).is_some();
        if removed {
            self.invalidations.fetch_add(1, Ordering::Relaxed);
        }
        Ok(removed)
    }

    async fn clear(&self) -> ShelfResult<u64> {
        let mut entries = self.entries.write().await;
        entries.epoch += 1;
        let count = entries.map.len() as u64;
        entries.map.clear();
        self.invalidations.fetch_add(count, Ordering::Relaxed);
        Ok(count)
    }

    async fn stats(&self) -> ShelfResult<CacheStats> {
        Ok(CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            entry_count: self.entries.read().await.map.len() as u64,
            invalidations: self.invalidations.load(Ordering::Relaxed),
        })
    }
}
