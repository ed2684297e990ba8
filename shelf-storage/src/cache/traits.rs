//! Cache backend traits and the cacheable marker.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use shelf_core::{EntityType, ShelfResult};

use super::key::CacheKey;
use crate::BookSummary;

/// Marker trait for types that can be cached.
///
/// `cache_key()` must be stable for the lifetime of the entity, and
/// `entity_type()` must match the entity type of every key it produces.
pub trait Cacheable: Clone + Serialize + DeserializeOwned + Send + Sync + 'static {
    fn entity_type() -> EntityType;

    fn cache_key(&self) -> CacheKey;
}

/// Cache backend trait for pluggable cache implementations.
///
/// Implementations must be safe for concurrent use and are responsible for
/// serializing values.
#[async_trait]
pub trait CacheBackend: Send + Sync {
    /// Get a value and when it was cached, or `None` if absent.
    async fn get<T: Cacheable>(&self, key: &CacheKey) -> ShelfResult<Option<(T, DateTime<Utc>)>>;

    /// Current invalidation epoch. Every `delete` and `clear` advances it,
    /// whether or not an entry was present.
    async fn epoch(&self) -> ShelfResult<u64>;

    /// Store a value under its own key, replacing any previous entry, unless
    /// the epoch has moved past `epoch`. Returns whether the value was stored.
    ///
    /// Read `epoch` before loading the value from storage: a purge that lands
    /// between the load and the store then discards the stale value.
    async fn put<T: Cacheable>(
        &self,
        entity: &T,
        cached_at: DateTime<Utc>,
        epoch: u64,
    ) -> ShelfResult<bool>;

    /// Remove an entry. Returns whether anything was removed; a missing key is not an error.
    async fn delete(&self, key: &CacheKey) -> ShelfResult<bool>;

    /// Drop every entry, returning how many were removed.
    async fn clear(&self) -> ShelfResult<u64>;

    async fn stats(&self) -> ShelfResult<CacheStats>;
}

/// Statistics about cache usage.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    /// Number of entries currently in cache.
    pub entry_count: u64,
    /// Deletes that actually removed an entry.
    pub invalidations: u64,
}

impl CacheStats {
    /// Calculate the hit rate (0.0 to 1.0).
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

impl Cacheable for BookSummary {
    fn entity_type() -> EntityType {
        EntityType::Book
    }

    fn cache_key(&self) -> CacheKey {
        CacheKey::book(self.book.book.book_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shelf_core::Book;

    #[test]
    fn test_cache_stats_hit_rate() {
        let stats = CacheStats {
            hits: 80,
            misses: 20,
            ..Default::default()
        };
        assert!((stats.hit_rate() - 0.8).abs() < 0.001);

        let empty_stats = CacheStats::default();
        assert!((empty_stats.hit_rate() - 0.0).abs() < 0.001);
    }

    #[test]
    fn test_summary_keyed_by_book() {
        let book = Book::new("Dune");
        let id = book.book_id;
        let summary = BookSummary::build(book, Vec::new());
        assert_eq!(BookSummary::entity_type(), EntityType::Book);
        assert_eq!(summary.cache_key(), CacheKey::book(id));
    }
}
