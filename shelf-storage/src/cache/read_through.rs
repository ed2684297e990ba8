//! Read-through cache for book summaries.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use shelf_core::{CacheSettings, ShelfResult};

use super::freshness::{CacheRead, Freshness};
use super::key::CacheKey;
use super::traits::{CacheBackend, Cacheable};
use crate::{BookSummary, StorageTrait};

/// Configuration for the read-through cache.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Entries older than this are refetched regardless of the requested freshness.
    pub entry_ttl: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self::from(&CacheSettings::default())
    }
}

impl From<&CacheSettings> for CacheConfig {
    fn from(settings: &CacheSettings) -> Self {
        Self {
            entry_ttl: settings.entry_ttl,
        }
    }
}

impl CacheConfig {
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.entry_ttl = ttl;
        self
    }
}

/// Loads the value behind a key on a cache miss.
#[async_trait]
pub trait StorageFetcher<T: Cacheable>: Send + Sync {
    async fn fetch(&self, key: &CacheKey) -> ShelfResult<Option<T>>;
}

/// Builds [`BookSummary`] values straight from storage.
pub struct SummaryFetcher<'a> {
    storage: &'a dyn StorageTrait,
}

impl<'a> SummaryFetcher<'a> {
    pub fn new(storage: &'a dyn StorageTrait) -> Self {
        Self { storage }
    }
}

#[async_trait]
impl StorageFetcher<BookSummary> for SummaryFetcher<'_> {
    async fn fetch(&self, key: &CacheKey) -> ShelfResult<Option<BookSummary>> {
        let Some(book_id) = key.book_id() else {
            return Ok(None);
        };
        let Some(book) = self.storage.book_get(book_id)? else {
            return Ok(None);
        };
        let reviews = self.storage.review_list_by_book(book_id)?;
        Ok(Some(BookSummary::build(book, reviews)))
    }
}

/// Read-through cache: serve from the backend when young enough, otherwise
/// fetch from storage and repopulate.
pub struct ReadThroughCache<C: CacheBackend> {
    cache: Arc<C>,
    config: CacheConfig,
}

impl<C: CacheBackend> ReadThroughCache<C> {
    pub fn new(cache: Arc<C>, config: CacheConfig) -> Self {
        Self { cache, config }
    }

    pub fn with_defaults(cache: Arc<C>) -> Self {
        Self::new(cache, CacheConfig::default())
    }

    pub fn backend(&self) -> &C {
        &self.cache
    }

    /// Get a value, falling back to storage when the cached entry is missing
    /// or older than `freshness` allows.
    ///
    /// Returns `Ok(None)` if storage has nothing under the key either.
    pub async fn get<T, S>(
        &self,
        key: &CacheKey,
        freshness: Freshness,
        storage: &S,
    ) -> ShelfResult<Option<CacheRead<T>>>
    where
        T: Cacheable,
        S: StorageFetcher<T>,
    {
        if let Some(max_age) = freshness.max_age(self.config.entry_ttl) {
            if let Some((entity, cached_at)) = self.cache.get::<T>(key).await? {
                let age = (Utc::now() - cached_at)
                    .to_std()
                    .unwrap_or(Duration::ZERO);
                if age <= max_age {
                    return Ok(Some(CacheRead::from_cache(entity, cached_at)));
                }
                tracing::debug!(
                    key = %key,
                    age_secs = age.as_secs(),
                    "Cache entry too old, refetching"
                );
            }
        }

        let epoch = self.cache.epoch().await?;
        match storage.fetch(key).await? {
            Some(entity) => {
                let cached_at = Utc::now();
                if !self.cache.put(&entity, cached_at, epoch).await? {
                    tracing::debug!(key = %key, "Invalidated during fetch, not caching");
                }
                Ok(Some(CacheRead::from_storage(entity, cached_at)))
            }
            None => {
                // nothing to serve; make sure no orphaned entry lingers
                self.cache.delete(key).await?;
                Ok(None)
            }
        }
    }
}

impl<C: CacheBackend> Clone for ReadThroughCache<C> {
    fn clone(&self) -> Self {
        Self {
            cache: Arc::clone(&self.cache),
            config: self.config.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{BookMutationHook, CacheInvalidator, InMemoryCacheBackend};
    use crate::{BookUpdate, InMemoryStorage};
    use shelf_core::{Book, BookId, EntityIdType, Review, ReviewInput};

    /// Loads the summary, then lets a writer change the book and purge the
    /// cache before handing the now stale summary back.
    struct InterleavedWriter<'a> {
        storage: &'a InMemoryStorage,
        invalidator: CacheInvalidator<InMemoryCacheBackend>,
        delete: bool,
    }

    #[async_trait]
    impl StorageFetcher<BookSummary> for InterleavedWriter<'_> {
        async fn fetch(&self, key: &CacheKey) -> ShelfResult<Option<BookSummary>> {
            let loaded = SummaryFetcher::new(self.storage).fetch(key).await?;
            if let Some(book_id) = key.book_id() {
                if self.delete {
                    self.storage.book_delete(book_id)?;
                    self.invalidator.book_deleted(book_id).await?;
                } else {
                    let book = self
                        .storage
                        .book_update(book_id, BookUpdate::title("Dune Messiah"))?;
                    self.invalidator.book_updated(&book).await?;
                }
            }
            Ok(loaded)
        }
    }

    fn seeded() -> (InMemoryStorage, Book) {
        let storage = InMemoryStorage::new();
        let book = Book::new("Dune");
        storage.book_insert(&book).unwrap();
        let new = ReviewInput::new("A sweeping desert epic", 5).validate().unwrap();
        storage
            .review_insert(&Review::from_new(book.book_id, new))
            .unwrap();
        (storage, book)
    }

    #[tokio::test]
    async fn test_cache_miss_then_hit() {
        let (storage, book) = seeded();
        let cache = ReadThroughCache::with_defaults(Arc::new(InMemoryCacheBackend::new()));
        let fetcher = SummaryFetcher::new(&storage);
        let key = CacheKey::book(book.book_id);

        let first = cache
            .get::<BookSummary, _>(&key, Freshness::Cached, &fetcher)
            .await
            .unwrap()
            .unwrap();
        assert!(!first.was_cache_hit());
        assert_eq!(first.value().book.reviews_count(), 1);

        let second = cache
            .get::<BookSummary, _>(&key, Freshness::Cached, &fetcher)
            .await
            .unwrap()
            .unwrap();
        assert!(second.was_cache_hit());
        assert_eq!(second.into_value(), first.into_value());
    }

    #[tokio::test]
    async fn test_fresh_bypasses_cache() {
        let (storage, book) = seeded();
        let cache = ReadThroughCache::with_defaults(Arc::new(InMemoryCacheBackend::new()));
        let fetcher = SummaryFetcher::new(&storage);
        let key = CacheKey::book(book.book_id);

        cache
            .get::<BookSummary, _>(&key, Freshness::Cached, &fetcher)
            .await
            .unwrap();
        storage
            .book_update(book.book_id, BookUpdate::title("Dune (revised)"))
            .unwrap();

        let stale = cache
            .get::<BookSummary, _>(&key, Freshness::Cached, &fetcher)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stale.value().book.book.title, "Dune");

        let fresh = cache
            .get::<BookSummary, _>(&key, Freshness::Fresh, &fetcher)
            .await
            .unwrap()
            .unwrap();
        assert!(!fresh.was_cache_hit());
        assert_eq!(fresh.value().book.book.title, "Dune (revised)");
    }

    #[tokio::test]
    async fn test_expired_entry_is_refetched() {
        let (storage, book) = seeded();
        let cache = ReadThroughCache::new(
            Arc::new(InMemoryCacheBackend::new()),
            CacheConfig::default().with_ttl(Duration::ZERO),
        );
        let fetcher = SummaryFetcher::new(&storage);
        let key = CacheKey::book(book.book_id);

        cache
            .get::<BookSummary, _>(&key, Freshness::Cached, &fetcher)
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(5)).await;
        let read = cache
            .get::<BookSummary, _>(&key, Freshness::Cached, &fetcher)
            .await
            .unwrap()
            .unwrap();
        assert!(!read.was_cache_hit());
    }

    #[tokio::test]
    async fn test_missing_book_returns_none() {
        let storage = InMemoryStorage::new();
        let cache = ReadThroughCache::with_defaults(Arc::new(InMemoryCacheBackend::new()));
        let read = cache
            .get::<BookSummary, _>(
                &CacheKey::book(BookId::now_v7()),
                Freshness::Cached,
                &SummaryFetcher::new(&storage),
            )
            .await
            .unwrap();
        assert!(read.is_none());
    }

    #[tokio::test]
    async fn test_update_during_fill_is_not_cached() {
        let (storage, book) = seeded();
        let backend = Arc::new(InMemoryCacheBackend::new());
        let cache = ReadThroughCache::with_defaults(Arc::clone(&backend));
        let key = CacheKey::book(book.book_id);
        let writer = InterleavedWriter {
            storage: &storage,
            invalidator: CacheInvalidator::new(Arc::clone(&backend)),
            delete: false,
        };

        let raced = cache
            .get::<BookSummary, _>(&key, Freshness::Cached, &writer)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(raced.value().book.book.title, "Dune");
        assert!(!backend.contains(&key).await);

        let read = cache
            .get::<BookSummary, _>(&key, Freshness::Cached, &SummaryFetcher::new(&storage))
            .await
            .unwrap()
            .unwrap();
        assert!(!read.was_cache_hit());
        assert_eq!(read.value().book.book.title, "Dune Messiah");
    }

    #[tokio::test]
    async fn test_delete_during_fill_does_not_resurrect_book() {
        let (storage, book) = seeded();
        let backend = Arc::new(InMemoryCacheBackend::new());
        let cache = ReadThroughCache::with_defaults(Arc::clone(&backend));
        let key = CacheKey::book(book.book_id);
        let writer = InterleavedWriter {
            storage: &storage,
            invalidator: CacheInvalidator::new(Arc::clone(&backend)),
            delete: true,
        };

        cache
            .get::<BookSummary, _>(&key, Freshness::Cached, &writer)
            .await
            .unwrap();

        let read = cache
            .get::<BookSummary, _>(&key, Freshness::Cached, &SummaryFetcher::new(&storage))
            .await
            .unwrap();
        assert!(read.is_none());
    }
}
