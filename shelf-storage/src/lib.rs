//! Shelf Storage - Review Store, Ranking Queries and Book Cache
//!
//! Defines the storage abstraction for books and reviews, the aggregation
//! engine that ranks books over time windows, the four named ranking presets,
//! and the process-wide book cache with its invalidation hook.

pub mod aggregation;
pub mod cache;
pub mod ranking;

pub use aggregation::{BookAggregate, BookSummary, RankingQuery, ReviewAggregate};
pub use ranking::RankingPreset;

// Re-export cache types for API integration
pub use cache::{
    BookMutationHook, CacheBackend, CacheConfig, CacheInvalidator, CacheKey, CacheRead,
    CacheStats, Cacheable, Freshness, InMemoryCacheBackend, ReadThroughCache, StorageFetcher,
    SummaryFetcher,
};

use shelf_core::{
    Book, BookId, EntityIdType, EntityType, Review, ShelfError, ShelfResult, StorageError,
};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

// ============================================================================
// UPDATE TYPES
// ============================================================================

/// Update payload for books.
#[derive(Debug, Clone, Default)]
pub struct BookUpdate {
    /// New title
    pub title: Option<String>,
}

impl BookUpdate {
    pub fn title(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
        }
    }

    pub fn has_any_updates(&self) -> bool {
        self.title.is_some()
    }
}

// ============================================================================
// STORAGE TRAIT
// ============================================================================

/// Storage trait for Shelf entities.
///
/// Book listings come back in creation order; that order is the stable
/// sequence rankings fall back on for ties.
pub trait StorageTrait: Send + Sync {
    // === Book Operations ===

    /// Insert a new book.
    fn book_insert(&self, b: &Book) -> ShelfResult<()>;

    /// Get a book by ID.
    fn book_get(&self, id: BookId) -> ShelfResult<Option<Book>>;

    /// List every book, oldest first.
    fn book_list(&self) -> ShelfResult<Vec<Book>>;

    /// Books whose title contains `needle`, case-insensitively, oldest first.
    fn book_search_title(&self, needle: &str) -> ShelfResult<Vec<Book>> {
        Ok(self
            .book_list()?
            .into_iter()
            .filter(|b| b.title_matches(needle))
            .collect())
    }

    /// Update a book, returning the stored result.
    fn book_update(&self, id: BookId, update: BookUpdate) -> ShelfResult<Book>;

    /// Delete a book and its reviews, returning the removed book.
    fn book_delete(&self, id: BookId) -> ShelfResult<Book>;

    // === Review Operations ===

    /// Append a review. Fails with `NotFound` when the book does not exist.
    fn review_insert(&self, r: &Review) -> ShelfResult<()>;

    /// Reviews of one book, oldest first.
    fn review_list_by_book(&self, book_id: BookId) -> ShelfResult<Vec<Review>>;
}

// ============================================================================
// IN-MEMORY STORAGE
// ============================================================================

/// In-memory storage, the default backend for the service and for tests.
///
/// Lock order is always `books` before `reviews`.
#[derive(Debug, Default)]
pub struct InMemoryStorage {
    books: Arc<RwLock<BTreeMap<BookId, Book>>>,
    reviews: Arc<RwLock<HashMap<BookId, Vec<Review>>>>,
}

fn read<T>(lock: &RwLock<T>) -> ShelfResult<RwLockReadGuard<'_, T>> {
    lock.read()
        .map_err(|_| ShelfError::Storage(StorageError::LockPoisoned))
}

fn write<T>(lock: &RwLock<T>) -> ShelfResult<RwLockWriteGuard<'_, T>> {
    lock.write()
        .map_err(|_| ShelfError::Storage(StorageError::LockPoisoned))
}

impl InMemoryStorage {
    /// Create a new empty storage.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get count of stored books.
    pub fn book_count(&self) -> ShelfResult<usize> {
        Ok(read(&self.books)?.len())
    }

    /// Get count of stored reviews across all books.
    pub fn review_count(&self) -> ShelfResult<usize> {
        Ok(read(&self.reviews)?.values().map(Vec::len).sum())
    }
}

impl StorageTrait for InMemoryStorage {
    fn book_insert(&self, b: &Book) -> ShelfResult<()> {
        let mut books = write(&self.books)?;
        if books.contains_key(&b.book_id) {
            return Err(ShelfError::Storage(StorageError::InsertFailed {
                entity_type: EntityType::Book,
                reason: "already exists".to_string(),
            }));
        }
        books.insert(b.book_id, b.clone());
        Ok(())
    }

    fn book_get(&self, id: BookId) -> ShelfResult<Option<Book>> {
        Ok(read(&self.books)?.get(&id).cloned())
    }

    fn book_list(&self) -> ShelfResult<Vec<Book>> {
        Ok(read(&self.books)?.values().cloned().collect())
    }

    fn book_update(&self, id: BookId, update: BookUpdate) -> ShelfResult<Book> {
        let mut books = write(&self.books)?;
        let book = books
            .get_mut(&id)
            .ok_or_else(|| ShelfError::not_found(EntityType::Book, id.as_uuid()))?;

        if let Some(title) = update.title {
            if title.trim().is_empty() {
                return Err(ShelfError::Storage(StorageError::UpdateFailed {
                    entity_type: EntityType::Book,
                    id: id.as_uuid(),
                    reason: "title must not be empty".to_string(),
                }));
            }
            book.title = title;
        }
        book.updated_at = chrono::Utc::now();

        Ok(book.clone())
    }

    fn book_delete(&self, id: BookId) -> ShelfResult<Book> {
        let mut books = write(&self.books)?;
        let book = books
            .remove(&id)
            .ok_or_else(|| ShelfError::not_found(EntityType::Book, id.as_uuid()))?;
        write(&self.reviews)?.remove(&id);
        Ok(book)
    }

    fn review_insert(&self, r: &Review) -> ShelfResult<()> {
        let books = read(&self.books)?;
        if !books.contains_key(&r.book_id) {
            return Err(ShelfError::not_found(EntityType::Book, r.book_id.as_uuid()));
        }

        let mut reviews = write(&self.reviews)?;
        let entry = reviews.entry(r.book_id).or_default();
        if entry.iter().any(|existing| existing.review_id == r.review_id) {
            return Err(ShelfError::Storage(StorageError::InsertFailed {
                entity_type: EntityType::Review,
                reason: "already exists".to_string(),
            }));
        }
        entry.push(r.clone());
        Ok(())
    }

    fn review_list_by_book(&self, book_id: BookId) -> ShelfResult<Vec<Review>> {
        let reviews = read(&self.reviews)?;
        let mut result = reviews.get(&book_id).cloned().unwrap_or_default();
        result.sort_by_key(|r| r.created_at);
        Ok(result)
    }
}

// ============================================================================
// TESTS
// ============================================================================
