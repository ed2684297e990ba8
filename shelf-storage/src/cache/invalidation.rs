//! Cache invalidation on book mutations.

use std::sync::Arc;

use async_trait::async_trait;
use shelf_core::{Book, BookId, ShelfResult};

use super::key::CacheKey;
use super::traits::CacheBackend;

/// Callback run after a book has been written and before the mutating call returns.
#[async_trait]
pub trait BookMutationHook: Send + Sync {
    async fn book_updated(&self, book: &Book) -> ShelfResult<()>;

    async fn book_deleted(&self, book_id: BookId) -> ShelfResult<()>;
}

/// Purges `book:<id>` from the cache whenever a book changes.
pub struct CacheInvalidator<C: CacheBackend> {
    backend: Arc<C>,
}

impl<C: CacheBackend> CacheInvalidator<C> {
    pub fn new(backend: Arc<C>) -> Self {
        Self { backend }
    }

    /// Delete the entry for one book. Missing entries are ignored.
    pub async fn purge(&self, book_id: BookId) -> ShelfResult<()> {
        let key = CacheKey::book(book_id);
        let removed = self.backend.delete(&key).await?;
        tracing::debug!(key = %key, removed, "Cache entry invalidated");
        Ok(())
    }
}

#[async_trait]
impl<C: CacheBackend> BookMutationHook for CacheInvalidator<C> {
    async fn book_updated(&self, book: &Book) -> ShelfResult<()> {
        self.purge(book.book_id).await
    }

    async fn book_deleted(&self, book_id: BookId) -> ShelfResult<()> {
        self.purge(book_id).await
    }
}
