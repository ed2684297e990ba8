//! Shelf service layer.
//!
//! Owns the store, the book cache, the mutation hook and the `reviews`
//! throttle, and implements every operation the HTTP routes expose.

use std::net::IpAddr;
use std::sync::Arc;

use chrono::Utc;
use shelf_core::{
    Book, BookId, Constraint, EntityIdType, EntityType, FieldViolation, RankingConfig, Review,
    ReviewInput, ShelfConfig, ShelfError, ShelfResult, SortOrder, TimeWindow, Timestamp,
    ValidationError,
};
use shelf_storage::{
    BookAggregate, BookMutationHook, BookSummary, BookUpdate, CacheBackend, CacheConfig,
    CacheInvalidator, CacheKey, CacheRead, CacheStats, Freshness, InMemoryCacheBackend,
    InMemoryStorage, RankingPreset, RankingQuery, ReadThroughCache, StorageTrait, SummaryFetcher,
};

use crate::config::ThrottleConfig;
use crate::throttle::ThrottlePolicy;
use crate::types::RankingParams;

pub type BookCache = ReadThroughCache<InMemoryCacheBackend>;

pub struct ShelfService {
    storage: Arc<dyn StorageTrait>,
    cache: BookCache,
    hook: Arc<dyn BookMutationHook>,
    throttle: ThrottlePolicy,
    ranking: RankingConfig,
}

impl ShelfService {
    /// Build a service whose mutation hook purges the service's own cache.
    pub fn new(
        storage: Arc<dyn StorageTrait>,
        config: &ShelfConfig,
        throttle: ThrottleConfig,
    ) -> Self {
        let backend = Arc::new(InMemoryCacheBackend::new());
        let hook: Arc<dyn BookMutationHook> = Arc::new(CacheInvalidator::new(Arc::clone(&backend)));
        Self {
            storage,
            cache: ReadThroughCache::new(backend, CacheConfig::from(&config.cache)),
            hook,
            throttle: ThrottlePolicy::reviews(throttle),
            ranking: config.ranking.clone(),
        }
    }

    /// In-memory store with the given configuration.
    pub fn in_memory(config: &ShelfConfig, throttle: ThrottleConfig) -> Self {
        Self::new(Arc::new(InMemoryStorage::new()), config, throttle)
    }

    /// Replace the post-mutation hook.
    pub fn with_hook(mut self, hook: Arc<dyn BookMutationHook>) -> Self {
        self.hook = hook;
        self
    }

    pub fn storage(&self) -> &dyn StorageTrait {
        self.storage.as_ref()
    }

    pub fn throttle(&self) -> &ThrottlePolicy {
        &self.throttle
    }

    // === Reviews ===

    /// Throttle, look up the book, validate, then append the review.
    pub async fn submit_review(
        &self,
        client: IpAddr,
        book_id: BookId,
        input: &ReviewInput,
    ) -> ShelfResult<Review> {
        self.throttle.check(client)?;

        if self.storage.book_get(book_id)?.is_none() {
            return Err(ShelfError::not_found(EntityType::Book, book_id.as_uuid()));
        }

        let new = input.validate()?;
        let review = Review::from_new(book_id, new);
        self.storage.review_insert(&review)?;

        tracing::info!(
            book_id = %book_id,
            review_id = %review.review_id,
            rating = review.rating.get(),
            "Review submitted"
        );
        Ok(review)
    }

    // === Rankings ===

    pub async fn rank(&self, params: &RankingParams) -> ShelfResult<Vec<BookAggregate>> {
        self.rank_at(params, Utc::now()).await
    }

    /// Rank with preset windows ending at `now`.
    pub async fn rank_at(
        &self,
        params: &RankingParams,
        now: Timestamp,
    ) -> ShelfResult<Vec<BookAggregate>> {
        let query = self.ranking_query(params, now)?;
        query.execute(self.storage.as_ref())
    }

    /// Translate request parameters into a query.
    pub fn ranking_query(
        &self,
        params: &RankingParams,
        now: Timestamp,
    ) -> ShelfResult<RankingQuery> {
        let mut query = match non_empty(&params.filter) {
            Some(name) => {
                if params.has_raw_ranking() {
                    return Err(ValidationError::InvalidValue {
                        field: "filter".to_string(),
                        reason: "cannot be combined with from, to, min_reviews or order"
                            .to_string(),
                    }
                    .into());
                }
                name.parse::<RankingPreset>()?.query(now, &self.ranking)
            }
            None => raw_query(params)?,
        };

        if let Some(title) = non_empty(&params.title) {
            query = query.title(title);
        }
        Ok(query)
    }

    // === Books ===

    pub async fn create_book(&self, title: &str) -> ShelfResult<Book> {
        let book = Book::new(require_title(title)?);
        self.storage.book_insert(&book)?;
        tracing::info!(book_id = %book.book_id, "Book created");
        Ok(book)
    }

    /// Book with its all-time aggregate and reviews, served through the cache.
    pub async fn book_summary(&self, book_id: BookId) -> ShelfResult<CacheRead<BookSummary>> {
        let fetcher = SummaryFetcher::new(self.storage.as_ref());
        self.cache
            .get::<BookSummary, _>(&CacheKey::book(book_id), Freshness::Cached, &fetcher)
            .await?
            .ok_or_else(|| ShelfError::not_found(EntityType::Book, book_id.as_uuid()))
    }

    /// Update a book; its cache entry is purged before this returns.
    pub async fn update_book(&self, book_id: BookId, mut update: BookUpdate) -> ShelfResult<Book> {
        if let Some(title) = update.title.take() {
            update.title = Some(require_title(&title)?);
        }

        let book = self.storage.book_update(book_id, update)?;
        self.hook.book_updated(&book).await?;
        tracing::info!(book_id = %book_id, "Book updated");
        Ok(book)
    }

    /// Delete a book and its reviews; its cache entry is purged before this returns.
    pub async fn delete_book(&self, book_id: BookId) -> ShelfResult<Book> {
        let book = self.storage.book_delete(book_id)?;
        self.hook.book_deleted(book_id).await?;
        tracing::info!(book_id = %book_id, "Book deleted");
        Ok(book)
    }

    pub async fn cache_stats(&self) -> ShelfResult<CacheStats> {
        self.cache.backend().stats().await
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn raw_query(params: &RankingParams) -> ShelfResult<RankingQuery> {
    let window = TimeWindow::parse(params.from.as_deref(), params.to.as_deref())?;
    let mut query = RankingQuery::new().window(window);

    if let Some(raw) = non_empty(&params.min_reviews) {
        let n = raw.parse::<u64>().map_err(|_| ValidationError::InvalidValue {
            field: "min_reviews".to_string(),
            reason: format!("'{}' is not a non-negative integer", raw),
        })?;
        query = query.min_reviews(n);
    }

    if let Some(raw) = non_empty(&params.order) {
        query = query.order_by(raw.parse::<SortOrder>()?);
    }

    Ok(query)
}

fn require_title(title: &str) -> ShelfResult<String> {
    let title = title.trim();
    if title.is_empty() {
        return Err(ValidationError::Rejected {
            violations: vec![FieldViolation::new("title", Constraint::Required)],
        }
        .into());
    }
    Ok(title.to_string())
}
