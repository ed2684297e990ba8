//! Shelf Test Utilities
//!
//! Shared test infrastructure for the Shelf workspace:
//! - Proptest generators for ratings, review texts and review histories
//! - Fixtures that seed an in-memory store relative to a fixed clock
//! - Assertions on `ShelfResult` error kinds

pub use shelf_storage::InMemoryStorage;

pub use shelf_core::{
    Book, BookId, EntityIdType, EntityType, ErrorKind, NewReview, Rating, Review, ReviewId,
    ReviewInput, ShelfError, ShelfResult, StorageError, Timestamp, ValidationError,
};

use chrono::{Duration, TimeZone, Utc};
use shelf_storage::StorageTrait;

// ============================================================================
// PROPTEST GENERATORS
// ============================================================================

pub mod generators {
    //! Proptest strategies for Shelf inputs.

    use super::*;
    use proptest::prelude::*;
    use shelf_core::{MAX_RATING, MIN_RATING, MIN_REVIEW_TEXT_CHARS};

    /// A rating inside `1..=5`.
    pub fn arb_rating() -> impl Strategy<Value = i64> {
        i64::from(MIN_RATING)..=i64::from(MAX_RATING)
    }

    /// A rating outside `1..=5`.
    pub fn arb_invalid_rating() -> impl Strategy<Value = i64> {
        prop_oneof![i64::MIN..i64::from(MIN_RATING), (i64::from(MAX_RATING) + 1)..i64::MAX]
    }

    /// Review text long enough to be accepted, including non-ASCII characters.
    pub fn arb_review_text() -> impl Strategy<Value = String> {
        "[a-zA-Z0-9 éñü]{15,120}".prop_filter("at least 15 chars after trimming", |s| {
            s.trim().chars().count() >= MIN_REVIEW_TEXT_CHARS
        })
    }

    /// Review text that is too short once trimmed.
    pub fn arb_short_text() -> impl Strategy<Value = String> {
        "[a-zA-Z0-9]{0,14}"
    }

    /// A review history: `(rating, days_ago)` pairs within the last two years.
    pub fn arb_review_history(max_len: usize) -> impl Strategy<Value = Vec<(i64, i64)>> {
        prop::collection::vec((arb_rating(), 0i64..730), 0..max_len)
    }

    /// Review histories for several books at once.
    pub fn arb_library(
        max_books: usize,
        max_reviews: usize,
    ) -> impl Strategy<Value = Vec<Vec<(i64, i64)>>> {
        prop::collection::vec(arb_review_history(max_reviews), 0..max_books)
    }
}

// ============================================================================
// TEST FIXTURES
// ============================================================================

pub mod fixtures {
    //! Pre-built fixtures for common scenarios.

    use super::*;

    /// Text that passes validation.
    pub const VALID_TEXT: &str = "A genuinely good read indeed";

    /// Fixed reference clock used by fixtures.
    pub fn fixed_now() -> Timestamp {
        Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0)
            .single()
            .unwrap_or_else(Utc::now)
    }

    /// A validated submission with [`VALID_TEXT`].
    pub fn new_review(rating: i64) -> ShelfResult<NewReview> {
        Ok(ReviewInput::new(VALID_TEXT, rating).validate()?)
    }

    /// Insert a book with the given title.
    pub fn seed_book(storage: &dyn StorageTrait, title: &str) -> ShelfResult<Book> {
        let book = Book::new(title);
        storage.book_insert(&book)?;
        Ok(book)
    }

    /// Insert reviews given as `(rating, days_ago)` relative to `now`.
    pub fn seed_reviews(
        storage: &dyn StorageTrait,
        book: &Book,
        now: Timestamp,
        history: &[(i64, i64)],
    ) -> ShelfResult<Vec<Review>> {
        history
            .iter()
            .map(|&(rating, days_ago)| {
                let review = Review::from_new_at(
                    book.book_id,
                    new_review(rating)?,
                    now - Duration::days(days_ago),
                );
                storage.review_insert(&review)?;
                Ok(review)
            })
            .collect()
    }

    /// Insert a book together with its review history.
    pub fn seed_book_with_reviews(
        storage: &dyn StorageTrait,
        title: &str,
        now: Timestamp,
        history: &[(i64, i64)],
    ) -> ShelfResult<Book> {
        let book = seed_book(storage, title)?;
        seed_reviews(storage, &book, now, history)?;
        Ok(book)
    }

    /// "Dune" with ratings 5, 4, 3 written 10, 25 and 100 days before `now`:
    /// two reviews in the last month, three in the last six months.
    pub fn dune(storage: &dyn StorageTrait, now: Timestamp) -> ShelfResult<Book> {
        seed_book_with_reviews(storage, "Dune", now, &[(5, 10), (4, 25), (3, 100)])
    }
}

// ============================================================================
// ASSERTIONS
// ============================================================================

pub mod assertions {
    //! Assertion helpers for `ShelfResult` values.

    use super::*;

    /// Assert that a result is Ok.
    pub fn assert_ok<T: std::fmt::Debug>(result: &ShelfResult<T>) {
        assert!(result.is_ok(), "Expected Ok, got {:?}", result);
    }

    /// Assert that a result failed with the given error kind.
    pub fn assert_kind<T: std::fmt::Debug>(result: &ShelfResult<T>, kind: ErrorKind) {
        match result {
            Err(e) => assert_eq!(e.kind(), kind, "Unexpected error: {:?}", e),
            Ok(v) => panic!("Expected {:?} error, got Ok({:?})", kind, v),
        }
    }

    /// Assert that a result is a NotFound error for a specific entity type.
    pub fn assert_not_found<T: std::fmt::Debug>(result: &ShelfResult<T>, entity_type: EntityType) {
        match result {
            Err(ShelfError::Storage(StorageError::NotFound { entity_type: et, .. })) => {
                assert_eq!(*et, entity_type, "Wrong entity type in NotFound error");
            }
            other => panic!("Expected NotFound error, got {:?}", other),
        }
    }

    /// Assert that a result is a validation failure naming exactly `fields`.
    pub fn assert_validation_fields<T: std::fmt::Debug>(result: &ShelfResult<T>, fields: &[&str]) {
        match result {
            Err(e @ ShelfError::Validation(_)) => assert_eq!(e.fields(), fields),
            other => panic!("Expected validation error, got {:?}", other),
        }
    }
}
