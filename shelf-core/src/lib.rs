//! Shelf Core - Entity Types
//!
//! Pure data structures shared by every other crate: identifiers, books and
//! reviews, time windows, submission validation, errors and configuration.
//! Storage, aggregation and caching live in `shelf-storage`.

pub mod config;
pub mod entities;
pub mod enums;
pub mod error;
pub mod identity;
pub mod validation;
pub mod window;

pub use config::{CacheSettings, RankingConfig, ShelfConfig};
pub use entities::{
    Book, NewReview, Rating, Review, MAX_RATING, MIN_RATING, MIN_REVIEW_TEXT_CHARS,
};
pub use enums::{EntityType, SortOrder};
pub use error::{
    CacheError, ConfigError, Constraint, ErrorKind, FieldViolation, ShelfError, ShelfResult,
    StorageError, ValidationError,
};
pub use identity::{new_entity_id, BookId, EntityIdType, ReviewId, Timestamp};
pub use validation::ReviewInput;
pub use window::TimeWindow;
