//! Core entity structures

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::{BookId, Constraint, EntityIdType, FieldViolation, ReviewId, Timestamp, ValidationError};

/// Lowest accepted star rating.
pub const MIN_RATING: u8 = 1;
/// Highest accepted star rating.
pub const MAX_RATING: u8 = 5;
/// Minimum review text length, in characters.
pub const MIN_REVIEW_TEXT_CHARS: usize = 15;

/// Star rating in `MIN_RATING..=MAX_RATING`.
///
/// The only constructor is [`Rating::new`], so an out-of-range rating cannot exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u8")]
pub struct Rating(u8);

impl Rating {
    pub fn new(value: i64) -> Result<Self, ValidationError> {
        if value < MIN_RATING as i64 || value > MAX_RATING as i64 {
            return Err(ValidationError::Rejected {
                violations: vec![FieldViolation::new("rating", Rating::range())],
            });
        }
        Ok(Self(value as u8))
    }

    pub fn get(&self) -> u8 {
        self.0
    }

    pub(crate) fn range() -> Constraint {
        Constraint::Range {
            min: MIN_RATING as i64,
            max: MAX_RATING as i64,
        }
    }
}

impl TryFrom<i64> for Rating {
    type Error = ValidationError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Rating::new(value)
    }
}

impl From<Rating> for u8 {
    fn from(rating: Rating) -> u8 {
        rating.0
    }
}

impl fmt::Display for Rating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Book - the ranked entity. Reviews attach to it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Book {
    pub book_id: BookId,
    pub title: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Book {
    pub fn new(title: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            book_id: BookId::now_v7(),
            title: title.into(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Case-insensitive substring match on the title.
    pub fn title_matches(&self, needle: &str) -> bool {
        self.title.to_lowercase().contains(&needle.to_lowercase())
    }
}

/// Review - immutable once written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Review {
    pub review_id: ReviewId,
    pub book_id: BookId,
    #[serde(alias = "review")]
    pub text: String,
    pub rating: Rating,
    pub created_at: Timestamp,
}

impl Review {
    /// Materialize a validated submission against a book, stamped now.
    pub fn from_new(book_id: BookId, new: NewReview) -> Self {
        Self::from_new_at(book_id, new, Utc::now())
    }

    /// Materialize a validated submission with an explicit creation time.
    pub fn from_new_at(book_id: BookId, new: NewReview, created_at: Timestamp) -> Self {
        Self {
            review_id: ReviewId::now_v7(),
            book_id,
            text: new.text,
            rating: new.rating,
            created_at,
        }
    }
}

/// A review submission that has passed validation.
///
/// Produced by [`crate::ReviewInput::validate`]; there is no other public way to build one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewReview {
    pub(crate) text: String,
    pub(crate) rating: Rating,
}

impl NewReview {
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn rating(&self) -> Rating {
        self.rating
    }
}
