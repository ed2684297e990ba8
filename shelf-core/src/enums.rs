//! Enum types

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::{ShelfError, ValidationError};

/// Entity type discriminator for error messages and cache bookkeeping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityType {
    Book,
    Review,
}

impl EntityType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityType::Book => "book",
            EntityType::Review => "review",
        }
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ordering applied to aggregated book results. Both orders are descending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    /// By `reviews_count`, most reviewed first.
    Popular,
    /// By `reviews_avg_rating`, best rated first. Books without an average go last.
    HighestRated,
}

impl SortOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Popular => "popular",
            SortOrder::HighestRated => "highest_rated",
        }
    }

    /// The other aggregate, used as the preset tie-break.
    pub fn counterpart(&self) -> SortOrder {
        match self {
            SortOrder::Popular => SortOrder::HighestRated,
            SortOrder::HighestRated => SortOrder::Popular,
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortOrder {
    type Err = ShelfError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "popular" => Ok(SortOrder::Popular),
            "highest_rated" | "highestRated" => Ok(SortOrder::HighestRated),
            other => Err(ValidationError::InvalidValue {
                field: "order".to_string(),
                reason: format!("unknown sort order '{}'", other),
            }
            .into()),
        }
    }
}
