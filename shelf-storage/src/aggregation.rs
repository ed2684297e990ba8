//! Aggregation engine: per-book review counts and average ratings.
//!
//! A [`RankingQuery`] is an immutable description of a ranking (base-set
//! title filter, review window, minimum review threshold, ordering). It is
//! built by chaining pure composition methods and executed once against a
//! [`StorageTrait`].
//!
//! A query carries exactly one [`TimeWindow`], so the count and the average
//! of a book are always computed over the same filtered review set.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use shelf_core::{Book, Review, ShelfResult, SortOrder, TimeWindow};

use crate::StorageTrait;

/// Count and mean rating over a filtered set of reviews.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ReviewAggregate {
    pub reviews_count: u64,
    /// Absent when no review matched.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reviews_avg_rating: Option<f64>,
}

impl ReviewAggregate {
    /// Aggregate the reviews whose `created_at` falls inside `window`.
    pub fn over<'a, I>(reviews: I, window: &TimeWindow) -> Self
    where
        I: IntoIterator<Item = &'a Review>,
    {
        let (count, sum) = reviews
            .into_iter()
            .filter(|r| window.contains(r.created_at))
            .fold((0u64, 0u64), |(count, sum), r| {
                (count + 1, sum + u64::from(r.rating.get()))
            });

        Self {
            reviews_count: count,
            reviews_avg_rating: (count > 0).then(|| sum as f64 / count as f64),
        }
    }
}

/// A book annotated with its aggregate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookAggregate {
    #[serde(flatten)]
    pub book: Book,
    #[serde(flatten)]
    pub aggregate: ReviewAggregate,
}

impl BookAggregate {
    pub fn reviews_count(&self) -> u64 {
        self.aggregate.reviews_count
    }

    pub fn reviews_avg_rating(&self) -> Option<f64> {
        self.aggregate.reviews_avg_rating
    }
}

/// A book with its all-time aggregate and its reviews, newest first.
///
/// This is the value cached under `book:<id>`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookSummary {
    #[serde(flatten)]
    pub book: BookAggregate,
    pub reviews: Vec<Review>,
}

impl BookSummary {
    pub fn build(book: Book, mut reviews: Vec<Review>) -> Self {
        let aggregate = ReviewAggregate::over(&reviews, &TimeWindow::all());
        reviews.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Self {
            book: BookAggregate { book, aggregate },
            reviews,
        }
    }
}

/// Immutable ranking specification.
///
/// ```ignore
/// let top = RankingQuery::new()
///     .title("dune")
///     .window(TimeWindow::last_months(now, 1))
///     .popular()
///     .min_reviews(2)
///     .execute(&storage)?;
/// ```
///
/// Ordering rules: `order_by` (and its `popular` / `highest_rated` shorthands)
/// replaces the primary order, so the last one applied wins. `then_by` sets a
/// secondary key that only breaks ties of the primary. Remaining ties keep the
/// storage order (book creation order).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RankingQuery {
    title: Option<String>,
    window: TimeWindow,
    min_reviews: Option<u64>,
    order: Option<SortOrder>,
    tie_break: Option<SortOrder>,
}

impl RankingQuery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restrict the base set to books whose title contains `needle` (case-insensitive).
    pub fn title(mut self, needle: impl Into<String>) -> Self {
        self.title = Some(needle.into());
        self
    }

    /// Window applied to both the count and the average.
    pub fn window(mut self, window: TimeWindow) -> Self {
        self.window = window;
        self
    }

    /// Keep books with at least `n` reviews in the window. Applied after aggregation.
    pub fn min_reviews(mut self, n: u64) -> Self {
        self.min_reviews = Some(n);
        self
    }

    pub fn order_by(mut self, order: SortOrder) -> Self {
        self.order = Some(order);
        self
    }

    pub fn then_by(mut self, order: SortOrder) -> Self {
        self.tie_break = Some(order);
        self
    }

    /// Order by `reviews_count` descending.
    pub fn popular(self) -> Self {
        self.order_by(SortOrder::Popular)
    }

    /// Order by `reviews_avg_rating` descending.
    pub fn highest_rated(self) -> Self {
        self.order_by(SortOrder::HighestRated)
    }

    pub fn time_window(&self) -> &TimeWindow {
        &self.window
    }

    pub fn title_filter(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub fn threshold(&self) -> Option<u64> {
        self.min_reviews
    }

    pub fn order(&self) -> Option<SortOrder> {
        self.order
    }

    pub fn tie_break(&self) -> Option<SortOrder> {
        self.tie_break
    }

    /// Load the base set and its reviews from storage, then rank.
    pub fn execute(&self, storage: &dyn StorageTrait) -> ShelfResult<Vec<BookAggregate>> {
        let books = match &self.title {
            Some(needle) => storage.book_search_title(needle)?,
            None => storage.book_list()?,
        };

        let mut rows = Vec::with_capacity(books.len());
        for book in books {
            let reviews = storage.review_list_by_book(book.book_id)?;
            rows.push((book, reviews));
        }

        let ranked = self.rank(rows);
        tracing::debug!(
            order = ?self.order,
            min_reviews = ?self.min_reviews,
            results = ranked.len(),
            "Ranking query executed"
        );
        Ok(ranked)
    }

    /// Rank already-loaded rows. Pure: no storage access.
    pub fn rank(&self, rows: Vec<(Book, Vec<Review>)>) -> Vec<BookAggregate> {
        let mut ranked: Vec<BookAggregate> = rows
            .into_iter()
            .filter(|(book, _)| {
                self.title
                    .as_deref()
                    .map_or(true, |needle| book.title_matches(needle))
            })
            .map(|(book, reviews)| BookAggregate {
                aggregate: ReviewAggregate::over(&reviews, &self.window),
                book,
            })
            .filter(|row| {
                self.min_reviews
                    .map_or(true, |n| row.aggregate.reviews_count >= n)
            })
            .collect();

        if let Some(order) = self.order {
            // sort_by is stable, so full ties keep storage order
            ranked.sort_by(|a, b| {
                compare(order, a, b).then_with(|| {
                    self.tie_break
                        .map_or(Ordering::Equal, |tie| compare(tie, a, b))
                })
            });
        }

        ranked
    }
}

/// Descending comparison on one aggregate. Missing averages sort last.
fn compare(order: SortOrder, a: &BookAggregate, b: &BookAggregate) -> Ordering {
    match order {
        SortOrder::Popular => b.aggregate.reviews_count.cmp(&a.aggregate.reviews_count),
        SortOrder::HighestRated => {
            match (a.aggregate.reviews_avg_rating, b.aggregate.reviews_avg_rating) {
                (Some(x), Some(y)) => y.partial_cmp(&x).unwrap_or(Ordering::Equal),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            }
        }
    }
}
