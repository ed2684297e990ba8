//! Process-wide book cache.
//!
//! Book summaries are cached under `book:<id>` and served through a
//! read-through layer that reports whether each read was a hit. Any mutation
//! of a book must purge its entry before the mutating call returns; the
//! [`BookMutationHook`] is how the service layer does that.
//!
//! Staleness is explicit: callers pick a [`Freshness`], and every read comes
//! back wrapped in a [`CacheRead<T>`].
//!
//! # Example
//!
//! ```ignore
//! let fetcher = SummaryFetcher::new(&storage);
//! let read = cache
//!     .get::<BookSummary, _>(&CacheKey::book(id), Freshness::Cached, &fetcher)
//!     .await?;
//! ```

pub mod freshness;
pub mod invalidation;
pub mod key;
pub mod memory;
pub mod read_through;
pub mod traits;

pub use freshness::{CacheRead, Freshness};
pub use invalidation::{BookMutationHook, CacheInvalidator};
pub use key::CacheKey;
pub use memory::InMemoryCacheBackend;
pub use read_through::{CacheConfig, ReadThroughCache, StorageFetcher, SummaryFetcher};
pub use traits::{CacheBackend, CacheStats, Cacheable};
