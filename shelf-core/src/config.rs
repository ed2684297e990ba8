//! Configuration types

use crate::*;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Window lengths and thresholds behind the four ranking presets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankingConfig {
    /// Window of the "last month" presets, in calendar months.
    pub short_window_months: u32,
    /// Window of the "last 6 months" presets, in calendar months.
    pub long_window_months: u32,
    /// Minimum qualifying reviews for the short-window presets.
    pub short_min_reviews: u64,
    /// Minimum qualifying reviews for the long-window presets.
    pub long_min_reviews: u64,
}

impl Default for RankingConfig {
    fn default() -> Self {
        Self {
            short_window_months: 1,
            long_window_months: 6,
            short_min_reviews: 2,
            long_min_reviews: 5,
        }
    }
}

/// Book cache settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheSettings {
    /// Entries older than this are refetched even without an invalidation.
    pub entry_ttl: Duration,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            entry_ttl: Duration::from_secs(3600),
        }
    }
}

/// Master configuration struct.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShelfConfig {
    pub ranking: RankingConfig,
    pub cache: CacheSettings,
}

impl ShelfConfig {
    /// Create from environment variables with fallback to defaults.
    ///
    /// Environment variables:
    /// - `SHELF_RANKING_SHORT_WINDOW_MONTHS` (default: 1)
    /// - `SHELF_RANKING_LONG_WINDOW_MONTHS` (default: 6)
    /// - `SHELF_RANKING_SHORT_MIN_REVIEWS` (default: 2)
    /// - `SHELF_RANKING_LONG_MIN_REVIEWS` (default: 5)
    /// - `SHELF_CACHE_TTL_SECS` (default: 3600)
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            ranking: RankingConfig {
                short_window_months: env_or(
                    "SHELF_RANKING_SHORT_WINDOW_MONTHS",
                    defaults.ranking.short_window_months,
                ),
                long_window_months: env_or(
                    "SHELF_RANKING_LONG_WINDOW_MONTHS",
                    defaults.ranking.long_window_months,
                ),
                short_min_reviews: env_or(
                    "SHELF_RANKING_SHORT_MIN_REVIEWS",
                    defaults.ranking.short_min_reviews,
                ),
                long_min_reviews: env_or(
                    "SHELF_RANKING_LONG_MIN_REVIEWS",
                    defaults.ranking.long_min_reviews,
                ),
            },
            cache: CacheSettings {
                entry_ttl: std::env::var("SHELF_CACHE_TTL_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .map(Duration::from_secs)
                    .unwrap_or(defaults.cache.entry_ttl),
            },
        }
    }

    /// Validate the configuration.
    ///
    /// Validates:
    /// - both preset windows span at least one month
    /// - the cache TTL is positive
    pub fn validate(&self) -> ShelfResult<()> {
        if self.ranking.short_window_months == 0 {
            return Err(ShelfError::Config(ConfigError::InvalidValue {
                field: "ranking.short_window_months".to_string(),
                value: self.ranking.short_window_months.to_string(),
                reason: "window must span at least one month".to_string(),
            }));
        }

        if self.ranking.long_window_months == 0 {
            return Err(ShelfError::Config(ConfigError::InvalidValue {
                field: "ranking.long_window_months".to_string(),
                value: self.ranking.long_window_months.to_string(),
                reason: "window must span at least one month".to_string(),
            }));
        }

        if self.cache.entry_ttl.is_zero() {
            return Err(ShelfError::Config(ConfigError::InvalidValue {
                field: "cache.entry_ttl".to_string(),
                value: format!("{:?}", self.cache.entry_ttl),
                reason: "entry_ttl must be positive".to_string(),
            }));
        }

        Ok(())
    }
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}
