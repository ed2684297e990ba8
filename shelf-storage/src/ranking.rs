//! Named ranking presets.
//!
//! Each preset is a fixed [`RankingQuery`] built from a sort order, a window
//! ending at `now`, and a review threshold, all taken from [`RankingConfig`].

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use shelf_core::{
    RankingConfig, ShelfError, ShelfResult, SortOrder, TimeWindow, Timestamp, ValidationError,
};

use crate::{BookAggregate, RankingQuery, StorageTrait};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RankingPreset {
    PopularLastMonth,
    PopularLast6Months,
    HighestRatedLastMonth,
    HighestRatedLast6Months,
}

impl RankingPreset {
    pub const ALL: [RankingPreset; 4] = [
        RankingPreset::PopularLastMonth,
        RankingPreset::PopularLast6Months,
        RankingPreset::HighestRatedLastMonth,
        RankingPreset::HighestRatedLast6Months,
    ];

    /// Name as accepted by the `filter` query parameter.
    pub fn name(&self) -> &'static str {
        match self {
            RankingPreset::PopularLastMonth => "popularLastMonth",
            RankingPreset::PopularLast6Months => "popularLast6Months",
            RankingPreset::HighestRatedLastMonth => "highestRatedLastMonth",
            RankingPreset::HighestRatedLast6Months => "highestRatedLast6Months",
        }
    }

    fn snake_name(&self) -> &'static str {
        match self {
            RankingPreset::PopularLastMonth => "popular_last_month",
            RankingPreset::PopularLast6Months => "popular_last_6_months",
            RankingPreset::HighestRatedLastMonth => "highest_rated_last_month",
            RankingPreset::HighestRatedLast6Months => "highest_rated_last_6_months",
        }
    }

    pub fn order(&self) -> SortOrder {
        match self {
            RankingPreset::PopularLastMonth | RankingPreset::PopularLast6Months => {
                SortOrder::Popular
            }
            RankingPreset::HighestRatedLastMonth | RankingPreset::HighestRatedLast6Months => {
                SortOrder::HighestRated
            }
        }
    }

    fn is_short(&self) -> bool {
        matches!(
            self,
            RankingPreset::PopularLastMonth | RankingPreset::HighestRatedLastMonth
        )
    }

    pub fn window_months(&self, config: &RankingConfig) -> u32 {
        if self.is_short() {
            config.short_window_months
        } else {
            config.long_window_months
        }
    }

    pub fn min_reviews(&self, config: &RankingConfig) -> u64 {
        if self.is_short() {
            config.short_min_reviews
        } else {
            config.long_min_reviews
        }
    }

    /// The query this preset stands for, with its window ending at `now`.
    ///
    /// Ties on the primary order are broken by the other aggregate.
    pub fn query(&self, now: Timestamp, config: &RankingConfig) -> RankingQuery {
        let order = self.order();
        RankingQuery::new()
            .window(TimeWindow::last_months(now, self.window_months(config)))
            .order_by(order)
            .then_by(order.counterpart())
            .min_reviews(self.min_reviews(config))
    }

    pub fn run(
        &self,
        storage: &dyn StorageTrait,
        now: Timestamp,
        config: &RankingConfig,
    ) -> ShelfResult<Vec<BookAggregate>> {
        self.query(now, config).execute(storage)
    }
}

impl fmt::Display for RankingPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for RankingPreset {
    type Err = ShelfError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        RankingPreset::ALL
            .into_iter()
            .find(|p| p.name() == s || p.snake_name() == s)
            .ok_or_else(|| {
                ValidationError::InvalidValue {
                    field: "filter".to_string(),
                    reason: format!(
                        "unknown filter '{}', expected one of: {}",
                        s,
                        RankingPreset::ALL.map(|p| p.name()).join(", ")
                    ),
                }
                .into()
            })
    }
}
