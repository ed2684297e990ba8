//! Request and response bodies.

use serde::{Deserialize, Serialize};
use shelf_storage::CacheStats;

/// Body of `POST /books`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateBookRequest {
    #[serde(default)]
    pub title: String,
}

/// Body of `PATCH /books/{id}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateBookRequest {
    pub title: Option<String>,
}

/// Query string of `GET /books`.
///
/// Either `filter` names a preset, or the raw `from`/`to`/`min_reviews`/`order`
/// parameters describe the ranking. `title` composes with both.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RankingParams {
    pub filter: Option<String>,
    pub from: Option<String>,
    pub to: Option<String>,
    #[serde(alias = "minReviews")]
    pub min_reviews: Option<String>,
    pub order: Option<String>,
    pub title: Option<String>,
}

impl RankingParams {
    pub fn preset(name: impl Into<String>) -> Self {
        Self {
            filter: Some(name.into()),
            ..Default::default()
        }
    }

    /// Whether any raw ranking parameter was supplied.
    pub fn has_raw_ranking(&self) -> bool {
        [&self.from, &self.to, &self.min_reviews, &self.order]
            .iter()
            .any(|p| p.as_deref().is_some_and(|v| !v.trim().is_empty()))
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub uptime_seconds: u64,
    pub cache: CacheStats,
}
