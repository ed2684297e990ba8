//! Health Check Endpoint

use std::sync::Arc;
use std::time::Instant;

use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::get, Json, Router};

use crate::error::ApiResult;
use crate::service::ShelfService;
use crate::state::AppState;
use crate::types::HealthResponse;

/// GET /health - Liveness plus cache statistics
pub async fn health(
    State(service): State<Arc<ShelfService>>,
    State(start_time): State<Instant>,
) -> ApiResult<impl IntoResponse> {
    let response = HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        uptime_seconds: start_time.elapsed().as_secs(),
        cache: service.cache_stats().await?,
    };
    Ok((StatusCode::OK, Json(response)))
}

pub fn create_router() -> Router<AppState> {
    Router::new().route("/health", get(health))
}
