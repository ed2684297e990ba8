//! REST API Routes Module
//!
//! - `/books` listing, ranking, CRUD and the cached book summary
//! - `/books/:id/reviews` review submission
//! - `/health` liveness with cache statistics

pub mod book;
pub mod health;
pub mod review;

use std::sync::Arc;

use axum::Router;
use shelf_core::BookId;
use tower_http::trace::TraceLayer;

use crate::error::ApiResult;
use crate::service::ShelfService;
use crate::state::AppState;

/// Build the full router over a shared service.
pub fn create_api_router(service: Arc<ShelfService>) -> Router {
    Router::new()
        .merge(book::create_router())
        .merge(review::create_router())
        .merge(health::create_router())
        .layer(TraceLayer::new_for_http())
        .with_state(AppState::new(service))
}

pub(crate) fn parse_book_id(raw: &str) -> ApiResult<BookId> {
    Ok(raw.trim().parse::<BookId>()?)
}
