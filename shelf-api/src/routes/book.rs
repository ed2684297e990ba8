//! Book routes: ranking, CRUD and the cached summary.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{HeaderName, HeaderValue, StatusCode},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use shelf_storage::BookUpdate;

use super::parse_book_id;
use crate::error::{ApiError, ApiResult};
use crate::service::ShelfService;
use crate::state::AppState;
use crate::types::{CreateBookRequest, RankingParams, UpdateBookRequest};

/// Reports whether `GET /books/:id` was served from the cache.
pub const X_CACHE: HeaderName = HeaderName::from_static("x-cache");

// ============================================================================
// HANDLERS
// ============================================================================

/// GET /books - Rank books by preset or raw parameters, optionally by title
pub async fn list_books(
    State(service): State<Arc<ShelfService>>,
    Query(params): Query<RankingParams>,
) -> ApiResult<impl IntoResponse> {
    let ranked = service.rank(&params).await?;
    Ok(Json(ranked))
}

/// POST /books - Create a book
pub async fn create_book(
    State(service): State<Arc<ShelfService>>,
    Json(req): Json<CreateBookRequest>,
) -> ApiResult<impl IntoResponse> {
    let book = service.create_book(&req.title).await?;
    Ok((StatusCode::CREATED, Json(book)))
}

/// GET /books/:id - Book with its aggregate and reviews
pub async fn get_book(
    State(service): State<Arc<ShelfService>>,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let read = service.book_summary(parse_book_id(&id)?).await?;
    let cache_status = if read.was_cache_hit() { "hit" } else { "miss" };

    Ok((
        [(X_CACHE, HeaderValue::from_static(cache_status))],
        Json(read.into_value()),
    ))
}

/// PATCH /books/:id - Update a book's title
pub async fn update_book(
    State(service): State<Arc<ShelfService>>,
    Path(id): Path<String>,
    Json(req): Json<UpdateBookRequest>,
) -> ApiResult<impl IntoResponse> {
    let book_id = parse_book_id(&id)?;
    let update = BookUpdate { title: req.title };
    if !update.has_any_updates() {
        return Err(ApiError::invalid_input(
            "At least one field must be provided for update",
        ));
    }

    let book = service.update_book(book_id, update).await?;
    Ok(Json(book))
}

/// DELETE /books/:id - Delete a book and its reviews
pub async fn delete_book(
    State(service): State<Arc<ShelfService>>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    service.delete_book(parse_book_id(&id)?).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ============================================================================
// ROUTER SETUP
// ============================================================================

pub fn create_router() -> Router<AppState> {
    Router::new()
        .route("/books", get(list_books).post(create_book))
        .route(
            "/books/:id",
            get(get_book).patch(update_book).delete(delete_book),
        )
}
