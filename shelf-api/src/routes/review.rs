//! Review submission.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{ConnectInfo, Path, State},
    http::{header, HeaderMap, StatusCode},
    response::IntoResponse,
    routing::post,
    Router,
};
use shelf_core::ReviewInput;

use super::parse_book_id;
use crate::error::ApiResult;
use crate::service::ShelfService;
use crate::state::AppState;

/// Read a submission body. Anything that is not a JSON object is treated as an
/// empty submission so that the throttle still counts it and validation
/// reports the missing fields.
fn review_input(body: &[u8]) -> ReviewInput {
    if body.iter().all(u8::is_ascii_whitespace) {
        return ReviewInput::default();
    }
    match serde_json::from_slice(body) {
        Ok(input) => input,
        Err(e) => {
            tracing::debug!(error = %e, "Unreadable review body");
            ReviewInput::default()
        }
    }
}

/// POST /books/:id/reviews - Submit a review, then redirect to the book
pub async fn create_review(
    State(service): State<Arc<ShelfService>>,
    Path(id): Path<String>,
    peer: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<impl IntoResponse> {
    let book_id = parse_book_id(&id)?;
    let client = service
        .throttle()
        .client_ip(&headers, peer.map(|ConnectInfo(addr)| addr));
    let input = review_input(&body);

    let review = service.submit_review(client, book_id, &input).await?;

    Ok((
        StatusCode::SEE_OTHER,
        [(header::LOCATION, format!("/books/{}", review.book_id))],
    ))
}

pub fn create_router() -> Router<AppState> {
    Router::new().route("/books/:id/reviews", post(create_review))
}
