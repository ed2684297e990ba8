//! End-to-end tests of the HTTP surface, driven through `tower::ServiceExt::oneshot`.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    body::Body,
    extract::ConnectInfo,
    http::{header, Request, StatusCode},
    response::Response,
    Router,
};
use chrono::Utc;
use serde_json::{json, Value};
use shelf_api::{create_api_router, ShelfService, ThrottleConfig};
use shelf_core::ShelfConfig;
use shelf_storage::StorageTrait;
use shelf_test_utils::fixtures;
use tower::ServiceExt;

fn service(throttle: ThrottleConfig) -> Arc<ShelfService> {
    Arc::new(ShelfService::in_memory(&ShelfConfig::default(), throttle))
}

fn app(service: &Arc<ShelfService>) -> Router {
    create_api_router(Arc::clone(service))
}

async fn send(service: &Arc<ShelfService>, request: Request<Body>) -> Response {
    app(service).oneshot(request).await.unwrap()
}

fn json_request(method: &str, uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .header("x-forwarded-for", "203.0.113.7")
        .body(Body::from(body.to_string()))
        .unwrap()
}

/// Attach the TCP peer address the server would have recorded.
fn from_peer(mut request: Request<Body>, peer: &str) -> Request<Body> {
    let addr: SocketAddr = peer.parse().unwrap();
    request.extensions_mut().insert(ConnectInfo(addr));
    request
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn body_json(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

fn error_fields(body: &Value) -> Vec<String> {
    body["details"]["fields"]
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v["field"].as_str().unwrap().to_string())
        .collect()
}

// ============================================================================
// REVIEW SUBMISSION
// ============================================================================

#[tokio::test]
async fn test_submit_review_redirects_to_book() {
    let service = service(ThrottleConfig::default());
    let book = fixtures::seed_book(service.storage(), "Dune").unwrap();

    let response = send(
        &service,
        json_request(
            "POST",
            &format!("/books/{}/reviews", book.book_id),
            &json!({ "review": fixtures::VALID_TEXT, "rating": 5 }),
        ),
    )
    .await;

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(
        response.headers()[header::LOCATION],
        format!("/books/{}", book.book_id).as_str()
    );
    assert_eq!(service.storage().review_list_by_book(book.book_id).unwrap().len(), 1);
}

#[tokio::test]
async fn test_invalid_review_lists_every_field() {
    let service = service(ThrottleConfig::disabled());
    let book = fixtures::seed_book(service.storage(), "Dune").unwrap();

    let response = send(
        &service,
        json_request(
            "POST",
            &format!("/books/{}/reviews", book.book_id),
            &json!({ "review": "meh", "rating": 0 }),
        ),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["code"], "VALIDATION_FAILED");
    assert_eq!(error_fields(&body), vec!["text", "rating"]);
    assert!(service.storage().review_list_by_book(book.book_id).unwrap().is_empty());
}

#[tokio::test]
async fn test_review_for_unknown_book_is_not_found() {
    let service = service(ThrottleConfig::disabled());
    let response = send(
        &service,
        json_request(
            "POST",
            &format!("/books/{}/reviews", uuid::Uuid::now_v7()),
            &json!({ "review": fixtures::VALID_TEXT, "rating": 3 }),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await["code"], "ENTITY_NOT_FOUND");

    let response = send(
        &service,
        json_request("POST", "/books/not-a-uuid/reviews", &json!({})),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_fourth_submission_is_throttled() {
    let service = service(ThrottleConfig::default());
    let book = fixtures::seed_book(service.storage(), "Dune").unwrap();
    let uri = format!("/books/{}/reviews", book.book_id);
    let body = json!({ "review": fixtures::VALID_TEXT, "rating": 4 });

    for _ in 0..3 {
        let response = send(&service, json_request("POST", &uri, &body)).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
    }

    let response = send(&service, json_request("POST", &uri, &body)).await;
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    let retry_after: u64 = response.headers()[header::RETRY_AFTER]
        .to_str()
        .unwrap()
        .parse()
        .unwrap();
    assert!(retry_after >= 1);
    assert_eq!(body_json(response).await["details"]["policy"], "reviews");

    assert_eq!(service.storage().review_list_by_book(book.book_id).unwrap().len(), 3);
}

#[tokio::test]
async fn test_rotating_forwarded_for_does_not_evade_throttle() {
    let service = service(ThrottleConfig::default());
    let book = fixtures::seed_book(service.storage(), "Dune").unwrap();
    let uri = format!("/books/{}/reviews", book.book_id);
    let body = json!({ "review": fixtures::VALID_TEXT, "rating": 4 });

    let mut statuses = Vec::new();
    for i in 0..10 {
        let mut request = from_peer(json_request("POST", &uri, &body), "192.0.2.10:41000");
        request.headers_mut().insert(
            "x-forwarded-for",
            format!("198.51.100.{}", i).parse().unwrap(),
        );
        statuses.push(send(&service, request).await.status());
    }

    assert_eq!(&statuses[..3], &[StatusCode::SEE_OTHER; 3]);
    assert!(statuses[3..].iter().all(|s| *s == StatusCode::TOO_MANY_REQUESTS));
    assert_eq!(service.storage().review_list_by_book(book.book_id).unwrap().len(), 3);
}

#[tokio::test]
async fn test_trusted_proxy_forwards_client_address() {
    let service = service(ThrottleConfig {
        trusted_proxies: vec!["192.0.2.1".parse().unwrap()],
        ..ThrottleConfig::default()
    });
    let book = fixtures::seed_book(service.storage(), "Dune").unwrap();
    let uri = format!("/books/{}/reviews", book.book_id);
    let body = json!({ "review": fixtures::VALID_TEXT, "rating": 4 });

    // four distinct clients behind one proxy
    for i in 0..4 {
        let mut request = from_peer(json_request("POST", &uri, &body), "192.0.2.1:443");
        request.headers_mut().insert(
            "x-forwarded-for",
            format!("198.51.100.{}", i).parse().unwrap(),
        );
        assert_eq!(send(&service, request).await.status(), StatusCode::SEE_OTHER);
    }
    assert_eq!(service.storage().review_list_by_book(book.book_id).unwrap().len(), 4);
}

// ============================================================================
// RANKINGS
// ============================================================================

#[tokio::test]
async fn test_preset_ranking_is_ordered() {
    let service = service(ThrottleConfig::disabled());
    let now = Utc::now();
    let dune = fixtures::dune(service.storage(), now).unwrap();
    let emma =
        fixtures::seed_book_with_reviews(service.storage(), "Emma", now, &[(2, 1), (2, 2), (3, 3)])
            .unwrap();
    fixtures::seed_book_with_reviews(service.storage(), "Ulysses", now, &[(5, 1)]).unwrap();

    let response = send(&service, get("/books?filter=popularLastMonth")).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    let ranked = body.as_array().unwrap();
    assert_eq!(ranked.len(), 2);
    assert_eq!(ranked[0]["book_id"], emma.book_id.to_string());
    assert_eq!(ranked[0]["reviews_count"], 3);
    assert_eq!(ranked[1]["book_id"], dune.book_id.to_string());
    assert_eq!(ranked[1]["reviews_avg_rating"], 4.5);

    let response = send(&service, get("/books?filter=highestRatedLastMonth&title=DUNE")).await;
    let body = body_json(response).await;
    assert_eq!(body.as_array().unwrap().len(), 1);
    assert_eq!(body[0]["title"], "Dune");
}

#[tokio::test]
async fn test_raw_ranking_params() {
    let service = service(ThrottleConfig::disabled());
    fixtures::dune(service.storage(), Utc::now()).unwrap();

    let response = send(&service, get("/books?minReviews=3&order=highest_rated")).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body[0]["reviews_count"], 3);
    assert_eq!(body[0]["reviews_avg_rating"], 4.0);
}

#[tokio::test]
async fn test_bad_ranking_params_name_the_field() {
    let service = service(ThrottleConfig::disabled());
    let cases = [
        ("/books?filter=bestEver", "filter"),
        ("/books?filter=popularLastMonth&order=popular", "filter"),
        ("/books?from=yesterday", "from"),
        ("/books?min_reviews=many", "min_reviews"),
        ("/books?order=newest", "order"),
    ];

    for (uri, field) in cases {
        let response = send(&service, get(uri)).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{}", uri);
        assert_eq!(error_fields(&body_json(response).await), vec![field], "{}", uri);
    }
}

// ============================================================================
// BOOKS
// ============================================================================

#[tokio::test]
async fn test_create_and_fetch_book() {
    let service = service(ThrottleConfig::disabled());

    let response = send(
        &service,
        json_request("POST", "/books", &json!({ "title": " Emma " })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let created = body_json(response).await;
    assert_eq!(created["title"], "Emma");

    let response = send(&service, json_request("POST", "/books", &json!({ "title": "" }))).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(error_fields(&body_json(response).await), vec!["title"]);

    let uri = format!("/books/{}", created["book_id"].as_str().unwrap());
    let response = send(&service, get(&uri)).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["x-cache"], "miss");
    let summary = body_json(response).await;
    assert_eq!(summary["reviews_count"], 0);
    assert!(summary.get("reviews_avg_rating").is_none());
    assert_eq!(summary["reviews"], json!([]));

    let response = send(&service, get(&uri)).await;
    assert_eq!(response.headers()["x-cache"], "hit");
}

#[tokio::test]
async fn test_patch_purges_cached_summary() {
    let service = service(ThrottleConfig::disabled());
    let book = fixtures::seed_book(service.storage(), "Dune").unwrap();
    let uri = format!("/books/{}", book.book_id);

    send(&service, get(&uri)).await;
    assert_eq!(send(&service, get(&uri)).await.headers()["x-cache"], "hit");

    let response = send(
        &service,
        json_request("PATCH", &uri, &json!({ "title": "Dune Messiah" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = send(&service, get(&uri)).await;
    assert_eq!(response.headers()["x-cache"], "miss");
    assert_eq!(body_json(response).await["title"], "Dune Messiah");

    let response = send(&service, json_request("PATCH", &uri, &json!({}))).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_delete_book() {
    let service = service(ThrottleConfig::disabled());
    let book = fixtures::dune(service.storage(), Utc::now()).unwrap();
    let uri = format!("/books/{}", book.book_id);
    send(&service, get(&uri)).await;

    let delete = Request::builder()
        .method("DELETE")
        .uri(&uri)
        .body(Body::empty())
        .unwrap();
    assert_eq!(send(&service, delete).await.status(), StatusCode::NO_CONTENT);

    assert_eq!(send(&service, get(&uri)).await.status(), StatusCode::NOT_FOUND);
    assert!(service.storage().review_list_by_book(book.book_id).unwrap().is_empty());
}

#[tokio::test]
async fn test_health() {
    let service = service(ThrottleConfig::default());
    let response = send(&service, get("/health")).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["cache"]["hits"], 0);
}
