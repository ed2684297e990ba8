//! Shelf API
//!
//! HTTP surface over the review store and ranking queries: review submission
//! behind the `reviews` throttle, preset and raw rankings, and the cached book
//! summary.

pub mod config;
pub mod error;
pub mod macros;
pub mod routes;
pub mod service;
pub mod state;
pub mod telemetry;
pub mod throttle;
pub mod types;

pub use config::{ApiConfig, ThrottleConfig};
pub use error::{ApiError, ApiResult, ErrorCode};
pub use routes::create_api_router;
pub use service::{BookCache, ShelfService};
pub use state::AppState;
pub use telemetry::init_tracing;
pub use throttle::{client_ip, ThrottlePolicy, REVIEWS_POLICY};
pub use types::{CreateBookRequest, HealthResponse, RankingParams, UpdateBookRequest};
