//! Shelf API Server Entry Point
//!
//! Loads configuration from the environment, builds the in-memory service and
//! starts the Axum HTTP server.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use shelf_api::{create_api_router, init_tracing, ApiConfig, ApiError, ApiResult, ShelfService};
use shelf_core::ShelfConfig;

#[tokio::main]
async fn main() -> ApiResult<()> {
    init_tracing()?;

    let shelf_config = ShelfConfig::from_env();
    shelf_config.validate()?;

    let api_config = ApiConfig::from_env()?;
    api_config.validate()?;

    let service = Arc::new(ShelfService::in_memory(
        &shelf_config,
        api_config.throttle.clone(),
    ));
    let app: Router = create_api_router(service);

    let addr = api_config.bind_addr()?;
    tracing::info!(
        %addr,
        throttle_enabled = api_config.throttle.enabled,
        reviews_per_hour = api_config.throttle.per_hour,
        "Starting Shelf API server"
    );

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| ApiError::internal_error(format!("Failed to bind {}: {}", addr, e)))?;

    // Peer addresses feed the per-client throttle.
    let server = axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    );
    tokio::select! {
        result = server => {
            result.map_err(|e| ApiError::internal_error(format!("Server error: {}", e)))?;
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Shutdown signal received");
        }
    }

    Ok(())
}
