//! Shared application state for Axum routers.

use std::sync::Arc;
use std::time::Instant;

use crate::service::ShelfService;

#[derive(Clone)]
pub struct AppState {
    pub service: Arc<ShelfService>,
    pub start_time: Instant,
}

impl AppState {
    pub fn new(service: Arc<ShelfService>) -> Self {
        Self {
            service,
            start_time: Instant::now(),
        }
    }
}

crate::impl_from_ref!(Arc<ShelfService>, service);
crate::impl_from_ref!(Instant, start_time);
