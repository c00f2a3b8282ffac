use crate::{AppState, handlers};
use axum::{Router, routing::get};

/// Public Router Module
///
/// Service endpoints reachable by anyone. The gate's exclusion list covers
/// these paths, so they never redirect.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // GET /health
        // Load balancer probe.
        .route("/health", get(handlers::health))
}
