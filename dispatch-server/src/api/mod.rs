//! HTTP API
//!
//! Synchronous surface of the system: order creation and admin reads, the
//! idempotency check-and-set endpoint, and inbound webhooks from the POS
//! and the acquirer. Everything asynchronous goes through the bus.

pub mod orders;
pub mod webhooks;

use crate::core::ServerState;
use crate::utils::{ok, AppResponse};
use axum::{routing::get, Json, Router};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub fn router(state: ServerState) -> Router {
    Router::new()
        .route("/health", get(health))
        .merge(orders::router())
        .merge(webhooks::router())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn health() -> Json<AppResponse<serde_json::Value>> {
    ok(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
