//! Webhook API 模块

mod handler;

use axum::{routing::post, Router};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new()
        .route("/webhooks/payment", post(handler::payment))
        .route("/webhooks/pos", post(handler::pos))
}
