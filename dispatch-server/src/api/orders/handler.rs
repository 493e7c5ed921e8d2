//! Order API Handlers

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use shared::models::Order;
use uuid::Uuid;

use crate::core::ServerState;
use crate::db::repository::order as order_repo;
use crate::orders::{CreateOrderRequest, UpdateOrderRequest};
use crate::utils::{ok, AppError, AppResponse, AppResult};

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    #[serde(default = "default_page")]
    pub page: i64,
    #[serde(default = "default_per_page")]
    pub per_page: i64,
}

fn default_page() -> i64 {
    1
}

fn default_per_page() -> i64 {
    20
}

#[derive(Debug, Serialize)]
pub struct OrderPage {
    pub items: Vec<Order>,
    pub total: i64,
    pub page: i64,
    pub per_page: i64,
}

/// POST /api/orders - 创建订单 (authoritative pricing happens here)
pub async fn create(
    State(state): State<ServerState>,
    Json(payload): Json<CreateOrderRequest>,
) -> AppResult<Json<AppResponse<Order>>> {
    let order = state.orders.create(payload).await?;
    Ok(ok(order))
}

/// GET /api/orders - 分页列表
pub async fn list(
    State(state): State<ServerState>,
    Query(query): Query<ListQuery>,
) -> AppResult<Json<AppResponse<OrderPage>>> {
    let page = query.page.max(1);
    let per_page = query.per_page.clamp(1, 100);
    let (items, total) = state.orders.list(per_page, (page - 1) * per_page).await?;
    Ok(ok(OrderPage {
        items,
        total,
        page,
        per_page,
    }))
}

/// GET /api/orders/:id
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<AppResponse<Order>>> {
    let order = state.orders.get(id).await?;
    Ok(ok(order))
}

/// PUT /api/orders/:id - admin item replacement
pub async fn update(
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateOrderRequest>,
) -> AppResult<Json<AppResponse<Order>>> {
    let order = state.orders.update(id, payload).await?;
    Ok(ok(order))
}

#[derive(Debug, Serialize)]
pub struct SyrveNotifiedResponse {
    /// `true` exactly once per order; later calls get `false`.
    pub notified: bool,
}

/// POST /api/orders/:id/syrve-notified - idempotency check-and-set used by
/// the POS webhook handler.
pub async fn syrve_notified(
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<AppResponse<SyrveNotifiedResponse>>> {
    let first = order_repo::mark_syrve_notified(state.pool(), id).await?;
    if !first {
        // Flag already set or no such order; only the latter is an error.
        order_repo::find_by_id(state.pool(), id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Order {id} not found")))?;
    }
    Ok(ok(SyrveNotifiedResponse { notified: first }))
}
