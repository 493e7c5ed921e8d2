//! Order Repository
//!
//! The order store is the single source of truth for order status. Lifecycle
//! paths never hard-delete; the admin update path replaces the item set
//! transactionally (delete-then-reinsert) and rewrites the recomputed totals.

use super::{RepoError, RepoResult};
use chrono::{DateTime, Utc};
use shared::models::{DeliveryType, Order, OrderItem, OrderStatus, PaymentMethod};
use sqlx::{FromRow, SqlitePool};
use uuid::Uuid;

#[derive(Debug, FromRow)]
struct OrderRow {
    id: String,
    status: String,
    total_price: f64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    name: String,
    phone: String,
    email: String,
    address: String,
    entrance: String,
    zone: Option<String>,
    coords: String,
    time: DateTime<Utc>,
    wishes: String,
    cutlery: i64,
    delivery_type: String,
    delivery_cost: f64,
    delivery_door: bool,
    delivery_door_price: f64,
    payment_method: String,
    invoice_id: Option<String>,
    payment_url: Option<String>,
    pos_submitted: bool,
    syrve_notified: bool,
}

#[derive(Debug, FromRow)]
struct OrderItemRow {
    id: String,
    order_id: String,
    product_id: String,
    external_product_id: String,
    name: String,
    price: f64,
    quantity: i64,
    total_price: f64,
    weight: f64,
    total_weight: f64,
    variation_id: Option<String>,
    variation_external_id: Option<String>,
    variation_name: Option<String>,
    variation_group_id: Option<String>,
    variation_group_name: Option<String>,
}

use super::parse_uuid;

fn parse_opt_uuid(s: &Option<String>, what: &str) -> RepoResult<Option<Uuid>> {
    match s {
        Some(s) => Ok(Some(parse_uuid(s, what)?)),
        None => Ok(None),
    }
}

impl OrderRow {
    fn into_order(self, items: Vec<OrderItem>) -> RepoResult<Order> {
        Ok(Order {
            id: parse_uuid(&self.id, "order")?,
            status: OrderStatus::parse(&self.status)
                .ok_or_else(|| RepoError::Database(format!("Unknown status: {}", self.status)))?,
            total_price: self.total_price,
            created_at: self.created_at,
            updated_at: self.updated_at,
            name: self.name,
            phone: self.phone,
            email: self.email,
            address: self.address,
            entrance: self.entrance,
            zone: self.zone,
            coords: self.coords,
            time: self.time,
            wishes: self.wishes,
            cutlery: self.cutlery,
            delivery_type: DeliveryType::parse(&self.delivery_type).ok_or_else(|| {
                RepoError::Database(format!("Unknown delivery type: {}", self.delivery_type))
            })?,
            delivery_cost: self.delivery_cost,
            delivery_door: self.delivery_door,
            delivery_door_price: self.delivery_door_price,
            payment_method: PaymentMethod::normalize(&self.payment_method).ok_or_else(|| {
                RepoError::Database(format!("Unknown payment method: {}", self.payment_method))
            })?,
            invoice_id: self.invoice_id,
            payment_url: self.payment_url,
            pos_submitted: self.pos_submitted,
            syrve_notified: self.syrve_notified,
            items,
        })
    }
}

impl OrderItemRow {
    fn into_item(self) -> RepoResult<OrderItem> {
        Ok(OrderItem {
            id: parse_uuid(&self.id, "order item")?,
            order_id: parse_uuid(&self.order_id, "order")?,
            product_id: parse_uuid(&self.product_id, "product")?,
            external_product_id: self.external_product_id,
            name: self.name,
            price: self.price,
            quantity: self.quantity,
            total_price: self.total_price,
            weight: self.weight,
            total_weight: self.total_weight,
            variation_id: parse_opt_uuid(&self.variation_id, "variation")?,
            variation_external_id: self.variation_external_id,
            variation_name: self.variation_name,
            variation_group_id: parse_opt_uuid(&self.variation_group_id, "variation group")?,
            variation_group_name: self.variation_group_name,
        })
    }
}

const ORDER_COLUMNS: &str = "id, status, total_price, created_at, updated_at, name, phone, email, \
     address, entrance, zone, coords, time, wishes, cutlery, delivery_type, delivery_cost, \
     delivery_door, delivery_door_price, payment_method, invoice_id, payment_url, \
     pos_submitted, syrve_notified";

const ITEM_COLUMNS: &str = "id, order_id, product_id, external_product_id, name, price, quantity, \
     total_price, weight, total_weight, variation_id, variation_external_id, variation_name, \
     variation_group_id, variation_group_name";

async fn insert_items(
    tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
    items: &[OrderItem],
) -> RepoResult<()> {
    for item in items {
        sqlx::query(&format!(
            "INSERT INTO order_item ({ITEM_COLUMNS}) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"
        ))
        .bind(item.id.to_string())
        .bind(item.order_id.to_string())
        .bind(item.product_id.to_string())
        .bind(&item.external_product_id)
        .bind(&item.name)
        .bind(item.price)
        .bind(item.quantity)
        .bind(item.total_price)
        .bind(item.weight)
        .bind(item.total_weight)
        .bind(item.variation_id.map(|u| u.to_string()))
        .bind(&item.variation_external_id)
        .bind(&item.variation_name)
        .bind(item.variation_group_id.map(|u| u.to_string()))
        .bind(&item.variation_group_name)
        .execute(&mut **tx)
        .await?;
    }
    Ok(())
}

/// Persist a new order together with its items, atomically.
pub async fn create_order(pool: &SqlitePool, order: &Order) -> RepoResult<()> {
    let mut tx = pool.begin().await?;

    sqlx::query(&format!(
        "INSERT INTO orders ({ORDER_COLUMNS}) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"
    ))
    .bind(order.id.to_string())
    .bind(order.status.as_str())
    .bind(order.total_price)
    .bind(order.created_at)
    .bind(order.updated_at)
    .bind(&order.name)
    .bind(&order.phone)
    .bind(&order.email)
    .bind(&order.address)
    .bind(&order.entrance)
    .bind(&order.zone)
    .bind(&order.coords)
    .bind(order.time)
    .bind(&order.wishes)
    .bind(order.cutlery)
    .bind(order.delivery_type.as_str())
    .bind(order.delivery_cost)
    .bind(order.delivery_door)
    .bind(order.delivery_door_price)
    .bind(order.payment_method.as_str())
    .bind(&order.invoice_id)
    .bind(&order.payment_url)
    .bind(order.pos_submitted)
    .bind(order.syrve_notified)
    .execute(&mut *tx)
    .await?;

    insert_items(&mut tx, &order.items).await?;
    tx.commit().await?;
    Ok(())
}

async fn items_for(pool: &SqlitePool, order_id: &str) -> RepoResult<Vec<OrderItem>> {
    let rows = sqlx::query_as::<_, OrderItemRow>(&format!(
        "SELECT {ITEM_COLUMNS} FROM order_item WHERE order_id = ? ORDER BY rowid"
    ))
    .bind(order_id)
    .fetch_all(pool)
    .await?;
    rows.into_iter().map(OrderItemRow::into_item).collect()
}

pub async fn find_by_id(pool: &SqlitePool, id: Uuid) -> RepoResult<Option<Order>> {
    let row = sqlx::query_as::<_, OrderRow>(&format!(
        "SELECT {ORDER_COLUMNS} FROM orders WHERE id = ?"
    ))
    .bind(id.to_string())
    .fetch_optional(pool)
    .await?;

    match row {
        Some(row) => {
            let items = items_for(pool, &row.id).await?;
            Ok(Some(row.into_order(items)?))
        }
        None => Ok(None),
    }
}

pub async fn find_by_invoice(pool: &SqlitePool, invoice_id: &str) -> RepoResult<Option<Order>> {
    let row = sqlx::query_as::<_, OrderRow>(&format!(
        "SELECT {ORDER_COLUMNS} FROM orders WHERE invoice_id = ? LIMIT 1"
    ))
    .bind(invoice_id)
    .fetch_optional(pool)
    .await?;

    match row {
        Some(row) => {
            let items = items_for(pool, &row.id).await?;
            Ok(Some(row.into_order(items)?))
        }
        None => Ok(None),
    }
}

/// Paginated listing, newest first, items attached.
pub async fn list(pool: &SqlitePool, limit: i64, offset: i64) -> RepoResult<(Vec<Order>, i64)> {
    let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM orders")
        .fetch_one(pool)
        .await?;

    let rows = sqlx::query_as::<_, OrderRow>(&format!(
        "SELECT {ORDER_COLUMNS} FROM orders ORDER BY created_at DESC LIMIT ? OFFSET ?"
    ))
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await?;

    let mut orders = Vec::with_capacity(rows.len());
    for row in rows {
        let items = items_for(pool, &row.id).await?;
        orders.push(row.into_order(items)?);
    }
    Ok((orders, total))
}

pub async fn update_status(pool: &SqlitePool, id: Uuid, status: OrderStatus) -> RepoResult<()> {
    let result = sqlx::query("UPDATE orders SET status = ?, updated_at = ? WHERE id = ?")
        .bind(status.as_str())
        .bind(Utc::now())
        .bind(id.to_string())
        .execute(pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(RepoError::NotFound(format!("Order {id} not found")));
    }
    Ok(())
}

/// Admin update: replace the full item set and header fields atomically.
/// Totals on `order` must already be recomputed by the caller.
pub async fn replace_items(pool: &SqlitePool, order: &Order) -> RepoResult<()> {
    let mut tx = pool.begin().await?;

    let result = sqlx::query(
        "UPDATE orders SET total_price = ?, updated_at = ?, name = ?, phone = ?, address = ?, \
         wishes = ?, cutlery = ?, delivery_cost = ?, delivery_door = ?, delivery_door_price = ? \
         WHERE id = ?",
    )
    .bind(order.total_price)
    .bind(order.updated_at)
    .bind(&order.name)
    .bind(&order.phone)
    .bind(&order.address)
    .bind(&order.wishes)
    .bind(order.cutlery)
    .bind(order.delivery_cost)
    .bind(order.delivery_door)
    .bind(order.delivery_door_price)
    .bind(order.id.to_string())
    .execute(&mut *tx)
    .await?;
    if result.rows_affected() == 0 {
        return Err(RepoError::NotFound(format!("Order {} not found", order.id)));
    }

    sqlx::query("DELETE FROM order_item WHERE order_id = ?")
        .bind(order.id.to_string())
        .execute(&mut *tx)
        .await?;
    insert_items(&mut tx, &order.items).await?;

    tx.commit().await?;
    Ok(())
}

/// Check-and-set for POS submission. Returns `true` when this call flipped
/// the flag — i.e. the caller owns the one allowed submission.
pub async fn mark_pos_submitted(pool: &SqlitePool, id: Uuid) -> RepoResult<bool> {
    let result = sqlx::query(
        "UPDATE orders SET pos_submitted = 1, updated_at = ? WHERE id = ? AND pos_submitted = 0",
    )
    .bind(Utc::now())
    .bind(id.to_string())
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}

/// Check-and-set used by the POS webhook handler. Returns `true` when this
/// is the first notification for the order.
pub async fn mark_syrve_notified(pool: &SqlitePool, id: Uuid) -> RepoResult<bool> {
    let result = sqlx::query(
        "UPDATE orders SET syrve_notified = 1, updated_at = ? WHERE id = ? AND syrve_notified = 0",
    )
    .bind(Utc::now())
    .bind(id.to_string())
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}
