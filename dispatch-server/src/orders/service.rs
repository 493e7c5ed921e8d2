use crate::bus::EventBus;
use crate::core::Settings;
use crate::db::repository::{order as order_repo, product as product_repo};
use crate::payments::{BasketLine, PaymentProvider};
use crate::pricing::{self, PRICE_TOLERANCE};
use crate::utils::{AppError, AppResult};
use chrono::{TimeZone, Utc};
use serde::{Deserialize, Serialize};
use shared::events::{queue, Notification};
use shared::models::{
    DeliveryType, GeoPoint, Order, OrderItem, OrderStatus, PaymentMethod, Product,
};
use shared::util::short_order_ref;
use sqlx::SqlitePool;
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

/// One requested order line: internal ids plus quantity, nothing priced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateOrderLine {
    pub product_id: Uuid,
    #[serde(default)]
    pub variation_id: Option<Uuid>,
    pub quantity: i64,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateOrderRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[validate(length(min = 5, max = 20))]
    pub phone: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub entrance: String,
    /// "lat,lng"; required for delivery orders.
    #[serde(default)]
    pub coords: String,
    /// `delivery` | `pickup` | `dine`.
    pub delivery_type: String,
    /// `"ASAP"` or `"YYYY-MM-DD HH:MM"` local time.
    pub time: String,
    pub payment_method: String,
    #[serde(default)]
    pub wishes: String,
    #[serde(default)]
    pub cutlery: i64,
    #[serde(default)]
    pub delivery_door: bool,
    #[validate(length(min = 1))]
    pub items: Vec<CreateOrderLine>,
    /// Client-computed total, cross-checked against the server total.
    pub total_price: f64,
}

/// Admin-side update: replaces the item set and editable header fields.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateOrderRequest {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub wishes: Option<String>,
    pub cutlery: Option<i64>,
    pub delivery_door: Option<bool>,
    #[validate(length(min = 1))]
    pub items: Vec<CreateOrderLine>,
}

pub struct OrderService {
    pool: SqlitePool,
    settings: Arc<Settings>,
    bus: Arc<EventBus>,
    payments: Arc<dyn PaymentProvider>,
    default_chat: i64,
}

impl OrderService {
    pub fn new(
        pool: SqlitePool,
        settings: Arc<Settings>,
        bus: Arc<EventBus>,
        payments: Arc<dyn PaymentProvider>,
        default_chat: i64,
    ) -> Self {
        Self {
            pool,
            settings,
            bus,
            payments,
            default_chat,
        }
    }

    /// Full creation pipeline. Any validation failure aborts the whole
    /// order; nothing is persisted until every check has passed.
    pub async fn create(&self, req: CreateOrderRequest) -> AppResult<Order> {
        req.validate()
            .map_err(|e| AppError::validation(e.to_string()))?;

        let delivery_type = DeliveryType::parse(&req.delivery_type)
            .ok_or_else(|| AppError::validation(format!("Unknown delivery type: {}", req.delivery_type)))?;
        let payment_method = PaymentMethod::normalize(&req.payment_method)
            .ok_or_else(|| AppError::validation(format!("Unknown payment method: {}", req.payment_method)))?;

        let now = chrono::Local::now().naive_local();
        let time = pricing::validate_order_time(
            &req.time,
            delivery_type,
            now,
            &self.settings.working_hours,
        )?;

        let order_id = Uuid::new_v4();
        let items = self.price_items(order_id, &req.items).await?;
        let subtotal: f64 = items.iter().map(|i| i.total_price).sum();

        let (zone_name, delivery_cost) = match delivery_type {
            DeliveryType::Delivery => {
                let point = parse_coords(&req.coords)
                    .ok_or_else(|| AppError::validation("Delivery order requires coordinates"))?;
                let zone = pricing::resolve_zone(&self.settings.zones, self.settings.center, point)
                    .ok_or(AppError::OutsideDeliveryZone)?;
                (
                    Some(zone.name.clone()),
                    pricing::delivery_cost(zone, subtotal),
                )
            }
            DeliveryType::Pickup | DeliveryType::Dine => (None, 0.0),
        };

        let door_price = if req.delivery_door && delivery_type == DeliveryType::Delivery {
            self.settings.door_delivery_price
        } else {
            0.0
        };

        let server_total = subtotal + delivery_cost + door_price;
        if (server_total - req.total_price).abs() > PRICE_TOLERANCE {
            return Err(AppError::PriceMismatch {
                expected: server_total,
                got: req.total_price,
            });
        }

        let created_at = Utc::now();
        let mut order = Order {
            id: order_id,
            status: OrderStatus::Pending,
            total_price: server_total,
            created_at,
            updated_at: created_at,
            name: req.name,
            phone: req.phone,
            email: req.email,
            address: req.address,
            entrance: req.entrance,
            zone: zone_name,
            coords: req.coords,
            time: Utc.from_utc_datetime(&time),
            wishes: req.wishes,
            cutlery: req.cutlery,
            delivery_type,
            delivery_cost,
            delivery_door: req.delivery_door,
            delivery_door_price: door_price,
            payment_method,
            invoice_id: None,
            payment_url: None,
            pos_submitted: false,
            syrve_notified: false,
            items,
        };

        if payment_method == PaymentMethod::Online {
            let reference = order.id.to_string();
            let destination = format!("Замовлення #{}", short_order_ref(&order.id));
            let amount_minor = (order.total_price * 100.0).round() as i64;
            let basket = invoice_basket(&order);
            let invoice = self
                .payments
                .init_invoice(amount_minor, &reference, &destination, &basket)
                .await?;
            order.invoice_id = Some(invoice.invoice_id);
            order.payment_url = Some(invoice.page_url);
        }

        order_repo::create_order(&self.pool, &order).await?;
        tracing::info!(
            order_id = %order.id,
            total = order.total_price,
            payment = order.payment_method.as_str(),
            "Order created"
        );

        self.notify(format!(
            "🆕 Замовлення #{}\n{}, {}\nСума: {:.2} грн ({})",
            short_order_ref(&order.id),
            order.name,
            order.phone,
            order.total_price,
            order.payment_method.as_str(),
        ));

        // Cash orders skip reconciliation and go straight to the POS queue;
        // online orders are published by the payment worker once paid.
        if order.payment_method == PaymentMethod::Cash {
            if let Err(e) = self.bus.publish(queue::ORDERS_CREATED, &order) {
                tracing::error!(order_id = %order.id, error = %e, "Failed to enqueue order for POS");
            }
        }

        Ok(order)
    }

    pub async fn get(&self, id: Uuid) -> AppResult<Order> {
        order_repo::find_by_id(&self.pool, id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Order {id} not found")))
    }

    pub async fn list(&self, limit: i64, offset: i64) -> AppResult<(Vec<Order>, i64)> {
        Ok(order_repo::list(&self.pool, limit, offset).await?)
    }

    /// Replace the item set and editable header fields, re-pricing every
    /// line from the catalog and recomputing the total invariant.
    pub async fn update(&self, id: Uuid, req: UpdateOrderRequest) -> AppResult<Order> {
        req.validate()
            .map_err(|e| AppError::validation(e.to_string()))?;

        let mut order = self.get(id).await?;
        if let Some(name) = req.name {
            order.name = name;
        }
        if let Some(phone) = req.phone {
            order.phone = phone;
        }
        if let Some(address) = req.address {
            order.address = address;
        }
        if let Some(wishes) = req.wishes {
            order.wishes = wishes;
        }
        if let Some(cutlery) = req.cutlery {
            order.cutlery = cutlery;
        }
        if let Some(door) = req.delivery_door {
            order.delivery_door = door;
            order.delivery_door_price = if door && order.delivery_type == DeliveryType::Delivery {
                self.settings.door_delivery_price
            } else {
                0.0
            };
        }

        order.items = self.price_items(order.id, &req.items).await?;
        order.updated_at = Utc::now();
        order.recompute_total();

        order_repo::replace_items(&self.pool, &order).await?;
        tracing::info!(order_id = %order.id, total = order.total_price, "Order updated");
        Ok(order)
    }

    /// Re-price requested lines from the catalog. Display names compose
    /// "Product (Variation)" when a variation is selected.
    async fn price_items(
        &self,
        order_id: Uuid,
        lines: &[CreateOrderLine],
    ) -> AppResult<Vec<OrderItem>> {
        let mut items = Vec::with_capacity(lines.len());
        for line in lines {
            if line.quantity <= 0 {
                return Err(AppError::validation("Item quantity must be positive"));
            }
            let product: Product = product_repo::find_product(&self.pool, line.product_id)
                .await?
                .filter(|p| !p.hidden)
                .ok_or_else(|| AppError::ProductNotFound(line.product_id.to_string()))?;

            let mut item = OrderItem {
                id: Uuid::new_v4(),
                order_id,
                product_id: product.id,
                external_product_id: product.external_id,
                name: product.name.clone(),
                price: product.price,
                quantity: line.quantity,
                total_price: 0.0,
                weight: product.weight,
                total_weight: 0.0,
                variation_id: None,
                variation_external_id: None,
                variation_name: None,
                variation_group_id: None,
                variation_group_name: None,
            };

            if let Some(variation_id) = line.variation_id {
                let variation = product_repo::find_variation(&self.pool, variation_id)
                    .await?
                    .ok_or_else(|| AppError::ProductNotFound(variation_id.to_string()))?;
                let group = product_repo::find_variation_group(&self.pool, variation.group_id)
                    .await?
                    .ok_or_else(|| AppError::ProductNotFound(variation.group_id.to_string()))?;
                item.name = format!("{} ({})", product.name, variation.name);
                item.variation_id = Some(variation.id);
                item.variation_external_id = Some(variation.external_id);
                item.variation_name = Some(variation.name);
                item.variation_group_id = Some(group.id);
                item.variation_group_name = Some(group.name);
            }

            item.recompute_totals();
            items.push(item);
        }
        Ok(items)
    }

    /// Best-effort operator notification; never fails the caller.
    fn notify(&self, text: String) {
        let note = Notification {
            chat_id: self.default_chat,
            text,
        };
        if let Err(e) = self.bus.publish(queue::TELEGRAM_MESSAGES, &note) {
            tracing::warn!(error = %e, "Notification enqueue failed");
        }
    }
}

/// Itemized hosted-page basket: order lines plus delivery pseudo-lines,
/// all in minor currency units.
fn invoice_basket(order: &Order) -> Vec<BasketLine> {
    let mut basket: Vec<BasketLine> = order
        .items
        .iter()
        .map(|item| BasketLine {
            name: item.name.clone(),
            qty: item.quantity,
            sum: (item.total_price * 100.0).round() as i64,
        })
        .collect();
    if order.delivery_cost > 0.0 {
        basket.push(BasketLine {
            name: "Доставка".into(),
            qty: 1,
            sum: (order.delivery_cost * 100.0).round() as i64,
        });
    }
    if order.delivery_door_price > 0.0 {
        basket.push(BasketLine {
            name: "Доставка до дверей".into(),
            qty: 1,
            sum: (order.delivery_door_price * 100.0).round() as i64,
        });
    }
    basket
}

fn parse_coords(raw: &str) -> Option<GeoPoint> {
    let (lat, lng) = raw.split_once(',')?;
    Some(GeoPoint {
        lat: lat.trim().parse().ok()?,
        lng: lng.trim().parse().ok()?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coords_parse_with_spaces() {
        let p = parse_coords("50.45, 30.52").unwrap();
        assert_eq!(p.lat, 50.45);
        assert_eq!(p.lng, 30.52);
    }

    #[test]
    fn coords_reject_garbage() {
        assert!(parse_coords("").is_none());
        assert!(parse_coords("50.45").is_none());
        assert!(parse_coords("x,y").is_none());
    }
}
