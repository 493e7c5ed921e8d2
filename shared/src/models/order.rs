//! Order model
//!
//! The order is the single source of truth for the fulfillment lifecycle.
//! Prices and weights on [`OrderItem`] are captured at order time and never
//! re-read from the catalog afterwards.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Order lifecycle status.
///
/// Only the `Pending -> Paid` edge is driven by payment reconciliation;
/// `Shipping`/`Completed`/`Cancelled` are operator transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Paid,
    Shipping,
    Completed,
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Paid => "paid",
            OrderStatus::Shipping => "shipping",
            OrderStatus::Completed => "completed",
            OrderStatus::Cancelled => "cancelled",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(OrderStatus::Pending),
            "paid" => Some(OrderStatus::Paid),
            "shipping" => Some(OrderStatus::Shipping),
            "completed" => Some(OrderStatus::Completed),
            "cancelled" => Some(OrderStatus::Cancelled),
            _ => None,
        }
    }
}

/// Delivery type requested by the customer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryType {
    Delivery,
    Pickup,
    Dine,
}

impl DeliveryType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeliveryType::Delivery => "delivery",
            DeliveryType::Pickup => "pickup",
            DeliveryType::Dine => "dine",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "delivery" => Some(DeliveryType::Delivery),
            "pickup" => Some(DeliveryType::Pickup),
            "dine" => Some(DeliveryType::Dine),
            _ => None,
        }
    }
}

/// Normalized payment method.
///
/// Inbound synonyms collapse to two methods: anything card-like becomes
/// `Online` (goes through the acquirer), `cash`/`terminal` become `Cash`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    Cash,
    Online,
}

impl PaymentMethod {
    pub fn normalize(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "cash" | "terminal" => Some(PaymentMethod::Cash),
            "bank" | "online" | "card" | "cashless" => Some(PaymentMethod::Online),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "cash",
            PaymentMethod::Online => "online",
        }
    }
}

/// A single order line. Owned exclusively by its [`Order`]; immutable after
/// creation except via the admin full-replacement path.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderItem {
    pub id: Uuid,
    pub order_id: Uuid,
    pub product_id: Uuid,
    /// Identifier of the product in the external POS catalog.
    pub external_product_id: String,
    /// Display name as priced ("Product (Variation)" when a variation is set).
    pub name: String,
    /// Unit price captured at order time.
    pub price: f64,
    pub quantity: i64,
    pub total_price: f64,
    pub weight: f64,
    pub total_weight: f64,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub variation_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variation_external_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variation_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variation_group_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variation_group_name: Option<String>,
}

impl OrderItem {
    /// Recompute frozen line totals from unit price/weight and quantity.
    pub fn recompute_totals(&mut self) {
        self.total_price = self.price * self.quantity as f64;
        self.total_weight = self.weight * self.quantity as f64;
    }
}

/// Customer order with its items.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: Uuid,
    pub status: OrderStatus,
    pub total_price: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,

    pub name: String,
    pub phone: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub entrance: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zone: Option<String>,
    /// "lat,lng" as submitted by the client, empty when not provided.
    #[serde(default)]
    pub coords: String,
    /// Requested fulfillment time (already validated against working hours).
    pub time: DateTime<Utc>,
    #[serde(default)]
    pub wishes: String,
    #[serde(default)]
    pub cutlery: i64,

    pub delivery_type: DeliveryType,
    pub delivery_cost: f64,
    pub delivery_door: bool,
    pub delivery_door_price: f64,
    pub payment_method: PaymentMethod,

    /// Acquirer invoice reference, present for online payments.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub invoice_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_url: Option<String>,

    /// Set once by the POS submitter; guards resubmission on redelivery.
    #[serde(default)]
    pub pos_submitted: bool,
    /// Set once by the POS webhook check-and-set; guards duplicate
    /// operator notifications.
    #[serde(default)]
    pub syrve_notified: bool,

    pub items: Vec<OrderItem>,
}

impl Order {
    /// Sum of item line totals, before delivery charges.
    pub fn items_total(&self) -> f64 {
        self.items.iter().map(|i| i.total_price).sum()
    }

    /// Recompute the authoritative order total.
    ///
    /// Invariant: `total_price == Σ item.total_price + delivery_cost +
    /// delivery_door_price` after every mutation path.
    pub fn recompute_total(&mut self) {
        for item in &mut self.items {
            item.recompute_totals();
        }
        self.total_price = self.items_total() + self.delivery_cost + self.delivery_door_price;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(price: f64, qty: i64) -> OrderItem {
        OrderItem {
            id: Uuid::new_v4(),
            order_id: Uuid::nil(),
            product_id: Uuid::new_v4(),
            external_product_id: "ext".into(),
            name: "Test".into(),
            price,
            quantity: qty,
            total_price: 0.0,
            weight: 0.1,
            total_weight: 0.0,
            variation_id: None,
            variation_external_id: None,
            variation_name: None,
            variation_group_id: None,
            variation_group_name: None,
        }
    }

    #[test]
    fn total_includes_delivery_and_door() {
        let mut order = Order {
            id: Uuid::new_v4(),
            status: OrderStatus::Pending,
            total_price: 0.0,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            name: "N".into(),
            phone: "".into(),
            email: "".into(),
            address: "".into(),
            entrance: "".into(),
            zone: None,
            coords: "".into(),
            time: Utc::now(),
            wishes: "".into(),
            cutlery: 0,
            delivery_type: DeliveryType::Delivery,
            delivery_cost: 60.0,
            delivery_door: true,
            delivery_door_price: 45.0,
            payment_method: PaymentMethod::Cash,
            invoice_id: None,
            payment_url: None,
            pos_submitted: false,
            syrve_notified: false,
            items: vec![item(120.0, 2), item(85.0, 1)],
        };
        order.recompute_total();
        assert_eq!(order.total_price, 240.0 + 85.0 + 60.0 + 45.0);
    }

    #[test]
    fn payment_method_synonyms_normalize() {
        assert_eq!(PaymentMethod::normalize("TERMINAL"), Some(PaymentMethod::Cash));
        assert_eq!(PaymentMethod::normalize("cashless"), Some(PaymentMethod::Online));
        assert_eq!(PaymentMethod::normalize("barter"), None);
    }
}
