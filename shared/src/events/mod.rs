//! Queue names and event payloads
//!
//! Every queue carries exactly one payload shape from the closed set below.
//! Consumers deserialize with explicit failure: a body that does not decode
//! is dead-lettered, never probed field-by-field or silently dropped.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Queue names. Producers and consumers must agree on these; the wire
/// names are kept compatible with the pre-existing broker topology.
pub mod queue {
    /// Acquirer webhook events (in).
    pub const PAYMENT_EVENTS: &str = "payment_events";
    /// Full order mirror, published once an order is ready for the POS.
    pub const ORDERS_CREATED: &str = "orders.created";
    /// Flattened POS stop-list snapshot (in for the reconciler).
    pub const STOP_LIST_UPDATED: &str = "syrve.stop_list.updated";
    /// Manual/triggered POS synchronization (in).
    pub const SYNC_START: &str = "syrve.sync.start";
    /// Ad hoc stock report request (in).
    pub const STOCK_REPORT: &str = "product.report.stock";
    /// Operator notification sink (out).
    pub const TELEGRAM_MESSAGES: &str = "telegram_messages";
    /// Taxi estimate requests (in).
    pub const TAXI_REQUESTS: &str = "taxi_requests";
    /// Taxi order confirmations (in).
    pub const TAXI_CONFIRMS: &str = "taxi_confirms";
    /// Taxi flow responses consumed by the notification bot (out).
    pub const TAXI_EVENTS: &str = "taxi_events";
}

/// Payment provider webhook event, at-least-once, possibly duplicated.
/// Matched to exactly one order by `invoice_id`; a duplicate for an
/// already-paid order is a no-op.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentSuccessEvent {
    pub invoice_id: String,
    /// Amount in minor units, as reported by the acquirer.
    pub amount: i64,
    pub status: String,
}

/// Full order mirror carried on [`queue::ORDERS_CREATED`]; the POS worker
/// consumes exactly this shape.
pub type OrderEvent = crate::models::Order;

/// One flattened stop-list entry: POS product id plus sellable balance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StopListEntry {
    pub product_id: String,
    pub balance: f64,
}

/// Stop-list snapshot published by the POS worker after a sync run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StopListUpdated {
    pub items: Vec<StopListEntry>,
    #[serde(default)]
    pub chat_id: i64,
}

/// Manual sync trigger (operator command or POS webhook).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncStart {
    #[serde(default)]
    pub chat_id: i64,
    #[serde(default)]
    pub initiator: String,
}

/// Ad hoc full stock report request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockReportRequest {
    #[serde(default)]
    pub chat_id: i64,
}

/// Free-form operator notification. `chat_id` of 0 means "default channel".
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    #[serde(default)]
    pub chat_id: i64,
    pub text: String,
}

// ========== Taxi flow envelopes ==========
//
// A multi-step human-in-the-loop flow (estimate -> confirm) correlated by
// chat id + order id, with at-most-once side effect per confirmation.

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaxiRequest {
    pub chat_id: i64,
    pub order_id: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaxiEstimateReady {
    pub chat_id: i64,
    pub order_id: Uuid,
    pub price: f64,
    pub payload_to: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaxiConfirm {
    pub chat_id: i64,
    pub order_id: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaxiOrdered {
    pub chat_id: i64,
    pub order_id: Uuid,
    pub status: String,
    #[serde(default)]
    pub message: String,
}
