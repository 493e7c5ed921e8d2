//! POS API wire types
//!
//! Shapes follow the Syrve cloud API (camelCase JSON). Only the fields the
//! resolver and submitter actually read are modeled; the catalog is a
//! read-mostly cache fetched per synchronization run, never persisted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ========== Auth / topology ==========

#[derive(Debug, Deserialize)]
pub struct AccessToken {
    pub token: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Organization {
    pub id: String,
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct OrganizationsResponse {
    pub organizations: Vec<Organization>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TerminalGroup {
    pub id: String,
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TerminalGroupBlock {
    #[serde(default)]
    pub organization_id: String,
    pub items: Vec<TerminalGroup>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TerminalGroupsResponse {
    pub terminal_groups: Vec<TerminalGroupBlock>,
}

// ========== Sections and tables ==========

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RestaurantTable {
    pub id: String,
    #[serde(default)]
    pub number: i64,
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RestaurantSection {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub terminal_group_id: String,
    #[serde(default)]
    pub tables: Vec<RestaurantTable>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionsResponse {
    pub restaurant_sections: Vec<RestaurantSection>,
}

/// One active POS order as reported by `order/by_table`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableOrder {
    #[serde(default)]
    pub id: String,
    pub order: TableOrderBody,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableOrderBody {
    #[serde(default)]
    pub table_ids: Vec<String>,
    pub when_created: Option<DateTime<Utc>>,
    #[serde(default)]
    pub status: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableOrdersResponse {
    pub orders: Vec<TableOrder>,
}

// ========== Nomenclature (menu + modifiers) ==========

/// Catalog modifier attached directly to a product. `min_amount > 0` makes
/// it mandatory at the POS.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PosModifier {
    pub id: String,
    #[serde(default)]
    pub min_amount: f64,
    #[serde(default)]
    pub max_amount: f64,
    #[serde(default)]
    pub default_amount: f64,
}

/// Modifier group; the group minimum applies to the sum of its children.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PosModifierGroup {
    pub id: String,
    #[serde(default)]
    pub min_amount: f64,
    #[serde(default)]
    pub max_amount: f64,
    #[serde(default)]
    pub child_modifiers: Vec<PosModifier>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PosMenuItem {
    pub id: String,
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub modifiers: Vec<PosModifier>,
    #[serde(default)]
    pub group_modifiers: Vec<PosModifierGroup>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Nomenclature {
    #[serde(default)]
    pub products: Vec<PosMenuItem>,
}

// ========== Order types ==========

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PosOrderType {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub order_service_type: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderTypeBlock {
    pub items: Vec<PosOrderType>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderTypesResponse {
    pub order_types: Vec<OrderTypeBlock>,
}

// ========== Stop lists ==========

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StopListItem {
    pub product_id: String,
    #[serde(default)]
    pub balance: f64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TerminalGroupStopList {
    #[serde(default)]
    pub terminal_group_id: String,
    #[serde(default)]
    pub items: Vec<StopListItem>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrganizationStopList {
    #[serde(default)]
    pub organization_id: String,
    #[serde(default)]
    pub items: Vec<TerminalGroupStopList>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StopListsResponse {
    #[serde(default)]
    pub terminal_group_stop_lists: Vec<OrganizationStopList>,
}

// ========== Order submission ==========

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PosOrderModifier {
    pub product_id: String,
    pub amount: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product_group_id: Option<String>,
}

/// One POS order line. Always amount 1; internal quantities are expanded
/// into separate lines because the POS marks commodities per unit.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PosOrderItem {
    pub product_id: String,
    #[serde(rename = "type")]
    pub item_type: String,
    pub amount: f64,
    /// Unit price as charged to the customer. Overrides the POS menu price,
    /// which matters for zone-dependent delivery fee lines.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub modifiers: Vec<PosOrderModifier>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PosCustomer {
    pub name: String,
    #[serde(rename = "type")]
    pub customer_type: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderPayload {
    pub table_ids: Vec<String>,
    pub order_type_id: String,
    /// Internal order UUID; echoed back in webhook events for correlation.
    pub external_number: String,
    pub items: Vec<PosOrderItem>,
    pub customer: PosCustomer,
    pub phone: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    pub organization_id: String,
    pub terminal_group_id: String,
    pub order: OrderPayload,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderResponse {
    #[serde(default)]
    pub order_info: Option<CreatedOrderInfo>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedOrderInfo {
    pub id: String,
}

// ========== Webhook callbacks ==========

/// One event in a POS webhook batch. Only delivery-order status updates
/// are acted on; the rest of the batch is noise.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookEvent {
    #[serde(default)]
    pub event_type: String,
    #[serde(default)]
    pub event_info: Option<WebhookEventInfo>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookEventInfo {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub external_number: Option<String>,
    #[serde(default)]
    pub creation_status: Option<String>,
}
