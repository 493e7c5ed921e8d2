//! Catalog snapshot models
//!
//! Read-side view of the product catalog used by pricing and the stop-list
//! reconciler. Pricing reads are authoritative at order time; the frozen
//! values live on the order items afterwards.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Catalog product.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    pub id: Uuid,
    /// Identifier of the same product in the external POS catalog.
    #[serde(default)]
    pub external_id: String,
    pub name: String,
    pub price: f64,
    #[serde(default)]
    pub weight: f64,
    /// Sellable balance mirrored from the POS stop list; `None` = unlimited.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stock: Option<f64>,
    #[serde(default)]
    pub hidden: bool,
}

/// Product variation (size, flavour, ...) referencing its group.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductVariation {
    pub id: Uuid,
    pub group_id: Uuid,
    #[serde(default)]
    pub external_id: String,
    pub name: String,
}

/// Variation group ("Size", "Dough", ...).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductVariationGroup {
    pub id: Uuid,
    pub name: String,
}
