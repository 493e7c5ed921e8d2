//! Delivery zone and working-hours reference data
//!
//! Read-only settings loaded at startup. A zone is a radius band around the
//! configured center point; a coordinate matches the zone when its haversine
//! distance falls in `[inner_radius, outer_radius)`.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Geographic point, decimal degrees.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

/// Delivery pricing region.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryZone {
    pub name: String,
    /// Flat delivery price for this zone.
    pub price: f64,
    /// Delivery is free when the item subtotal reaches this; 0 = never free.
    #[serde(default)]
    pub free_order_price: f64,
    /// Inclusive inner bound, km from the center point.
    #[serde(default)]
    pub inner_radius: f64,
    /// Exclusive outer bound, km from the center point.
    #[serde(rename = "radius")]
    pub outer_radius: f64,
}

/// Opening window for one weekday. Times are "HH:MM" local strings,
/// compared lexicographically (the wire format the storefront uses).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DaySchedule {
    pub start: String,
    pub end: String,
    #[serde(default)]
    pub closed: bool,
}

/// Weekly schedule per delivery type, keyed by lowercase day name
/// ("monday" .. "sunday").
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WorkingHours {
    #[serde(default)]
    pub delivery: HashMap<String, DaySchedule>,
    #[serde(default)]
    pub pickup: HashMap<String, DaySchedule>,
}
