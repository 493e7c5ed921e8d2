//! Order Pricing & Validation
//!
//! Authoritative server-side pricing. The client-submitted total is only a
//! cross-check; every price and weight is re-read from the catalog and the
//! delivery cost is derived from zone geometry, never trusted from the
//! request.

pub mod schedule;
pub mod zones;

pub use schedule::validate_order_time;
pub use zones::{delivery_cost, haversine_km, resolve_zone};

/// Maximum accepted divergence between the client total and the server
/// total, in currency units. Anything above is a stale-pricing rejection.
pub const PRICE_TOLERANCE: f64 = 1.0;
