//! Order creation and admin update pipeline
//!
//! The service owns the authoritative pricing path: schedule check, catalog
//! re-pricing, zone geometry, tolerance check against the client total, then
//! persistence. Payment initiation happens before the order row is written
//! so the invoice reference lands in the same insert.

pub mod service;

pub use service::{CreateOrderLine, CreateOrderRequest, OrderService, UpdateOrderRequest};
