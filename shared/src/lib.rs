//! Shared types for the dispatch backend
//!
//! Wire-level types used by both the HTTP surface and the queue consumers:
//! domain models (orders, catalog snapshots, delivery zones), the closed set
//! of event payloads carried on each queue, and small utilities.

pub mod events;
pub mod models;
pub mod util;

// Re-exports
pub use serde::{Deserialize, Serialize};

// Event re-exports (for convenient access)
pub use events::{OrderEvent, PaymentSuccessEvent, queue};
pub use models::{DeliveryType, Order, OrderItem, OrderStatus, PaymentMethod};
