//! Domain models shared across the API surface and queue consumers.

pub mod order;
pub mod product;
pub mod zone;

pub use order::{DeliveryType, Order, OrderItem, OrderStatus, PaymentMethod};
pub use product::{Product, ProductVariation, ProductVariationGroup};
pub use zone::{DaySchedule, DeliveryZone, GeoPoint, WorkingHours};
