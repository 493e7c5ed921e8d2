//! POS (Syrve) synchronization
//!
//! Everything that turns an internal order into POS terms: the HTTP client,
//! the product/modifier resolver, delivery-table selection, payload assembly
//! and submission, plus the workers that drive it off the bus.

pub mod client;
pub mod resolver;
pub mod submitter;
pub mod tables;
pub mod types;
pub mod worker;

pub use client::SyrveClient;
pub use resolver::Resolver;
pub use submitter::OrderSubmitter;
pub use worker::{PosWorker, SyncWorker};
