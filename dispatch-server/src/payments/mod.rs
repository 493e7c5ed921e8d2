//! Payment integration
//!
//! A thin provider client for invoice creation plus the reconciliation
//! worker that drives the `pending -> paid` edge from acquirer webhook
//! events.

pub mod provider;
pub mod worker;

pub use provider::{AcquiringClient, BasketLine, CreatedInvoice, PaymentProvider};
pub use worker::PaymentWorker;
