//! Courier taxi flow
//!
//! A human-in-the-loop estimate/confirm flow correlated by chat id and
//! order id, with an at-most-once ordering side effect per confirmation.

pub mod provider;
pub mod worker;

pub use provider::{OnTaxiClient, TaxiEstimate, TaxiProvider};
pub use worker::TaxiWorker;
