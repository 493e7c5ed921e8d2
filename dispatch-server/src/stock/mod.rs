//! Stop-list reconciliation
//!
//! Mirrors POS-reported sellable balances into the local catalog and emits
//! a human-readable diff report so operators see what changed.

pub mod diff;
pub mod worker;

pub use diff::{diff_stop_list, StockChange, StopListDiff, UNLIMITED_SENTINEL};
pub use worker::StockWorker;
