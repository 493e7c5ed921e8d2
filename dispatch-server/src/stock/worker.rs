//! Stock worker
//!
//! Services two queues: stop-list snapshots (apply + report) and ad hoc
//! stock report requests. Updates are applied before the message is
//! acknowledged; a database failure leaves the snapshot for redelivery.

use crate::bus::{Delivery, EventBus};
use crate::db::repository::product as product_repo;
use shared::events::{queue, Notification, StockReportRequest, StopListUpdated};
use sqlx::SqlitePool;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use super::diff::{diff_stop_list, render_report};

pub struct StockWorker {
    pool: SqlitePool,
    bus: Arc<EventBus>,
    default_chat: i64,
    reset_missing: bool,
}

impl StockWorker {
    pub fn new(
        pool: SqlitePool,
        bus: Arc<EventBus>,
        default_chat: i64,
        reset_missing: bool,
    ) -> Self {
        Self {
            pool,
            bus,
            default_chat,
            reset_missing,
        }
    }

    pub async fn run(self, shutdown: CancellationToken) {
        let mut stop_list_sub = self.bus.subscribe(queue::STOP_LIST_UPDATED);
        let mut report_sub = self.bus.subscribe(queue::STOCK_REPORT);
        tracing::info!("Stock worker started");
        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                delivery = stop_list_sub.recv() => {
                    let Some(delivery) = delivery else { break };
                    self.handle_stop_list(delivery).await;
                }
                delivery = report_sub.recv() => {
                    let Some(delivery) = delivery else { break };
                    self.handle_report_request(delivery).await;
                }
            }
        }
        tracing::info!("Stock worker stopped");
    }

    async fn handle_stop_list(&self, delivery: Delivery) {
        let update: StopListUpdated = match delivery.decode() {
            Ok(update) => update,
            Err(e) => {
                delivery.reject(&format!("Undecodable stop-list update: {e}"));
                return;
            }
        };

        let products = match product_repo::find_all_products(&self.pool).await {
            Ok(products) => products,
            Err(e) => {
                delivery.nack(&format!("Product listing failed: {e}"));
                return;
            }
        };

        let diff = diff_stop_list(&products, &update.items, self.reset_missing);
        if diff.unknown > 0 {
            tracing::warn!(count = diff.unknown, "Stop list mentions unknown products");
        }
        if diff.missing_from_payload > 0 {
            tracing::info!(
                count = diff.missing_from_payload,
                reset = self.reset_missing,
                "Limited products absent from stop-list payload"
            );
        }

        for change in &diff.changes {
            if let Err(e) =
                product_repo::update_stock_by_external_id(&self.pool, &change.external_id, change.new)
                    .await
            {
                delivery.nack(&format!("Stock update failed for {}: {e}", change.external_id));
                return;
            }
        }
        tracing::info!(changes = diff.changes.len(), "Stop list reconciled");

        self.notify(update.chat_id, render_report(&diff));
        delivery.ack();
    }

    async fn handle_report_request(&self, delivery: Delivery) {
        let request: StockReportRequest = match delivery.decode() {
            Ok(request) => request,
            Err(e) => {
                delivery.reject(&format!("Undecodable stock report request: {e}"));
                return;
            }
        };

        let products = match product_repo::find_all_products(&self.pool).await {
            Ok(products) => products,
            Err(e) => {
                delivery.nack(&format!("Product listing failed: {e}"));
                return;
            }
        };

        let mut limited: Vec<String> = products
            .iter()
            .filter_map(|p| p.stock.map(|s| format!("▫️ {}: {:.0}", p.name, s)))
            .collect();
        let report = if limited.is_empty() {
            "✅ Всі позиції без обмежень".to_string()
        } else {
            limited.sort();
            format!("📦 Обмежені позиції:\n{}", limited.join("\n"))
        };

        self.notify(request.chat_id, report);
        delivery.ack();
    }

    fn notify(&self, chat_id: i64, text: String) {
        let chat_id = if chat_id != 0 {
            chat_id
        } else {
            self.default_chat
        };
        let note = Notification { chat_id, text };
        if let Err(e) = self.bus.publish(queue::TELEGRAM_MESSAGES, &note) {
            tracing::warn!(error = %e, "Notification enqueue failed");
        }
    }
}
