//! Payment reconciliation worker
//!
//! Drives the `pending -> paid` edge from acquirer events. Events are
//! at-least-once and possibly duplicated; the already-paid case is a
//! deliberate no-op so redelivery is harmless. Only a real processing
//! error (database down) leaves the message for redelivery.

use crate::bus::{Delivery, EventBus};
use crate::db::repository::order as order_repo;
use shared::events::{queue, Notification, PaymentSuccessEvent};
use shared::models::{Order, OrderStatus};
use shared::util::short_order_ref;
use sqlx::SqlitePool;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

const ACTIONABLE_STATUS: &str = "success";

enum Outcome {
    Paid(Box<Order>),
    AlreadyPaid,
    UnknownInvoice,
}

pub struct PaymentWorker {
    pool: SqlitePool,
    bus: Arc<EventBus>,
    default_chat: i64,
}

impl PaymentWorker {
    pub fn new(pool: SqlitePool, bus: Arc<EventBus>, default_chat: i64) -> Self {
        Self {
            pool,
            bus,
            default_chat,
        }
    }

    pub async fn run(self, shutdown: CancellationToken) {
        let mut sub = self.bus.subscribe(queue::PAYMENT_EVENTS);
        tracing::info!("Payment worker started");
        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                delivery = sub.recv() => {
                    let Some(delivery) = delivery else { break };
                    self.handle(delivery).await;
                }
            }
        }
        tracing::info!("Payment worker stopped");
    }

    async fn handle(&self, delivery: Delivery) {
        let event: PaymentSuccessEvent = match delivery.decode() {
            Ok(event) => event,
            Err(e) => {
                delivery.reject(&format!("Undecodable payment event: {e}"));
                return;
            }
        };

        if event.status != ACTIONABLE_STATUS {
            // Hold/failure callbacks share the channel; not ours to act on.
            tracing::debug!(invoice_id = %event.invoice_id, status = %event.status, "Ignoring non-success payment event");
            delivery.ack();
            return;
        }

        match self.apply(&event).await {
            Ok(Outcome::Paid(order)) => {
                self.notify(format!(
                    "💳 Оплачено замовлення #{} ({:.2} грн)",
                    short_order_ref(&order.id),
                    order.total_price,
                ));
                if let Err(e) = self.bus.publish(queue::ORDERS_CREATED, order.as_ref()) {
                    tracing::error!(order_id = %order.id, error = %e, "Failed to enqueue paid order for POS");
                }
                delivery.ack();
            }
            Ok(Outcome::AlreadyPaid) => {
                tracing::info!(invoice_id = %event.invoice_id, "Duplicate payment event, order already paid");
                delivery.ack();
            }
            Ok(Outcome::UnknownInvoice) => {
                tracing::error!(invoice_id = %event.invoice_id, "Payment event for unknown invoice");
                self.notify(format!(
                    "⚠️ Оплата по невідомому інвойсу {}",
                    event.invoice_id
                ));
                delivery.ack();
            }
            Err(e) => {
                delivery.nack(&format!("Payment reconciliation failed: {e}"));
            }
        }
    }

    async fn apply(
        &self,
        event: &PaymentSuccessEvent,
    ) -> Result<Outcome, crate::db::repository::RepoError> {
        let Some(mut order) = order_repo::find_by_invoice(&self.pool, &event.invoice_id).await?
        else {
            return Ok(Outcome::UnknownInvoice);
        };

        if order.status == OrderStatus::Paid {
            return Ok(Outcome::AlreadyPaid);
        }

        order_repo::update_status(&self.pool, order.id, OrderStatus::Paid).await?;
        order.status = OrderStatus::Paid;
        tracing::info!(
            order_id = %order.id,
            invoice_id = %event.invoice_id,
            amount_minor = event.amount,
            "Order marked paid"
        );
        Ok(Outcome::Paid(Box::new(order)))
    }

    fn notify(&self, text: String) {
        let note = Notification {
            chat_id: self.default_chat,
            text,
        };
        if let Err(e) = self.bus.publish(queue::TELEGRAM_MESSAGES, &note) {
            tracing::warn!(error = %e, "Notification enqueue failed");
        }
    }
}
