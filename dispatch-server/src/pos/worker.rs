//! POS queue workers
//!
//! One worker per queue, each owning its own client and dependencies.
//! Deliveries on a queue are processed one at a time; the POS API is the
//! bottleneck and table selection must not race.

use crate::bus::{Delivery, EventBus};
use shared::events::{queue, Notification, OrderEvent, StopListEntry, StopListUpdated, SyncStart};
use shared::util::short_order_ref;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use super::client::SyrveClient;
use super::submitter::{OrderSubmitter, SubmitError, SubmitOutcome};

/// Consumes ready orders and pushes them into the POS.
pub struct PosWorker {
    submitter: OrderSubmitter,
    bus: Arc<EventBus>,
    default_chat: i64,
}

impl PosWorker {
    pub fn new(submitter: OrderSubmitter, bus: Arc<EventBus>, default_chat: i64) -> Self {
        Self {
            submitter,
            bus,
            default_chat,
        }
    }

    pub async fn run(self, shutdown: CancellationToken) {
        let mut sub = self.bus.subscribe(queue::ORDERS_CREATED);
        tracing::info!("POS worker started");
        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                delivery = sub.recv() => {
                    let Some(delivery) = delivery else { break };
                    self.handle(delivery).await;
                }
            }
        }
        tracing::info!("POS worker stopped");
    }

    async fn handle(&self, delivery: Delivery) {
        let order: OrderEvent = match delivery.decode() {
            Ok(order) => order,
            Err(e) => {
                delivery.reject(&format!("Undecodable order event: {e}"));
                return;
            }
        };
        let reference = short_order_ref(&order.id);

        match self.submitter.submit(&order).await {
            Ok(SubmitOutcome::Submitted { table, .. }) => {
                self.notify(format!("📋 Замовлення #{reference} передано на кухню ({table})"));
                delivery.ack();
            }
            Ok(SubmitOutcome::AlreadySubmitted) => {
                tracing::info!(order_id = %order.id, "Order already submitted to POS");
                delivery.ack();
            }
            Ok(SubmitOutcome::FailedAfterClaim { reason }) => {
                // The claim is spent; a retry could duplicate the ticket.
                tracing::error!(order_id = %order.id, reason, "POS create failed after claim");
                self.notify(format!(
                    "🚨 Замовлення #{reference} НЕ потрапило на кухню: {reason}"
                ));
                delivery.ack();
            }
            Err(SubmitError::Permanent(reason)) => {
                tracing::error!(order_id = %order.id, reason, "POS synchronization abandoned");
                self.notify(format!(
                    "🚨 Замовлення #{reference} не синхронізовано з POS: {reason}"
                ));
                delivery.ack();
            }
            Err(SubmitError::Transient(e)) => {
                delivery.nack(&format!("POS submission failed: {e}"));
            }
        }
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

/// Handles manual sync triggers: pulls the POS stop list and republishes
/// it for the reconciler.
pub struct SyncWorker {
    client: SyrveClient,
    bus: Arc<EventBus>,
}

impl SyncWorker {
    pub fn new(client: SyrveClient, bus: Arc<EventBus>) -> Self {
        Self { client, bus }
    }

    pub async fn run(self, shutdown: CancellationToken) {
        let mut sub = self.bus.subscribe(queue::SYNC_START);
        tracing::info!("Sync worker started");
        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                delivery = sub.recv() => {
                    let Some(delivery) = delivery else { break };
                    self.handle(delivery).await;
                }
            }
        }
        tracing::info!("Sync worker stopped");
    }

    async fn handle(&self, delivery: Delivery) {
        let trigger: SyncStart = match delivery.decode() {
            Ok(trigger) => trigger,
            Err(e) => {
                delivery.reject(&format!("Undecodable sync trigger: {e}"));
                return;
            }
        };
        tracing::info!(initiator = %trigger.initiator, "Stop-list sync triggered");

        match self.fetch_stop_list().await {
            Ok(items) => {
                let update = StopListUpdated {
                    items,
                    chat_id: trigger.chat_id,
                };
                if let Err(e) = self.bus.publish(queue::STOP_LIST_UPDATED, &update) {
                    delivery.nack(&format!("Failed to publish stop list: {e}"));
                    return;
                }
                delivery.ack();
            }
            Err(e) => {
                delivery.nack(&format!("Stop-list fetch failed: {e}"));
            }
        }
    }

    async fn fetch_stop_list(&self) -> crate::utils::AppResult<Vec<StopListEntry>> {
        let token = self.client.access_token().await?;
        let organizations = self.client.organizations(&token).await?;
        let organization = organizations
            .first()
            .ok_or_else(|| crate::utils::AppError::pos("POS reports no organizations"))?;
        let items = self.client.stop_lists(&token, &organization.id).await?;
        Ok(items
            .into_iter()
            .map(|item| StopListEntry {
                product_id: item.product_id,
                balance: item.balance,
            })
            .collect())
    }
}
