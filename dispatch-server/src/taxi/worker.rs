//! Taxi worker
//!
//! Estimates live in memory keyed by (chat id, order id); a confirmation
//! atomically removes its estimate, so the ordering side effect fires at
//! most once no matter how many times the confirm event is redelivered.

use crate::bus::{Delivery, EventBus};
use crate::db::repository::order as order_repo;
use dashmap::DashMap;
use shared::events::{queue, TaxiConfirm, TaxiEstimateReady, TaxiOrdered, TaxiRequest};
use shared::util::short_order_ref;
use sqlx::SqlitePool;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use super::provider::{TaxiEstimate, TaxiProvider};

pub struct TaxiWorker {
    pool: SqlitePool,
    bus: Arc<EventBus>,
    provider: Arc<dyn TaxiProvider>,
    pending: DashMap<(i64, Uuid), TaxiEstimate>,
}

impl TaxiWorker {
    pub fn new(pool: SqlitePool, bus: Arc<EventBus>, provider: Arc<dyn TaxiProvider>) -> Self {
        Self {
            pool,
            bus,
            provider,
            pending: DashMap::new(),
        }
    }

    pub async fn run(self, shutdown: CancellationToken) {
        let mut request_sub = self.bus.subscribe(queue::TAXI_REQUESTS);
        let mut confirm_sub = self.bus.subscribe(queue::TAXI_CONFIRMS);
        tracing::info!("Taxi worker started");
        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                delivery = request_sub.recv() => {
                    let Some(delivery) = delivery else { break };
                    self.handle_request(delivery).await;
                }
                delivery = confirm_sub.recv() => {
                    let Some(delivery) = delivery else { break };
                    self.handle_confirm(delivery).await;
                }
            }
        }
        tracing::info!("Taxi worker stopped");
    }

    async fn handle_request(&self, delivery: Delivery) {
        let request: TaxiRequest = match delivery.decode() {
            Ok(request) => request,
            Err(e) => {
                delivery.reject(&format!("Undecodable taxi request: {e}"));
                return;
            }
        };

        let order = match order_repo::find_by_id(&self.pool, request.order_id).await {
            Ok(Some(order)) => order,
            Ok(None) => {
                self.publish_result(TaxiOrdered {
                    chat_id: request.chat_id,
                    order_id: request.order_id,
                    status: "error".into(),
                    message: "Замовлення не знайдено".into(),
                });
                delivery.ack();
                return;
            }
            Err(e) => {
                delivery.nack(&format!("Order lookup failed: {e}"));
                return;
            }
        };

        if order.address.trim().is_empty() {
            self.publish_result(TaxiOrdered {
                chat_id: request.chat_id,
                order_id: request.order_id,
                status: "error".into(),
                message: "У замовлення немає адреси доставки".into(),
            });
            delivery.ack();
            return;
        }

        let comment = format!("#{}", short_order_ref(&order.id));
        match self.provider.estimate(&order.address, &comment).await {
            Ok(estimate) => {
                let ready = TaxiEstimateReady {
                    chat_id: request.chat_id,
                    order_id: request.order_id,
                    price: estimate.price,
                    payload_to: estimate.payload_to.clone(),
                };
                self.pending
                    .insert((request.chat_id, request.order_id), estimate);
                if let Err(e) = self.bus.publish(queue::TAXI_EVENTS, &ready) {
                    tracing::error!(error = %e, "Failed to publish taxi estimate");
                }
                delivery.ack();
            }
            Err(e) => {
                delivery.nack(&format!("Taxi estimate failed: {e}"));
            }
        }
    }

    async fn handle_confirm(&self, delivery: Delivery) {
        let confirm: TaxiConfirm = match delivery.decode() {
            Ok(confirm) => confirm,
            Err(e) => {
                delivery.reject(&format!("Undecodable taxi confirm: {e}"));
                return;
            }
        };
        let key = (confirm.chat_id, confirm.order_id);

        // Removal is the at-most-once gate: a redelivered confirm finds
        // nothing and degrades to a report-only no-op.
        let Some((_, estimate)) = self.pending.remove(&key) else {
            self.publish_result(TaxiOrdered {
                chat_id: confirm.chat_id,
                order_id: confirm.order_id,
                status: "expired".into(),
                message: "Оцінка застаріла, запросіть нову".into(),
            });
            delivery.ack();
            return;
        };

        let order = match order_repo::find_by_id(&self.pool, confirm.order_id).await {
            Ok(Some(order)) => order,
            Ok(None) => {
                self.publish_result(TaxiOrdered {
                    chat_id: confirm.chat_id,
                    order_id: confirm.order_id,
                    status: "error".into(),
                    message: "Замовлення не знайдено".into(),
                });
                delivery.ack();
                return;
            }
            Err(e) => {
                // Estimate goes back so the confirmation can be retried.
                self.pending.insert(key, estimate);
                delivery.nack(&format!("Order lookup failed: {e}"));
                return;
            }
        };

        let comment = format!("#{}", short_order_ref(&order.id));
        match self
            .provider
            .order(&estimate.payload_to, &order.phone, &comment)
            .await
        {
            Ok(status) => {
                self.publish_result(TaxiOrdered {
                    chat_id: confirm.chat_id,
                    order_id: confirm.order_id,
                    status,
                    message: String::new(),
                });
                delivery.ack();
            }
            Err(e) => {
                self.pending.insert(key, estimate);
                delivery.nack(&format!("Taxi order failed: {e}"));
            }
        }
    }

    fn publish_result(&self, result: TaxiOrdered) {
        if let Err(e) = self.bus.publish(queue::TAXI_EVENTS, &result) {
            tracing::error!(error = %e, "Failed to publish taxi result");
        }
    }
}
