//! Webhook Handlers
//!
//! Inbound callbacks are turned into bus events as fast as possible; all
//! real processing happens in the workers. A webhook is answered 200 once
//! its event is durably enqueued, so provider retries stay cheap.

use axum::{extract::State, Json};
use serde::Deserialize;
use shared::events::{queue, Notification, PaymentSuccessEvent, SyncStart};
use shared::util::short_order_ref;
use uuid::Uuid;

use crate::core::ServerState;
use crate::db::repository::order as order_repo;
use crate::pos::types::WebhookEvent;
use crate::utils::{ok, AppResponse, AppResult};

/// Acquirer callback shape (monobank-style).
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentCallback {
    pub invoice_id: String,
    pub status: String,
    #[serde(default)]
    pub amount: i64,
}

/// POST /webhooks/payment - 收单回调
pub async fn payment(
    State(state): State<ServerState>,
    Json(callback): Json<PaymentCallback>,
) -> AppResult<Json<AppResponse<()>>> {
    let event = PaymentSuccessEvent {
        invoice_id: callback.invoice_id,
        amount: callback.amount,
        status: callback.status,
    };
    state.bus.publish(queue::PAYMENT_EVENTS, &event)?;
    Ok(ok(()))
}

/// Order lifecycle events for both delivery and table orders; the error
/// variants may arrive without a creation status.
const ORDER_EVENTS: [&str; 4] = [
    "DeliveryOrderUpdate",
    "TableOrderUpdate",
    "DeliveryOrderError",
    "TableOrderError",
];
const STOP_LIST_EVENT: &str = "StopListUpdate";
const STATUS_SUCCESS: &str = "Success";
const STATUS_ERROR: &str = "Error";

/// `Some(true)` when the order reached the POS, `Some(false)` when it was
/// rejected, `None` for intermediate statuses that are not actionable.
fn order_outcome(event_type: &str, creation_status: Option<&str>) -> Option<bool> {
    match creation_status {
        Some(STATUS_SUCCESS) => Some(true),
        Some(STATUS_ERROR) => Some(false),
        // Error events are final even when the POS omits the status.
        None | Some("") if event_type.ends_with("Error") => Some(false),
        _ => None,
    }
}

/// POST /webhooks/pos - POS 事件批量回调
///
/// Order-status events notify operators exactly once per order via the
/// `syrve_notified` check-and-set; stop-list events trigger a sync run.
/// Everything else in the batch is noise.
pub async fn pos(
    State(state): State<ServerState>,
    Json(events): Json<Vec<WebhookEvent>>,
) -> AppResult<Json<AppResponse<()>>> {
    for event in events {
        match event.event_type.as_str() {
            t if ORDER_EVENTS.contains(&t) => handle_order_update(&state, event).await,
            STOP_LIST_EVENT => {
                let trigger = SyncStart {
                    chat_id: state.config.telegram_chat_id,
                    initiator: "pos-webhook".into(),
                };
                if let Err(e) = state.bus.publish(queue::SYNC_START, &trigger) {
                    tracing::error!(error = %e, "Failed to trigger stop-list sync");
                }
            }
            other => {
                tracing::debug!(event_type = other, "Ignoring POS webhook event");
            }
        }
    }
    Ok(ok(()))
}

async fn handle_order_update(state: &ServerState, event: WebhookEvent) {
    let Some(info) = event.event_info else { return };
    let Some(success) = order_outcome(&event.event_type, info.creation_status.as_deref())
    else {
        return;
    };
    let Some(order_id) = info
        .external_number
        .as_deref()
        .and_then(|n| Uuid::parse_str(n).ok())
    else {
        tracing::warn!(pos_order_id = %info.id, "POS event without usable order reference");
        return;
    };

    let first = match order_repo::mark_syrve_notified(state.pool(), order_id).await {
        Ok(first) => first,
        Err(e) => {
            tracing::error!(order_id = %order_id, error = %e, "syrve_notified check-and-set failed");
            return;
        }
    };
    if !first {
        return;
    }

    let reference = short_order_ref(&order_id);
    let text = if success {
        format!("✅ Замовлення #{reference} прийнято POS")
    } else {
        format!("🚨 POS відхилив замовлення #{reference}")
    };
    let note = Notification {
        chat_id: state.config.telegram_chat_id,
        text,
    };
    if let Err(e) = state.bus.publish(queue::TELEGRAM_MESSAGES, &note) {
        tracing::warn!(error = %e, "Notification enqueue failed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_events_are_final_even_without_status() {
        assert!(ORDER_EVENTS.contains(&"DeliveryOrderError"));
        assert_eq!(order_outcome("DeliveryOrderError", None), Some(false));
        assert_eq!(order_outcome("TableOrderError", Some("Error")), Some(false));
    }

    #[test]
    fn table_orders_are_handled_like_delivery_orders() {
        assert!(ORDER_EVENTS.contains(&"TableOrderUpdate"));
        assert_eq!(order_outcome("TableOrderUpdate", Some("Success")), Some(true));
    }

    #[test]
    fn intermediate_statuses_are_not_actionable() {
        assert_eq!(order_outcome("DeliveryOrderUpdate", Some("InProgress")), None);
        assert_eq!(order_outcome("DeliveryOrderUpdate", None), None);
    }
}
