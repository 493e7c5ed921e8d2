//! POS order submission
//!
//! Assembles the final POS payload and creates the order on the selected
//! delivery table. Submission is guarded by the persisted `pos_submitted`
//! check-and-set: the flag is claimed immediately before the create call,
//! so every earlier step can fail and be retried freely, while the create
//! call itself happens at most once per order.

use crate::core::Settings;
use crate::db::repository::order as order_repo;
use crate::utils::AppError;
use chrono::{Duration, Utc};
use shared::models::{DeliveryType, Order};
use shared::util::short_order_ref;
use sqlx::SqlitePool;
use std::sync::Arc;

use super::client::SyrveClient;
use super::resolver::Resolver;
use super::tables::select_table;
use super::types::{CreateOrderRequest, OrderPayload, PosCustomer, PosOrderItem};

/// Pseudo-product names the POS menu carries for delivery fees.
const DELIVERY_FEE_NAME: &str = "Доставка";
const DOOR_FEE_NAME: &str = "Доставка до дверей";

const ACTIVE_ORDER_WINDOW_HOURS: i64 = 24;

#[derive(Debug)]
pub enum SubmitOutcome {
    Submitted {
        pos_order_id: Option<String>,
        table: String,
    },
    /// The idempotency flag was already set; nothing to do.
    AlreadySubmitted,
    /// The submission claim was consumed but the final create call failed.
    /// Retrying risks a duplicate kitchen ticket; an operator must step in.
    FailedAfterClaim { reason: String },
}

#[derive(Debug)]
pub enum SubmitError {
    /// Retryable: the POS or the database was unreachable.
    Transient(AppError),
    /// Resolution failed for good (missing section, tables or order type);
    /// redelivery cannot help.
    Permanent(String),
}

impl std::fmt::Display for SubmitError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SubmitError::Transient(e) => write!(f, "transient: {e}"),
            SubmitError::Permanent(reason) => write!(f, "permanent: {reason}"),
        }
    }
}

impl From<AppError> for SubmitError {
    fn from(e: AppError) -> Self {
        SubmitError::Transient(e)
    }
}

pub struct OrderSubmitter {
    client: SyrveClient,
    pool: SqlitePool,
    settings: Arc<Settings>,
}

impl OrderSubmitter {
    pub fn new(client: SyrveClient, pool: SqlitePool, settings: Arc<Settings>) -> Self {
        Self {
            client,
            pool,
            settings,
        }
    }

    pub async fn submit(&self, order: &Order) -> Result<SubmitOutcome, SubmitError> {
        if order.pos_submitted {
            return Ok(SubmitOutcome::AlreadySubmitted);
        }

        let token = self.client.access_token().await?;

        let organizations = self.client.organizations(&token).await?;
        let organization = organizations
            .first()
            .ok_or_else(|| SubmitError::Permanent("POS reports no organizations".into()))?;

        let terminal_groups = self
            .client
            .terminal_groups(&token, &organization.id)
            .await?;
        let terminal_group = terminal_groups
            .first()
            .ok_or_else(|| SubmitError::Permanent("POS reports no terminal groups".into()))?;

        let sections = self
            .client
            .restaurant_sections(&token, &terminal_group.id)
            .await?;
        let section = sections
            .iter()
            .find(|s| s.name == self.settings.pos_section_name)
            .ok_or_else(|| {
                SubmitError::Permanent(format!(
                    "Section '{}' not found",
                    self.settings.pos_section_name
                ))
            })?;
        if section.tables.is_empty() {
            return Err(SubmitError::Permanent(format!(
                "Section '{}' has no tables",
                section.name
            )));
        }

        let table_ids: Vec<String> = section.tables.iter().map(|t| t.id.clone()).collect();
        let since = Utc::now() - Duration::hours(ACTIVE_ORDER_WINDOW_HOURS);
        let active = self
            .client
            .orders_by_table(&token, &organization.id, &table_ids, since)
            .await?;
        let table = select_table(&section.tables, &active)
            .ok_or_else(|| SubmitError::Permanent("No delivery table available".into()))?;

        let order_types = self.client.order_types(&token, &organization.id).await?;
        let order_type = order_types
            .iter()
            .find(|t| t.name == self.settings.pos_order_type)
            .ok_or_else(|| {
                SubmitError::Permanent(format!(
                    "Order type '{}' not found",
                    self.settings.pos_order_type
                ))
            })?;

        let nomenclature = self.client.nomenclature(&token, &organization.id).await?;
        let resolver = Resolver::new(&self.settings.pos_mapping, &nomenclature.products);

        let mut items: Vec<PosOrderItem> = Vec::new();
        for line in &order.items {
            items.extend(resolver.resolve_item(line));
        }
        if order.delivery_cost > 0.0 {
            items.push(fee_line(&resolver, DELIVERY_FEE_NAME, order.delivery_cost));
        }
        if order.delivery_door_price > 0.0 {
            items.push(fee_line(&resolver, DOOR_FEE_NAME, order.delivery_door_price));
        }

        let payload = OrderPayload {
            table_ids: vec![table.id.clone()],
            order_type_id: order_type.id.clone(),
            external_number: order.id.to_string(),
            items,
            customer: PosCustomer {
                name: order.name.clone(),
                customer_type: "regular".into(),
            },
            phone: order.phone.clone(),
            comment: Some(order_comment(order)),
        };
        let request = CreateOrderRequest {
            organization_id: organization.id.clone(),
            terminal_group_id: terminal_group.id.clone(),
            order: payload,
        };

        // Claim the single allowed submission just before the create call;
        // a lost claim means another delivery already went through.
        let owns = order_repo::mark_pos_submitted(&self.pool, order.id)
            .await
            .map_err(|e| SubmitError::Transient(e.into()))?;
        if !owns {
            return Ok(SubmitOutcome::AlreadySubmitted);
        }

        match self.client.create_order(&token, &request).await {
            Ok(response) => {
                let pos_order_id = response.order_info.map(|info| info.id);
                tracing::info!(
                    order_id = %order.id,
                    table = %table.name,
                    pos_order_id = ?pos_order_id,
                    "Order submitted to POS"
                );
                Ok(SubmitOutcome::Submitted {
                    pos_order_id,
                    table: table.name.clone(),
                })
            }
            Err(e) => Ok(SubmitOutcome::FailedAfterClaim {
                reason: e.to_string(),
            }),
        }
    }
}

/// Delivery fees are zone-dependent, so the line carries the order's actual
/// charge instead of the POS menu price of the pseudo-product.
fn fee_line(resolver: &Resolver<'_>, name: &str, price: f64) -> PosOrderItem {
    PosOrderItem {
        product_id: resolver.resolve_id("", name),
        item_type: "Product".into(),
        amount: 1.0,
        price: Some(price),
        modifiers: Vec::new(),
        comment: None,
    }
}

fn order_comment(order: &Order) -> String {
    let mut comment = format!(
        "#{} | {}",
        short_order_ref(&order.id),
        order.time.format("%Y-%m-%d %H:%M"),
    );
    if order.delivery_type == DeliveryType::Delivery {
        comment.push_str(&format!("\nАдреса: {}", order.address));
        if !order.entrance.is_empty() {
            comment.push_str(&format!(", під'їзд {}", order.entrance));
        }
        if order.delivery_door {
            comment.push_str("\nДоставка до дверей");
        }
    }
    if !order.wishes.is_empty() {
        comment.push_str(&format!("\nПобажання: {}", order.wishes));
    }
    if order.cutlery > 0 {
        comment.push_str(&format!("\nПрибори: {}", order.cutlery));
    }
    comment.push_str(&format!("\nОплата: {}", order.payment_method.as_str()));
    comment
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use shared::models::{OrderStatus, PaymentMethod};
    use uuid::Uuid;

    #[test]
    fn comment_carries_address_and_wishes() {
        let order = Order {
            id: Uuid::nil(),
            status: OrderStatus::Paid,
            total_price: 0.0,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            name: "Олена".into(),
            phone: "+380501112233".into(),
            email: "".into(),
            address: "вул. Шевченка 1".into(),
            entrance: "2".into(),
            zone: None,
            coords: "".into(),
            time: Utc.with_ymd_and_hms(2024, 6, 3, 18, 30, 0).unwrap(),
            wishes: "без цибулі".into(),
            cutlery: 2,
            delivery_type: DeliveryType::Delivery,
            delivery_cost: 60.0,
            delivery_door: true,
            delivery_door_price: 45.0,
            payment_method: PaymentMethod::Cash,
            invoice_id: None,
            payment_url: None,
            pos_submitted: false,
            syrve_notified: false,
            items: vec![],
        };
        let comment = order_comment(&order);
        assert!(comment.contains("вул. Шевченка 1"));
        assert!(comment.contains("під'їзд 2"));
        assert!(comment.contains("Доставка до дверей"));
        assert!(comment.contains("без цибулі"));
        assert!(comment.contains("Прибори: 2"));
    }

    #[test]
    fn fee_line_carries_the_actual_charge() {
        let catalog = vec![];
        let mapping = std::collections::HashMap::new();
        let resolver = Resolver::new(&mapping, &catalog);
        let line = fee_line(&resolver, DELIVERY_FEE_NAME, 60.0);
        assert_eq!(line.amount, 1.0);
        assert_eq!(line.price, Some(60.0));
    }
}
