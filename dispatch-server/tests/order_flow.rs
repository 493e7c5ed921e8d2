//! End-to-end order flow over a temporary database: creation with
//! authoritative pricing, payment reconciliation idempotence, and the POS
//! notification check-and-set.

use async_trait::async_trait;
use dispatch_server::bus::EventBus;
use dispatch_server::core::Settings;
use dispatch_server::db::repository::order as order_repo;
use dispatch_server::db::DbService;
use dispatch_server::orders::{CreateOrderLine, CreateOrderRequest, OrderService, UpdateOrderRequest};
use dispatch_server::payments::{BasketLine, CreatedInvoice, PaymentProvider, PaymentWorker};
use dispatch_server::utils::AppResult;
use shared::events::{queue, OrderEvent, PaymentSuccessEvent};
use shared::models::{DaySchedule, DeliveryZone, GeoPoint, OrderStatus, WorkingHours};
use sqlx::SqlitePool;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

struct StubPayments;

#[async_trait]
impl PaymentProvider for StubPayments {
    async fn init_invoice(
        &self,
        _amount_minor: i64,
        reference: &str,
        _destination: &str,
        _basket: &[BasketLine],
    ) -> AppResult<CreatedInvoice> {
        Ok(CreatedInvoice {
            invoice_id: format!("inv-{reference}"),
            page_url: "https://pay.example/checkout".into(),
        })
    }
}

fn test_settings() -> Settings {
    let mut always_open = HashMap::new();
    for day in [
        "monday",
        "tuesday",
        "wednesday",
        "thursday",
        "friday",
        "saturday",
        "sunday",
    ] {
        always_open.insert(
            day.to_string(),
            DaySchedule {
                start: "00:00".into(),
                end: "23:59".into(),
                closed: false,
            },
        );
    }
    Settings {
        center: GeoPoint {
            lat: 50.45,
            lng: 30.52,
        },
        zones: vec![DeliveryZone {
            name: "near".into(),
            price: 60.0,
            free_order_price: 800.0,
            inner_radius: 0.0,
            outer_radius: 5.0,
        }],
        working_hours: WorkingHours {
            delivery: always_open.clone(),
            pickup: always_open,
        },
        door_delivery_price: 45.0,
        ..Settings::default()
    }
}

async fn setup() -> (tempfile::TempDir, SqlitePool, Arc<EventBus>, OrderService) {
    let dir = tempfile::tempdir().expect("tempdir");
    let db_path = dir.path().join("test.db");
    let db = DbService::new(db_path.to_str().unwrap()).await.expect("db");
    let bus = Arc::new(EventBus::new());
    let service = OrderService::new(
        db.pool.clone(),
        Arc::new(test_settings()),
        bus.clone(),
        Arc::new(StubPayments),
        0,
    );
    (dir, db.pool, bus, service)
}

async fn seed_product(pool: &SqlitePool, name: &str, price: f64) -> Uuid {
    let id = Uuid::new_v4();
    sqlx::query(
        "INSERT INTO product (id, external_id, name, price, weight, stock, hidden) \
         VALUES (?, ?, ?, ?, 0.2, NULL, 0)",
    )
    .bind(id.to_string())
    .bind(format!("ext-{id}"))
    .bind(name)
    .bind(price)
    .execute(pool)
    .await
    .expect("seed product");
    id
}

fn order_request(product_id: Uuid, quantity: i64, total: f64, payment: &str) -> CreateOrderRequest {
    CreateOrderRequest {
        name: "Олена".into(),
        phone: "+380501112233".into(),
        email: "".into(),
        address: "вул. Шевченка 1".into(),
        entrance: "".into(),
        coords: "50.45,30.52".into(),
        delivery_type: "delivery".into(),
        time: "ASAP".into(),
        payment_method: payment.into(),
        wishes: "".into(),
        cutlery: 0,
        delivery_door: false,
        items: vec![CreateOrderLine {
            product_id,
            variation_id: None,
            quantity,
        }],
        total_price: total,
    }
}

#[tokio::test]
async fn created_order_total_equals_items_plus_delivery() {
    let (_dir, pool, _bus, service) = setup().await;
    let product_id = seed_product(&pool, "Бургер", 120.0).await;

    // 2 x 120 + 60 delivery
    let order = service
        .create(order_request(product_id, 2, 300.0, "cash"))
        .await
        .expect("create order");

    assert_eq!(order.status, OrderStatus::Pending);
    assert_eq!(order.total_price, 300.0);
    assert_eq!(
        order.total_price,
        order.items_total() + order.delivery_cost + order.delivery_door_price
    );

    let stored = order_repo::find_by_id(&pool, order.id)
        .await
        .expect("find")
        .expect("stored");
    assert_eq!(stored.total_price, 300.0);
    assert_eq!(stored.items.len(), 1);
    assert_eq!(stored.items[0].quantity, 2);
}

#[tokio::test]
async fn price_mismatch_beyond_tolerance_is_rejected() {
    let (_dir, pool, _bus, service) = setup().await;
    let product_id = seed_product(&pool, "Бургер", 120.0).await;

    // Within 1.0 of the server total 300: accepted.
    service
        .create(order_request(product_id, 2, 299.5, "cash"))
        .await
        .expect("tolerated total");

    // 1.01 off: rejected.
    let err = service
        .create(order_request(product_id, 2, 301.01, "cash"))
        .await
        .expect_err("should reject");
    assert!(err.to_string().contains("Prices have changed"));
}

#[tokio::test]
async fn duplicate_payment_event_pays_exactly_once() {
    let (_dir, pool, bus, service) = setup().await;
    let product_id = seed_product(&pool, "Бургер", 120.0).await;

    let order = service
        .create(order_request(product_id, 2, 300.0, "bank"))
        .await
        .expect("create order");
    let invoice_id = order.invoice_id.clone().expect("online order has invoice");

    let mut pos_queue = bus.subscribe(queue::ORDERS_CREATED);
    let shutdown = CancellationToken::new();
    let worker = PaymentWorker::new(pool.clone(), bus.clone(), 0);
    let handle = tokio::spawn(worker.run(shutdown.clone()));

    let event = PaymentSuccessEvent {
        invoice_id,
        amount: 30_000,
        status: "success".into(),
    };
    bus.publish(queue::PAYMENT_EVENTS, &event).unwrap();
    bus.publish(queue::PAYMENT_EVENTS, &event).unwrap();

    // Exactly one order lands on the POS queue.
    let delivery = tokio::time::timeout(Duration::from_secs(5), pos_queue.recv())
        .await
        .expect("first POS event")
        .expect("delivery");
    let mirrored: OrderEvent = delivery.decode().expect("order event");
    assert_eq!(mirrored.id, order.id);
    assert_eq!(mirrored.status, OrderStatus::Paid);
    delivery.ack();

    let second = tokio::time::timeout(Duration::from_millis(300), pos_queue.recv()).await;
    assert!(second.is_err(), "duplicate event must not re-publish");

    let stored = order_repo::find_by_id(&pool, order.id)
        .await
        .expect("find")
        .expect("stored");
    assert_eq!(stored.status, OrderStatus::Paid);

    shutdown.cancel();
    handle.await.unwrap();
}

#[tokio::test]
async fn syrve_notified_flag_flips_once() {
    let (_dir, pool, _bus, service) = setup().await;
    let product_id = seed_product(&pool, "Бургер", 120.0).await;
    let order = service
        .create(order_request(product_id, 1, 180.0, "cash"))
        .await
        .expect("create order");

    assert!(order_repo::mark_syrve_notified(&pool, order.id)
        .await
        .expect("first"));
    assert!(!order_repo::mark_syrve_notified(&pool, order.id)
        .await
        .expect("second"));
}

#[tokio::test]
async fn admin_update_replaces_items_and_recomputes_total() {
    let (_dir, pool, _bus, service) = setup().await;
    let burger = seed_product(&pool, "Бургер", 120.0).await;
    let soup = seed_product(&pool, "Суп", 95.0).await;

    // 2 x 120 + 60 delivery
    let order = service
        .create(order_request(burger, 2, 300.0, "cash"))
        .await
        .expect("create order");

    let updated = service
        .update(
            order.id,
            UpdateOrderRequest {
                name: None,
                phone: None,
                address: None,
                wishes: Some("гострий".into()),
                cutlery: None,
                delivery_door: None,
                items: vec![CreateOrderLine {
                    product_id: soup,
                    variation_id: None,
                    quantity: 3,
                }],
            },
        )
        .await
        .expect("update order");

    assert_eq!(updated.items.len(), 1);
    assert_eq!(updated.items[0].quantity, 3);
    assert_eq!(updated.total_price, 3.0 * 95.0 + 60.0);
    assert_eq!(
        updated.total_price,
        updated.items_total() + updated.delivery_cost + updated.delivery_door_price
    );

    // The old item set is gone from the database, not only from the mirror.
    let stored = order_repo::find_by_id(&pool, order.id)
        .await
        .expect("find")
        .expect("stored");
    assert_eq!(stored.items.len(), 1);
    assert_eq!(stored.items[0].name, "Суп");
    assert_eq!(stored.wishes, "гострий");
    assert_eq!(stored.total_price, updated.total_price);
}
