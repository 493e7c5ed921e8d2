//! 服务器状态
//!
//! `ServerState` holds the shared singletons: configuration, settings,
//! database pool, event bus and the order service. `Arc` everywhere, so
//! cloning into handlers and workers is cheap.

use crate::bus::EventBus;
use crate::core::{Config, Settings};
use crate::db::DbService;
use crate::orders::OrderService;
use crate::payments::{AcquiringClient, PaymentProvider};
use crate::utils::AppResult;
use sqlx::SqlitePool;
use std::sync::Arc;

#[derive(Clone)]
pub struct ServerState {
    pub config: Arc<Config>,
    pub settings: Arc<Settings>,
    pub db: DbService,
    pub bus: Arc<EventBus>,
    pub orders: Arc<OrderService>,
}

impl ServerState {
    pub async fn new(config: Config) -> AppResult<Self> {
        let settings = Arc::new(Settings::load(&config.settings_path)?);
        let db = DbService::new(&config.db_path()).await?;
        let bus = Arc::new(EventBus::new());

        let payments: Arc<dyn PaymentProvider> = Arc::new(AcquiringClient::new(&config)?);
        let orders = Arc::new(OrderService::new(
            db.pool.clone(),
            settings.clone(),
            bus.clone(),
            payments,
            config.telegram_chat_id,
        ));

        Ok(Self {
            config: Arc::new(config),
            settings,
            db,
            bus,
            orders,
        })
    }

    /// Variant for tests: custom bus and payment provider, temp database.
    pub async fn with_parts(
        config: Config,
        settings: Settings,
        bus: Arc<EventBus>,
        payments: Arc<dyn PaymentProvider>,
    ) -> AppResult<Self> {
        let settings = Arc::new(settings);
        let db = DbService::new(&config.db_path()).await?;
        let orders = Arc::new(OrderService::new(
            db.pool.clone(),
            settings.clone(),
            bus.clone(),
            payments,
            config.telegram_chat_id,
        ));
        Ok(Self {
            config: Arc::new(config),
            settings,
            db,
            bus,
            orders,
        })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.db.pool
    }
}
