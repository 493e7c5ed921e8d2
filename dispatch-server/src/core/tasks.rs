//! 后台任务管理
//!
//! 统一管理所有队列 worker 的启动和关闭。
//! Each worker owns its own dependencies (HTTP clients, pool handles) and
//! is spawned with a child shutdown token; shutdown cancels all of them
//! and waits for the handles to drain.

use crate::core::ServerState;
use crate::payments::PaymentWorker;
use crate::pos::{OrderSubmitter, PosWorker, SyncWorker, SyrveClient};
use crate::stock::StockWorker;
use crate::taxi::{OnTaxiClient, TaxiProvider, TaxiWorker};
use crate::utils::AppResult;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

struct RegisteredTask {
    name: &'static str,
    handle: JoinHandle<()>,
}

pub struct BackgroundTasks {
    tasks: Vec<RegisteredTask>,
    shutdown: CancellationToken,
}

impl BackgroundTasks {
    /// Build every worker from the shared state and spawn it.
    pub fn spawn_all(state: &ServerState) -> AppResult<Self> {
        let shutdown = CancellationToken::new();
        let mut tasks = Vec::new();

        let mut spawn = |name: &'static str, handle: JoinHandle<()>| {
            tracing::info!(task = name, "Background task spawned");
            tasks.push(RegisteredTask { name, handle });
        };

        let payment = PaymentWorker::new(
            state.pool().clone(),
            state.bus.clone(),
            state.config.telegram_chat_id,
        );
        spawn("payment_worker", tokio::spawn(payment.run(shutdown.child_token())));

        // POS 客户端每个 worker 独立持有
        let submitter = OrderSubmitter::new(
            SyrveClient::new(&state.config)?,
            state.pool().clone(),
            state.settings.clone(),
        );
        let pos = PosWorker::new(submitter, state.bus.clone(), state.config.telegram_chat_id);
        spawn("pos_worker", tokio::spawn(pos.run(shutdown.child_token())));

        let sync = SyncWorker::new(SyrveClient::new(&state.config)?, state.bus.clone());
        spawn("sync_worker", tokio::spawn(sync.run(shutdown.child_token())));

        let stock = StockWorker::new(
            state.pool().clone(),
            state.bus.clone(),
            state.config.telegram_chat_id,
            state.config.stoplist_reset_missing,
        );
        spawn("stock_worker", tokio::spawn(stock.run(shutdown.child_token())));

        let taxi_client: Arc<dyn TaxiProvider> = Arc::new(OnTaxiClient::new(
            state.config.taxi_api_url.clone(),
            state.config.taxi_token.clone(),
        )?);
        let taxi = TaxiWorker::new(state.pool().clone(), state.bus.clone(), taxi_client);
        spawn("taxi_worker", tokio::spawn(taxi.run(shutdown.child_token())));

        Ok(Self { tasks, shutdown })
    }

    /// Cancel all workers and wait for them to finish.
    pub async fn shutdown(self) {
        self.shutdown.cancel();
        for task in self.tasks {
            if let Err(e) = task.handle.await {
                tracing::warn!(task = task.name, error = %e, "Background task join failed");
            } else {
                tracing::info!(task = task.name, "Background task stopped");
            }
        }
    }
}
