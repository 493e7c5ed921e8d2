//! Server Implementation
//!
//! HTTP 服务器启动和管理

use crate::api;
use crate::core::{BackgroundTasks, Config, ServerState};
use crate::utils::{AppError, AppResult};

pub struct Server {
    config: Config,
}

impl Server {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    pub async fn run(self) -> AppResult<()> {
        let state = ServerState::new(self.config).await?;
        let tasks = BackgroundTasks::spawn_all(&state)?;

        let addr = std::net::SocketAddr::from(([0, 0, 0, 0], state.config.http_port));
        let router = api::router(state.clone());

        tracing::info!("🚀 Dispatch server starting on {addr}");
        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|e| AppError::internal(format!("Failed to bind {addr}: {e}")))?;

        axum::serve(listener, router)
            .with_graceful_shutdown(async {
                let _ = tokio::signal::ctrl_c().await;
                tracing::info!("Shutting down...");
            })
            .await
            .map_err(|e| AppError::internal(format!("HTTP server failed: {e}")))?;

        tasks.shutdown().await;
        Ok(())
    }
}
