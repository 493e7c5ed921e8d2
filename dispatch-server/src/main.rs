use dispatch_server::{init_logger_with_file, Config, Server};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. 环境与日志
    dotenv::dotenv().ok();
    let config = Config::from_env();
    std::fs::create_dir_all(&config.work_dir)?;
    init_logger_with_file(
        std::env::var("LOG_LEVEL").ok().as_deref(),
        Some(&config.work_dir),
    );

    tracing::info!(environment = %config.environment, "🚀 Dispatch server starting...");

    // 2. 启动 HTTP 服务器 (Server::run 会自动启动后台 worker)
    let server = Server::new(config);
    if let Err(e) = server.run().await {
        tracing::error!("Server error: {e}");
        return Err(e.into());
    }

    Ok(())
}
