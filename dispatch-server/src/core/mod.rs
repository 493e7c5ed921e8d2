//! Core Module
//!
//! 配置、共享状态、HTTP 服务器和后台任务编排。

pub mod config;
pub mod server;
pub mod state;
pub mod tasks;

pub use config::{Config, Settings};
pub use server::Server;
pub use state::ServerState;
pub use tasks::BackgroundTasks;
