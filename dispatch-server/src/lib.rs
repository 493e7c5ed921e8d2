//! Dispatch Server - 外卖订单调度后端
//!
//! # 架构概述
//!
//! 订单履约后端：客户下单、异步确认支付、同步到餐厅 POS，
//! 并把 POS 的停售清单镜像回本地目录。
//!
//! - **事件总线** (`bus`): at-least-once 内存队列，手动确认 + 死信
//! - **定价** (`pricing`): 营业时间校验、配送区域几何、权威计价
//! - **订单** (`orders`): 创建/管理流水线
//! - **支付** (`payments`): 发票创建 + pending→paid 对账 worker
//! - **POS 同步** (`pos`): 商品/修饰符解析、配送桌位选择、订单提交
//! - **库存** (`stock`): 停售清单对账
//! - **HTTP API** (`api`): 同步接口与 webhook 入口
//!
//! # 模块结构
//!
//! ```text
//! dispatch-server/src/
//! ├── core/          # 配置、状态、服务器、后台任务
//! ├── api/           # HTTP 路由和处理器
//! ├── bus/           # 事件总线
//! ├── db/            # 数据库层
//! ├── orders/        # 订单服务
//! ├── payments/      # 支付对账
//! ├── pos/           # POS 同步
//! ├── pricing/       # 定价与校验
//! ├── stock/         # 停售清单对账
//! ├── taxi/          # 配送出租车流程
//! └── utils/         # 错误、日志、响应
//! ```

pub mod api;
pub mod bus;
pub mod core;
pub mod db;
pub mod orders;
pub mod payments;
pub mod pos;
pub mod pricing;
pub mod stock;
pub mod taxi;
pub mod utils;

// Re-export 公共类型
pub use bus::EventBus;
pub use core::{BackgroundTasks, Config, Server, ServerState, Settings};
pub use orders::OrderService;
pub use utils::{AppError, AppResult};

// Re-export logger functions
pub use utils::logger::{init_logger, init_logger_with_file};
