//! 服务器配置
//!
//! Two layers: process-level `Config` from environment variables, and the
//! restaurant `Settings` document (zones, working hours, POS mapping) loaded
//! from a JSON file so operators can edit it without a redeploy.
//!
//! # 环境变量
//!
//! | 环境变量 | 默认值 | 说明 |
//! |----------|--------|------|
//! | WORK_DIR | /var/lib/dispatch | 工作目录 (数据库、日志) |
//! | HTTP_PORT | 3000 | HTTP 服务端口 |
//! | SETTINGS_PATH | <WORK_DIR>/settings.json | 餐厅设置文件 |
//! | SYRVE_API_URL | https://api-eu.syrve.live/api/1 | POS API 地址 |
//! | SYRVE_API_KEY | (empty) | POS API 密钥 |
//! | PAYMENT_API_URL | https://api.monobank.ua | 收单 API 地址 |
//! | PAYMENT_TOKEN | (empty) | 收单令牌 |
//! | TELEGRAM_CHAT_ID | 0 | 默认通知频道 |

use crate::utils::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use shared::models::{DeliveryZone, GeoPoint, WorkingHours};
use std::collections::HashMap;
use std::path::Path;

#[derive(Debug, Clone)]
pub struct Config {
    /// 工作目录
    pub work_dir: String,
    /// HTTP API 服务端口
    pub http_port: u16,
    /// 运行环境: development | production
    pub environment: String,
    /// 餐厅设置文件路径
    pub settings_path: String,

    // === POS (Syrve) ===
    pub syrve_api_url: String,
    pub syrve_api_key: String,
    /// POS 请求超时(秒)
    pub syrve_timeout_secs: u64,

    // === 收单 (acquirer) ===
    pub payment_api_url: String,
    pub payment_token: String,
    /// 付款完成后的跳转地址
    pub payment_redirect_url: String,
    /// 收单回调到本服务的地址
    pub payment_webhook_url: String,

    // === 出租车配送 ===
    pub taxi_api_url: String,
    pub taxi_token: String,

    // === 通知 ===
    pub telegram_chat_id: i64,

    /// 停售清单中消失的商品是否恢复为无限库存。
    /// POS 语义不明确，默认关闭，仅记录计数。
    pub stoplist_reset_missing: bool,
}

impl Config {
    pub fn from_env() -> Self {
        let work_dir = std::env::var("WORK_DIR").unwrap_or_else(|_| "/var/lib/dispatch".into());
        let settings_path = std::env::var("SETTINGS_PATH")
            .unwrap_or_else(|_| format!("{work_dir}/settings.json"));
        Self {
            http_port: std::env::var("HTTP_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(3000),
            environment: std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into()),
            settings_path,
            syrve_api_url: std::env::var("SYRVE_API_URL")
                .unwrap_or_else(|_| "https://api-eu.syrve.live/api/1".into()),
            syrve_api_key: std::env::var("SYRVE_API_KEY").unwrap_or_default(),
            syrve_timeout_secs: std::env::var("SYRVE_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(15),
            payment_api_url: std::env::var("PAYMENT_API_URL")
                .unwrap_or_else(|_| "https://api.monobank.ua".into()),
            payment_token: std::env::var("PAYMENT_TOKEN").unwrap_or_default(),
            payment_redirect_url: std::env::var("PAYMENT_REDIRECT_URL").unwrap_or_default(),
            payment_webhook_url: std::env::var("PAYMENT_WEBHOOK_URL").unwrap_or_default(),
            taxi_api_url: std::env::var("TAXI_API_URL")
                .unwrap_or_else(|_| "https://ontaxi.com.ua/api".into()),
            taxi_token: std::env::var("TAXI_TOKEN").unwrap_or_default(),
            telegram_chat_id: std::env::var("TELEGRAM_CHAT_ID")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(0),
            stoplist_reset_missing: std::env::var("STOPLIST_RESET_MISSING")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(false),
            work_dir,
        }
    }

    pub fn db_path(&self) -> String {
        format!("{}/dispatch.db", self.work_dir)
    }
}

/// Restaurant settings document. Read once at startup; reference data for
/// pricing and POS resolution.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    /// 配送中心点 (半径带的圆心)
    pub center: GeoPoint,
    #[serde(default)]
    pub zones: Vec<DeliveryZone>,
    #[serde(default)]
    pub working_hours: WorkingHours,
    /// 上门配送附加费
    #[serde(default)]
    pub door_delivery_price: f64,
    /// POS 配送区域 (restaurant section) 名称
    #[serde(default = "default_section_name")]
    pub pos_section_name: String,
    /// POS 订单类型名称
    #[serde(default = "default_order_type")]
    pub pos_order_type: String,
    /// Explicit internal-external-id -> POS-id mapping, consulted before
    /// any name heuristic during POS resolution.
    #[serde(default)]
    pub pos_mapping: HashMap<String, String>,
}

fn default_section_name() -> String {
    "Доставка".into()
}

fn default_order_type() -> String {
    "Доставка БРО".into()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            center: GeoPoint { lat: 0.0, lng: 0.0 },
            zones: Vec::new(),
            working_hours: WorkingHours::default(),
            door_delivery_price: 0.0,
            pos_section_name: default_section_name(),
            pos_order_type: default_order_type(),
            pos_mapping: HashMap::new(),
        }
    }
}

impl Settings {
    /// Load from the configured JSON file; a missing file yields defaults
    /// so a fresh install can boot before settings are provisioned.
    pub fn load(path: &str) -> AppResult<Self> {
        if !Path::new(path).exists() {
            tracing::warn!(path, "Settings file not found, using defaults");
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(path)
            .map_err(|e| AppError::internal(format!("Failed to read settings: {e}")))?;
        serde_json::from_str(&raw)
            .map_err(|e| AppError::internal(format!("Invalid settings file: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn settings_parse_with_defaults() {
        let raw = r#"{
            "center": {"lat": 50.45, "lng": 30.52},
            "zones": [
                {"name": "near", "price": 60, "freeOrderPrice": 800, "radius": 3.0}
            ]
        }"#;
        let s: Settings = serde_json::from_str(raw).unwrap();
        assert_eq!(s.zones.len(), 1);
        assert_eq!(s.zones[0].inner_radius, 0.0);
        assert_eq!(s.zones[0].outer_radius, 3.0);
        assert_eq!(s.pos_section_name, "Доставка");
        assert!(s.pos_mapping.is_empty());
    }
}
