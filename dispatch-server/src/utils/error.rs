//! 统一错误处理
//!
//! Application error taxonomy:
//! - validation errors (bad time, price mismatch, unresolved product/zone)
//!   are rejected synchronously with a 4xx and never retried;
//! - transient external errors (POS timeout, database down) are 5xx on the
//!   HTTP path and nack-for-redelivery on the queue path;
//! - permanent resolution failures abandon the async side effect but never
//!   invalidate the order itself.
//!
//! # 使用示例
//!
//! ```ignore
//! Err(AppError::not_found("Order not found"))
//! Ok(ok(data))
//! ```

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use tracing::error;

/// API 统一响应结构
///
/// ```json
/// {
///   "code": "E0000",
///   "message": "success",
///   "data": { ... }
/// }
/// ```
#[derive(Debug, Serialize)]
pub struct AppResponse<T> {
    /// 错误码 (E0000 表示成功)
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

/// Application error enum
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    // ========== Order validation (4xx, never retried) ==========
    #[error("Requested time is not available")]
    TimeNotAvailable,

    #[error("Prices have changed, expected {expected:.2}, got {got:.2}")]
    PriceMismatch { expected: f64, got: f64 },

    #[error("Product not found: {0}")]
    ProductNotFound(String),

    #[error("Address is outside the delivery area")]
    OutsideDeliveryZone,

    #[error("Validation failed: {0}")]
    Validation(String),

    // ========== Generic business errors (4xx) ==========
    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Resource already exists: {0}")]
    Conflict(String),

    // ========== External dependencies ==========
    #[error("POS error: {0}")]
    Pos(String),

    #[error("Payment provider error: {0}")]
    Payment(String),

    // ========== System errors (5xx) ==========
    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn pos(msg: impl Into<String>) -> Self {
        Self::Pos(msg.into())
    }

    pub fn database(msg: impl Into<String>) -> Self {
        Self::Database(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::TimeNotAvailable => {
                (StatusCode::BAD_REQUEST, "E1001", self.to_string())
            }
            AppError::PriceMismatch { .. } => {
                (StatusCode::UNPROCESSABLE_ENTITY, "E1002", self.to_string())
            }
            AppError::ProductNotFound(_) => {
                (StatusCode::BAD_REQUEST, "E1003", self.to_string())
            }
            AppError::OutsideDeliveryZone => {
                (StatusCode::UNPROCESSABLE_ENTITY, "E1004", self.to_string())
            }
            AppError::Validation(_) => (StatusCode::BAD_REQUEST, "E0002", self.to_string()),
            AppError::NotFound(_) => (StatusCode::NOT_FOUND, "E0003", self.to_string()),
            AppError::Conflict(_) => (StatusCode::CONFLICT, "E0004", self.to_string()),

            AppError::Pos(msg) => {
                error!(target: "pos", error = %msg, "POS call failed");
                (
                    StatusCode::BAD_GATEWAY,
                    "E8001",
                    "POS unavailable".to_string(),
                )
            }
            AppError::Payment(msg) => {
                error!(target: "payment", error = %msg, "Payment provider call failed");
                (
                    StatusCode::BAD_GATEWAY,
                    "E8002",
                    "Payment provider unavailable".to_string(),
                )
            }

            AppError::Database(msg) => {
                error!(target: "database", error = %msg, "Database error occurred");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "E9002",
                    "Database error".to_string(),
                )
            }
            AppError::Internal(msg) => {
                error!(target: "internal", error = %msg, "Internal error occurred");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "E9001",
                    "Internal server error".to_string(),
                )
            }
        };

        let body = Json(AppResponse::<()> {
            code: code.to_string(),
            message,
            data: None,
        });

        (status, body).into_response()
    }
}

impl From<crate::db::repository::RepoError> for AppError {
    fn from(e: crate::db::repository::RepoError) -> Self {
        use crate::db::repository::RepoError;
        match e {
            RepoError::NotFound(msg) => AppError::NotFound(msg),
            RepoError::Duplicate(msg) => AppError::Conflict(msg),
            RepoError::Validation(msg) => AppError::Validation(msg),
            RepoError::Database(msg) => AppError::Database(msg),
        }
    }
}

// ========== Helper functions ==========

/// Create a successful response
pub fn ok<T: Serialize>(data: T) -> Json<AppResponse<T>> {
    Json(AppResponse {
        code: "E0000".to_string(),
        message: "Success".to_string(),
        data: Some(data),
    })
}
