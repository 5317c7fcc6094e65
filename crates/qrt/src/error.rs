//! QRT 服务错误类型
//!
//! 错误分为两类：
//! - 客户端可见错误（400/401/404），返回固定的提示消息
//! - 内部错误（500），记录日志但对外只返回通用消息

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// QRT 服务错误
#[derive(Debug, Error)]
pub enum QrtError {
    // ========== 请求错误 ==========
    /// 请求参数非法
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// 密文或凭证格式损坏（无法解码/解析/认证）
    #[error("Malformed token data")]
    Malformed,

    /// 二维码已过期
    #[error("QR code has expired")]
    QrExpired,

    /// 访问窗口已过期
    #[error("Access window has expired")]
    AccessExpired,

    // ========== 认证错误 ==========
    /// 凭证签名校验失败
    #[error("Token signature verification failed")]
    SignatureInvalid,

    /// 凭证已过期
    #[error("Token has expired")]
    TokenExpired,

    // ========== 资源错误 ==========
    /// 短链 ID 不存在或已过期
    #[error("Resource not found")]
    NotFound,

    // ========== 内部错误 ==========
    /// 加解密内部错误
    #[error("Crypto error: {0}")]
    Crypto(String),

    /// 存储后端错误
    #[error("Storage error: {0}")]
    Storage(String),

    /// 配置错误
    #[error("Configuration error: {0}")]
    Config(String),

    /// 其他内部错误
    #[error("Internal error: {0}")]
    Internal(String),
}

pub type QrtResult<T> = Result<T, QrtError>;

impl IntoResponse for QrtError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            QrtError::InvalidRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            QrtError::Malformed => (StatusCode::BAD_REQUEST, "Invalid token data".to_string()),
            QrtError::QrExpired => (StatusCode::BAD_REQUEST, "QR code has expired".to_string()),
            QrtError::AccessExpired => (
                StatusCode::BAD_REQUEST,
                "Access window has expired".to_string(),
            ),
            // 签名无效和凭证过期统一返回认证失败，不泄露具体原因
            QrtError::SignatureInvalid | QrtError::TokenExpired => {
                (StatusCode::UNAUTHORIZED, "Authentication failed".to_string())
            }
            QrtError::NotFound => (StatusCode::NOT_FOUND, "Resource not found".to_string()),
            QrtError::Crypto(msg)
            | QrtError::Storage(msg)
            | QrtError::Config(msg)
            | QrtError::Internal(msg) => {
                // 内部细节只进日志，不进响应体
                tracing::error!("QRT internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": message,
            "code": status.as_u16(),
        }));

        (status, body).into_response()
    }
}
