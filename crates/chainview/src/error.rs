//! Chainview 服务错误类型

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// Chainview 服务错误
#[derive(Debug, Error)]
pub enum ChainviewError {
    /// 合约地址格式非法
    #[error("Invalid contract address: {0}")]
    InvalidAddress(String),

    /// RPC 调用失败（节点不可达、调用 revert 等）
    #[error("RPC call failed: {0}")]
    Rpc(String),

    /// 链上数据解码失败（结构不符合预期）
    #[error("Failed to decode chain data: {0}")]
    Decode(String),

    /// 配置错误
    #[error("Configuration error: {0}")]
    Config(String),

    /// 其他内部错误
    #[error("Internal error: {0}")]
    Internal(String),
}

pub type ChainviewResult<T> = Result<T, ChainviewError>;

impl IntoResponse for ChainviewError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ChainviewError::InvalidAddress(msg) => (
                StatusCode::BAD_REQUEST,
                format!("Invalid contract address: {msg}"),
            ),
            ChainviewError::Rpc(msg) => {
                tracing::warn!("Chain RPC failure: {}", msg);
                (
                    StatusCode::BAD_GATEWAY,
                    "Upstream chain node unavailable".to_string(),
                )
            }
            ChainviewError::Decode(msg) => {
                tracing::error!("Chain data decode failure: {}", msg);
                (
                    StatusCode::BAD_GATEWAY,
                    "Unexpected chain data format".to_string(),
                )
            }
            ChainviewError::Config(msg) | ChainviewError::Internal(msg) => {
                tracing::error!("Chainview internal error: {}", msg);
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_address_is_client_error() {
        let resp = ChainviewError::InvalidAddress("0xzz".to_string()).into_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_rpc_failure_is_bad_gateway() {
        let resp = ChainviewError::Rpc("connection refused".to_string()).into_response();
        assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn test_decode_failure_is_bad_gateway() {
        // 上游返回无法解读的数据，归因于上游
        let resp = ChainviewError::Decode("unknown task status 9".to_string()).into_response();
        assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn test_internal_errors_are_masked() {
        let resp = ChainviewError::Internal("details".to_string()).into_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
