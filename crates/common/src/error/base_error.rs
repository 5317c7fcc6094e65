//! 顶层错误枚举
//!
//! 聚合所有子模块的错误类型，提供统一的错误处理接口

use super::{ConfigError, ValidationError};
use thiserror::Error;

/// 顶层错误枚举，聚合基础设施层的错误
#[derive(Error, Debug)]
pub enum BaseError {
    // ========== 基础设施错误 ==========
    /// 配置错误
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    // ========== 通用错误 ==========
    /// IO 错误
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// 序列化错误
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// 验证错误
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// 通用错误（用于不适合其他类别的错误）
    #[error("General error: {message}")]
    General { message: String },

    /// 内部错误（通常表示编程错误）
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl BaseError {
    /// 创建通用错误
    pub fn general(message: impl Into<String>) -> Self {
        Self::General {
            message: message.into(),
        }
    }

    /// 创建内部错误
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_wraps_into_base() {
        let err: BaseError = ConfigError::missing_secret("qrt", "signing").into();
        assert!(matches!(err, BaseError::Config(_)));
        assert!(err.to_string().contains("signing"));
    }

    #[test]
    fn test_general_constructor() {
        let err = BaseError::general("bind failed");
        assert_eq!(err.to_string(), "General error: bind failed");
    }
}

/// 统一的 Result 类型
pub type Result<T> = std::result::Result<T, BaseError>;
