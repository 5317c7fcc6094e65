//! 配置相关错误类型
//!
//! 定义所有与配置解析、验证、加载相关的错误

use thiserror::Error;

/// 配置相关错误
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid configuration format: {message}")]
    InvalidFormat { message: String },

    #[error("Missing required field: {field}")]
    MissingField { field: String },

    #[error("Invalid value for field '{field}': {value}")]
    InvalidValue { field: String, value: String },

    #[error("Configuration file not found: {path}")]
    FileNotFound { path: String },

    #[error("Failed to parse configuration: {source}")]
    ParseError {
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// 启用的服务缺少密钥配置（encryption/signing）
    #[error("Missing secret for service '{service}': {role}")]
    MissingSecret { service: String, role: String },

    /// enable 位掩码超出已定义的服务位范围
    #[error("Invalid enable bitmask: {value} (max {max})")]
    InvalidEnableBitmask { value: u8, max: u8 },

    #[error("Environment variable error: {var}")]
    EnvError { var: String },
}

impl ConfigError {
    /// 便捷构造：启用服务缺少密钥
    pub fn missing_secret(service: impl Into<String>, role: impl Into<String>) -> Self {
        Self::MissingSecret {
            service: service.into(),
            role: role.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_secret_display() {
        let err = ConfigError::missing_secret("qrt", "encryption");
        assert_eq!(
            err.to_string(),
            "Missing secret for service 'qrt': encryption"
        );
    }

    #[test]
    fn test_bitmask_display() {
        let err = ConfigError::InvalidEnableBitmask { value: 7, max: 3 };
        assert!(err.to_string().contains("7"));
    }
}
