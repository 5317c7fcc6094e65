//! QRT 服务配置
//!
//! QRT 服务为农产品溯源二维码提供负载加解密、签名凭证颁发和短链映射功能

use crate::crypto::SecretSource;
use crate::storage::StorageConfig;
use serde::{Deserialize, Serialize};

/// QRT 服务配置
///
/// Service enable/disable is controlled by the bitmask in AgrixConfig.enable.
/// The ENABLE_QRT bit (bit 0) must be set to enable this service.
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct QrtServiceConfig {
    /// 短链映射存储配置
    #[serde(default)]
    pub storage: StorageConfig,

    /// 二维码负载加密密钥配置
    ///
    /// 必须配置，否则服务拒绝启动
    #[serde(default)]
    pub encryption: SecretConfig,

    /// 访问凭证签名密钥配置
    ///
    /// 必须配置，否则服务拒绝启动
    #[serde(default)]
    pub signing: SecretConfig,
}

/// 密钥配置
///
/// 支持三种来源，优先级: secret_file > secret_env > secret。
/// 三者都未配置时 source() 返回 None，启动校验会将其视为致命错误。
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct SecretConfig {
    /// 直接配置密钥
    ///
    /// 注意：直接在配置文件中存储密钥不够安全，生产环境建议使用 secret_env 或 secret_file
    #[serde(default)]
    pub secret: Option<String>,

    /// 从指定的环境变量读取密钥
    ///
    /// 例如：secret_env = "AGRIX_QR_SECRET"
    #[serde(default)]
    pub secret_env: Option<String>,

    /// 从文件读取密钥
    ///
    /// 文件权限应设置为 600 (仅所有者可读写)
    #[serde(default)]
    pub secret_file: Option<String>,
}

impl SecretConfig {
    /// 获取密钥来源
    ///
    /// 优先级: secret_file > secret_env > secret
    pub fn source(&self) -> Option<SecretSource> {
        if let Some(path) = &self.secret_file {
            return Some(SecretSource::File(path.clone()));
        }

        if let Some(env_var) = &self.secret_env {
            return Some(SecretSource::Environment(env_var.clone()));
        }

        if let Some(secret) = &self.secret {
            return Some(SecretSource::Direct(secret.clone()));
        }

        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::StorageBackend;

    #[test]
    fn test_default_qrt_service_config() {
        let config = QrtServiceConfig::default();
        assert_eq!(config.storage.backend, StorageBackend::Memory);
        assert!(config.encryption.source().is_none());
        assert!(config.signing.source().is_none());
    }

    #[test]
    fn test_secret_source_priority() {
        // 未配置密钥
        let config = SecretConfig::default();
        assert!(config.source().is_none());

        // 仅配置 secret
        let config = SecretConfig {
            secret: Some("inline-secret".to_string()),
            ..Default::default()
        };
        match config.source() {
            Some(SecretSource::Direct(s)) => assert_eq!(s, "inline-secret"),
            _ => panic!("Expected Direct secret source"),
        }

        // 配置 secret 和 secret_env，优先使用 secret_env
        let config = SecretConfig {
            secret: Some("inline-secret".to_string()),
            secret_env: Some("TEST_ENV".to_string()),
            ..Default::default()
        };
        match config.source() {
            Some(SecretSource::Environment(e)) => assert_eq!(e, "TEST_ENV"),
            _ => panic!("Expected Environment secret source"),
        }

        // 配置所有三个，优先使用 secret_file
        let config = SecretConfig {
            secret: Some("inline-secret".to_string()),
            secret_env: Some("TEST_ENV".to_string()),
            secret_file: Some("/path/to/secret".to_string()),
        };
        match config.source() {
            Some(SecretSource::File(f)) => assert_eq!(f, "/path/to/secret"),
            _ => panic!("Expected File secret source"),
        }
    }

    #[test]
    fn test_deserialize_from_toml() {
        let toml_str = r#"
            [encryption]
            secret_env = "AGRIX_QR_SECRET"

            [signing]
            secret_file = "/etc/agrix/signing.key"

            [storage]
            backend = "memory"
            short_id_ttl_seconds = 7200
        "#;

        let config: QrtServiceConfig = toml::from_str(toml_str).unwrap();
        assert!(matches!(
            config.encryption.source(),
            Some(SecretSource::Environment(_))
        ));
        assert!(matches!(
            config.signing.source(),
            Some(SecretSource::File(_))
        ));
        assert_eq!(config.storage.short_id_ttl_seconds, 7200);
    }
}
