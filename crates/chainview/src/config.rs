//! Chainview 服务配置

use serde::{Deserialize, Serialize};

/// Chainview 服务配置
///
/// Service enable/disable is controlled by the bitmask in AgrixConfig.enable.
/// The ENABLE_CHAINVIEW bit (bit 1) must be set to enable this service.
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct ChainviewServiceConfig {
    /// 区块链 RPC 端点 URL
    ///
    /// 例如：https://sepolia.infura.io/v3/<project-id>
    #[serde(default)]
    pub rpc_url: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_from_toml() {
        let toml_str = r#"
            rpc_url = "https://sepolia.example.org/rpc"
        "#;

        let config: ChainviewServiceConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.rpc_url, "https://sepolia.example.org/rpc");
    }

    #[test]
    fn test_default_is_empty() {
        let config = ChainviewServiceConfig::default();
        assert!(config.rpc_url.is_empty());
    }
}
