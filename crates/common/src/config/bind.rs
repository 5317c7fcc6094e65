//! 网络绑定配置

use serde::{Deserialize, Serialize};

/// HTTP 服务绑定配置
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct HttpBindConfig {
    /// 域名
    ///
    /// 服务绑定的域名，用于生成对外公布的 URL。
    pub domain_name: String,

    /// 绑定 IP 地址
    ///
    /// 服务实际绑定的网络接口 IP 地址。
    /// 通常使用 "0.0.0.0" 监听所有接口。
    pub ip: String,

    /// 绑定端口
    ///
    /// HTTP 服务监听的端口号。
    pub port: u16,
}

impl Default for HttpBindConfig {
    fn default() -> Self {
        Self {
            domain_name: "localhost".to_string(),
            ip: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

/// 网络绑定配置
///
/// 定义 HTTP 服务的网络绑定参数。
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct BindConfig {
    /// HTTP 服务绑定配置
    #[serde(default)]
    pub http: HttpBindConfig,
}
