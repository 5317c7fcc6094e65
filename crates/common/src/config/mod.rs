//! 统一配置管理系统
//!
//! 本模块是 Agrix 辅助服务配置的"单一真理之源"。
//! 所有配置项的定义、文档、默认值都在这里统一管理。

pub mod bind;
pub mod services;

pub use crate::config::bind::{BindConfig, HttpBindConfig};
pub use crate::config::services::ServicesConfig;
use serde::{Deserialize, Serialize};

/// Agrix 辅助服务的主配置结构体
///
/// 这是系统的核心配置，包含了所有服务的配置信息。
/// 配置文件使用 TOML 格式，支持完整的类型安全加载。
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AgrixConfig {
    /// Service enable flags (bitmask) - Primary switch for all services
    ///
    /// This is the primary control mechanism for enabling services. Each service
    /// must have its corresponding bit set in this mask to be enabled.
    ///
    /// Bit positions:
    /// - Bit 0 (1): QRT service (QR provenance tokens)
    /// - Bit 1 (2): Chainview service (on-chain plan reader)
    ///
    /// Examples:
    /// - `enable = 3` enables both services (1+2=3)
    /// - `enable = 1` enables QRT only
    #[serde(default = "default_enable")]
    pub enable: u8,

    /// 服务器实例名称
    ///
    /// 用于标识不同的服务器实例，在集群部署中用于区分节点。
    /// 建议使用有意义的命名规则，如：agrix-01, agrix-prod-east-1 等。
    pub name: String,

    /// 运行环境标识
    ///
    /// 指定当前运行环境，影响安全策略和默认行为：
    /// - "dev": 开发环境，校验较松
    /// - "prod": 生产环境，严格的安全检查
    /// - "test": 测试环境，用于自动化测试
    pub env: String,

    /// PID 文件路径（可选）
    ///
    /// 用于存储进程 ID 的文件路径。系统管理工具可以使用此文件
    /// 来监控和管理服务进程。
    pub pid: Option<String>,

    /// 网络绑定配置
    #[serde(default)]
    pub bind: BindConfig,

    /// 位置标签
    ///
    /// 用于标识服务器的地理位置或逻辑分组，便于运维管理和监控。
    /// 例如：cn-east-1, farm-hub-01
    #[serde(default = "default_location_tag")]
    pub location_tag: String,

    /// 服务配置集合
    ///
    /// 包含所有业务服务的配置，每个服务可以独立配置自己的参数和依赖。
    #[serde(default)]
    pub services: ServicesConfig,

    /// 可观测性配置（日志）
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

/// 可观测性配置
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ObservabilityConfig {
    /// 过滤级别
    ///
    /// 支持 EnvFilter 语法（如 "info,hyper=warn"）。默认值 "info"。
    #[serde(default = "default_filter_level")]
    pub filter_level: String,

    #[serde(default)]
    pub log: LogConfig,
}

/// 日志配置
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct LogConfig {
    /// 日志输出目标
    ///
    /// 控制日志输出位置：
    /// - "console": 仅输出到控制台（默认）
    /// - "file": 输出到文件
    #[serde(default = "default_log_output")]
    pub output: String,

    /// 日志轮转开关
    ///
    /// 当 output = "file" 时有效：
    /// - true: 按天轮转日志文件
    /// - false: 追加到单个文件
    #[serde(default)]
    pub rotate: bool,

    /// 日志文件路径
    ///
    /// 当 output = "file" 时有效
    #[serde(default = "default_log_path")]
    pub path: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            filter_level: default_filter_level(),
            log: LogConfig::default(),
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            output: default_log_output(),
            rotate: false,
            path: default_log_path(),
        }
    }
}

fn default_enable() -> u8 {
    1 // 默认仅启用 QRT 服务
}

fn default_log_output() -> String {
    "console".to_string()
}

fn default_log_path() -> String {
    "logs/".to_string()
}

fn default_filter_level() -> String {
    "info".to_string()
}

fn default_location_tag() -> String {
    "default-location".to_string()
}

impl Default for AgrixConfig {
    fn default() -> Self {
        Self {
            enable: default_enable(),
            name: "agrix-default".to_string(),
            env: "dev".to_string(),
            pid: Some("logs/agrix.pid".to_string()),
            bind: BindConfig::default(),
            location_tag: default_location_tag(),
            services: ServicesConfig::default(),
            observability: ObservabilityConfig::default(),
        }
    }
}

// 服务启用标志位常量
pub const ENABLE_QRT: u8 = 0b01;
pub const ENABLE_CHAINVIEW: u8 = 0b10;

impl AgrixConfig {
    /// 检查是否启用了 QRT 凭证服务
    ///
    /// Service is enabled if the ENABLE_QRT bit is set in the enable bitmask.
    pub fn is_qrt_enabled(&self) -> bool {
        self.enable & ENABLE_QRT != 0
    }

    /// 检查是否启用了 Chainview 链上读取服务
    pub fn is_chainview_enabled(&self) -> bool {
        self.enable & ENABLE_CHAINVIEW != 0
    }

    /// 获取 PID 文件路径，如果没有配置则使用默认值
    pub fn get_pid_path(&self) -> Option<String> {
        self.pid
            .clone()
            .or_else(|| Some("logs/agrix.pid".to_string()))
    }

    /// 返回可观测性配置引用
    pub fn observability_config(&self) -> &ObservabilityConfig {
        &self.observability
    }

    /// 返回日志配置引用
    pub fn log_config(&self) -> &LogConfig {
        &self.observability.log
    }

    /// 检查是否使用控制台日志输出
    pub fn is_console_logging(&self) -> bool {
        self.observability.log.output == "console"
    }

    /// 检查是否应该轮转日志
    pub fn should_rotate_logs(&self) -> bool {
        self.observability.log.output == "file" && self.observability.log.rotate
    }

    /// 从文件加载配置
    pub fn from_file<P: AsRef<std::path::Path>>(
        path: P,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let path_ref = path.as_ref();

        // Check if file exists
        if !path_ref.exists() {
            return Err(format!("Configuration file does not exist: {path_ref:?}").into());
        }

        // Check if path is a file, not a directory
        if !path_ref.is_file() {
            return Err(format!("Path is not a valid file: {path_ref:?}").into());
        }

        let content = std::fs::read_to_string(path_ref)?;
        let config: AgrixConfig = toml::from_str(&content)?;

        Ok(config)
    }

    /// 从 TOML 字符串加载配置
    pub fn from_toml(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// 将配置序列化为 TOML 字符串
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string(self)
    }

    /// 验证配置有效性
    ///
    /// 检查所有配置项的合法性，包括：
    /// - 必需字段是否存在
    /// - 数值范围是否合理
    /// - 启用的服务是否有对应配置段
    ///
    /// 以 "Warning:" 开头的条目为警告，不阻止启动；其余为关键错误。
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        // 验证位掩码值范围 (0-3, 2 bits)
        if self.enable > 3 {
            errors.push(format!(
                "Invalid enable bitmask value: {}. Must be between 0 and 3 (2 bits)",
                self.enable
            ));
        }

        if self.enable == 0 {
            errors.push("Warning: no services enabled (enable = 0)".to_string());
        }

        if self.name.trim().is_empty() {
            errors.push("Instance name cannot be empty".to_string());
        }

        match self.env.as_str() {
            "dev" | "prod" | "test" => {}
            other => errors.push(format!(
                "Invalid env value '{other}': must be one of dev, prod, test"
            )),
        }

        if self.bind.http.port == 0 {
            errors.push("bind.http.port cannot be 0".to_string());
        }

        // QRT 服务校验
        if self.is_qrt_enabled() {
            match &self.services.qrt {
                None => {
                    errors.push(
                        "QRT service is enabled but [services.qrt] section is missing".to_string(),
                    );
                }
                Some(qrt_config) => {
                    // 密钥必须显式配置，缺省时拒绝启动
                    if qrt_config.encryption.source().is_none() {
                        errors.push(
                            "QRT encryption secret is not configured: set one of \
                             services.qrt.encryption.{secret, secret_env, secret_file}"
                                .to_string(),
                        );
                    }
                    if qrt_config.signing.source().is_none() {
                        errors.push(
                            "QRT signing secret is not configured: set one of \
                             services.qrt.signing.{secret, secret_env, secret_file}"
                                .to_string(),
                        );
                    }

                    // 内存后端的短链映射不跨实例共享
                    if self.env == "prod"
                        && qrt_config.storage.backend == qrt::storage::StorageBackend::Memory
                    {
                        errors.push(
                            "Warning: memory short-id backend in prod; mappings are lost on \
                             restart and are not shared across instances"
                                .to_string(),
                        );
                    }
                }
            }
        }

        // Chainview 服务校验
        if self.is_chainview_enabled() {
            match &self.services.chainview {
                None => {
                    errors.push(
                        "Chainview service is enabled but [services.chainview] section is missing"
                            .to_string(),
                    );
                }
                Some(chainview_config) => {
                    if chainview_config.rpc_url.trim().is_empty() {
                        errors.push("services.chainview.rpc_url cannot be empty".to_string());
                    }
                }
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal_qrt_toml() -> &'static str {
        r#"
            enable = 1
            name = "agrix-test"
            env = "test"

            [bind.http]
            domain_name = "localhost"
            ip = "127.0.0.1"
            port = 8080

            [services.qrt]
            [services.qrt.encryption]
            secret_env = "AGRIX_QR_SECRET"
            [services.qrt.signing]
            secret_env = "AGRIX_SIGNING_SECRET"
            [services.qrt.storage]
            backend = "memory"
            short_id_ttl_seconds = 3600
        "#
    }

    #[test]
    fn test_default_config() {
        let config = AgrixConfig::default();
        assert!(config.is_qrt_enabled());
        assert!(!config.is_chainview_enabled());
    }

    #[test]
    fn test_enable_bitmask() {
        let mut config = AgrixConfig::default();
        config.enable = ENABLE_QRT | ENABLE_CHAINVIEW;
        assert!(config.is_qrt_enabled());
        assert!(config.is_chainview_enabled());

        config.enable = ENABLE_CHAINVIEW;
        assert!(!config.is_qrt_enabled());
        assert!(config.is_chainview_enabled());
    }

    #[test]
    fn test_parse_minimal_config() {
        let config = AgrixConfig::from_toml(minimal_qrt_toml()).unwrap();
        assert_eq!(config.name, "agrix-test");
        assert!(config.is_qrt_enabled());
        assert!(config.services.qrt.is_some());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_missing_qrt_section() {
        let toml_str = r#"
            enable = 1
            name = "agrix-test"
            env = "test"
        "#;

        let config = AgrixConfig::from_toml(toml_str).unwrap();
        let errors = config.validate().unwrap_err();
        assert!(
            errors
                .iter()
                .any(|e| e.contains("[services.qrt] section is missing"))
        );
    }

    #[test]
    fn test_validate_missing_secrets() {
        let toml_str = r#"
            enable = 1
            name = "agrix-test"
            env = "test"

            [services.qrt]
        "#;

        let config = AgrixConfig::from_toml(toml_str).unwrap();
        let errors = config.validate().unwrap_err();
        assert!(errors.iter().any(|e| e.contains("encryption secret")));
        assert!(errors.iter().any(|e| e.contains("signing secret")));
    }

    #[test]
    fn test_validate_memory_backend_prod_warning() {
        let mut config = AgrixConfig::from_toml(minimal_qrt_toml()).unwrap();
        config.env = "prod".to_string();

        let errors = config.validate().unwrap_err();
        assert!(errors.iter().any(|e| e.starts_with("Warning:")));
        // 只有警告，没有关键错误
        assert!(errors.iter().all(|e| e.starts_with("Warning:")));
    }

    #[test]
    fn test_validate_chainview_requires_rpc_url() {
        let toml_str = r#"
            enable = 2
            name = "agrix-test"
            env = "test"

            [services.chainview]
            rpc_url = ""
        "#;

        let config = AgrixConfig::from_toml(toml_str).unwrap();
        let errors = config.validate().unwrap_err();
        assert!(errors.iter().any(|e| e.contains("rpc_url")));
    }

    #[test]
    fn test_invalid_bitmask_rejected() {
        let mut config = AgrixConfig::from_toml(minimal_qrt_toml()).unwrap();
        config.enable = 7;
        let errors = config.validate().unwrap_err();
        assert!(errors.iter().any(|e| e.contains("bitmask")));
    }

    #[test]
    fn test_roundtrip_toml() {
        let config = AgrixConfig::from_toml(minimal_qrt_toml()).unwrap();
        let serialized = config.to_toml().unwrap();
        let reparsed = AgrixConfig::from_toml(&serialized).unwrap();
        assert_eq!(reparsed.name, config.name);
        assert_eq!(reparsed.enable, config.enable);
    }
}
