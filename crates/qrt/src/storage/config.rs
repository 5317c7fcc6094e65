//! 短链映射存储配置

use serde::{Deserialize, Serialize};

/// 存储后端类型
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// 进程内内存存储（默认，重启后丢失）
    #[default]
    Memory,

    /// Redis 存储（跨实例共享，需要 backend-redis feature）
    Redis,
}

/// 短链映射存储配置
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct StorageConfig {
    /// 后端类型
    #[serde(default)]
    pub backend: StorageBackend,

    /// 短链映射有效期（秒），0 表示永不过期
    #[serde(default = "default_short_id_ttl")]
    pub short_id_ttl_seconds: u64,

    /// Redis 配置（backend = "redis" 时必需）
    #[serde(default)]
    pub redis: Option<RedisConfig>,
}

/// Redis 连接配置
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct RedisConfig {
    /// 连接 URL，例如 redis://localhost:6379/0
    pub url: String,

    /// 连接池大小
    #[serde(default = "default_pool_size")]
    pub pool_size: u32,

    /// 操作超时（毫秒）
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_short_id_ttl() -> u64 {
    24 * 60 * 60
}

fn default_pool_size() -> u32 {
    10
}

fn default_timeout_ms() -> u64 {
    5000
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::Memory,
            short_id_ttl_seconds: default_short_id_ttl(),
            redis: None,
        }
    }
}
