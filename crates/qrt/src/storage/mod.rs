//! 短链映射存储模块
//!
//! 提供多种存储后端支持：内存（默认）、Redis
//!
//! # 设计
//!
//! - `ShortIdBackend` trait 定义统一的异步接口
//! - `ShortIdStore` enum 封装不同的后端实现
//! - 通过 `StorageConfig` 配置选择和初始化后端

pub mod backend;
pub mod config;

// 内存后端始终可用
pub mod memory;

#[cfg(feature = "backend-redis")]
pub mod redis;

use crate::error::{QrtError, QrtResult};

pub use backend::ShortIdBackend;
pub use config::{RedisConfig, StorageBackend, StorageConfig};

use memory::MemoryBackend;

#[cfg(feature = "backend-redis")]
use redis::RedisBackend;

/// 短链映射存储统一接口
///
/// 使用 enum 而不是 trait object 的好处：
/// - 零成本抽象（无虚函数调用）
/// - 可以 Clone
/// - 编译期类型检查
#[derive(Clone, Debug)]
pub enum ShortIdStore {
    /// 内存存储后端（始终可用）
    Memory(MemoryBackend),

    /// Redis 存储后端
    #[cfg(feature = "backend-redis")]
    Redis(RedisBackend),
}

impl ShortIdStore {
    /// 从配置创建存储实例
    ///
    /// # Errors
    /// - 缺少对应后端的配置
    /// - 后端初始化失败
    /// - 后端功能未启用（feature flag）
    pub async fn from_config(config: &StorageConfig) -> QrtResult<Self> {
        match config.backend {
            StorageBackend::Memory => {
                let backend = MemoryBackend::new();
                backend.init().await?;
                Ok(Self::Memory(backend))
            }

            #[cfg(feature = "backend-redis")]
            StorageBackend::Redis => {
                let cfg = config
                    .redis
                    .as_ref()
                    .ok_or_else(|| QrtError::Config("Missing Redis config".into()))?;
                let backend = RedisBackend::new(cfg).await?;
                backend.init().await?;
                Ok(Self::Redis(backend))
            }

            #[cfg(not(feature = "backend-redis"))]
            StorageBackend::Redis => Err(QrtError::Config(
                "Redis backend not enabled. Compile with --features backend-redis".into(),
            )),
        }
    }

    /// 存储短链映射
    pub async fn store(&self, short_id: &str, token: &str, ttl_seconds: u64) -> QrtResult<()> {
        match self {
            Self::Memory(b) => b.store(short_id, token, ttl_seconds).await,

            #[cfg(feature = "backend-redis")]
            Self::Redis(b) => b.store(short_id, token, ttl_seconds).await,
        }
    }

    /// 解析短链 ID
    pub async fn resolve(&self, short_id: &str) -> QrtResult<Option<String>> {
        match self {
            Self::Memory(b) => b.resolve(short_id).await,

            #[cfg(feature = "backend-redis")]
            Self::Redis(b) => b.resolve(short_id).await,
        }
    }

    /// 当前映射条数
    pub async fn entry_count(&self) -> QrtResult<u64> {
        match self {
            Self::Memory(b) => b.entry_count().await,

            #[cfg(feature = "backend-redis")]
            Self::Redis(b) => b.entry_count().await,
        }
    }

    /// 清理过期映射
    pub async fn cleanup_expired(&self) -> QrtResult<u64> {
        match self {
            Self::Memory(b) => b.cleanup_expired().await,

            #[cfg(feature = "backend-redis")]
            Self::Redis(b) => b.cleanup_expired().await,
        }
    }

    /// 获取后端类型名称
    pub fn backend_name(&self) -> &'static str {
        match self {
            Self::Memory(_) => "Memory",

            #[cfg(feature = "backend-redis")]
            Self::Redis(_) => "Redis",
        }
    }
}
