//! 短链映射存储后端统一接口

use crate::error::QrtResult;
use async_trait::async_trait;

/// 短链映射存储后端接口
///
/// 所有后端必须实现 TTL 语义：过期的映射对 resolve 不可见。
#[async_trait]
pub trait ShortIdBackend: Send + Sync {
    /// 初始化后端（建立连接、准备结构）
    async fn init(&self) -> QrtResult<()>;

    /// 存储短链映射
    ///
    /// `ttl_seconds` 为 0 时映射永不过期。
    async fn store(&self, short_id: &str, token: &str, ttl_seconds: u64) -> QrtResult<()>;

    /// 解析短链 ID，返回对应的凭证
    ///
    /// 不存在或已过期时返回 None。
    async fn resolve(&self, short_id: &str) -> QrtResult<Option<String>>;

    /// 当前存储的映射条数（含可能尚未清理的过期条目）
    async fn entry_count(&self) -> QrtResult<u64>;

    /// 清理过期映射，返回清理的条数
    async fn cleanup_expired(&self) -> QrtResult<u64>;
}
