//! Redis 存储后端实现
//!
//! 使用 Redis 存储短链映射，支持多实例共享。TTL 由 Redis 自动管理。

use crate::error::{QrtError, QrtResult};
use crate::storage::backend::ShortIdBackend;
use crate::storage::config::RedisConfig;
use async_trait::async_trait;
use deadpool_redis::{Config, Pool, PoolConfig, Runtime, Timeouts};
use redis::AsyncCommands;
use std::time::Duration;
use tracing::{debug, info};

/// Redis 存储后端
///
/// 数据结构设计：
/// - qrt:short:{short_id} -> String (凭证)，通过 SET EX 设置 TTL
#[derive(Clone)]
pub struct RedisBackend {
    pool: Pool,
}

impl std::fmt::Debug for RedisBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisBackend").finish_non_exhaustive()
    }
}

fn mapping_key(short_id: &str) -> String {
    format!("qrt:short:{short_id}")
}

/// 根据配置构建连接池参数（池大小和超时）
fn build_pool_config(config: &RedisConfig) -> PoolConfig {
    let mut pool_config = PoolConfig::new(config.pool_size as usize);
    let timeout = Duration::from_millis(config.timeout_ms);
    pool_config.timeouts = Timeouts {
        wait: Some(timeout),
        create: Some(timeout),
        recycle: Some(timeout),
    };
    pool_config
}

impl RedisBackend {
    /// 创建新的 Redis 后端实例
    pub async fn new(config: &RedisConfig) -> QrtResult<Self> {
        let mut cfg = Config::from_url(&config.url);
        cfg.pool = Some(build_pool_config(config));
        let pool = cfg
            .create_pool(Some(Runtime::Tokio1))
            .map_err(|e| QrtError::Storage(format!("Failed to create Redis pool: {e}")))?;

        // 测试连接
        let mut conn = pool
            .get()
            .await
            .map_err(|e| QrtError::Storage(format!("Failed to connect to Redis: {e}")))?;

        redis::cmd("PING")
            .query_async::<_, String>(&mut *conn)
            .await
            .map_err(|e| QrtError::Storage(format!("Redis PING failed: {e}")))?;

        info!(
            "Redis short-id storage initialized: url={}, pool_size={}, timeout_ms={}",
            config.url, config.pool_size, config.timeout_ms
        );

        Ok(Self { pool })
    }
}

#[async_trait]
impl ShortIdBackend for RedisBackend {
    async fn init(&self) -> QrtResult<()> {
        // Redis 不需要初始化结构
        debug!("Redis backend initialized (no schema needed)");
        Ok(())
    }

    async fn store(&self, short_id: &str, token: &str, ttl_seconds: u64) -> QrtResult<()> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|e| QrtError::Storage(format!("Failed to get Redis connection: {e}")))?;

        let key = mapping_key(short_id);

        if ttl_seconds == 0 {
            let _: () = conn
                .set(&key, token)
                .await
                .map_err(|e| QrtError::Storage(format!("Failed to store mapping: {e}")))?;
        } else {
            let _: () = conn
                .set_ex(&key, token, ttl_seconds)
                .await
                .map_err(|e| QrtError::Storage(format!("Failed to store mapping: {e}")))?;
        }

        Ok(())
    }

    async fn resolve(&self, short_id: &str) -> QrtResult<Option<String>> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|e| QrtError::Storage(format!("Failed to get Redis connection: {e}")))?;

        let result: Option<String> = conn
            .get(mapping_key(short_id))
            .await
            .map_err(|e| QrtError::Storage(format!("Failed to resolve short id: {e}")))?;

        Ok(result)
    }

    async fn entry_count(&self) -> QrtResult<u64> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|e| QrtError::Storage(format!("Failed to get Redis connection: {e}")))?;

        // SCAN 遍历 qrt:short:* 模式的 key
        let mut cursor = 0u64;
        let mut count = 0u64;

        loop {
            let (new_cursor, keys): (u64, Vec<String>) = redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg("qrt:short:*")
                .arg("COUNT")
                .arg(100)
                .query_async(&mut *conn)
                .await
                .map_err(|e| QrtError::Storage(format!("Failed to scan keys: {e}")))?;

            count += keys.len() as u64;
            cursor = new_cursor;

            if cursor == 0 {
                break;
            }
        }

        Ok(count)
    }

    async fn cleanup_expired(&self) -> QrtResult<u64> {
        // Redis 通过 SET EX 的 TTL 自动清理过期映射
        debug!("Redis automatically expires short-id mappings via TTL");
        Ok(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn get_redis_url() -> String {
        std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://localhost:6379/0".to_string())
    }

    #[test]
    fn test_pool_config_applies_size_and_timeouts() {
        let config = RedisConfig {
            url: "redis://localhost:6379/0".to_string(),
            pool_size: 7,
            timeout_ms: 1500,
        };

        let pool_config = build_pool_config(&config);
        assert_eq!(pool_config.max_size, 7);
        assert_eq!(
            pool_config.timeouts.wait,
            Some(Duration::from_millis(1500))
        );
        assert_eq!(
            pool_config.timeouts.create,
            Some(Duration::from_millis(1500))
        );
    }

    async fn create_test_backend() -> RedisBackend {
        let config = RedisConfig {
            url: get_redis_url(),
            pool_size: 5,
            timeout_ms: 5000,
        };

        RedisBackend::new(&config).await.unwrap()
    }

    async fn cleanup_test_data(backend: &RedisBackend) {
        let mut conn = backend.pool.get().await.unwrap();
        let _: () = redis::cmd("FLUSHDB").query_async(&mut *conn).await.unwrap();
    }

    #[tokio::test]
    #[ignore] // 需要 Redis 服务器
    async fn test_store_and_resolve() {
        let backend = create_test_backend().await;
        cleanup_test_data(&backend).await;

        backend.store("Ab3xYz9q", "token-value", 3600).await.unwrap();
        let resolved = backend.resolve("Ab3xYz9q").await.unwrap();
        assert_eq!(resolved, Some("token-value".to_string()));

        cleanup_test_data(&backend).await;
    }

    #[tokio::test]
    #[ignore] // 需要 Redis 服务器
    async fn test_resolve_missing() {
        let backend = create_test_backend().await;
        cleanup_test_data(&backend).await;

        assert_eq!(backend.resolve("missing").await.unwrap(), None);
    }

    #[tokio::test]
    #[ignore] // 需要 Redis 服务器
    async fn test_ttl_expiration() {
        let backend = create_test_backend().await;
        cleanup_test_data(&backend).await;

        backend.store("short-lived", "token", 1).await.unwrap();
        assert!(backend.resolve("short-lived").await.unwrap().is_some());

        tokio::time::sleep(tokio::time::Duration::from_secs(2)).await;

        assert_eq!(backend.resolve("short-lived").await.unwrap(), None);

        cleanup_test_data(&backend).await;
    }

    #[tokio::test]
    #[ignore] // 需要 Redis 服务器
    async fn test_entry_count() {
        let backend = create_test_backend().await;
        cleanup_test_data(&backend).await;

        assert_eq!(backend.entry_count().await.unwrap(), 0);

        backend.store("a", "1", 3600).await.unwrap();
        backend.store("b", "2", 3600).await.unwrap();
        assert_eq!(backend.entry_count().await.unwrap(), 2);

        cleanup_test_data(&backend).await;
    }
}
