//! 内存存储后端实现
//!
//! 进程内 HashMap 存储，适合单实例部署。重启后映射全部丢失。

use crate::error::QrtResult;
use crate::storage::backend::ShortIdBackend;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::sync::RwLock;
use tracing::debug;

/// 单条短链映射记录
#[derive(Debug, Clone)]
struct MappingRecord {
    token: String,
    /// 过期时间（Unix 秒），0 表示永不过期
    expires_at: u64,
}

impl MappingRecord {
    fn is_expired(&self, now: u64) -> bool {
        self.expires_at != 0 && now >= self.expires_at
    }
}

/// 内存存储后端
#[derive(Clone, Debug)]
pub struct MemoryBackend {
    entries: Arc<RwLock<HashMap<String, MappingRecord>>>,
}

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
        }
    }
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ShortIdBackend for MemoryBackend {
    async fn init(&self) -> QrtResult<()> {
        debug!("Memory backend initialized");
        Ok(())
    }

    async fn store(&self, short_id: &str, token: &str, ttl_seconds: u64) -> QrtResult<()> {
        let expires_at = if ttl_seconds == 0 {
            0
        } else {
            now_secs() + ttl_seconds
        };

        let mut entries = self.entries.write().await;
        entries.insert(
            short_id.to_string(),
            MappingRecord {
                token: token.to_string(),
                expires_at,
            },
        );

        Ok(())
    }

    async fn resolve(&self, short_id: &str) -> QrtResult<Option<String>> {
        let now = now_secs();

        // 过期条目读取时惰性删除
        {
            let entries = self.entries.read().await;
            match entries.get(short_id) {
                None => return Ok(None),
                Some(record) if !record.is_expired(now) => {
                    return Ok(Some(record.token.clone()));
                }
                Some(_) => {}
            }
        }

        let mut entries = self.entries.write().await;
        if let Some(record) = entries.get(short_id) {
            if record.is_expired(now) {
                entries.remove(short_id);
            }
        }

        Ok(None)
    }

    async fn entry_count(&self) -> QrtResult<u64> {
        Ok(self.entries.read().await.len() as u64)
    }

    async fn cleanup_expired(&self) -> QrtResult<u64> {
        let now = now_secs();
        let mut entries = self.entries.write().await;

        let before = entries.len();
        entries.retain(|_, record| !record.is_expired(now));
        let removed = (before - entries.len()) as u64;

        if removed > 0 {
            debug!("Cleaned up {} expired short-id mappings", removed);
        }

        Ok(removed)
    }
}
