//! 服务状态监控
//!
//! 定义服务运行状态的统一表示，供服务管理器和健康检查使用

use serde::{Deserialize, Serialize};

/// 服务运行状态
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum ServiceState {
    /// 状态未知（尚未启动或已停止）
    Unknown,
    /// 正在运行，附带对外服务 URL
    Running(String),
    /// 出现错误，附带错误描述
    Error(String),
}

impl ServiceState {
    /// 检查服务是否正在运行
    pub fn is_running(&self) -> bool {
        matches!(self, ServiceState::Running(_))
    }
}

impl Default for ServiceState {
    fn default() -> Self {
        Self::Unknown
    }
}
