//! 服务信息
//!
//! 定义了服务的基本信息结构

use agrix_common::monitoring::ServiceState;
use serde::{Deserialize, Serialize};
use tracing::{error, info};
use url::Url;

use agrix_common::config::AgrixConfig;

use super::ServiceType;

/// 服务基本信息
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceInfo {
    /// 服务名称
    pub name: String,
    /// 服务类型
    pub service_type: ServiceType,
    pub domain_name: String,
    pub port_info: String,
    /// 服务状态
    pub status: ServiceState,
    /// 服务描述
    pub description: Option<String>,
}

impl ServiceInfo {
    pub fn new(
        name: impl Into<String>,
        service_type: ServiceType,
        description: Option<String>,
        config: &AgrixConfig,
    ) -> Self {
        let http_config = &config.bind.http;
        let port_info = http_config.port.to_string();
        let domain_name = format!("http://{}", http_config.domain_name);

        Self {
            name: name.into(),
            service_type,
            port_info,
            domain_name,
            status: ServiceState::Unknown,
            description,
        }
    }

    /// 设置服务状态为运行中
    pub fn set_running(&mut self, url: Url) {
        self.status = ServiceState::Running(url.to_string());
        info!(
            "Service '{}' is now running at {}/{}",
            self.name,
            self.url(),
            self.domain_name
        );
    }

    /// 设置服务状态为错误
    pub fn set_error(&mut self, error: impl Into<String>) {
        let error_msg = error.into();
        self.status = ServiceState::Error(error_msg.clone());
        error!(
            "Service '{}' encountered error: {}",
            self.name, error_msg
        );
    }

    /// 检查服务是否正在运行
    pub fn is_running(&self) -> bool {
        matches!(self.status, ServiceState::Running(_))
    }

    /// 获取服务状态的 URL（如果是运行状态）
    pub fn url(&self) -> String {
        match &self.status {
            ServiceState::Running(url) => url.to_string(),
            _ => "N/A".to_string(),
        }
    }
}
