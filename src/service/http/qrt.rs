//! QRT HTTP 服务实现
//!
//! 提供二维码负载加密、访问凭证和短链映射的 HTTP API 服务

use crate::service::ServiceType;
use crate::service::{HttpRouterService, info::ServiceInfo};
use agrix_common::config::AgrixConfig;
use anyhow::Result;
use async_trait::async_trait;
use axum::Router;
use qrt::{create_qrt_state, create_router};
use tracing::info;

/// QRT HTTP 服务实现
#[derive(Debug)]
pub struct QrtHttpService {
    info: ServiceInfo,
    config: AgrixConfig,
}

impl QrtHttpService {
    pub fn new(config: AgrixConfig) -> Self {
        Self {
            info: ServiceInfo::new(
                "QRT Service",
                ServiceType::Qrt,
                Some("QR Token - 溯源二维码凭证服务".to_string()),
                &config,
            ),
            config,
        }
    }
}

#[async_trait]
impl HttpRouterService for QrtHttpService {
    fn info(&self) -> &ServiceInfo {
        &self.info
    }

    fn info_mut(&mut self) -> &mut ServiceInfo {
        &mut self.info
    }

    async fn build_router(&mut self) -> Result<Router> {
        info!("Building QRT router");

        let qrt_service_config = self
            .config
            .services
            .qrt
            .as_ref()
            .ok_or_else(|| anyhow::anyhow!("QRT service configuration not found"))?;

        // 密钥缺失会在这里失败，服务拒绝启动
        let qrt_state = create_qrt_state(qrt_service_config)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to create QRT state: {e}"))?;

        let router = create_router(qrt_state);

        info!("QRT router built successfully");
        Ok(router)
    }

    fn route_prefix(&self) -> &str {
        "/qrt"
    }
}
