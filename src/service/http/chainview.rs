//! Chainview HTTP 服务实现
//!
//! 提供链上种植计划读取的 HTTP API 服务

use crate::service::ServiceType;
use crate::service::{HttpRouterService, info::ServiceInfo};
use agrix_common::config::AgrixConfig;
use anyhow::Result;
use async_trait::async_trait;
use axum::Router;
use chainview::{create_chainview_state, create_router};
use tracing::info;

/// Chainview HTTP 服务实现
#[derive(Debug)]
pub struct ChainviewHttpService {
    info: ServiceInfo,
    config: AgrixConfig,
}

impl ChainviewHttpService {
    pub fn new(config: AgrixConfig) -> Self {
        Self {
            info: ServiceInfo::new(
                "Chainview Service",
                ServiceType::Chainview,
                Some("Chainview - 链上种植计划读取服务".to_string()),
                &config,
            ),
            config,
        }
    }
}

#[async_trait]
impl HttpRouterService for ChainviewHttpService {
    fn info(&self) -> &ServiceInfo {
        &self.info
    }

    fn info_mut(&mut self) -> &mut ServiceInfo {
        &mut self.info
    }

    async fn build_router(&mut self) -> Result<Router> {
        info!("Building Chainview router");

        let chainview_service_config = self
            .config
            .services
            .chainview
            .as_ref()
            .ok_or_else(|| anyhow::anyhow!("Chainview service configuration not found"))?;

        let chainview_state = create_chainview_state(chainview_service_config)
            .map_err(|e| anyhow::anyhow!("Failed to create Chainview state: {e}"))?;

        let router = create_router(chainview_state);

        info!("Chainview router built successfully");
        Ok(router)
    }

    fn route_prefix(&self) -> &str {
        "/chain"
    }
}
