//! 服务容器
//!
//! 封装不同类型的服务，统一生命周期管理

use super::HttpRouterService;
use super::{ChainviewHttpService, QrtHttpService};
use crate::service::info::ServiceInfo;
use axum::Router;
use url::Url;

/// 服务容器，用于封装不同类型的服务
#[derive(Debug)]
pub enum ServiceContainer {
    Qrt(QrtHttpService),
    Chainview(ChainviewHttpService),
}

impl ServiceContainer {
    /// 创建QRT服务容器
    pub fn qrt(service: QrtHttpService) -> Self {
        Self::Qrt(service)
    }

    /// 创建Chainview服务容器
    pub fn chainview(service: ChainviewHttpService) -> Self {
        Self::Chainview(service)
    }

    #[allow(dead_code)]
    pub fn service_type(&self) -> &'static str {
        match self {
            ServiceContainer::Qrt(_) => "QRT",
            ServiceContainer::Chainview(_) => "Chainview",
        }
    }

    pub fn info(&self) -> &ServiceInfo {
        match self {
            ServiceContainer::Qrt(service) => service.info(),
            ServiceContainer::Chainview(service) => service.info(),
        }
    }

    /// 获取路由前缀
    pub fn route_prefix(&self) -> &str {
        match self {
            ServiceContainer::Qrt(service) => service.route_prefix(),
            ServiceContainer::Chainview(service) => service.route_prefix(),
        }
    }

    /// 构建路由器
    pub async fn build_router(&mut self) -> Result<Router, anyhow::Error> {
        match self {
            ServiceContainer::Qrt(service) => service.build_router().await,
            ServiceContainer::Chainview(service) => service.build_router().await,
        }
    }

    /// 服务启动回调
    pub async fn on_start(&mut self, base_url: Url) -> Result<(), anyhow::Error> {
        match self {
            ServiceContainer::Qrt(service) => service.on_start(base_url).await,
            ServiceContainer::Chainview(service) => service.on_start(base_url).await,
        }
    }

    /// 服务停止回调
    pub async fn on_stop(&mut self) -> Result<(), anyhow::Error> {
        match self {
            ServiceContainer::Qrt(service) => service.on_stop().await,
            ServiceContainer::Chainview(service) => service.on_stop().await,
        }
    }
}
