//! 服务管理器
//!
//! 负责管理多个 HTTP 路由服务的生命周期：合并路由、启动服务器、优雅关闭

use crate::service::container::ServiceContainer;
use agrix_common::config::AgrixConfig;
use anyhow::Result;
use axum::Router;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Notify, RwLock};
use tokio::task::JoinHandle;
use tracing::{error, info};
use url::Url;

use super::info::ServiceInfo;

/// 服务管理器，负责管理多个服务的生命周期
#[derive(Debug)]
pub struct ServiceManager {
    services: Vec<ServiceContainer>,
    shutdown_tx: tokio::sync::broadcast::Sender<()>,
    service_infos: Arc<RwLock<HashMap<String, ServiceInfo>>>,
    config: AgrixConfig,
}

impl ServiceManager {
    /// 创建新的服务管理器
    pub fn new(config: AgrixConfig, shutdown_tx: tokio::sync::broadcast::Sender<()>) -> Self {
        Self {
            services: Vec::new(),
            shutdown_tx,
            service_infos: Arc::new(RwLock::new(HashMap::new())),
            config,
        }
    }

    /// 添加服务到管理器
    pub fn add_service(&mut self, service: ServiceContainer) {
        info!("Adding service '{}' to manager", service.info().name);
        self.services.push(service);
    }

    /// 启动所有服务
    pub async fn start_all(&mut self) -> Result<Vec<JoinHandle<()>>> {
        info!(
            "Starting all {} services ({}).",
            self.services.len(),
            self.services
                .iter()
                .map(|s| s.info().service_type.to_string())
                .collect::<Vec<_>>()
                .join(", ")
        );

        let services = std::mem::take(&mut self.services);

        let notify = Arc::new(Notify::new());
        let mut handle_futs = Vec::new();

        // 启动HTTP服务器（合并所有HTTP路由服务）
        if !services.is_empty() {
            let handle = self.start_http_services(services, notify.clone()).await?;
            handle_futs.push(handle);
            notify.notified().await;
        }

        Ok(handle_futs)
    }

    /// 启动HTTP服务器，合并所有HTTP路由服务
    async fn start_http_services(
        &mut self,
        mut services: Vec<ServiceContainer>,
        notify: Arc<Notify>,
    ) -> Result<JoinHandle<()>> {
        info!(
            "Starting HTTP server with {} route services (environment: {})",
            services.len(),
            self.config.env
        );

        let http_config = &self.config.bind.http;
        let bind_addr = format!("{}:{}", http_config.ip, http_config.port);
        let public_url = Url::parse(&format!(
            "http://{}:{}",
            http_config.domain_name, http_config.port
        ))
        .map_err(|e| anyhow::anyhow!("Failed to parse HTTP URL: {e}"))?;

        // 构建合并的路由器
        let mut app = Router::new();

        use tower_http::cors::CorsLayer;
        use tower_http::trace::TraceLayer;

        for service in &mut services {
            let route_prefix = service.route_prefix().to_string();
            let service_name = service.info().name.clone();

            match service.build_router().await {
                Ok(router) => {
                    info!(
                        "Adding route '{}' for service '{}'",
                        route_prefix, service_name
                    );
                    app = app.nest(&route_prefix, router);

                    // 调用 on_start 回调并记录服务信息
                    if let Err(e) = service.on_start(public_url.clone()).await {
                        error!("Failed to start service '{}': {:?}", service_name, e);
                    }
                    self.service_infos
                        .write()
                        .await
                        .insert(service_name.clone(), service.info().clone());
                }
                Err(e) => {
                    // 路由构建失败是致命错误（例如密钥缺失），不降级继续
                    return Err(anyhow::anyhow!(
                        "Failed to build router for service '{service_name}': {e}"
                    ));
                }
            }
        }

        // 添加全局 Prometheus metrics 端点
        info!("Adding /metrics endpoint for Prometheus");
        app = app.route("/metrics", axum::routing::get(metrics_handler));

        // 添加全局中间件层
        app = app
            .layer(TraceLayer::new_for_http())
            .layer(CorsLayer::permissive());

        // 启动服务器
        let addr: std::net::SocketAddr = bind_addr
            .parse()
            .map_err(|e| anyhow::anyhow!("Invalid bind address '{bind_addr}': {e}"))?;

        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to bind to address '{addr}': {e}"))?;

        info!("HTTP server listening on {}", addr);
        notify.notify_one();

        let shutdown_tx = self.shutdown_tx.clone();
        let handle = tokio::spawn(async move {
            let mut shutdown_rx = shutdown_tx.subscribe();
            let server = axum::serve(
                listener,
                app.into_make_service_with_connect_info::<std::net::SocketAddr>(),
            )
            .with_graceful_shutdown(async move {
                let _ = shutdown_rx.recv().await;
                info!("HTTP server received shutdown signal");
            });
            if let Err(e) = server.await {
                error!("HTTP server error: {}", e);
                let _ = shutdown_tx.send(());
            }
            info!("HTTP server stopped");
        });

        Ok(handle)
    }

    /// 当前已注册服务的信息快照
    pub async fn service_infos(&self) -> Vec<ServiceInfo> {
        self.service_infos.read().await.values().cloned().collect()
    }

    /// Stop all services
    pub async fn stop_all(&mut self) -> Result<()> {
        info!("Stopping all services");

        let _ = self.shutdown_tx.send(());
        for service in &mut self.services {
            if let Err(e) = service.on_stop().await {
                error!("Failed to stop service '{}': {:?}", service.info().name, e);
            }
        }

        info!("All services stopped");
        Ok(())
    }
}

/// Prometheus metrics endpoint handler
async fn metrics_handler() -> String {
    agrix_common::metrics::export_metrics()
}
