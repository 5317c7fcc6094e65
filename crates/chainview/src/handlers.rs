//! Chainview HTTP 处理器

use crate::config::ChainviewServiceConfig;
use crate::error::{ChainviewError, ChainviewResult};
use crate::reader::PlanReader;
use crate::types::PlanInfo;
use alloy::primitives::Address;
use axum::{
    Router,
    extract::{Json, Path, State},
    routing::get,
};
use lazy_static::lazy_static;
use prometheus::{IntCounterVec, Opts};
use std::str::FromStr;
use tracing::{debug, info};

lazy_static! {
    /// Chainview 服务指标
    static ref CHAINVIEW_PLAN_READS: IntCounterVec = IntCounterVec::new(
        Opts::new("agrix_chain_plan_reads_total", "Total number of plan reads from chain")
            .namespace("agrix"),
        &["status"]
    ).unwrap();
}

/// 注册 Chainview metrics 到全局 registry
pub fn register_chainview_metrics(
    registry: &prometheus::Registry,
) -> Result<(), prometheus::Error> {
    registry.register(Box::new(CHAINVIEW_PLAN_READS.clone()))?;
    Ok(())
}

/// Chainview 服务状态
#[derive(Clone)]
pub struct ChainviewState {
    pub reader: PlanReader,
}

/// 从 Chainview 配置创建 ChainviewState
pub fn create_chainview_state(
    service_config: &ChainviewServiceConfig,
) -> ChainviewResult<ChainviewState> {
    info!("Initializing Chainview state from ChainviewServiceConfig");

    if service_config.rpc_url.trim().is_empty() {
        return Err(ChainviewError::Config(
            "Chainview rpc_url is not configured".to_string(),
        ));
    }

    let reader = PlanReader::new(&service_config.rpc_url)?;
    Ok(ChainviewState { reader })
}

/// 创建 Chainview 服务的路由
pub fn create_router(state: ChainviewState) -> Router {
    Router::new()
        .route("/plan/{address}", get(plan_handler))
        .route("/health", get(health_check_handler))
        .with_state(state)
}

async fn plan_handler(
    State(state): State<ChainviewState>,
    Path(address): Path<String>,
) -> Result<Json<PlanInfo>, ChainviewError> {
    let address = Address::from_str(&address).map_err(|_| {
        CHAINVIEW_PLAN_READS.with_label_values(&["invalid"]).inc();
        ChainviewError::InvalidAddress(address.clone())
    })?;

    let info = state.reader.fetch_plan(address).await.inspect_err(|e| {
        let status = match e {
            ChainviewError::Rpc(_) => "rpc_error",
            ChainviewError::Decode(_) => "decode_error",
            _ => "error",
        };
        CHAINVIEW_PLAN_READS.with_label_values(&[status]).inc();
    })?;

    CHAINVIEW_PLAN_READS.with_label_values(&["success"]).inc();
    debug!("Plan info served for contract {}", address);

    Ok(Json(info))
}

async fn health_check_handler() -> Json<serde_json::Value> {
    debug!("Health check requested");

    Json(serde_json::json!({
        "status": "healthy",
        "service": "chainview",
        "timestamp": std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0)
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    fn test_state() -> ChainviewState {
        create_chainview_state(&ChainviewServiceConfig {
            rpc_url: "https://sepolia.example.org/rpc".to_string(),
        })
        .unwrap()
    }

    #[test]
    fn test_state_requires_rpc_url() {
        let result = create_chainview_state(&ChainviewServiceConfig::default());
        assert!(matches!(result, Err(ChainviewError::Config(_))));
    }

    #[tokio::test]
    async fn test_invalid_address_rejected() {
        let app = create_router(test_state());

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/plan/not-an-address")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_health_check() {
        let app = create_router(test_state());

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }
}
