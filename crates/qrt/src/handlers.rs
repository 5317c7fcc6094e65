//! QRT HTTP 处理器

use crate::{
    config::QrtServiceConfig,
    crypto::PayloadCipher,
    error::{QrtError, QrtResult},
    signer::{ASSERTION_TTL_SECS, AssertionSigner},
    storage::ShortIdStore,
    types::{
        DecryptQuery, DecryptResponse, EncryptRequest, EncryptResponse, IssueTokenRequest,
        IssueTokenResponse, QrPayload, ResolveQuery, ResolveResponse, ShortenRequest,
        ShortenResponse, VerifyTokenRequest, VerifyTokenResponse,
    },
};
use axum::{
    Router,
    extract::{Json, Query, State},
    routing::{get, post},
};
use lazy_static::lazy_static;
use prometheus::{IntCounterVec, Opts};
use rand::Rng;
use std::sync::{
    Arc,
    atomic::{AtomicU32, Ordering},
};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{debug, info, warn};

lazy_static! {
    /// QRT 服务指标
    static ref QRT_PAYLOADS_ENCRYPTED: IntCounterVec = IntCounterVec::new(
        Opts::new("agrix_qr_payloads_encrypted_total", "Total number of QR payloads encrypted")
            .namespace("agrix"),
        &["status"]
    ).unwrap();

    static ref QRT_PAYLOADS_DECRYPTED: IntCounterVec = IntCounterVec::new(
        Opts::new("agrix_qr_payloads_decrypted_total", "Total number of QR payloads decrypted")
            .namespace("agrix"),
        &["status"]
    ).unwrap();

    static ref QRT_TOKENS_ISSUED: IntCounterVec = IntCounterVec::new(
        Opts::new("agrix_qrt_tokens_issued_total", "Total number of access tokens issued")
            .namespace("agrix"),
        &["status"]
    ).unwrap();

    static ref QRT_TOKENS_VERIFIED: IntCounterVec = IntCounterVec::new(
        Opts::new("agrix_qrt_tokens_verified_total", "Total number of access tokens verified")
            .namespace("agrix"),
        &["status"]
    ).unwrap();

    static ref QRT_SHORT_IDS_CREATED: IntCounterVec = IntCounterVec::new(
        Opts::new("agrix_qrt_short_ids_created_total", "Total number of short ids created")
            .namespace("agrix"),
        &["backend"]
    ).unwrap();
}

/// 注册 QRT metrics 到全局 registry
pub fn register_qrt_metrics(registry: &prometheus::Registry) -> Result<(), prometheus::Error> {
    registry.register(Box::new(QRT_PAYLOADS_ENCRYPTED.clone()))?;
    registry.register(Box::new(QRT_PAYLOADS_DECRYPTED.clone()))?;
    registry.register(Box::new(QRT_TOKENS_ISSUED.clone()))?;
    registry.register(Box::new(QRT_TOKENS_VERIFIED.clone()))?;
    registry.register(Box::new(QRT_SHORT_IDS_CREATED.clone()))?;
    Ok(())
}

/// 惰性清理触发条件
const CLEANUP_CHECK_INTERVAL: u32 = 100; // 每 100 次请求检查一次
const CLEANUP_MIN_ENTRIES: u64 = 10; // 至少有 10 条映射时才清理

/// 短链 ID 长度
const SHORT_ID_LEN: usize = 8;
/// 短链 ID 碰撞重试次数
const SHORT_ID_MAX_ATTEMPTS: u32 = 4;

/// QRT 服务状态
#[derive(Clone)]
pub struct QrtState {
    pub cipher: PayloadCipher,
    pub signer: AssertionSigner,
    pub store: ShortIdStore,
    /// 短链映射有效期（秒）
    short_id_ttl: u64,
    /// 请求计数器（用于惰性清理触发）
    request_counter: Arc<AtomicU32>,
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

impl QrtState {
    pub fn new(
        cipher: PayloadCipher,
        signer: AssertionSigner,
        store: ShortIdStore,
        short_id_ttl: u64,
    ) -> Self {
        Self {
            cipher,
            signer,
            store,
            short_id_ttl,
            request_counter: Arc::new(AtomicU32::new(0)),
        }
    }

    /// 惰性清理：在请求时检查是否需要清理过期映射
    ///
    /// 触发条件：
    /// - 每 CLEANUP_CHECK_INTERVAL 次请求检查一次
    /// - 存储中至少有 CLEANUP_MIN_ENTRIES 条映射
    async fn maybe_cleanup_expired(&self) {
        let count = self.request_counter.fetch_add(1, Ordering::Relaxed);

        if count % CLEANUP_CHECK_INTERVAL != 0 {
            return;
        }

        // 在后台异步清理，不阻塞当前请求
        let store = self.store.clone();
        tokio::spawn(async move {
            let total = match store.entry_count().await {
                Ok(count) => count,
                Err(e) => {
                    warn!("Failed to get entry count for cleanup check: {}", e);
                    return;
                }
            };

            if total < CLEANUP_MIN_ENTRIES {
                debug!(
                    "Skipping cleanup: only {} entries (threshold: {})",
                    total, CLEANUP_MIN_ENTRIES
                );
                return;
            }

            match store.cleanup_expired().await {
                Ok(cleaned) => {
                    if cleaned > 0 {
                        info!(
                            "Lazy cleanup: removed {} expired mappings (total: {})",
                            cleaned, total
                        );
                    }
                }
                Err(e) => {
                    warn!("Failed to cleanup expired mappings: {}", e);
                }
            }
        });
    }

    /// 生成未被占用的短链 ID
    async fn new_short_id(&self) -> QrtResult<String> {
        for _ in 0..SHORT_ID_MAX_ATTEMPTS {
            let id: String = {
                let mut rng = rand::thread_rng();
                (0..SHORT_ID_LEN)
                    .map(|_| {
                        const CHARSET: &[u8] =
                            b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";
                        CHARSET[rng.gen_range(0..CHARSET.len())] as char
                    })
                    .collect()
            };

            if self.store.resolve(&id).await?.is_none() {
                return Ok(id);
            }
        }

        Err(QrtError::Internal(
            "Failed to allocate unique short id".to_string(),
        ))
    }
}

/// 从 QRT 配置创建 QrtState
///
/// 加密和签名密钥都是必须项，任一缺失时直接返回配置错误，服务拒绝启动。
pub async fn create_qrt_state(service_config: &QrtServiceConfig) -> QrtResult<QrtState> {
    info!("Initializing QRT state from QrtServiceConfig");

    let encryption_source = service_config.encryption.source().ok_or_else(|| {
        QrtError::Config(
            "QR encryption secret is not configured (secret/secret_env/secret_file)".to_string(),
        )
    })?;
    let cipher = PayloadCipher::from_secret_source(&encryption_source)?;

    let signing_source = service_config.signing.source().ok_or_else(|| {
        QrtError::Config(
            "Token signing secret is not configured (secret/secret_env/secret_file)".to_string(),
        )
    })?;
    let signer = AssertionSigner::from_secret_source(&signing_source)?;

    let store = ShortIdStore::from_config(&service_config.storage).await?;
    info!(
        "QRT short-id storage ready: backend={}",
        store.backend_name()
    );

    Ok(QrtState::new(
        cipher,
        signer,
        store,
        service_config.storage.short_id_ttl_seconds,
    ))
}

/// 创建 QRT 服务的路由
pub fn create_router(state: QrtState) -> Router {
    Router::new()
        .route("/encrypt", post(encrypt_handler))
        .route("/decrypt", get(decrypt_handler))
        .route("/token/issue", post(issue_token_handler))
        .route("/token/verify", post(verify_token_handler))
        .route("/shorten", post(shorten_handler))
        .route("/resolve", get(resolve_handler))
        .route("/health", get(health_check_handler))
        .with_state(state)
}

/// 根据小时数计算过期时间（Unix 毫秒）
///
/// 支持小数和负数小时；负数会得到已过期的时间戳，下限钳制为 0。
fn expiry_from_hours(now: u64, hours: f64) -> u64 {
    let offset_ms = (hours * 3_600_000.0) as i64;
    (now as i64 + offset_ms).max(0) as u64
}

async fn encrypt_handler(
    State(state): State<QrtState>,
    Json(request): Json<EncryptRequest>,
) -> Result<Json<EncryptResponse>, QrtError> {
    // 参数校验先于任何加密操作
    let contract_address = match request.contract_address {
        Some(addr) if !addr.trim().is_empty() => addr,
        _ => {
            QRT_PAYLOADS_ENCRYPTED.with_label_values(&["invalid"]).inc();
            return Err(QrtError::InvalidRequest(
                "contractAddress is required".to_string(),
            ));
        }
    };

    let now = now_ms();
    let expires_at = request.qr_expiry_hours.map(|h| expiry_from_hours(now, h));
    let access_expires_at = request
        .access_expiry_hours
        .map(|h| expiry_from_hours(now, h));

    let payload = QrPayload {
        contract_address,
        qr_expires_at: expires_at,
        access_expires_at,
    };

    let encrypted_data = state.cipher.encrypt(&payload).inspect_err(|_| {
        QRT_PAYLOADS_ENCRYPTED.with_label_values(&["error"]).inc();
    })?;

    QRT_PAYLOADS_ENCRYPTED.with_label_values(&["success"]).inc();
    debug!("Encrypted QR payload for contract");

    Ok(Json(EncryptResponse {
        encrypted_data,
        expires_at,
        access_expires_at,
    }))
}

async fn decrypt_handler(
    State(state): State<QrtState>,
    Query(query): Query<DecryptQuery>,
) -> Result<Json<DecryptResponse>, QrtError> {
    let data = match query.data {
        Some(d) if !d.trim().is_empty() => d,
        _ => {
            QRT_PAYLOADS_DECRYPTED.with_label_values(&["invalid"]).inc();
            return Err(QrtError::InvalidRequest(
                "data query parameter is required".to_string(),
            ));
        }
    };

    let payload = state.cipher.decrypt(&data).inspect_err(|_| {
        QRT_PAYLOADS_DECRYPTED
            .with_label_values(&["malformed"])
            .inc();
    })?;

    // 二维码过期检查先于访问窗口检查
    payload.verify_expiry(now_ms()).inspect_err(|e| {
        let status = match e {
            QrtError::QrExpired => "qr_expired",
            QrtError::AccessExpired => "access_expired",
            _ => "error",
        };
        QRT_PAYLOADS_DECRYPTED.with_label_values(&[status]).inc();
    })?;

    QRT_PAYLOADS_DECRYPTED.with_label_values(&["success"]).inc();

    Ok(Json(DecryptResponse {
        contract_address: payload.contract_address,
        expires_at: payload.qr_expires_at,
        access_expires_at: payload.access_expires_at,
    }))
}

async fn issue_token_handler(
    State(state): State<QrtState>,
    Json(request): Json<IssueTokenRequest>,
) -> Result<Json<IssueTokenResponse>, QrtError> {
    let contract_address = match request.contract_address {
        Some(addr) if !addr.trim().is_empty() => addr,
        _ => {
            QRT_TOKENS_ISSUED.with_label_values(&["invalid"]).inc();
            return Err(QrtError::InvalidRequest(
                "contractAddress is required".to_string(),
            ));
        }
    };

    let issued_at = now_secs();
    let token = state
        .signer
        .issue_at(&contract_address, issued_at)
        .inspect_err(|_| {
            QRT_TOKENS_ISSUED.with_label_values(&["error"]).inc();
        })?;

    QRT_TOKENS_ISSUED.with_label_values(&["success"]).inc();
    info!("Issued access token");

    Ok(Json(IssueTokenResponse {
        token,
        expires_at: issued_at + ASSERTION_TTL_SECS,
    }))
}

async fn verify_token_handler(
    State(state): State<QrtState>,
    Json(request): Json<VerifyTokenRequest>,
) -> Result<Json<VerifyTokenResponse>, QrtError> {
    let token = match request.token {
        Some(t) if !t.trim().is_empty() => t,
        _ => {
            QRT_TOKENS_VERIFIED.with_label_values(&["invalid"]).inc();
            return Err(QrtError::InvalidRequest("token is required".to_string()));
        }
    };

    let contract_address = state.signer.verify(&token).map_err(|e| {
        let status = match &e {
            QrtError::SignatureInvalid => "signature_invalid",
            QrtError::TokenExpired => "expired",
            QrtError::Malformed => "malformed",
            _ => "error",
        };
        QRT_TOKENS_VERIFIED.with_label_values(&[status]).inc();

        // 对外统一返回认证失败，不通过状态码区分格式错误和签名错误
        match e {
            QrtError::Malformed => QrtError::SignatureInvalid,
            other => other,
        }
    })?;

    QRT_TOKENS_VERIFIED.with_label_values(&["success"]).inc();

    Ok(Json(VerifyTokenResponse {
        valid: true,
        contract_address,
    }))
}

async fn shorten_handler(
    State(state): State<QrtState>,
    Json(request): Json<ShortenRequest>,
) -> Result<Json<ShortenResponse>, QrtError> {
    let token = match request.token {
        Some(t) if !t.trim().is_empty() => t,
        _ => {
            return Err(QrtError::InvalidRequest("token is required".to_string()));
        }
    };

    let short_id = state.new_short_id().await?;
    state
        .store
        .store(&short_id, &token, state.short_id_ttl)
        .await?;

    QRT_SHORT_IDS_CREATED
        .with_label_values(&[state.store.backend_name()])
        .inc();

    state.maybe_cleanup_expired().await;

    debug!("Created short id mapping: {}", short_id);
    Ok(Json(ShortenResponse { short_id }))
}

async fn resolve_handler(
    State(state): State<QrtState>,
    Query(query): Query<ResolveQuery>,
) -> Result<Json<ResolveResponse>, QrtError> {
    let id = match query.id {
        Some(i) if !i.trim().is_empty() => i,
        _ => {
            return Err(QrtError::InvalidRequest(
                "id query parameter is required".to_string(),
            ));
        }
    };

    state.maybe_cleanup_expired().await;

    match state.store.resolve(&id).await? {
        Some(token) => Ok(Json(ResolveResponse { token })),
        None => Err(QrtError::NotFound),
    }
}

async fn health_check_handler(
    State(state): State<QrtState>,
) -> Result<Json<serde_json::Value>, QrtError> {
    debug!("Health check requested");

    let entry_count = state.store.entry_count().await?;

    let response = serde_json::json!({
        "status": "healthy",
        "service": "qrt",
        "backend": state.store.backend_name(),
        "short_id_count": entry_count,
        "timestamp": now_secs()
    });

    Ok(Json(response))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expiry_from_hours_fractional() {
        let now = 1_000_000_000_000;
        // 0.5 小时 = 30 分钟 = 1_800_000 毫秒
        assert_eq!(expiry_from_hours(now, 0.5), now + 1_800_000);
    }

    #[test]
    fn test_expiry_from_hours_negative() {
        let now = 1_000_000_000_000;
        // 负数小时得到过去的时间戳
        assert_eq!(expiry_from_hours(now, -1.0), now - 3_600_000);
        // 下限钳制为 0
        assert_eq!(expiry_from_hours(1000, -1.0), 0);
    }

    #[tokio::test]
    async fn test_short_id_shape() {
        let config = QrtServiceConfig {
            encryption: crate::config::SecretConfig {
                secret: Some(PayloadCipher::generate_secret()),
                ..Default::default()
            },
            signing: crate::config::SecretConfig {
                secret: Some("test-signing-secret".to_string()),
                ..Default::default()
            },
            ..Default::default()
        };

        let state = create_qrt_state(&config).await.unwrap();
        let id = state.new_short_id().await.unwrap();
        assert_eq!(id.len(), SHORT_ID_LEN);
        assert!(id.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[tokio::test]
    async fn test_state_requires_secrets() {
        let config = QrtServiceConfig::default();
        let result = create_qrt_state(&config).await;
        assert!(matches!(result, Err(QrtError::Config(_))));
    }
}
