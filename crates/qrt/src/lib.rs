//! QRT - QR 溯源凭证服务
//!
//! 为农产品溯源二维码提供三项能力：
//! - 负载加解密：AES-256-GCM，输出 URL 安全的密文，支持双过期窗口
//! - 访问凭证：HMAC-SHA256 签名的紧凑凭证，固定 24 小时有效期
//! - 短链映射：凭证到短 ID 的易失映射，支持内存/Redis 后端

pub mod config;
pub mod crypto;
pub mod error;
pub mod handlers;
pub mod signer;
pub mod storage;
pub mod types;

pub use config::{QrtServiceConfig, SecretConfig};
pub use crypto::{PayloadCipher, SecretSource};
pub use error::{QrtError, QrtResult};
pub use handlers::{QrtState, create_qrt_state, create_router, register_qrt_metrics};
pub use signer::{ASSERTION_TTL_SECS, AssertionSigner};
pub use storage::{ShortIdStore, StorageBackend, StorageConfig};
pub use types::QrPayload;
