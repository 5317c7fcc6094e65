//! 二维码负载加密模块
//!
//! 使用 AES-256-GCM 对二维码负载进行加密，输出 URL 安全的 Base64 字符串，
//! 可以直接嵌入二维码 URL 的查询参数。

// Allow deprecated generic-array::from_slice until aes-gcm upgrades
#![allow(deprecated)]

use crate::error::{QrtError, QrtResult};
use crate::types::QrPayload;
use aes_gcm::{
    Aes256Gcm, Nonce,
    aead::{Aead, KeyInit, OsRng},
};
use base64::prelude::*;
use rand::RngCore;
use tracing::{debug, info};

/// 密钥来源
#[derive(Debug, Clone)]
pub enum SecretSource {
    /// 直接从配置文件读取密钥
    Direct(String),
    /// 从环境变量读取密钥
    Environment(String),
    /// 从文件路径读取密钥
    File(String),
}

impl SecretSource {
    /// 解析出密钥字符串
    pub fn resolve(&self) -> QrtResult<String> {
        match self {
            SecretSource::Direct(secret) => {
                debug!("Loading secret from direct configuration");
                Ok(secret.clone())
            }
            SecretSource::Environment(env_var) => {
                debug!("Loading secret from environment variable: {}", env_var);
                std::env::var(env_var).map_err(|e| {
                    QrtError::Config(format!(
                        "Failed to read secret from environment variable {env_var}: {e}"
                    ))
                })
            }
            SecretSource::File(path) => {
                debug!("Loading secret from file: {}", path);
                std::fs::read_to_string(path).map_err(|e| {
                    QrtError::Config(format!("Failed to read secret from file {path}: {e}"))
                })
            }
        }
    }
}

/// 负载加密器
///
/// 加密格式: base64url(nonce[12] || ciphertext || tag[16])，无填充。
/// 输出仅包含 URL 安全字符，可直接嵌入查询参数。
#[derive(Clone)]
pub struct PayloadCipher {
    cipher: Aes256Gcm,
}

impl std::fmt::Debug for PayloadCipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PayloadCipher").finish_non_exhaustive()
    }
}

impl PayloadCipher {
    /// 从密钥源创建加密器
    pub fn from_secret_source(source: &SecretSource) -> QrtResult<Self> {
        let secret = source.resolve()?;
        Self::from_secret(&secret)
    }

    /// 从密钥字符串创建加密器
    ///
    /// 密钥可以是:
    /// - 64 字符的十六进制字符串 (32 字节)
    /// - 44 字符的 Base64 字符串 (32 字节)
    pub fn from_secret(secret: &str) -> QrtResult<Self> {
        let secret = secret.trim();

        let key_bytes = if secret.len() == 64 {
            hex::decode(secret)
                .map_err(|e| QrtError::Config(format!("Invalid secret hex format: {e}")))?
        } else if secret.len() == 44 || secret.len() == 43 {
            BASE64_STANDARD
                .decode(secret)
                .map_err(|e| QrtError::Config(format!("Invalid secret base64 format: {e}")))?
        } else {
            return Err(QrtError::Config(format!(
                "Invalid secret length: expected 64 hex chars or 44 base64 chars, got {}",
                secret.len()
            )));
        };

        if key_bytes.len() != 32 {
            return Err(QrtError::Config(format!(
                "Invalid secret size: expected 32 bytes, got {}",
                key_bytes.len()
            )));
        }

        let cipher = Aes256Gcm::new_from_slice(&key_bytes)
            .map_err(|e| QrtError::Crypto(format!("Failed to create cipher: {e}")))?;

        info!("QR payload encryption secret loaded");
        Ok(Self { cipher })
    }

    /// 加密负载
    ///
    /// 负载先序列化为 JSON，再加密为 URL 安全的 Base64 字符串。
    pub fn encrypt(&self, payload: &QrPayload) -> QrtResult<String> {
        let plaintext = serde_json::to_vec(payload)
            .map_err(|e| QrtError::Crypto(format!("Payload serialization failed: {e}")))?;

        // 随机 nonce (12 字节)
        let mut nonce_bytes = [0u8; 12];
        OsRng.fill_bytes(&mut nonce_bytes);
        let nonce = Nonce::from_slice(&nonce_bytes);

        let ciphertext = self
            .cipher
            .encrypt(nonce, plaintext.as_ref())
            .map_err(|e| QrtError::Crypto(format!("Encryption failed: {e}")))?;

        // 组合: nonce || ciphertext (包含 tag)
        let mut encrypted = Vec::with_capacity(12 + ciphertext.len());
        encrypted.extend_from_slice(&nonce_bytes);
        encrypted.extend_from_slice(&ciphertext);

        Ok(BASE64_URL_SAFE_NO_PAD.encode(&encrypted))
    }

    /// 解密负载
    ///
    /// 任何解码、长度、认证或解析失败都归为 Malformed，
    /// 不向调用方泄露具体失败阶段。
    pub fn decrypt(&self, encrypted: &str) -> QrtResult<QrPayload> {
        let encrypted_bytes = BASE64_URL_SAFE_NO_PAD
            .decode(encrypted)
            .map_err(|_| QrtError::Malformed)?;

        if encrypted_bytes.len() < 12 + 16 {
            return Err(QrtError::Malformed);
        }

        let (nonce_bytes, ciphertext) = encrypted_bytes.split_at(12);
        let nonce = Nonce::from_slice(nonce_bytes);

        let plaintext = self
            .cipher
            .decrypt(nonce, ciphertext)
            .map_err(|_| QrtError::Malformed)?;

        serde_json::from_slice(&plaintext).map_err(|_| QrtError::Malformed)
    }

    /// 生成新的加密密钥（用于初始化部署）
    ///
    /// 返回十六进制格式的 32 字节随机密钥
    pub fn generate_secret() -> String {
        let mut key = [0u8; 32];
        OsRng.fill_bytes(&mut key);
        hex::encode(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cipher() -> PayloadCipher {
        PayloadCipher::from_secret(&PayloadCipher::generate_secret()).unwrap()
    }

    fn payload(address: &str) -> QrPayload {
        QrPayload {
            contract_address: address.to_string(),
            qr_expires_at: None,
            access_expires_at: None,
        }
    }

    #[test]
    fn test_encrypt_decrypt_roundtrip() {
        let cipher = cipher();
        let original = QrPayload {
            contract_address: "0x1234abcd".to_string(),
            qr_expires_at: Some(1_900_000_000_000),
            access_expires_at: Some(1_900_000_500_000),
        };

        let encrypted = cipher.encrypt(&original).unwrap();
        let decrypted = cipher.decrypt(&encrypted).unwrap();

        assert_eq!(decrypted.contract_address, original.contract_address);
        assert_eq!(decrypted.qr_expires_at, original.qr_expires_at);
        assert_eq!(decrypted.access_expires_at, original.access_expires_at);
    }

    #[test]
    fn test_output_is_url_safe() {
        let cipher = cipher();
        let mut rng = rand::thread_rng();

        // 随机负载批量检查，输出不能包含需要 URL 转义的字符
        for _ in 0..100 {
            let mut raw = [0u8; 24];
            rng.fill_bytes(&mut raw);
            let encrypted = cipher.encrypt(&payload(&hex::encode(raw))).unwrap();

            assert!(
                encrypted
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'),
                "Non-URL-safe character in ciphertext: {encrypted}"
            );
        }
    }

    #[test]
    fn test_ciphertext_is_nondeterministic() {
        let cipher = cipher();
        let p = payload("0xabc");
        let a = cipher.encrypt(&p).unwrap();
        let b = cipher.encrypt(&p).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_decrypt_with_wrong_secret() {
        let encrypted = cipher().encrypt(&payload("0xabc")).unwrap();

        let other = cipher();
        let result = other.decrypt(&encrypted);
        assert!(matches!(result, Err(QrtError::Malformed)));
    }

    #[test]
    fn test_decrypt_invalid_base64() {
        let result = cipher().decrypt("not+valid/base64=");
        assert!(matches!(result, Err(QrtError::Malformed)));
    }

    #[test]
    fn test_decrypt_too_short() {
        let short = BASE64_URL_SAFE_NO_PAD.encode([0u8; 10]);
        let result = cipher().decrypt(&short);
        assert!(matches!(result, Err(QrtError::Malformed)));
    }

    #[test]
    fn test_decrypt_tampered_ciphertext() {
        let cipher = cipher();
        let encrypted = cipher.encrypt(&payload("0xabc")).unwrap();

        let mut bytes = BASE64_URL_SAFE_NO_PAD.decode(&encrypted).unwrap();
        let last = bytes.len() - 1;
        bytes[last] ^= 0x01;
        let tampered = BASE64_URL_SAFE_NO_PAD.encode(&bytes);

        assert!(matches!(cipher.decrypt(&tampered), Err(QrtError::Malformed)));
    }

    #[test]
    fn test_invalid_secret_length() {
        let result = PayloadCipher::from_secret("too-short");
        assert!(result.is_err());
        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("Invalid secret length")
        );
    }

    #[test]
    fn test_base64_secret() {
        let mut key = [0u8; 32];
        OsRng.fill_bytes(&mut key);
        let secret_b64 = BASE64_STANDARD.encode(key);

        let cipher = PayloadCipher::from_secret(&secret_b64).unwrap();
        let p = payload("0xdef");
        let roundtrip = cipher.decrypt(&cipher.encrypt(&p).unwrap()).unwrap();
        assert_eq!(roundtrip.contract_address, "0xdef");
    }

    #[test]
    fn test_secret_from_environment() {
        let secret = PayloadCipher::generate_secret();
        unsafe {
            std::env::set_var("TEST_QR_SECRET_ENV", &secret);
        }

        let cipher = PayloadCipher::from_secret_source(&SecretSource::Environment(
            "TEST_QR_SECRET_ENV".to_string(),
        ))
        .unwrap();
        let p = payload("0x123");
        assert!(cipher.decrypt(&cipher.encrypt(&p).unwrap()).is_ok());

        unsafe {
            std::env::remove_var("TEST_QR_SECRET_ENV");
        }
    }

    #[test]
    fn test_secret_from_file() {
        use std::io::Write;
        use tempfile::NamedTempFile;

        let secret = PayloadCipher::generate_secret();
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(secret.as_bytes()).unwrap();
        file.flush().unwrap();

        let cipher = PayloadCipher::from_secret_source(&SecretSource::File(
            file.path().to_string_lossy().to_string(),
        ))
        .unwrap();
        assert!(cipher.encrypt(&payload("0x456")).is_ok());
    }

    #[test]
    fn test_missing_environment_variable() {
        let result = PayloadCipher::from_secret_source(&SecretSource::Environment(
            "TEST_QR_SECRET_MISSING".to_string(),
        ));
        assert!(matches!(result, Err(QrtError::Config(_))));
    }
}
