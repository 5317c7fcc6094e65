//! 访问凭证签名模块
//!
//! 颁发和验证 HMAC-SHA256 签名的紧凑凭证，格式为三段式:
//! `base64url(header).base64url(claims).base64url(signature)`
//!
//! 凭证有效期固定 24 小时，从颁发时刻起算。

use crate::crypto::SecretSource;
use crate::error::{QrtError, QrtResult};
use base64::prelude::*;
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::info;

type HmacSha256 = Hmac<Sha256>;

/// 凭证有效期：24 小时
pub const ASSERTION_TTL_SECS: u64 = 24 * 60 * 60;

/// 凭证头部（所有凭证固定相同）
#[derive(Debug, Serialize, Deserialize, PartialEq)]
struct AssertionHeader {
    alg: String,
    typ: String,
}

impl AssertionHeader {
    fn expected() -> Self {
        Self {
            alg: "HS256".to_string(),
            typ: "QRT".to_string(),
        }
    }
}

/// 凭证声明
#[derive(Debug, Serialize, Deserialize)]
struct AssertionClaims {
    /// 合约地址
    a: String,
    /// 颁发时间（Unix 秒）
    iat: u64,
    /// 过期时间（Unix 秒）
    exp: u64,
}

/// 凭证签名器
#[derive(Clone)]
pub struct AssertionSigner {
    key: Vec<u8>,
}

impl std::fmt::Debug for AssertionSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AssertionSigner").finish_non_exhaustive()
    }
}

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

impl AssertionSigner {
    /// 从密钥源创建签名器
    pub fn from_secret_source(source: &SecretSource) -> QrtResult<Self> {
        let secret = source.resolve()?;
        let secret = secret.trim();

        if secret.is_empty() {
            return Err(QrtError::Config(
                "Signing secret must not be empty".to_string(),
            ));
        }

        info!("Token signing secret loaded");
        Ok(Self {
            key: secret.as_bytes().to_vec(),
        })
    }

    fn mac(&self) -> HmacSha256 {
        // HMAC-SHA256 接受任意长度密钥
        HmacSha256::new_from_slice(&self.key).expect("HMAC accepts any key length")
    }

    fn sign(&self, signing_input: &str) -> Vec<u8> {
        let mut mac = self.mac();
        mac.update(signing_input.as_bytes());
        mac.finalize().into_bytes().to_vec()
    }

    /// 为指定合约地址颁发凭证
    pub fn issue(&self, contract_address: &str) -> QrtResult<String> {
        self.issue_at(contract_address, now_secs())
    }

    /// 在指定时刻颁发凭证（时间参数化，便于测试）
    pub fn issue_at(&self, contract_address: &str, now: u64) -> QrtResult<String> {
        let header = AssertionHeader::expected();
        let claims = AssertionClaims {
            a: contract_address.to_string(),
            iat: now,
            exp: now + ASSERTION_TTL_SECS,
        };

        let header_b64 = BASE64_URL_SAFE_NO_PAD.encode(
            serde_json::to_vec(&header)
                .map_err(|e| QrtError::Internal(format!("Header serialization failed: {e}")))?,
        );
        let claims_b64 = BASE64_URL_SAFE_NO_PAD.encode(
            serde_json::to_vec(&claims)
                .map_err(|e| QrtError::Internal(format!("Claims serialization failed: {e}")))?,
        );

        let signing_input = format!("{header_b64}.{claims_b64}");
        let signature_b64 = BASE64_URL_SAFE_NO_PAD.encode(self.sign(&signing_input));

        Ok(format!("{signing_input}.{signature_b64}"))
    }

    /// 验证凭证，返回其中的合约地址
    pub fn verify(&self, token: &str) -> QrtResult<String> {
        self.verify_at(token, now_secs())
    }

    /// 在指定时刻验证凭证
    ///
    /// 验证顺序: 格式 -> 签名 -> 过期时间。
    /// 签名验证先于过期检查，未通过签名的凭证不会暴露过期信息。
    pub fn verify_at(&self, token: &str, now: u64) -> QrtResult<String> {
        let mut parts = token.split('.');
        let (header_b64, claims_b64, signature_b64) =
            match (parts.next(), parts.next(), parts.next(), parts.next()) {
                (Some(h), Some(c), Some(s), None) => (h, c, s),
                _ => return Err(QrtError::Malformed),
            };

        // 签名比较使用 HMAC verify，恒定时间
        let signature = BASE64_URL_SAFE_NO_PAD
            .decode(signature_b64)
            .map_err(|_| QrtError::Malformed)?;

        let mut mac = self.mac();
        mac.update(format!("{header_b64}.{claims_b64}").as_bytes());
        mac.verify_slice(&signature)
            .map_err(|_| QrtError::SignatureInvalid)?;

        let header_bytes = BASE64_URL_SAFE_NO_PAD
            .decode(header_b64)
            .map_err(|_| QrtError::Malformed)?;
        let header: AssertionHeader =
            serde_json::from_slice(&header_bytes).map_err(|_| QrtError::Malformed)?;
        if header != AssertionHeader::expected() {
            return Err(QrtError::Malformed);
        }

        let claims_bytes = BASE64_URL_SAFE_NO_PAD
            .decode(claims_b64)
            .map_err(|_| QrtError::Malformed)?;
        let claims: AssertionClaims =
            serde_json::from_slice(&claims_bytes).map_err(|_| QrtError::Malformed)?;

        if now >= claims.exp {
            return Err(QrtError::TokenExpired);
        }

        Ok(claims.a)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signer() -> AssertionSigner {
        AssertionSigner::from_secret_source(&SecretSource::Direct(
            "test-signing-secret".to_string(),
        ))
        .unwrap()
    }

    #[test]
    fn test_issue_verify_roundtrip() {
        let signer = signer();
        let token = signer.issue("0x1234abcd").unwrap();
        let address = signer.verify(&token).unwrap();
        assert_eq!(address, "0x1234abcd");
    }

    #[test]
    fn test_token_is_three_parts() {
        let token = signer().issue("0xabc").unwrap();
        assert_eq!(token.split('.').count(), 3);
        // 每段都应是 URL 安全字符
        assert!(
            token
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.')
        );
    }

    #[test]
    fn test_expired_token_rejected() {
        let signer = signer();
        let issued_at = 1_700_000_000;
        let token = signer.issue_at("0xabc", issued_at).unwrap();

        // 刚过 24 小时
        let result = signer.verify_at(&token, issued_at + ASSERTION_TTL_SECS);
        assert!(matches!(result, Err(QrtError::TokenExpired)));

        // 过期前一秒仍然有效
        let address = signer
            .verify_at(&token, issued_at + ASSERTION_TTL_SECS - 1)
            .unwrap();
        assert_eq!(address, "0xabc");
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let token = signer().issue("0xabc").unwrap();

        let other = AssertionSigner::from_secret_source(&SecretSource::Direct(
            "different-secret".to_string(),
        ))
        .unwrap();
        let result = other.verify(&token);
        assert!(matches!(result, Err(QrtError::SignatureInvalid)));
    }

    #[test]
    fn test_tampered_claims_rejected() {
        let signer = signer();
        let token = signer.issue("0xabc").unwrap();

        let parts: Vec<&str> = token.split('.').collect();
        let forged_claims = BASE64_URL_SAFE_NO_PAD.encode(
            serde_json::to_vec(&AssertionClaims {
                a: "0xattacker".to_string(),
                iat: now_secs(),
                exp: now_secs() + ASSERTION_TTL_SECS,
            })
            .unwrap(),
        );
        let forged = format!("{}.{}.{}", parts[0], forged_claims, parts[2]);

        let result = signer.verify(&forged);
        assert!(matches!(result, Err(QrtError::SignatureInvalid)));
    }

    #[test]
    fn test_malformed_tokens_rejected() {
        let signer = signer();

        for bad in ["", "abc", "a.b", "a.b.c.d", "not base64!.x.y"] {
            let result = signer.verify(bad);
            assert!(
                matches!(result, Err(QrtError::Malformed)),
                "Expected Malformed for {bad:?}, got {result:?}"
            );
        }
    }

    #[test]
    fn test_empty_secret_rejected() {
        let result = AssertionSigner::from_secret_source(&SecretSource::Direct("  ".to_string()));
        assert!(matches!(result, Err(QrtError::Config(_))));
    }
}
