//! QRT 服务请求/响应类型

use crate::error::{QrtError, QrtResult};
use serde::{Deserialize, Serialize};

/// 二维码加密负载
///
/// 加密前的明文结构，序列化为紧凑 JSON 后再加密。
/// 字段名刻意缩短，减小二维码密度。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QrPayload {
    /// 合约地址
    #[serde(rename = "a")]
    pub contract_address: String,

    /// 二维码过期时间（Unix 毫秒），None 表示永久有效
    #[serde(rename = "e", skip_serializing_if = "Option::is_none")]
    pub qr_expires_at: Option<u64>,

    /// 访问窗口过期时间（Unix 毫秒），None 表示不限制
    #[serde(rename = "x", skip_serializing_if = "Option::is_none")]
    pub access_expires_at: Option<u64>,
}

impl QrPayload {
    /// 检查两个过期窗口
    ///
    /// 二维码过期先于访问窗口过期检查，两者都过期时报告二维码过期。
    pub fn verify_expiry(&self, now_ms: u64) -> QrtResult<()> {
        if let Some(qr_exp) = self.qr_expires_at {
            if now_ms > qr_exp {
                return Err(QrtError::QrExpired);
            }
        }

        if let Some(access_exp) = self.access_expires_at {
            if now_ms > access_exp {
                return Err(QrtError::AccessExpired);
            }
        }

        Ok(())
    }
}

/// 加密请求
#[derive(Debug, Deserialize)]
pub struct EncryptRequest {
    /// 合约地址（必填）
    #[serde(rename = "contractAddress")]
    pub contract_address: Option<String>,

    /// 二维码有效小时数（可选，支持小数）
    #[serde(rename = "qrExpiryHours")]
    pub qr_expiry_hours: Option<f64>,

    /// 访问窗口有效小时数（可选，支持小数）
    #[serde(rename = "accessExpiryHours")]
    pub access_expiry_hours: Option<f64>,
}

/// 加密响应
#[derive(Debug, Serialize)]
pub struct EncryptResponse {
    /// URL 安全的密文
    #[serde(rename = "encryptedData")]
    pub encrypted_data: String,

    /// 二维码过期时间（Unix 毫秒）
    #[serde(rename = "expiresAt", skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<u64>,

    /// 访问窗口过期时间（Unix 毫秒）
    #[serde(rename = "accessExpiresAt", skip_serializing_if = "Option::is_none")]
    pub access_expires_at: Option<u64>,
}

/// 解密响应
#[derive(Debug, Serialize)]
pub struct DecryptResponse {
    /// 合约地址
    #[serde(rename = "contractAddress")]
    pub contract_address: String,

    /// 二维码过期时间（Unix 毫秒）
    #[serde(rename = "expiresAt", skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<u64>,

    /// 访问窗口过期时间（Unix 毫秒）
    #[serde(rename = "accessExpiresAt", skip_serializing_if = "Option::is_none")]
    pub access_expires_at: Option<u64>,
}

/// 凭证颁发请求
#[derive(Debug, Deserialize)]
pub struct IssueTokenRequest {
    #[serde(rename = "contractAddress")]
    pub contract_address: Option<String>,
}

/// 凭证颁发响应
#[derive(Debug, Serialize)]
pub struct IssueTokenResponse {
    pub token: String,

    /// 凭证过期时间（Unix 秒）
    #[serde(rename = "expiresAt")]
    pub expires_at: u64,
}

/// 凭证验证请求
#[derive(Debug, Deserialize)]
pub struct VerifyTokenRequest {
    pub token: Option<String>,
}

/// 凭证验证响应
#[derive(Debug, Serialize)]
pub struct VerifyTokenResponse {
    pub valid: bool,

    #[serde(rename = "contractAddress")]
    pub contract_address: String,
}

/// 短链创建请求
#[derive(Debug, Deserialize)]
pub struct ShortenRequest {
    pub token: Option<String>,
}

/// 短链创建响应
#[derive(Debug, Serialize)]
pub struct ShortenResponse {
    #[serde(rename = "shortId")]
    pub short_id: String,
}

/// 短链解析查询参数
#[derive(Debug, Deserialize)]
pub struct ResolveQuery {
    pub id: Option<String>,
}

/// 短链解析响应
#[derive(Debug, Serialize)]
pub struct ResolveResponse {
    pub token: String,
}

/// 解密查询参数
#[derive(Debug, Deserialize)]
pub struct DecryptQuery {
    pub data: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_compact_field_names() {
        let payload = QrPayload {
            contract_address: "0xabc".to_string(),
            qr_expires_at: Some(1000),
            access_expires_at: None,
        };

        let json = serde_json::to_string(&payload).unwrap();
        assert!(json.contains("\"a\":"));
        assert!(json.contains("\"e\":"));
        // None 字段不应出现
        assert!(!json.contains("\"x\":"));
    }

    #[test]
    fn test_verify_expiry_no_limits() {
        let payload = QrPayload {
            contract_address: "0xabc".to_string(),
            qr_expires_at: None,
            access_expires_at: None,
        };
        assert!(payload.verify_expiry(u64::MAX).is_ok());
    }

    #[test]
    fn test_verify_expiry_qr_takes_precedence() {
        // 两个窗口都过期时，报告二维码过期
        let payload = QrPayload {
            contract_address: "0xabc".to_string(),
            qr_expires_at: Some(1000),
            access_expires_at: Some(2000),
        };
        assert!(matches!(
            payload.verify_expiry(5000),
            Err(QrtError::QrExpired)
        ));
    }

    #[test]
    fn test_verify_expiry_independent_windows() {
        // 仅访问窗口过期
        let payload = QrPayload {
            contract_address: "0xabc".to_string(),
            qr_expires_at: Some(10_000),
            access_expires_at: Some(2000),
        };
        assert!(matches!(
            payload.verify_expiry(5000),
            Err(QrtError::AccessExpired)
        ));

        // 仅二维码过期
        let payload = QrPayload {
            contract_address: "0xabc".to_string(),
            qr_expires_at: Some(2000),
            access_expires_at: Some(10_000),
        };
        assert!(matches!(
            payload.verify_expiry(5000),
            Err(QrtError::QrExpired)
        ));
    }

    #[test]
    fn test_verify_expiry_boundary_is_inclusive() {
        // 恰好等于过期时刻仍然有效
        let payload = QrPayload {
            contract_address: "0xabc".to_string(),
            qr_expires_at: Some(5000),
            access_expires_at: Some(5000),
        };
        assert!(payload.verify_expiry(5000).is_ok());
    }
}
