// ==========================================
// 固件发布记录系统 - 访问令牌
// ==========================================
// 格式: JWT,HS256 签名
// 声明: uid / role / email / sub / iat / nbf / exp / iss
// 红线: 校验时固定算法,拒绝其他签名算法
// ==========================================

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::user::User;
use crate::service::error::{ServiceError, ServiceResult};

/// 签发方标识
pub const TOKEN_ISSUER: &str = "firmware-changelog";

/// nbf 相对签发时刻的回拨秒数 (容忍时钟偏差)
const NOT_BEFORE_SKEW_SECS: i64 = 5;

// ==========================================
// TokenClaims - 签发时写入的声明
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    pub uid: i64,
    pub role: String,
    pub email: String,
    pub sub: String,
    pub iat: i64,
    pub nbf: i64,
    pub exp: i64,
    pub iss: String,
}

impl TokenClaims {
    /// 为用户构造声明
    pub fn for_user(user: &User, now: DateTime<Utc>, ttl: Duration) -> Self {
        Self {
            uid: user.id,
            role: user.role.to_string(),
            email: user.email.clone(),
            sub: user.id.to_string(),
            iat: now.timestamp(),
            nbf: (now - Duration::seconds(NOT_BEFORE_SKEW_SECS)).timestamp(),
            exp: (now + ttl).timestamp(),
            iss: TOKEN_ISSUER.to_string(),
        }
    }
}

/// 校验时按原始 JSON 读取,身份声明的数值类型由 normalize_subject 统一
#[derive(Debug, Deserialize)]
struct RawClaims {
    #[serde(default)]
    uid: Option<Value>,
    #[serde(default)]
    sub: Option<Value>,
    #[serde(default)]
    role: Option<Value>,
    #[serde(default)]
    email: Option<Value>,
}

/// 校验通过后的声明
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedClaims {
    pub user_id: u64,
    pub role: Option<String>,
    pub email: Option<String>,
}

// ==========================================
// TokenCodec - 令牌编解码
// ==========================================
pub struct TokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl TokenCodec {
    /// 以共享密钥创建编解码器
    ///
    /// # 参数
    /// - `secret`: HS256 共享密钥
    /// - `leeway_secs`: exp/nbf 校验的时钟容差
    pub fn new(secret: &str, leeway_secs: u64) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = leeway_secs;
        validation.validate_nbf = true;
        validation.set_required_spec_claims(&["exp"]);

        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }

    /// 签发令牌
    pub fn issue(&self, claims: &TokenClaims) -> ServiceResult<String> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding_key)
            .map_err(|e| ServiceError::InternalError(format!("令牌签发失败: {}", e)))
    }

    /// 校验令牌 (签名 + 算法 + exp/nbf) 并归一化身份声明
    ///
    /// # 返回
    /// - `Err(Unauthorized)`: 签名/算法/时效不通过,或无法得到正整数身份
    pub fn verify(&self, token: &str) -> ServiceResult<VerifiedClaims> {
        let data = decode::<RawClaims>(token, &self.decoding_key, &self.validation)
            .map_err(|e| {
                tracing::debug!("令牌校验失败: {}", e);
                ServiceError::unauthorized("invalid token")
            })?;
        let claims = data.claims;

        let user_id = normalize_subject(claims.uid.as_ref(), claims.sub.as_ref())
            .ok_or_else(|| ServiceError::unauthorized("missing uid"))?;

        Ok(VerifiedClaims {
            user_id,
            role: claims.role.as_ref().and_then(as_text),
            email: claims.email.as_ref().and_then(as_text),
        })
    }
}

/// 从 uid / sub 声明中取出正整数身份
///
/// 接受整数、整值浮点数、十进制数字字符串; uid 优先,sub 兜底。
/// 两者都无法得到正整数时返回 None。
pub fn normalize_subject(uid: Option<&Value>, sub: Option<&Value>) -> Option<u64> {
    uid.and_then(positive_id).or_else(|| sub.and_then(positive_id))
}

fn positive_id(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => {
            if let Some(id) = n.as_u64() {
                return (id > 0).then_some(id);
            }
            let f = n.as_f64()?;
            if f >= 1.0 && f.fract() == 0.0 && f < u64::MAX as f64 {
                Some(f as u64)
            } else {
                None
            }
        }
        Value::String(s) => s.trim().parse::<u64>().ok().filter(|id| *id > 0),
        _ => None,
    }
}

fn as_text(value: &Value) -> Option<String> {
    value
        .as_str()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::Role;
    use serde_json::json;

    fn sample_user() -> User {
        User {
            id: 42,
            name: "Ana".to_string(),
            email: "ana@example.com".to_string(),
            password_hash: String::new(),
            role: Role::Editor,
        }
    }

    #[test]
    fn test_normalize_subject_accepts_numeric_forms() {
        assert_eq!(normalize_subject(Some(&json!(7)), None), Some(7));
        assert_eq!(normalize_subject(Some(&json!(7.0)), None), Some(7));
        assert_eq!(normalize_subject(Some(&json!("7")), None), Some(7));
        assert_eq!(normalize_subject(None, Some(&json!("9"))), Some(9));
    }

    #[test]
    fn test_normalize_subject_rejects_non_positive() {
        assert_eq!(normalize_subject(Some(&json!(0)), None), None);
        assert_eq!(normalize_subject(Some(&json!(-3)), None), None);
        assert_eq!(normalize_subject(Some(&json!(2.5)), None), None);
        assert_eq!(normalize_subject(Some(&json!("abc")), None), None);
        assert_eq!(normalize_subject(Some(&json!(true)), None), None);
        assert_eq!(normalize_subject(None, None), None);
    }

    #[test]
    fn test_uid_wins_over_sub_and_sub_is_fallback() {
        assert_eq!(normalize_subject(Some(&json!(1)), Some(&json!("2"))), Some(1));
        assert_eq!(normalize_subject(Some(&json!(0)), Some(&json!("2"))), Some(2));
    }

    #[test]
    fn test_issue_then_verify() {
        let codec = TokenCodec::new("segredo", 5);
        let claims = TokenClaims::for_user(&sample_user(), Utc::now(), Duration::hours(2));
        assert_eq!(claims.nbf, claims.iat - 5);
        assert_eq!(claims.iss, TOKEN_ISSUER);

        let token = codec.issue(&claims).unwrap();
        let verified = codec.verify(&token).unwrap();

        assert_eq!(verified.user_id, 42);
        assert_eq!(verified.role.as_deref(), Some("editor"));
        assert_eq!(verified.email.as_deref(), Some("ana@example.com"));
    }

    #[test]
    fn test_verify_rejects_wrong_secret_and_expired() {
        let issuer = TokenCodec::new("outro", 0);
        let codec = TokenCodec::new("segredo", 0);
        let claims = TokenClaims::for_user(&sample_user(), Utc::now(), Duration::hours(1));
        let token = issuer.issue(&claims).unwrap();
        assert!(matches!(codec.verify(&token), Err(ServiceError::Unauthorized(_))));

        let stale = TokenClaims::for_user(
            &sample_user(),
            Utc::now() - Duration::hours(3),
            Duration::hours(1),
        );
        let token = codec.issue(&stale).unwrap();
        assert!(matches!(codec.verify(&token), Err(ServiceError::Unauthorized(_))));
    }

    #[test]
    fn test_verify_rejects_other_algorithm() {
        let codec = TokenCodec::new("segredo", 5);
        let claims = TokenClaims::for_user(&sample_user(), Utc::now(), Duration::hours(1));
        let token = encode(
            &Header::new(Algorithm::HS512),
            &claims,
            &EncodingKey::from_secret(b"segredo"),
        )
        .unwrap();

        assert!(matches!(codec.verify(&token), Err(ServiceError::Unauthorized(_))));
    }
}
