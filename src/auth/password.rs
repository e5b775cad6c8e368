// ==========================================
// 固件发布记录系统 - 口令哈希
// ==========================================
// 算法: argon2id,存储为 PHC 字符串
// ==========================================

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;

use crate::service::error::{ServiceError, ServiceResult};

/// 对明文口令做 argon2id 哈希
pub fn hash_password(password: &str) -> ServiceResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| ServiceError::InternalError(format!("口令哈希失败: {}", e)))
}

/// 校验明文口令与存储的哈希是否匹配
///
/// 存储值无法解析时视为不匹配
pub fn verify_password(password: &str, hash: &str) -> bool {
    match PasswordHash::new(hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_then_verify() {
        let hash = hash_password("s3nha-forte").unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password("s3nha-forte", &hash));
        assert!(!verify_password("s3nha-fraca", &hash));
    }

    #[test]
    fn test_salts_differ() {
        let a = hash_password("same").unwrap();
        let b = hash_password("same").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_garbage_hash_never_matches() {
        assert!(!verify_password("anything", "not-a-phc-string"));
        assert!(!verify_password("", ""));
    }
}
