// ==========================================
// 固件发布记录系统 - 鉴权层
// ==========================================
// 职责: 口令哈希、令牌签发/校验、身份与角色检查
// ==========================================

pub mod gate;
pub mod password;
pub mod token;

pub use gate::{require_role, AuthGate, Identity, RequestContext, ADMINS, EDITORS};
pub use password::{hash_password, verify_password};
pub use token::{normalize_subject, TokenClaims, TokenCodec, VerifiedClaims, TOKEN_ISSUER};
