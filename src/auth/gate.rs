// ==========================================
// 固件发布记录系统 - 鉴权门
// ==========================================
// 两道独立检查:
//   1. 身份 (authenticate): 失败 → Unauthorized (401)
//   2. 角色 (require_role): 失败 → Forbidden (403)
// 身份信息通过显式的 RequestContext 传递给命令
// ==========================================

use std::sync::Arc;

use crate::auth::token::TokenCodec;
use crate::domain::types::Role;
use crate::service::error::{ServiceError, ServiceResult};

/// 创建/更新发布允许的角色
pub const EDITORS: &[Role] = &[Role::Admin, Role::Editor];

/// 删除发布允许的角色
pub const ADMINS: &[Role] = &[Role::Admin];

// ==========================================
// Identity - 已认证的调用方
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub user_id: i64,
    /// 可识别的角色; 缺失或未知角色为 None
    pub role: Option<Role>,
    /// 令牌中的原始角色字符串
    pub raw_role: Option<String>,
}

// ==========================================
// RequestContext - 请求级上下文
// ==========================================
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    authorization: Option<String>,
}

impl RequestContext {
    /// 匿名请求
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// 携带 Authorization 头的请求
    pub fn with_authorization(header: impl Into<String>) -> Self {
        Self {
            authorization: Some(header.into()),
        }
    }

    /// 便捷构造: `Bearer <token>`
    pub fn bearer(token: &str) -> Self {
        Self::with_authorization(format!("Bearer {}", token))
    }

    pub fn authorization(&self) -> Option<&str> {
        self.authorization.as_deref()
    }
}

// ==========================================
// AuthGate - 身份校验
// ==========================================
pub struct AuthGate {
    codec: Arc<TokenCodec>,
}

impl AuthGate {
    pub fn new(codec: Arc<TokenCodec>) -> Self {
        Self { codec }
    }

    /// 从 Authorization 头建立身份
    ///
    /// 头部必须恰好是两段: `Bearer <token>` (scheme 不区分大小写)
    ///
    /// # 返回
    /// - `Err(Unauthorized("missing token"))`: 头部缺失或格式错误
    /// - `Err(Unauthorized("invalid token"))`: 签名/算法/时效不通过
    /// - `Err(Unauthorized("missing uid"))`: 无法得到正整数身份
    pub fn authenticate(&self, authorization: Option<&str>) -> ServiceResult<Identity> {
        let token = bearer_token(authorization)
            .ok_or_else(|| ServiceError::unauthorized("missing token"))?;

        let claims = self.codec.verify(token)?;
        let user_id = i64::try_from(claims.user_id)
            .map_err(|_| ServiceError::unauthorized("missing uid"))?;

        let role = claims.role.as_deref().and_then(|r| r.parse::<Role>().ok());
        if role.is_none() {
            if let Some(raw) = claims.role.as_deref() {
                tracing::warn!("令牌携带未知角色: user_id={}, role={}", user_id, raw);
            }
        }

        Ok(Identity {
            user_id,
            role,
            raw_role: claims.role,
        })
    }

    /// 从请求上下文建立身份
    pub fn identify(&self, ctx: &RequestContext) -> ServiceResult<Identity> {
        self.authenticate(ctx.authorization())
    }
}

fn bearer_token(authorization: Option<&str>) -> Option<&str> {
    let header = authorization?;
    let mut parts = header.split_whitespace();
    let scheme = parts.next()?;
    let token = parts.next()?;
    if parts.next().is_some() || !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    Some(token)
}

/// 角色检查
///
/// 身份没有角色,或角色不在允许集合内 → Forbidden
pub fn require_role(identity: &Identity, allowed: &[Role]) -> ServiceResult<()> {
    match identity.role {
        Some(role) if allowed.contains(&role) => Ok(()),
        _ => {
            tracing::warn!(
                "角色不足: user_id={}, role={:?}, allowed={:?}",
                identity.user_id,
                identity.raw_role,
                allowed
            );
            Err(ServiceError::forbidden("forbidden"))
        }
    }
}
