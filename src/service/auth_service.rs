// ==========================================
// 固件发布记录系统 - 登录服务
// ==========================================
// 职责: 校验口令并签发访问令牌
// 红线: 邮箱不存在与口令错误对调用方不可区分
// ==========================================

use std::sync::Arc;

use chrono::{Duration, Utc};
use serde::Serialize;

use crate::auth::password::verify_password;
use crate::auth::token::{TokenClaims, TokenCodec};
use crate::domain::types::Role;
use crate::domain::user::User;
use crate::repository::error::RepositoryError;
use crate::repository::user_repo::UserRepository;
use crate::service::error::{ServiceError, ServiceResult};

const INVALID_CREDENTIALS: &str = "invalid credentials";

/// 登录返回的用户信息 (不含口令哈希)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoginUser {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub role: Role,
}

impl From<&User> for LoginUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            role: user.role,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: LoginUser,
}

pub struct AuthService {
    users: Arc<UserRepository>,
    codec: Arc<TokenCodec>,
    ttl: Duration,
}

impl AuthService {
    pub fn new(users: Arc<UserRepository>, codec: Arc<TokenCodec>, ttl: Duration) -> Self {
        Self { users, codec, ttl }
    }

    /// 登录
    ///
    /// # 返回
    /// - `Ok(LoginResponse)`: 令牌 + 用户信息
    /// - `Err(Unauthorized)`: 邮箱不存在或口令错误
    pub fn login(&self, email: &str, password: &str) -> ServiceResult<LoginResponse> {
        let user = match self.users.find_by_email(email) {
            Ok(user) => user,
            Err(RepositoryError::NotFound { .. }) => {
                tracing::warn!("登录失败: 邮箱不存在");
                return Err(ServiceError::unauthorized(INVALID_CREDENTIALS));
            }
            Err(e) => return Err(e.into()),
        };

        if !verify_password(password, &user.password_hash) {
            tracing::warn!("登录失败: 口令错误, user_id={}", user.id);
            return Err(ServiceError::unauthorized(INVALID_CREDENTIALS));
        }

        let claims = TokenClaims::for_user(&user, Utc::now(), self.ttl);
        let token = self.codec.issue(&claims)?;
        tracing::info!("登录成功: user_id={}, role={}", user.id, user.role);

        Ok(LoginResponse {
            token,
            user: LoginUser::from(&user),
        })
    }
}
