use serde::{Deserialize, Serialize};

use crate::app::state::AppState;
use crate::domain::types::Role;
use crate::domain::user::User;
use crate::service::auth_service::LoginResponse;
use crate::service::error::ServiceError;

use super::common::{map_service_error, CommandResult, Reply};

// ==========================================
// 用户/登录 DTO
// ==========================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterUserRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// 注册成功返回的用户 (不含口令哈希)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserCreatedResponse {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub role: Role,
}

impl From<User> for UserCreatedResponse {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            name: u.name,
            email: u.email,
            role: u.role,
        }
    }
}

// ==========================================
// 用户相关命令
// ==========================================

/// 自助注册 (公开,角色固定为 viewer)
pub fn register_user(
    state: &AppState,
    request: RegisterUserRequest,
) -> CommandResult<UserCreatedResponse> {
    let user = state
        .user_service
        .register(&request.name, &request.email, &request.password)
        .map_err(map_service_error)?;

    Ok(Reply::created(user.into()))
}

/// 登录 (公开)
pub fn login(state: &AppState, request: LoginRequest) -> CommandResult<LoginResponse> {
    if request.email.trim().is_empty() || request.password.is_empty() {
        return Err(map_service_error(ServiceError::validation(
            "email 和 password 不能为空",
        )));
    }

    let response = state
        .auth_service
        .login(&request.email, &request.password)
        .map_err(map_service_error)?;

    Ok(Reply::ok(response))
}
