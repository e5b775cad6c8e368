// ==========================================
// 固件发布记录系统 - 用户领域模型
// ==========================================
// 鉴权主体: 身份 + 角色
// 红线: 自助注册一律为 viewer,角色不可自行提升
// ==========================================

use serde::{Deserialize, Serialize};

use crate::domain::types::Role;

// ==========================================
// User - 用户
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,         // 唯一,不区分大小写
    pub password_hash: String, // argon2 PHC 字符串,不对外暴露
    pub role: Role,
}

/// 待创建的用户
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
}

/// 对外公开的用户摘要 (发布记录的创建人)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSummary {
    pub id: i64,
    pub name: String,
    pub role: Role,
}
