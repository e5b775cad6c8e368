// ==========================================
// 固件发布记录系统 - 用户服务
// ==========================================
// 职责: 自助注册、初始管理员、角色变更
// 红线: 注册入口一律创建 viewer
// ==========================================

use std::sync::Arc;

use crate::auth::password::hash_password;
use crate::config::AdminSeed;
use crate::domain::types::Role;
use crate::domain::user::{NewUser, User};
use crate::repository::error::RepositoryError;
use crate::repository::user_repo::UserRepository;
use crate::service::error::{ServiceError, ServiceResult};

const MIN_NAME_CHARS: usize = 2;
const MIN_PASSWORD_LEN: usize = 6;
const MAX_PASSWORD_LEN: usize = 72;

pub struct UserService {
    repo: Arc<UserRepository>,
}

impl UserService {
    pub fn new(repo: Arc<UserRepository>) -> Self {
        Self { repo }
    }

    /// 自助注册
    ///
    /// # 返回
    /// - `Ok(User)`: 新用户 (角色为 viewer)
    /// - `Err(ValidationError)`: 姓名/邮箱/口令不合规
    /// - `Err(ConstraintViolation)`: 邮箱已注册
    pub fn register(&self, name: &str, email: &str, password: &str) -> ServiceResult<User> {
        let name = name.trim();
        let email = email.trim().to_lowercase();

        if name.chars().count() < MIN_NAME_CHARS {
            return Err(ServiceError::validation("姓名至少 2 个字符"));
        }
        if !is_plausible_email(&email) {
            return Err(ServiceError::validation("邮箱格式无效"));
        }
        if password.len() < MIN_PASSWORD_LEN || password.len() > MAX_PASSWORD_LEN {
            return Err(ServiceError::validation("口令长度必须在 6 到 72 之间"));
        }

        let new_user = NewUser {
            name: name.to_string(),
            email,
            password_hash: hash_password(password)?,
        };

        let id = self.repo.create(&new_user).map_err(|e| match e {
            RepositoryError::UniqueConstraintViolation(_) => {
                ServiceError::ConstraintViolation("邮箱已注册".to_string())
            }
            other => other.into(),
        })?;

        tracing::info!("用户已注册: id={}, email={}", id, new_user.email);
        Ok(self.repo.find_by_id(id)?)
    }

    /// 初始化管理员
    ///
    /// 邮箱已存在时不做任何事
    ///
    /// # 返回
    /// - `Ok(Some(id))`: 新建的管理员
    /// - `Ok(None)`: 已存在
    pub fn seed_admin(&self, seed: &AdminSeed) -> ServiceResult<Option<i64>> {
        match self.repo.find_by_email(&seed.email) {
            Ok(_) => return Ok(None),
            Err(RepositoryError::NotFound { .. }) => {}
            Err(e) => return Err(e.into()),
        }

        let admin = NewUser {
            name: seed.name.trim().to_string(),
            email: seed.email.trim().to_lowercase(),
            password_hash: hash_password(&seed.password)?,
        };
        let id = self.repo.create_with_role(&admin, Role::Admin)?;
        tracing::info!("初始管理员已创建: id={}, email={}", id, admin.email);
        Ok(Some(id))
    }

    /// 变更角色 (不对外暴露)
    pub fn update_role(&self, id: i64, role: Role) -> ServiceResult<()> {
        self.repo.update_role(id, role)?;
        tracing::info!("用户角色已变更: id={}, role={}", id, role);
        Ok(())
    }

    pub fn find_by_id(&self, id: i64) -> ServiceResult<User> {
        Ok(self.repo.find_by_id(id)?)
    }
}

/// 形如 `x@y.z`: 恰好一个 @,本地部分非空,域名含点且点不在首尾
fn is_plausible_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    match domain.rsplit_once('.') {
        Some((host, tld)) => !host.is_empty() && !tld.is_empty() && !domain.starts_with('.'),
        None => false,
    }
}
