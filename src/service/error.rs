// ==========================================
// 固件发布记录系统 - 服务层错误类型
// ==========================================
// 职责: 统一业务错误分类,转换 Repository 错误
// 分类: 校验失败 / 未找到 / 约束冲突 / 未认证 / 无权限 / 存储 / 内部
// ==========================================

use crate::domain::types::UnknownVariant;
use crate::repository::error::RepositoryError;
use thiserror::Error;

/// 服务层错误类型
#[derive(Error, Debug)]
pub enum ServiceError {
    // ===== 调用方可见 (4xx) =====
    #[error("数据验证失败: {0}")]
    ValidationError(String),

    #[error("资源未找到: {0}")]
    NotFound(String),

    #[error("约束冲突: {0}")]
    ConstraintViolation(String),

    #[error("未认证: {0}")]
    Unauthorized(String),

    #[error("无权限: {0}")]
    Forbidden(String),

    // ===== 服务端 (5xx) =====
    #[error("数据库错误: {0}")]
    DatabaseError(String),

    #[error("内部错误: {0}")]
    InternalError(String),
}

impl ServiceError {
    pub fn validation(msg: impl Into<String>) -> Self {
        ServiceError::ValidationError(msg.into())
    }

    pub fn unauthorized(msg: impl Into<String>) -> Self {
        ServiceError::Unauthorized(msg.into())
    }

    pub fn forbidden(msg: impl Into<String>) -> Self {
        ServiceError::Forbidden(msg.into())
    }
}

// ==========================================
// 从 RepositoryError 转换
// ==========================================
// 唯一/外键冲突 → ConstraintViolation; 行不存在 → NotFound; 其余原样作为存储错误
impl From<RepositoryError> for ServiceError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound { entity, id } => {
                ServiceError::NotFound(format!("{}(id={})", entity, id))
            }
            RepositoryError::UniqueConstraintViolation(msg) => {
                ServiceError::ConstraintViolation(msg)
            }
            RepositoryError::ForeignKeyViolation(msg) => ServiceError::ConstraintViolation(msg),
            RepositoryError::DatabaseQueryError(msg) => ServiceError::DatabaseError(msg),
            RepositoryError::LockError(msg) => ServiceError::InternalError(msg),
        }
    }
}

impl From<UnknownVariant> for ServiceError {
    fn from(err: UnknownVariant) -> Self {
        ServiceError::ValidationError(err.to_string())
    }
}

/// Result 类型别名
pub type ServiceResult<T> = Result<T, ServiceError>;
