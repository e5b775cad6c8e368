// ==========================================
// 固件发布记录系统 - 业务服务层
// ==========================================
// 职责: 领域规则校验,编排 Repository
// 红线: 不直接拼装 SQL
// ==========================================

pub mod auth_service;
pub mod error;
pub mod release_service;
pub mod user_service;

pub use auth_service::{AuthService, LoginResponse, LoginUser};
pub use error::{ServiceError, ServiceResult};
pub use release_service::ReleaseService;
pub use user_service::UserService;
