// ==========================================
// 固件发布记录系统 - 核心库
// ==========================================
// 技术栈: Rust + SQLite
// 核心: 发布聚合的事务化持久化、列表查询、角色鉴权
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 数据访问
pub mod repository;

// 服务层 - 业务规则
pub mod service;

// 鉴权层 - 口令/令牌/角色
pub mod auth;

// 配置层 - 环境变量
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA/建表）
pub mod db;

// 日志系统
pub mod logging;

// 应用层 - 命令边界
pub mod app;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{EntryClassification, FirmwareStatus, Role};

// 领域实体
pub use domain::{ChangelogEntry, FirmwareLink, Release, ReleaseFilter, ReleaseModule, User};

// 服务
pub use service::{AuthService, ReleaseService, ServiceError, UserService};

// 应用
pub use app::AppState;
pub use config::AppConfig;

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "固件发布记录系统";
