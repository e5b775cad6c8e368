// ==========================================
// 固件发布记录系统 - 应用状态
// ==========================================
// 职责: 组装仓储、服务与鉴权门,作为命令的共享状态
// ==========================================

use std::sync::{Arc, Mutex};

use rusqlite::Connection;

use crate::auth::gate::AuthGate;
use crate::auth::token::TokenCodec;
use crate::config::AppConfig;
use crate::db::open_shared_connection;
use crate::repository::{ReleaseRepository, UserRepository};
use crate::service::{AuthService, ReleaseService, UserService};

/// 应用状态
///
/// 所有仓储共享同一个数据库连接
pub struct AppState {
    /// 共享连接
    pub conn: Arc<Mutex<Connection>>,

    /// 发布服务
    pub release_service: Arc<ReleaseService>,

    /// 用户服务
    pub user_service: Arc<UserService>,

    /// 登录服务
    pub auth_service: Arc<AuthService>,

    /// 鉴权门
    pub auth_gate: Arc<AuthGate>,
}

impl AppState {
    /// 按配置打开数据库并初始化全部组件
    ///
    /// # 说明
    /// 该方法会:
    /// 1. 打开数据库并建表 (幂等)
    /// 2. 初始化 Repository
    /// 3. 初始化服务与鉴权门
    pub fn new(config: &AppConfig) -> Result<Self, String> {
        tracing::info!("初始化AppState，数据库路径: {}", config.database_url);

        let conn = open_shared_connection(&config.database_url)
            .map_err(|e| format!("无法打开数据库: {}", e))?;

        Ok(Self::from_connection(conn, config))
    }

    /// 从已有连接组装 (调用方负责建表)
    pub fn from_connection(conn: Arc<Mutex<Connection>>, config: &AppConfig) -> Self {
        // ==========================================
        // 初始化Repository层
        // ==========================================
        let release_repo = Arc::new(ReleaseRepository::new(conn.clone()));
        let user_repo = Arc::new(UserRepository::new(conn.clone()));

        // ==========================================
        // 初始化服务与鉴权
        // ==========================================
        let codec = Arc::new(TokenCodec::new(&config.jwt_secret, config.token_leeway_secs));

        let release_service = Arc::new(ReleaseService::new(release_repo));
        let user_service = Arc::new(UserService::new(user_repo.clone()));
        let auth_service = Arc::new(AuthService::new(
            user_repo,
            codec.clone(),
            config.token_ttl(),
        ));
        let auth_gate = Arc::new(AuthGate::new(codec));

        tracing::info!("AppState初始化完成");

        Self {
            conn,
            release_service,
            user_service,
            auth_service,
            auth_gate,
        }
    }

    /// 初始化管理员 (配置中提供时)
    pub fn seed_admin(&self, config: &AppConfig) -> Result<Option<i64>, String> {
        match &config.admin_seed {
            Some(seed) => self
                .user_service
                .seed_admin(seed)
                .map_err(|e| format!("初始化管理员失败: {}", e)),
            None => Ok(None),
        }
    }
}
