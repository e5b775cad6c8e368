// ==========================================
// 固件发布记录系统 - 配置层
// ==========================================
// 职责: 从进程环境加载应用配置
// ==========================================

pub mod app_config;

// 重导出核心配置
pub use app_config::{config_keys, AdminSeed, AppConfig, ConfigError, FileServerConfig};
