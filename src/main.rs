// ==========================================
// 固件发布记录系统 - 主入口
// ==========================================
// 职责: 日志 → 配置 → 数据库 → 初始管理员
// ==========================================

use anyhow::Context;

use firmware_changelog::app::AppState;
use firmware_changelog::config::AppConfig;
use firmware_changelog::{db, logging};

fn main() -> anyhow::Result<()> {
    // 初始化日志系统
    if std::env::var("LOG_FORMAT").map(|v| v == "json").unwrap_or(false) {
        logging::init_json();
    } else {
        logging::init();
    }

    tracing::info!("==================================================");
    tracing::info!("{}", firmware_changelog::APP_NAME);
    tracing::info!("系统版本: {}", firmware_changelog::VERSION);
    tracing::info!("==================================================");

    let config = AppConfig::from_env().context("加载配置失败")?;
    tracing::info!("配置: {:?}", config);

    let app_state = AppState::new(&config).map_err(anyhow::Error::msg)?;

    {
        let conn = app_state
            .conn
            .lock()
            .map_err(|e| anyhow::anyhow!("数据库锁获取失败: {}", e))?;
        let version = db::read_schema_version(&conn).context("读取 schema 版本失败")?;
        tracing::info!("schema 版本: {:?}", version);
    }

    match app_state.seed_admin(&config).map_err(anyhow::Error::msg)? {
        Some(id) => tracing::info!("初始管理员已创建: id={}", id),
        None => tracing::info!("跳过初始管理员 (未配置或已存在)"),
    }

    tracing::info!("就绪: port={}", config.port);
    Ok(())
}
