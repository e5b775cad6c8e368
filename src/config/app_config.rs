// ==========================================
// 固件发布记录系统 - 应用配置
// ==========================================
// 来源: 进程环境变量 (进程环境为唯一来源)
// 职责: 读取、解析、回落默认值
// ==========================================

use std::time::Duration;
use thiserror::Error;

// ==========================================
// 配置键常量
// ==========================================
pub mod config_keys {
    pub const DATABASE_URL: &str = "DATABASE_URL";
    pub const PORT: &str = "PORT";
    pub const JWT_SECRET: &str = "JWT_SECRET";
    pub const ACCESS_TOKEN_TTL: &str = "ACCESS_TOKEN_TTL";
    pub const TOKEN_LEEWAY_SECS: &str = "TOKEN_LEEWAY_SECS";

    pub const ADMIN_EMAIL: &str = "ADMIN_EMAIL";
    pub const ADMIN_PASSWORD: &str = "ADMIN_PASSWORD";
    pub const ADMIN_NAME: &str = "ADMIN_NAME";

    pub const FILE_SERVER_URL: &str = "FILE_SERVER_URL";
    pub const FILE_SERVER_USER: &str = "FILE_SERVER_USER";
    pub const FILE_SERVER_PASSWORD: &str = "FILE_SERVER_PASSWORD";
    pub const FILE_SERVER_TIMEOUT_SECS: &str = "FILE_SERVER_TIMEOUT_SECS";
}

pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_ACCESS_TOKEN_TTL: Duration = Duration::from_secs(2 * 60 * 60);
pub const DEFAULT_TOKEN_LEEWAY_SECS: u64 = 5;
pub const DEFAULT_ADMIN_NAME: &str = "Admin";
pub const DEFAULT_FILE_SERVER_TIMEOUT_SECS: u64 = 30;

/// 配置错误
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("缺少必需的环境变量: {0}")]
    Missing(&'static str),

    #[error("环境变量取值无效 ({key}={value}): {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

/// 初始管理员
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminSeed {
    pub email: String,
    pub password: String,
    pub name: String,
}

/// 外部文件服务器 (固件二进制存放处)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileServerConfig {
    pub base_url: String,
    pub user: Option<String>,
    pub password: Option<String>,
    pub timeout: Duration,
}

// ==========================================
// AppConfig - 应用配置
// ==========================================
#[derive(Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub database_url: String,
    pub port: u16,
    pub jwt_secret: String,
    pub access_token_ttl: Duration,
    pub token_leeway_secs: u64,
    pub admin_seed: Option<AdminSeed>,
    pub file_server: Option<FileServerConfig>,
}

// 密钥/口令不进日志
impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("database_url", &self.database_url)
            .field("port", &self.port)
            .field("jwt_secret", &"***")
            .field("access_token_ttl", &self.access_token_ttl)
            .field("token_leeway_secs", &self.token_leeway_secs)
            .field("admin_seed", &self.admin_seed.as_ref().map(|a| &a.email))
            .field(
                "file_server",
                &self.file_server.as_ref().map(|fs| &fs.base_url),
            )
            .finish()
    }
}

impl AppConfig {
    /// 从进程环境变量加载
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// 从任意键值来源加载
    ///
    /// 空字符串 (含纯空白) 视为未设置
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        use config_keys::*;

        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let database_url = get(DATABASE_URL).ok_or(ConfigError::Missing(DATABASE_URL))?;
        let jwt_secret = get(JWT_SECRET).ok_or(ConfigError::Missing(JWT_SECRET))?;

        let port = match get(PORT) {
            Some(raw) => raw.parse::<u16>().map_err(|e| ConfigError::Invalid {
                key: PORT,
                value: raw.clone(),
                reason: e.to_string(),
            })?,
            None => DEFAULT_PORT,
        };

        let access_token_ttl = match get(ACCESS_TOKEN_TTL) {
            Some(raw) => parse_duration(&raw).unwrap_or_else(|| {
                tracing::warn!(
                    "{} 取值无法解析: '{}', 使用默认值 {:?}",
                    ACCESS_TOKEN_TTL,
                    raw,
                    DEFAULT_ACCESS_TOKEN_TTL
                );
                DEFAULT_ACCESS_TOKEN_TTL
            }),
            None => DEFAULT_ACCESS_TOKEN_TTL,
        };

        let token_leeway_secs = match get(TOKEN_LEEWAY_SECS) {
            Some(raw) => raw.parse::<u64>().unwrap_or_else(|_| {
                tracing::warn!(
                    "{} 取值无法解析: '{}', 使用默认值 {}",
                    TOKEN_LEEWAY_SECS,
                    raw,
                    DEFAULT_TOKEN_LEEWAY_SECS
                );
                DEFAULT_TOKEN_LEEWAY_SECS
            }),
            None => DEFAULT_TOKEN_LEEWAY_SECS,
        };

        // 邮箱和口令都提供时才做管理员初始化
        let admin_seed = match (get(ADMIN_EMAIL), get(ADMIN_PASSWORD)) {
            (Some(email), Some(password)) => Some(AdminSeed {
                email,
                password,
                name: get(ADMIN_NAME).unwrap_or_else(|| DEFAULT_ADMIN_NAME.to_string()),
            }),
            _ => None,
        };

        let file_server = get(FILE_SERVER_URL).map(|base_url| FileServerConfig {
            base_url,
            user: get(FILE_SERVER_USER),
            password: get(FILE_SERVER_PASSWORD),
            timeout: Duration::from_secs(
                get(FILE_SERVER_TIMEOUT_SECS)
                    .and_then(|raw| raw.parse::<u64>().ok())
                    .unwrap_or(DEFAULT_FILE_SERVER_TIMEOUT_SECS),
            ),
        });

        Ok(Self {
            database_url,
            port,
            jwt_secret,
            access_token_ttl,
            token_leeway_secs,
            admin_seed,
            file_server,
        })
    }

    /// 令牌有效期 (chrono 形式,供签发使用)
    pub fn token_ttl(&self) -> chrono::Duration {
        chrono::Duration::from_std(self.access_token_ttl)
            .unwrap_or_else(|_| chrono::Duration::hours(2))
    }
}

/// 解析时长: 支持 `h` / `m` / `s` 单位组合 (如 `2h`, `90m`, `1h30m`, `3600s`)
///
/// 纯数字按秒处理; 结果为 0 或格式错误时返回 None
pub fn parse_duration(raw: &str) -> Option<Duration> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(secs) = raw.parse::<u64>() {
        return (secs > 0).then(|| Duration::from_secs(secs));
    }

    let mut total: u64 = 0;
    let mut digits = String::new();
    for ch in raw.chars() {
        if ch.is_ascii_digit() {
            digits.push(ch);
            continue;
        }
        let unit = match ch {
            'h' => 3600,
            'm' => 60,
            's' => 1,
            _ => return None,
        };
        if digits.is_empty() {
            return None;
        }
        let n: u64 = digits.parse().ok()?;
        total = total.checked_add(n.checked_mul(unit)?)?;
        digits.clear();
    }
    if !digits.is_empty() || total == 0 {
        return None;
    }
    Some(Duration::from_secs(total))
}
