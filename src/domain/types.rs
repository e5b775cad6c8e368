// ==========================================
// 固件发布记录系统 - 领域类型定义
// ==========================================
// 红线: 枚举型字段在边界处统一为封闭变体,未知值一律拒绝
// 存储/传输格式: 与数据库一致的字面量字符串
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// 枚举解析失败
///
/// 由服务层转换为 ValidationError
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{field} 取值无效: '{value}' (允许: {allowed})")]
pub struct UnknownVariant {
    pub field: &'static str,
    pub value: String,
    pub allowed: &'static str,
}

// ==========================================
// 固件状态 (Firmware Status)
// ==========================================
// 无强制迁移图: 任意状态之间可经显式更新互转(由人工管理生命周期)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FirmwareStatus {
    Revisao,       // 评审中
    #[default]
    Producao,      // 量产
    Descontinuado, // 停用
}

impl fmt::Display for FirmwareStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.to_db_str())
    }
}

impl FromStr for FirmwareStatus {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "revisao" => Ok(FirmwareStatus::Revisao),
            "producao" => Ok(FirmwareStatus::Producao),
            "descontinuado" => Ok(FirmwareStatus::Descontinuado),
            other => Err(UnknownVariant {
                field: "status",
                value: other.to_string(),
                allowed: "revisao|producao|descontinuado",
            }),
        }
    }
}

impl FirmwareStatus {
    /// 解析状态; 空串(含纯空白)回落为默认值 producao
    pub fn parse_or_default(s: &str) -> Result<Self, UnknownVariant> {
        let s = s.trim();
        if s.is_empty() {
            return Ok(FirmwareStatus::default());
        }
        s.parse()
    }

    /// 转换为数据库存储的字符串
    pub fn to_db_str(&self) -> &'static str {
        match self {
            FirmwareStatus::Revisao => "revisao",
            FirmwareStatus::Producao => "producao",
            FirmwareStatus::Descontinuado => "descontinuado",
        }
    }
}

// ==========================================
// 变更分类 (Entry Classification)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntryClassification {
    #[serde(rename = "Novo")]
    Novo, // 新功能
    #[serde(rename = "Otimização")]
    Otimizacao, // 优化
    #[serde(rename = "Correção")]
    Correcao, // 缺陷修复
    #[serde(rename = "Segurança")]
    Seguranca, // 安全
}

impl fmt::Display for EntryClassification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.to_db_str())
    }
}

impl FromStr for EntryClassification {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "Novo" => Ok(EntryClassification::Novo),
            "Otimização" => Ok(EntryClassification::Otimizacao),
            "Correção" => Ok(EntryClassification::Correcao),
            "Segurança" => Ok(EntryClassification::Seguranca),
            other => Err(UnknownVariant {
                field: "classification",
                value: other.to_string(),
                allowed: "Novo|Otimização|Correção|Segurança",
            }),
        }
    }
}

impl EntryClassification {
    pub fn to_db_str(&self) -> &'static str {
        match self {
            EntryClassification::Novo => "Novo",
            EntryClassification::Otimizacao => "Otimização",
            EntryClassification::Correcao => "Correção",
            EntryClassification::Seguranca => "Segurança",
        }
    }
}

// ==========================================
// 用户角色 (Role)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,  // 管理员
    Editor, // 编辑
    Viewer, // 只读
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.to_db_str())
    }
}

impl FromStr for Role {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Role::Admin),
            "editor" => Ok(Role::Editor),
            "viewer" => Ok(Role::Viewer),
            other => Err(UnknownVariant {
                field: "role",
                value: other.to_string(),
                allowed: "admin|editor|viewer",
            }),
        }
    }
}

impl Role {
    pub fn to_db_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Editor => "editor",
            Role::Viewer => "viewer",
        }
    }
}
