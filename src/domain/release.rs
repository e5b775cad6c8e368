// ==========================================
// 固件发布记录系统 - 发布聚合领域模型
// ==========================================
// 聚合根: Release
// 子集合: ReleaseModule / ChangelogEntry / FirmwareLink (随发布级联删除)
// 红线: 子集合无独立生命周期,更新时整体替换
// ==========================================

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::domain::types::{EntryClassification, FirmwareStatus};
use crate::domain::user::UserSummary;

// ==========================================
// Release - 固件发布
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Release {
    pub id: i64,                         // 主键
    pub version: String,                 // 版本号 (全局唯一)
    pub previous_version: String,        // 上一版本
    pub ota: bool,                       // 是否支持 OTA
    pub ota_obs: Option<String>,         // OTA 备注
    pub release_date: NaiveDate,         // 发布日期
    pub important_note: Option<String>,  // 重要说明
    pub status: FirmwareStatus,          // 状态
    pub product_category: String,        // 产品分类
    pub product_name: String,            // 产品名称
    pub created_by_user_id: i64,         // 创建人
    pub created_at: NaiveDateTime,       // 创建时间 (UTC)
    pub updated_at: NaiveDateTime,       // 更新时间 (UTC)

    // ===== 预加载关系 =====
    pub created_by: Option<UserSummary>,
    pub modules: Vec<ReleaseModule>,     // 无序
    pub entries: Vec<ChangelogEntry>,    // 按 item_order 升序
    pub links: Vec<FirmwareLink>,        // 按 id 升序
}

/// 待创建的发布聚合 (不含生成字段)
#[derive(Debug, Clone, PartialEq)]
pub struct NewRelease {
    pub version: String,
    pub previous_version: String,
    pub ota: bool,
    pub ota_obs: Option<String>,
    pub release_date: NaiveDate,
    pub important_note: Option<String>,
    pub status: FirmwareStatus,
    pub product_category: String,
    pub product_name: String,
    pub created_by_user_id: i64,
    pub modules: Vec<ModuleInput>,
    pub entries: Vec<EntryInput>,
    pub links: Vec<LinkInput>,
}

/// 发布的标量字段 (整行覆盖更新时使用)
#[derive(Debug, Clone, PartialEq)]
pub struct ReleaseFields {
    pub version: String,
    pub previous_version: String,
    pub ota: bool,
    pub ota_obs: Option<String>,
    pub release_date: NaiveDate,
    pub important_note: Option<String>,
    pub status: FirmwareStatus,
    pub product_category: String,
    pub product_name: String,
}

// ==========================================
// ReleaseModule - 模块固件版本
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseModule {
    pub id: i64,
    pub release_id: i64,
    pub module: String,  // 例: "PCB A7"
    pub version: String, // 例: "1.3033.0"
    pub updated: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ModuleInput {
    pub module: String,
    pub version: String,
    pub updated: bool,
}

// ==========================================
// ChangelogEntry - 变更条目
// ==========================================
// item_order 仅用于展示排序,不要求唯一
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangelogEntry {
    pub id: i64,
    pub release_id: i64,
    pub item_order: i32,
    pub classification: EntryClassification,
    pub observation: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryInput {
    pub item_order: i32,
    pub classification: EntryClassification,
    pub observation: String,
}

// ==========================================
// FirmwareLink - 固件下载链接
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FirmwareLink {
    pub id: i64,
    pub release_id: i64,
    pub module: String,
    pub description: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkInput {
    pub module: String,
    pub description: String,
    pub url: String,
}

// ==========================================
// ReleaseFilter - 列表查询条件
// ==========================================
// 各条件之间 AND; q 在 version/previous_version/ota_obs/important_note 之间 OR
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReleaseFilter {
    pub q: Option<String>,            // 不区分大小写的子串匹配
    pub version: Option<String>,      // 精确匹配
    pub date_from: Option<NaiveDate>, // release_date >= date_from
    pub date_to: Option<NaiveDate>,   // release_date <= date_to
}

impl Release {
    /// 提取标量字段
    pub fn fields(&self) -> ReleaseFields {
        ReleaseFields {
            version: self.version.clone(),
            previous_version: self.previous_version.clone(),
            ota: self.ota,
            ota_obs: self.ota_obs.clone(),
            release_date: self.release_date,
            important_note: self.important_note.clone(),
            status: self.status,
            product_category: self.product_category.clone(),
            product_name: self.product_name.clone(),
        }
    }

    /// 以新的标量字段覆盖本对象 (不触碰 id / 创建人 / 创建时间 / 子集合)
    pub fn apply_fields(&mut self, fields: ReleaseFields) {
        self.version = fields.version;
        self.previous_version = fields.previous_version;
        self.ota = fields.ota;
        self.ota_obs = fields.ota_obs;
        self.release_date = fields.release_date;
        self.important_note = fields.important_note;
        self.status = fields.status;
        self.product_category = fields.product_category;
        self.product_name = fields.product_name;
    }

    /// 模块子集合的输入形式
    pub fn module_inputs(&self) -> Vec<ModuleInput> {
        self.modules
            .iter()
            .map(|m| ModuleInput {
                module: m.module.clone(),
                version: m.version.clone(),
                updated: m.updated,
            })
            .collect()
    }
}
