use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::app::state::AppState;
use crate::auth::gate::{require_role, RequestContext, ADMINS, EDITORS};
use crate::db::DATE_FORMAT;
use crate::domain::release::{
    ChangelogEntry, EntryInput, FirmwareLink, LinkInput, ModuleInput, NewRelease, Release,
    ReleaseFields, ReleaseFilter, ReleaseModule,
};
use crate::domain::types::{EntryClassification, FirmwareStatus};
use crate::domain::user::UserSummary;
use crate::service::error::{ServiceError, ServiceResult};

use super::common::{map_service_error, non_blank, CommandResult, Reply};

// ==========================================
// 请求 DTO
// ==========================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleDto {
    #[serde(default)]
    pub module: String,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub updated: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryDto {
    #[serde(default)]
    pub item_order: i32,
    /// 原始字符串,转换时校验
    #[serde(default)]
    pub classification: String,
    #[serde(default)]
    pub observation: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkDto {
    #[serde(default)]
    pub module: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub url: String,
}

/// 创建/更新发布的载荷
///
/// 任何 id 字段都不会被读取,更新目标只由路径参数决定
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateReleaseRequest {
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub previous_version: String,
    #[serde(default)]
    pub ota: bool,
    #[serde(default)]
    pub ota_obs: Option<String>,
    /// `YYYY-MM-DD` 或 RFC 3339 时间戳 (取日期部分)
    #[serde(default)]
    pub release_date: String,
    #[serde(default)]
    pub important_note: Option<String>,
    /// 空串回落为 producao
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub product_category: String,
    #[serde(default)]
    pub product_name: String,
    #[serde(default)]
    pub modules: Vec<ModuleDto>,
    #[serde(default)]
    pub entries: Vec<EntryDto>,
    #[serde(default)]
    pub links: Vec<LinkDto>,
}

/// 载荷解析后的各部分
struct ReleaseParts {
    fields: ReleaseFields,
    modules: Vec<ModuleInput>,
    entries: Vec<EntryInput>,
    links: Vec<LinkInput>,
}

impl CreateReleaseRequest {
    fn into_parts(self) -> ServiceResult<ReleaseParts> {
        let status = FirmwareStatus::parse_or_default(&self.status)?;
        let release_date = parse_release_date(&self.release_date)?;

        let entries = self
            .entries
            .into_iter()
            .map(|e| -> ServiceResult<EntryInput> {
                Ok(EntryInput {
                    item_order: e.item_order,
                    classification: e.classification.parse::<EntryClassification>()?,
                    observation: e.observation,
                })
            })
            .collect::<ServiceResult<Vec<EntryInput>>>()?;

        let modules = self
            .modules
            .into_iter()
            .map(|m| ModuleInput {
                module: m.module,
                version: m.version,
                updated: m.updated,
            })
            .collect();

        let links = self
            .links
            .into_iter()
            .map(|l| LinkInput {
                module: l.module,
                description: l.description,
                url: l.url,
            })
            .collect();

        Ok(ReleaseParts {
            fields: ReleaseFields {
                version: self.version,
                previous_version: self.previous_version,
                ota: self.ota,
                ota_obs: non_blank(self.ota_obs),
                release_date,
                important_note: non_blank(self.important_note),
                status,
                product_category: self.product_category,
                product_name: self.product_name,
            },
            modules,
            entries,
            links,
        })
    }
}

fn parse_release_date(raw: &str) -> ServiceResult<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(ServiceError::validation("releaseDate 不能为空"));
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, DATE_FORMAT) {
        return Ok(date);
    }
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.date_naive())
        .map_err(|_| {
            ServiceError::validation(format!(
                "releaseDate 格式错误 (应为 YYYY-MM-DD 或 RFC 3339): {}",
                raw
            ))
        })
}

/// 列表查询参数 (原始字符串)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListQuery {
    pub q: Option<String>,
    pub version: Option<String>,
    pub date_from: Option<String>,
    pub date_to: Option<String>,
}

impl ListQuery {
    /// 转换为过滤条件; 格式错误的日期当作未提供
    pub fn to_filter(&self) -> ReleaseFilter {
        let date = |raw: &Option<String>| {
            raw.as_deref()
                .map(str::trim)
                .and_then(|s| NaiveDate::parse_from_str(s, DATE_FORMAT).ok())
        };

        ReleaseFilter {
            q: non_blank(self.q.clone()),
            version: non_blank(self.version.clone()),
            date_from: date(&self.date_from),
            date_to: date(&self.date_to),
        }
    }
}

// ==========================================
// 响应 DTO
// ==========================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseModulePublic {
    pub id: i64,
    pub module: String,
    pub version: String,
    pub updated: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangelogEntryPublic {
    pub id: i64,
    pub item_order: i32,
    pub classification: EntryClassification,
    pub observation: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FirmwareLinkPublic {
    pub id: i64,
    pub module: String,
    pub description: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReleaseResponse {
    pub id: i64,
    pub version: String,
    pub previous_version: String,
    pub ota: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ota_obs: Option<String>,
    pub release_date: NaiveDate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub important_note: Option<String>,
    pub product_category: String,
    pub product_name: String,
    pub status: FirmwareStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_by: Option<UserSummary>,
    pub modules: Vec<ReleaseModulePublic>,
    pub entries: Vec<ChangelogEntryPublic>,
    pub links: Vec<FirmwareLinkPublic>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl From<ReleaseModule> for ReleaseModulePublic {
    fn from(m: ReleaseModule) -> Self {
        Self {
            id: m.id,
            module: m.module,
            version: m.version,
            updated: m.updated,
        }
    }
}

impl From<ChangelogEntry> for ChangelogEntryPublic {
    fn from(e: ChangelogEntry) -> Self {
        Self {
            id: e.id,
            item_order: e.item_order,
            classification: e.classification,
            observation: e.observation,
        }
    }
}

impl From<FirmwareLink> for FirmwareLinkPublic {
    fn from(l: FirmwareLink) -> Self {
        Self {
            id: l.id,
            module: l.module,
            description: l.description,
            url: l.url,
        }
    }
}

impl From<Release> for ReleaseResponse {
    fn from(r: Release) -> Self {
        Self {
            id: r.id,
            version: r.version,
            previous_version: r.previous_version,
            ota: r.ota,
            ota_obs: r.ota_obs,
            release_date: r.release_date,
            important_note: r.important_note,
            product_category: r.product_category,
            product_name: r.product_name,
            status: r.status,
            created_by: r.created_by,
            modules: r.modules.into_iter().map(Into::into).collect(),
            entries: r.entries.into_iter().map(Into::into).collect(),
            links: r.links.into_iter().map(Into::into).collect(),
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

// ==========================================
// 发布相关命令
// ==========================================

/// 查询发布列表 (公开)
pub fn list_releases(state: &AppState, query: &ListQuery) -> CommandResult<Vec<ReleaseResponse>> {
    let releases = state
        .release_service
        .list(&query.to_filter())
        .map_err(map_service_error)?;

    Ok(Reply::ok(releases.into_iter().map(Into::into).collect()))
}

/// 查询单个发布 (公开)
pub fn get_release(state: &AppState, id: i64) -> CommandResult<ReleaseResponse> {
    let release = state.release_service.get(id).map_err(map_service_error)?;
    Ok(Reply::ok(release.into()))
}

/// 创建发布 (admin / editor)
///
/// 创建人取自令牌身份,忽略载荷
pub fn create_release(
    state: &AppState,
    ctx: &RequestContext,
    request: CreateReleaseRequest,
) -> CommandResult<ReleaseResponse> {
    let identity = state.auth_gate.identify(ctx).map_err(map_service_error)?;
    require_role(&identity, EDITORS).map_err(map_service_error)?;

    let parts = request.into_parts().map_err(map_service_error)?;
    let new_release = NewRelease {
        version: parts.fields.version,
        previous_version: parts.fields.previous_version,
        ota: parts.fields.ota,
        ota_obs: parts.fields.ota_obs,
        release_date: parts.fields.release_date,
        important_note: parts.fields.important_note,
        status: parts.fields.status,
        product_category: parts.fields.product_category,
        product_name: parts.fields.product_name,
        created_by_user_id: identity.user_id,
        modules: parts.modules,
        entries: parts.entries,
        links: parts.links,
    };

    let release = state
        .release_service
        .create(new_release)
        .map_err(map_service_error)?;
    Ok(Reply::created(release.into()))
}

/// 整体更新发布 (admin / editor)
pub fn update_release(
    state: &AppState,
    ctx: &RequestContext,
    id: i64,
    request: CreateReleaseRequest,
) -> CommandResult<ReleaseResponse> {
    let identity = state.auth_gate.identify(ctx).map_err(map_service_error)?;
    require_role(&identity, EDITORS).map_err(map_service_error)?;

    let parts = request.into_parts().map_err(map_service_error)?;
    let release = state
        .release_service
        .update_full(id, parts.fields, &parts.modules, &parts.entries, &parts.links)
        .map_err(map_service_error)?;

    tracing::info!("发布更新: id={}, by_user={}", id, identity.user_id);
    Ok(Reply::ok(release.into()))
}

/// 删除发布 (仅 admin)
pub fn delete_release(state: &AppState, ctx: &RequestContext, id: i64) -> CommandResult<()> {
    let identity = state.auth_gate.identify(ctx).map_err(map_service_error)?;
    require_role(&identity, ADMINS).map_err(map_service_error)?;

    state.release_service.delete(id).map_err(map_service_error)?;

    tracing::info!("发布删除: id={}, by_user={}", id, identity.user_id);
    Ok(Reply::no_content())
}
