use super::ReleaseRepository;
use crate::db::UNICODE_LOWER_FN;
use crate::domain::release::{ChangelogEntry, FirmwareLink, Release, ReleaseFilter, ReleaseModule};
use crate::domain::user::UserSummary;
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::sql_util::{escape_like, format_date, get_date, get_datetime, get_enum};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};
use std::collections::HashMap;

const RELEASE_SELECT: &str = r#"
    SELECT r.id, r.version, r.previous_version, r.ota, r.ota_obs,
           r.release_date, r.important_note, r.status,
           r.product_category, r.product_name,
           r.created_by_user_id, r.created_at, r.updated_at,
           u.id, u.name, u.role
    FROM releases r
    LEFT JOIN users u ON u.id = r.created_by_user_id
"#;

impl ReleaseRepository {
    // ==========================================
    // 查询操作
    // ==========================================

    /// 按 id 查询完整聚合
    ///
    /// # 返回
    /// - `Ok(Release)`: 模块(插入顺序)、条目(item_order 升序)、链接已预加载
    /// - `Err(NotFound)`: 发布不存在
    pub fn get_by_id(&self, id: i64) -> RepositoryResult<Release> {
        let conn = self.get_conn()?;
        load_release(&conn, id)
    }

    /// 按条件查询发布列表 (release_date 降序)
    ///
    /// 说明：
    /// - version 精确匹配; q 在 version/previous_version/ota_obs/important_note 间做
    ///   不区分大小写的子串 OR 匹配; date_from/date_to 为闭区间
    /// - release_date 在库中为 YYYY-MM-DD 文本,ISO 格式支持字符串比较
    pub fn list(&self, filter: &ReleaseFilter) -> RepositoryResult<Vec<Release>> {
        let conn = self.get_conn()?;

        let mut sql = format!("{} WHERE 1 = 1", RELEASE_SELECT);
        let mut values: Vec<Value> = Vec::new();
        let mut idx: i32 = 1;

        if let Some(version) = non_blank(filter.version.as_deref()) {
            sql.push_str(&format!(" AND r.version = ?{}", idx));
            values.push(Value::from(version.to_string()));
            idx += 1;
        }

        if let Some(q) = non_blank(filter.q.as_deref()) {
            // 列与检索词必须按同一规则转小写,否则带重音的字符无法匹配
            sql.push_str(&format!(
                " AND ({f}(r.version) LIKE ?{i} ESCAPE '\\' \
                  OR {f}(r.previous_version) LIKE ?{i} ESCAPE '\\' \
                  OR {f}(COALESCE(r.ota_obs, '')) LIKE ?{i} ESCAPE '\\' \
                  OR {f}(COALESCE(r.important_note, '')) LIKE ?{i} ESCAPE '\\')",
                f = UNICODE_LOWER_FN,
                i = idx
            ));
            values.push(Value::from(format!("%{}%", escape_like(&q.to_lowercase()))));
            idx += 1;
        }

        if let Some(from) = filter.date_from {
            sql.push_str(&format!(" AND r.release_date >= ?{}", idx));
            values.push(Value::from(format_date(from)));
            idx += 1;
        }

        if let Some(to) = filter.date_to {
            sql.push_str(&format!(" AND r.release_date <= ?{}", idx));
            values.push(Value::from(format_date(to)));
        }

        sql.push_str(" ORDER BY r.release_date DESC, r.id DESC");
        tracing::debug!("release list sql: {}", sql);

        let mut stmt = conn.prepare(&sql)?;
        let mut releases = stmt
            .query_map(params_from_iter(values), map_release_row)?
            .collect::<Result<Vec<Release>, _>>()?;

        preload_children(&conn, &mut releases)?;
        Ok(releases)
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|s| !s.is_empty())
}

/// 在给定连接上读取完整聚合 (供事务提交后复用同一把锁)
pub(super) fn load_release(conn: &Connection, id: i64) -> RepositoryResult<Release> {
    let sql = format!("{} WHERE r.id = ?1", RELEASE_SELECT);
    let mut release = conn
        .query_row(&sql, params![id], map_release_row)
        .optional()?
        .ok_or_else(|| RepositoryError::not_found("Release", id))?;

    preload_children(conn, std::slice::from_mut(&mut release))?;
    Ok(release)
}

/// 批量预加载子集合 (每类子表一次查询)
fn preload_children(conn: &Connection, releases: &mut [Release]) -> RepositoryResult<()> {
    if releases.is_empty() {
        return Ok(());
    }

    let ids: Vec<i64> = releases.iter().map(|r| r.id).collect();
    let placeholders = vec!["?"; ids.len()].join(", ");

    let mut modules: HashMap<i64, Vec<ReleaseModule>> = HashMap::new();
    {
        let sql = format!(
            "SELECT id, release_id, module, version, updated FROM release_modules \
             WHERE release_id IN ({}) ORDER BY id",
            placeholders
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(ids.iter()), map_module_row)?;
        for row in rows {
            let m = row?;
            modules.entry(m.release_id).or_default().push(m);
        }
    }

    let mut entries: HashMap<i64, Vec<ChangelogEntry>> = HashMap::new();
    {
        let sql = format!(
            "SELECT id, release_id, item_order, classification, observation FROM changelog_entries \
             WHERE release_id IN ({}) ORDER BY item_order ASC, id ASC",
            placeholders
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(ids.iter()), map_entry_row)?;
        for row in rows {
            let e = row?;
            entries.entry(e.release_id).or_default().push(e);
        }
    }

    let mut links: HashMap<i64, Vec<FirmwareLink>> = HashMap::new();
    {
        let sql = format!(
            "SELECT id, release_id, module, description, url FROM firmware_links \
             WHERE release_id IN ({}) ORDER BY id",
            placeholders
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(ids.iter()), map_link_row)?;
        for row in rows {
            let l = row?;
            links.entry(l.release_id).or_default().push(l);
        }
    }

    for release in releases.iter_mut() {
        release.modules = modules.remove(&release.id).unwrap_or_default();
        release.entries = entries.remove(&release.id).unwrap_or_default();
        release.links = links.remove(&release.id).unwrap_or_default();
    }
    Ok(())
}

// ==========================================
// 行映射
// ==========================================

fn map_release_row(row: &Row) -> rusqlite::Result<Release> {
    let creator_id: Option<i64> = row.get(13)?;
    let created_by = match creator_id {
        Some(id) => Some(UserSummary {
            id,
            name: row.get(14)?,
            role: get_enum(row, 15)?,
        }),
        None => None,
    };

    Ok(Release {
        id: row.get(0)?,
        version: row.get(1)?,
        previous_version: row.get(2)?,
        ota: row.get(3)?,
        ota_obs: row.get(4)?,
        release_date: get_date(row, 5)?,
        important_note: row.get(6)?,
        status: get_enum(row, 7)?,
        product_category: row.get(8)?,
        product_name: row.get(9)?,
        created_by_user_id: row.get(10)?,
        created_at: get_datetime(row, 11)?,
        updated_at: get_datetime(row, 12)?,
        created_by,
        modules: Vec::new(),
        entries: Vec::new(),
        links: Vec::new(),
    })
}

fn map_module_row(row: &Row) -> rusqlite::Result<ReleaseModule> {
    Ok(ReleaseModule {
        id: row.get(0)?,
        release_id: row.get(1)?,
        module: row.get(2)?,
        version: row.get(3)?,
        updated: row.get(4)?,
    })
}

fn map_entry_row(row: &Row) -> rusqlite::Result<ChangelogEntry> {
    Ok(ChangelogEntry {
        id: row.get(0)?,
        release_id: row.get(1)?,
        item_order: row.get(2)?,
        classification: get_enum(row, 3)?,
        observation: row.get(4)?,
    })
}

fn map_link_row(row: &Row) -> rusqlite::Result<FirmwareLink> {
    Ok(FirmwareLink {
        id: row.get(0)?,
        release_id: row.get(1)?,
        module: row.get(2)?,
        description: row.get(3)?,
        url: row.get(4)?,
    })
}
