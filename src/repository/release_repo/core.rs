use super::queries::load_release;
use crate::domain::release::{EntryInput, LinkInput, ModuleInput, NewRelease, Release};
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::sql_util::{format_date, format_datetime, now_utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::sync::{Arc, Mutex};

// ==========================================
// ReleaseRepository - 发布聚合仓储
// ==========================================
// 红线: Repository 不做业务逻辑,只做数据映射与事务边界
pub struct ReleaseRepository {
    conn: Arc<Mutex<Connection>>,
}

impl ReleaseRepository {
    /// 创建新的发布仓储
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 获取数据库连接
    pub(super) fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    // ==========================================
    // 写入操作
    // ==========================================

    /// 创建发布 (含模块/变更条目/下载链接)
    ///
    /// # 参数
    /// - `release`: 待创建的发布聚合
    ///
    /// # 返回
    /// - `Ok(id)`: 新发布的主键
    /// - `Err(UniqueConstraintViolation)`: version 与已有记录冲突
    ///
    /// # 红线
    /// - 发布行与子集合在同一事务内写入,失败时不留下孤立子记录
    pub fn create(&self, release: &NewRelease) -> RepositoryResult<i64> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;

        let now = format_datetime(now_utc());
        tx.execute(
            r#"
            INSERT INTO releases (
                version, previous_version, ota, ota_obs, release_date,
                important_note, status, product_category, product_name,
                created_by_user_id, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
            "#,
            params![
                release.version,
                release.previous_version,
                release.ota,
                release.ota_obs,
                format_date(release.release_date),
                release.important_note,
                release.status.to_db_str(),
                release.product_category,
                release.product_name,
                release.created_by_user_id,
                now,
                now,
            ],
        )?;
        let id = tx.last_insert_rowid();

        insert_children(&tx, id, &release.modules, &release.entries, &release.links)?;

        tx.commit()?;
        tracing::debug!(
            "release 已写入: id={}, modules={}, entries={}, links={}",
            id,
            release.modules.len(),
            release.entries.len(),
            release.links.len()
        );
        Ok(id)
    }

    /// 覆盖发布的标量字段 (整行保存,不触碰子集合)
    ///
    /// # 返回
    /// - `Err(NotFound)`: 发布不存在
    pub fn update_base_fields(&self, release: &Release) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        write_base_fields(&conn, release)
    }

    /// 整体替换发布的子集合 (replace-all)
    ///
    /// 在单个事务内: 删除该发布现有的模块/条目/链接 → 插入新集合 → 提交,
    /// 随后重新读取完整聚合返回。空集合合法 (结果为零个子记录)。
    ///
    /// # 红线
    /// - 任一步骤失败则整体回滚,读者不会观察到“删了一半/插了一半”的状态
    pub fn replace_relations(
        &self,
        id: i64,
        modules: &[ModuleInput],
        entries: &[EntryInput],
        links: &[LinkInput],
    ) -> RepositoryResult<Release> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;

        ensure_exists(&tx, id)?;
        replace_children(&tx, id, modules, entries, links)?;

        tx.commit()?;
        load_release(&conn, id)
    }

    /// 标量字段 + 子集合在同一事务内整体更新
    ///
    /// 说明：update_base_fields + replace_relations 分两次提交时,
    /// 两次之间可能观察到“新标量 + 旧子集合”。这里合并为一个事务。
    pub fn update_full(
        &self,
        release: &Release,
        modules: &[ModuleInput],
        entries: &[EntryInput],
        links: &[LinkInput],
    ) -> RepositoryResult<Release> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;

        write_base_fields(&tx, release)?;
        replace_children(&tx, release.id, modules, entries, links)?;

        tx.commit()?;
        load_release(&conn, release.id)
    }

    /// 删除发布 (子集合由外键级联删除)
    pub fn delete(&self, id: i64) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let rows = conn.execute("DELETE FROM releases WHERE id = ?1", params![id])?;
        if rows == 0 {
            return Err(RepositoryError::not_found("Release", id));
        }
        Ok(())
    }
}

// ==========================================
// 事务内辅助函数 (Transaction 可解引用为 Connection)
// ==========================================

fn ensure_exists(conn: &Connection, id: i64) -> RepositoryResult<()> {
    let found = conn
        .query_row("SELECT 1 FROM releases WHERE id = ?1", params![id], |_| Ok(()))
        .optional()?;
    found.ok_or_else(|| RepositoryError::not_found("Release", id))
}

fn write_base_fields(conn: &Connection, release: &Release) -> RepositoryResult<()> {
    let rows = conn.execute(
        r#"
        UPDATE releases
        SET version = ?1, previous_version = ?2, ota = ?3, ota_obs = ?4,
            release_date = ?5, important_note = ?6, status = ?7,
            product_category = ?8, product_name = ?9,
            created_by_user_id = ?10, created_at = ?11, updated_at = ?12
        WHERE id = ?13
        "#,
        params![
            release.version,
            release.previous_version,
            release.ota,
            release.ota_obs,
            format_date(release.release_date),
            release.important_note,
            release.status.to_db_str(),
            release.product_category,
            release.product_name,
            release.created_by_user_id,
            format_datetime(release.created_at),
            format_datetime(release.updated_at),
            release.id,
        ],
    )?;

    if rows == 0 {
        return Err(RepositoryError::not_found("Release", release.id));
    }
    Ok(())
}

fn replace_children(
    conn: &Connection,
    release_id: i64,
    modules: &[ModuleInput],
    entries: &[EntryInput],
    links: &[LinkInput],
) -> RepositoryResult<()> {
    conn.execute(
        "DELETE FROM release_modules WHERE release_id = ?1",
        params![release_id],
    )?;
    conn.execute(
        "DELETE FROM changelog_entries WHERE release_id = ?1",
        params![release_id],
    )?;
    conn.execute(
        "DELETE FROM firmware_links WHERE release_id = ?1",
        params![release_id],
    )?;

    insert_children(conn, release_id, modules, entries, links)
}

fn insert_children(
    conn: &Connection,
    release_id: i64,
    modules: &[ModuleInput],
    entries: &[EntryInput],
    links: &[LinkInput],
) -> RepositoryResult<()> {
    if !modules.is_empty() {
        let mut stmt = conn.prepare(
            "INSERT INTO release_modules (release_id, module, version, updated) VALUES (?1, ?2, ?3, ?4)",
        )?;
        for m in modules {
            stmt.execute(params![release_id, m.module, m.version, m.updated])?;
        }
    }

    if !entries.is_empty() {
        let mut stmt = conn.prepare(
            r#"INSERT INTO changelog_entries (release_id, item_order, classification, observation)
               VALUES (?1, ?2, ?3, ?4)"#,
        )?;
        for e in entries {
            stmt.execute(params![
                release_id,
                e.item_order,
                e.classification.to_db_str(),
                e.observation,
            ])?;
        }
    }

    if !links.is_empty() {
        let mut stmt = conn.prepare(
            "INSERT INTO firmware_links (release_id, module, description, url) VALUES (?1, ?2, ?3, ?4)",
        )?;
        for l in links {
            stmt.execute(params![release_id, l.module, l.description, l.url])?;
        }
    }

    Ok(())
}
