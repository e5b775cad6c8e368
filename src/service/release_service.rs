// ==========================================
// 固件发布记录系统 - 发布业务服务
// ==========================================
// 职责: 领域规则校验 + 编排仓储调用
// 红线: 更新时标量字段与子集合在同一事务内提交
// ==========================================

use std::sync::Arc;

use crate::domain::release::{
    EntryInput, LinkInput, ModuleInput, NewRelease, Release, ReleaseFields, ReleaseFilter,
};
use crate::repository::release_repo::ReleaseRepository;
use crate::repository::sql_util::now_utc;
use crate::service::error::{ServiceError, ServiceResult};

// ==========================================
// ReleaseService - 发布服务
// ==========================================
pub struct ReleaseService {
    repo: Arc<ReleaseRepository>,
}

impl ReleaseService {
    pub fn new(repo: Arc<ReleaseRepository>) -> Self {
        Self { repo }
    }

    /// 创建发布
    ///
    /// # 返回
    /// - `Ok(Release)`: 重新读取的完整聚合 (含生成的 id / 时间戳 / 创建人)
    /// - `Err(ValidationError)`: version 为空
    /// - `Err(ConstraintViolation)`: version 已存在
    pub fn create(&self, mut release: NewRelease) -> ServiceResult<Release> {
        release.version = require_version(&release.version)?;

        let id = self.repo.create(&release)?;
        tracing::info!(
            "发布已创建: id={}, version={}, by_user={}",
            id,
            release.version,
            release.created_by_user_id
        );
        Ok(self.repo.get_by_id(id)?)
    }

    /// 按 id 查询
    pub fn get(&self, id: i64) -> ServiceResult<Release> {
        Ok(self.repo.get_by_id(id)?)
    }

    /// 按条件列表查询 (不做额外校验)
    pub fn list(&self, filter: &ReleaseFilter) -> ServiceResult<Vec<Release>> {
        Ok(self.repo.list(filter)?)
    }

    /// 整体更新发布
    ///
    /// 以 `id` 为准 (忽略载荷中的任何 id),保留创建人与创建时间,
    /// 刷新 updated_at; 标量字段和子集合在一个事务内替换。
    pub fn update_full(
        &self,
        id: i64,
        mut fields: ReleaseFields,
        modules: &[ModuleInput],
        entries: &[EntryInput],
        links: &[LinkInput],
    ) -> ServiceResult<Release> {
        fields.version = require_version(&fields.version)?;

        let mut current = self.repo.get_by_id(id)?;
        current.apply_fields(fields);
        current.id = id;
        current.updated_at = now_utc();

        let updated = self.repo.update_full(&current, modules, entries, links)?;
        tracing::info!(
            "发布已更新: id={}, version={}, modules={}, entries={}, links={}",
            id,
            updated.version,
            updated.modules.len(),
            updated.entries.len(),
            updated.links.len()
        );
        Ok(updated)
    }

    /// 删除发布 (子集合由存储级联删除)
    pub fn delete(&self, id: i64) -> ServiceResult<()> {
        self.repo.delete(id)?;
        tracing::info!("发布已删除: id={}", id);
        Ok(())
    }
}

fn require_version(version: &str) -> ServiceResult<String> {
    let version = version.trim();
    if version.is_empty() {
        return Err(ServiceError::validation("version 不能为空"));
    }
    Ok(version.to_string())
}
