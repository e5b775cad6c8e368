// ==========================================
// 固件发布记录系统 - 领域模型层
// ==========================================
// 职责: 定义领域实体、类型
// 红线: 不含数据访问逻辑
// ==========================================

pub mod release;
pub mod types;
pub mod user;

// 重导出核心类型
pub use release::{
    ChangelogEntry, EntryInput, FirmwareLink, LinkInput, ModuleInput, NewRelease, Release,
    ReleaseFields, ReleaseFilter, ReleaseModule,
};
pub use types::{EntryClassification, FirmwareStatus, Role, UnknownVariant};
pub use user::{NewUser, User, UserSummary};
