// ==========================================
// 固件发布记录系统 - 发布聚合数据仓储
// ==========================================
// 聚合: releases + release_modules + changelog_entries + firmware_links
// 红线: Repository 不含业务逻辑
// 红线: 子集合“整体替换”必须在单个事务内完成,读者只能看到旧集合或新集合
// ==========================================

mod core;
mod queries;


pub use core::ReleaseRepository;
