// ==========================================
// 固件发布记录系统 - 应用层
// ==========================================
// 职责: 应用状态组装 + 命令边界
// ==========================================

pub mod commands;
pub mod state;

// 重导出
pub use commands::*;
pub use state::AppState;
