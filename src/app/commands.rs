// ==========================================
// 固件发布记录系统 - 命令边界 (按域拆分)
// ==========================================
// 职责: 传输无关的命令入口,连接调用方与业务服务
// 顺序: 身份 → 角色 → 载荷校验 → 服务
// ==========================================

mod common;
mod release;
mod user;

pub use common::{CommandResult, ErrorResponse, Reply};
pub use release::*;
pub use user::*;
