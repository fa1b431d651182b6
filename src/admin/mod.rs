//! Admin 模块
//!
//! Input: Database, JWT
//! Output: Admin API 路由和服务
//! Pos: 管理后台 API 层
//!
//! # 功能
//! - 超级管理员初始化（仅一次）
//! - 登录 / Token 签发与校验
//! - 用户查询、余额调整、封禁
//! - 每次写操作与审计记录在同一事务内提交
//!
//! # 使用
//! ```ignore
//! let admin_service = AdminService::new(db, jwt, config.bcrypt_cost);
//! let admin_state = AdminState::new(admin_service);
//! let admin_router = create_admin_router(admin_state);
//! ```

mod auth_handlers;
mod error;
mod handlers;
pub mod jwt;
mod middleware;
mod password;
mod router;
mod service;
pub mod types;

pub use error::AdminServiceError;
pub use middleware::AdminState;
pub use router::create_admin_router;
pub use service::AdminService;
