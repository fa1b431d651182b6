//! Admin API 路由配置

use axum::{
    Router, middleware,
    routing::{get, post},
};

use super::{
    auth_handlers::{bootstrap_superadmin, login},
    handlers::{balance_delta, block_user, get_user, get_user_audit},
    middleware::{AdminState, admin_auth_middleware},
};

/// 创建 Admin API 路由
///
/// # 端点
/// - `POST /bootstrap_superadmin` - 初始化第一个管理员（无需认证）
/// - `POST /login` - 登录获取 Token（无需认证）
/// - `GET /users/{external_id}` - 获取用户信息
/// - `GET /users/{external_id}/audit` - 获取用户审计记录
/// - `POST /balance/delta` - 调整余额
/// - `POST /block` - 封禁用户
///
/// # 认证
/// 除初始化和登录外，需要 `Authorization: Bearer <token>` header
pub fn create_admin_router(state: AdminState) -> Router {
    let protected = Router::new()
        .route("/users/{external_id}", get(get_user))
        .route("/users/{external_id}/audit", get(get_user_audit))
        .route("/balance/delta", post(balance_delta))
        .route("/block", post(block_user))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            admin_auth_middleware,
        ));

    Router::new()
        .route("/bootstrap_superadmin", post(bootstrap_superadmin))
        .route("/login", post(login))
        .merge(protected)
        .with_state(state)
}
