//! Admin 认证相关处理器
//!
//! 提供超级管理员初始化和登录端点（无需 Token）

use axum::{
    Json,
    extract::State,
    response::IntoResponse,
};

use super::{
    middleware::AdminState,
    types::{CredentialsRequest, OkResponse},
};

/// POST /api/admin/bootstrap_superadmin
///
/// 仅在没有任何管理员时可用
pub async fn bootstrap_superadmin(
    State(state): State<AdminState>,
    Json(payload): Json<CredentialsRequest>,
) -> impl IntoResponse {
    match state
        .service
        .bootstrap_superadmin(&payload.username, &payload.password)
        .await
    {
        Ok(_) => Json(OkResponse::new()).into_response(),
        Err(e) => (e.status_code(), Json(e.into_response())).into_response(),
    }
}

/// POST /api/admin/login
///
/// 验证用户名密码，返回 JWT Token
pub async fn login(
    State(state): State<AdminState>,
    Json(payload): Json<CredentialsRequest>,
) -> impl IntoResponse {
    match state.service.login(&payload.username, &payload.password).await {
        Ok(response) => Json(response).into_response(),
        Err(e) => (e.status_code(), Json(e.into_response())).into_response(),
    }
}
