//! Admin API 中间件
//!
//! Input: Bearer Token, 请求
//! Output: 已认证的管理员（注入请求扩展）
//! Pos: Admin API 认证层

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::{IntoResponse, Json, Response},
};

use super::error::AdminServiceError;
use super::service::AdminService;
use crate::common::auth;

/// Admin API 共享状态
#[derive(Clone)]
pub struct AdminState {
    /// Admin 服务
    pub service: Arc<AdminService>,
}

impl AdminState {
    pub fn new(service: AdminService) -> Self {
        Self {
            service: Arc::new(service),
        }
    }
}

/// Admin API 认证中间件
///
/// 依次完成：提取 Token → 验证签名和有效期 → 加载管理员。
/// 成功后把 `Admin` 放进请求扩展，处理器通过 `Extension<Admin>` 获取。
pub async fn admin_auth_middleware(
    State(state): State<AdminState>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let Some(token) = auth::extract_bearer_token(request.headers()) else {
        return reject(AdminServiceError::Unauthorized);
    };

    match state.service.authenticate(&token).await {
        Ok(admin) => {
            request.extensions_mut().insert(admin);
            next.run(request).await
        }
        Err(e) => reject(e),
    }
}

fn reject(error: AdminServiceError) -> Response {
    if !matches!(error, AdminServiceError::InternalError(_)) {
        tracing::warn!("Admin API 认证失败: {}", error);
    }
    (error.status_code(), Json(error.into_response())).into_response()
}
