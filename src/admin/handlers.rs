//! Admin API HTTP 处理器

use axum::{
    Extension, Json,
    extract::{Path, State},
    response::IntoResponse,
};

use super::{
    middleware::AdminState,
    types::{
        AuditLogResponse, BalanceDeltaRequest, BalanceDeltaResponse, BlockRequest, OkResponse,
    },
};
use crate::db::model::Admin;

/// GET /api/admin/users/:external_id
/// 获取用户信息
pub async fn get_user(
    State(state): State<AdminState>,
    Path(external_id): Path<String>,
) -> impl IntoResponse {
    match state.service.get_user(&external_id).await {
        Ok(response) => Json(response).into_response(),
        Err(e) => (e.status_code(), Json(e.into_response())).into_response(),
    }
}

/// GET /api/admin/users/:external_id/audit
/// 获取用户的审计记录
pub async fn get_user_audit(
    State(state): State<AdminState>,
    Path(external_id): Path<String>,
) -> impl IntoResponse {
    match state.service.user_audit_log(&external_id).await {
        Ok(entries) => Json(AuditLogResponse {
            entries: entries.into_iter().map(Into::into).collect(),
        })
        .into_response(),
        Err(e) => (e.status_code(), Json(e.into_response())).into_response(),
    }
}

/// POST /api/admin/balance/delta
/// 调整用户余额
pub async fn balance_delta(
    State(state): State<AdminState>,
    Extension(admin): Extension<Admin>,
    Json(payload): Json<BalanceDeltaRequest>,
) -> impl IntoResponse {
    match state
        .service
        .balance_delta(&admin, &payload.external_id, payload.amount, &payload.reason)
        .await
    {
        Ok(balance) => Json(BalanceDeltaResponse { ok: true, balance }).into_response(),
        Err(e) => (e.status_code(), Json(e.into_response())).into_response(),
    }
}

/// POST /api/admin/block
/// 封禁用户
pub async fn block_user(
    State(state): State<AdminState>,
    Extension(admin): Extension<Admin>,
    Json(payload): Json<BlockRequest>,
) -> impl IntoResponse {
    match state
        .service
        .block(&admin, &payload.external_id, &payload.reason)
        .await
    {
        Ok(()) => Json(OkResponse::new()).into_response(),
        Err(e) => (e.status_code(), Json(e.into_response())).into_response(),
    }
}
