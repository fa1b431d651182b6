//! Admin API 类型定义

use serde::{Deserialize, Serialize};

use crate::db::model::{AdminRole, AuditAction, AuditLogEntry, User};

// ============ 认证 ============

/// 初始化超级管理员 / 登录请求
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialsRequest {
    pub username: String,
    pub password: String,
}

/// 登录响应
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub token: String,
    pub role: AdminRole,
    /// Token 有效秒数
    pub expires_in: i64,
}

// ============ 用户 ============

/// 用户信息（不含变更历史）
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub external_id: String,
    pub name: String,
    pub balance: f64,
    pub blocked: bool,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            external_id: user.external_id,
            name: user.name,
            balance: user.balance,
            blocked: user.is_blocked,
        }
    }
}

/// 余额变动请求
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BalanceDeltaRequest {
    pub external_id: String,
    /// 变动金额（可为负）
    pub amount: f64,
    pub reason: String,
}

/// 余额变动响应
#[derive(Debug, Serialize)]
pub struct BalanceDeltaResponse {
    pub ok: bool,
    pub balance: f64,
}

/// 封禁请求
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockRequest {
    pub external_id: String,
    pub reason: String,
}

// ============ 审计 ============

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditLogItem {
    pub id: i64,
    pub admin_id: i64,
    pub action: AuditAction,
    pub target_user_id: i64,
    pub details: String,
    pub created_at: String,
}

impl From<AuditLogEntry> for AuditLogItem {
    fn from(entry: AuditLogEntry) -> Self {
        Self {
            id: entry.id,
            admin_id: entry.admin_id,
            action: entry.action,
            target_user_id: entry.target_user_id,
            details: entry.details,
            created_at: entry.created_at,
        }
    }
}

/// 用户审计记录响应
#[derive(Debug, Serialize)]
pub struct AuditLogResponse {
    pub entries: Vec<AuditLogItem>,
}

// ============ 通用响应 ============

/// 操作成功响应
#[derive(Debug, Serialize)]
pub struct OkResponse {
    pub ok: bool,
}

impl OkResponse {
    pub fn new() -> Self {
        Self { ok: true }
    }
}

/// 错误响应
#[derive(Debug, Serialize)]
pub struct AdminErrorResponse {
    pub error: AdminError,
}

#[derive(Debug, Serialize)]
pub struct AdminError {
    #[serde(rename = "type")]
    pub error_type: String,
    pub message: String,
}

impl AdminErrorResponse {
    pub fn new(error_type: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: AdminError {
                error_type: error_type.into(),
                message: message.into(),
            },
        }
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new("invalid_request", message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new("not_found", message)
    }

    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::new("internal_error", message)
    }
}
