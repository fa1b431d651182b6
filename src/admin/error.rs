//! Admin API 错误类型定义

use std::fmt;

use axum::http::StatusCode;

use super::types::AdminErrorResponse;
use crate::db::users::LedgerError;

/// Admin 服务错误
#[derive(Debug)]
pub enum AdminServiceError {
    /// 未提供 Token
    Unauthorized,
    /// Token 无效或已过期
    InvalidToken,
    /// Token 对应的管理员已不存在
    AdminNotFound,
    /// 用户名或密码错误（不区分两者）
    InvalidCredentials,
    /// 用户不存在
    UserNotFound { external_id: String },
    /// 已存在管理员，不能再次初始化
    AdminsAlreadyExist,
    /// 变更后余额为负
    NegativeBalance,
    /// 请求参数无效
    InvalidRequest(String),
    /// 内部错误（存储、哈希等）
    InternalError(String),
}

impl fmt::Display for AdminServiceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AdminServiceError::Unauthorized => write!(f, "Missing authorization token"),
            AdminServiceError::InvalidToken => write!(f, "Invalid or expired token"),
            AdminServiceError::AdminNotFound => write!(f, "Admin not found"),
            AdminServiceError::InvalidCredentials => write!(f, "Invalid credentials"),
            AdminServiceError::UserNotFound { external_id } => {
                write!(f, "User not found: {}", external_id)
            }
            AdminServiceError::AdminsAlreadyExist => write!(f, "Admins already exist"),
            AdminServiceError::NegativeBalance => write!(f, "Balance cannot be negative"),
            AdminServiceError::InvalidRequest(msg) => write!(f, "{}", msg),
            AdminServiceError::InternalError(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for AdminServiceError {}

impl AdminServiceError {
    /// 获取对应的 HTTP 状态码
    pub fn status_code(&self) -> StatusCode {
        match self {
            AdminServiceError::Unauthorized
            | AdminServiceError::InvalidToken
            | AdminServiceError::AdminNotFound
            | AdminServiceError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            AdminServiceError::UserNotFound { .. } => StatusCode::NOT_FOUND,
            AdminServiceError::AdminsAlreadyExist
            | AdminServiceError::NegativeBalance
            | AdminServiceError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            AdminServiceError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// 转换为 API 错误响应
    ///
    /// 内部错误只记录日志，不把细节返回给调用方
    pub fn into_response(self) -> AdminErrorResponse {
        match &self {
            AdminServiceError::Unauthorized
            | AdminServiceError::InvalidToken
            | AdminServiceError::AdminNotFound => {
                AdminErrorResponse::new("authentication_error", self.to_string())
            }
            AdminServiceError::InvalidCredentials => {
                AdminErrorResponse::new("invalid_credentials", self.to_string())
            }
            AdminServiceError::UserNotFound { .. } => AdminErrorResponse::not_found(self.to_string()),
            AdminServiceError::AdminsAlreadyExist => {
                AdminErrorResponse::new("conflict", self.to_string())
            }
            AdminServiceError::NegativeBalance | AdminServiceError::InvalidRequest(_) => {
                AdminErrorResponse::invalid_request(self.to_string())
            }
            AdminServiceError::InternalError(msg) => {
                tracing::error!("Admin 服务内部错误: {}", msg);
                AdminErrorResponse::internal_error("Internal server error")
            }
        }
    }

    pub(super) fn from_ledger(e: LedgerError, external_id: &str) -> Self {
        match e {
            LedgerError::UserNotFound => AdminServiceError::UserNotFound {
                external_id: external_id.to_string(),
            },
            LedgerError::NegativeBalance { .. } => AdminServiceError::NegativeBalance,
            LedgerError::InvalidAmount(amount) => {
                AdminServiceError::InvalidRequest(format!("Invalid amount: {}", amount))
            }
            LedgerError::Storage(e) => AdminServiceError::InternalError(e.to_string()),
        }
    }
}

impl From<rusqlite::Error> for AdminServiceError {
    fn from(e: rusqlite::Error) -> Self {
        AdminServiceError::InternalError(format!("数据库错误: {}", e))
    }
}

impl From<tokio::task::JoinError> for AdminServiceError {
    fn from(e: tokio::task::JoinError) -> Self {
        AdminServiceError::InternalError(format!("后台任务失败: {}", e))
    }
}

impl From<bcrypt::BcryptError> for AdminServiceError {
    fn from(e: bcrypt::BcryptError) -> Self {
        AdminServiceError::InternalError(format!("密码哈希失败: {}", e))
    }
}

impl From<jsonwebtoken::errors::Error> for AdminServiceError {
    fn from(e: jsonwebtoken::errors::Error) -> Self {
        AdminServiceError::InternalError(format!("Token 生成失败: {}", e))
    }
}
