//! 持久化实体

use std::fmt;
use std::str::FromStr;

use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::{Deserialize, Serialize};

/// 平台用户
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub id: i64,
    /// 外部平台 ID（唯一）
    pub external_id: String,
    pub name: String,
    /// 余额，永远 >= 0
    pub balance: f64,
    pub is_blocked: bool,
    pub created_at: String,
    pub updated_at: String,
}

/// 管理员角色
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AdminRole {
    Admin,
    Superadmin,
}

impl AdminRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            AdminRole::Admin => "admin",
            AdminRole::Superadmin => "superadmin",
        }
    }
}

impl fmt::Display for AdminRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AdminRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(AdminRole::Admin),
            "superadmin" => Ok(AdminRole::Superadmin),
            other => Err(format!("未知的管理员角色: {}", other)),
        }
    }
}

impl ToSql for AdminRole {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for AdminRole {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|e: String| FromSqlError::Other(e.into()))
    }
}

/// 管理员
#[derive(Debug, Clone, PartialEq)]
pub struct Admin {
    pub id: i64,
    pub username: String,
    /// bcrypt 哈希，永不外传
    pub password_hash: String,
    pub role: AdminRole,
}

/// 审计动作类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditAction {
    DeltaBalance,
    Block,
}

impl AuditAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditAction::DeltaBalance => "DELTA_BALANCE",
            AuditAction::Block => "BLOCK",
        }
    }
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AuditAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "DELTA_BALANCE" => Ok(AuditAction::DeltaBalance),
            "BLOCK" => Ok(AuditAction::Block),
            other => Err(format!("未知的审计动作: {}", other)),
        }
    }
}

impl ToSql for AuditAction {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for AuditAction {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|e: String| FromSqlError::Other(e.into()))
    }
}

/// 审计日志（只追加）
#[derive(Debug, Clone, PartialEq)]
pub struct AuditLogEntry {
    pub id: i64,
    pub admin_id: i64,
    pub action: AuditAction,
    pub target_user_id: i64,
    pub details: String,
    pub created_at: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_round_trips_through_str() {
        assert_eq!("superadmin".parse::<AdminRole>(), Ok(AdminRole::Superadmin));
        assert_eq!(AdminRole::Admin.to_string(), "admin");
        assert!("root".parse::<AdminRole>().is_err());
    }

    #[test]
    fn test_audit_action_wire_names() {
        assert_eq!(
            serde_json::to_string(&AuditAction::DeltaBalance).unwrap(),
            "\"DELTA_BALANCE\""
        );
        assert_eq!(AuditAction::Block.as_str(), "BLOCK");
        assert_eq!("BLOCK".parse::<AuditAction>(), Ok(AuditAction::Block));
    }
}
