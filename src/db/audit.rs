//! 审计日志（只追加，不提供修改和删除）

use rusqlite::{Connection, params};

use super::model::{AuditAction, AuditLogEntry};
use super::now_rfc3339;

pub fn append(
    conn: &Connection,
    admin_id: i64,
    action: AuditAction,
    target_user_id: i64,
    details: &str,
) -> rusqlite::Result<AuditLogEntry> {
    let created_at = now_rfc3339();
    conn.execute(
        "INSERT INTO audit_logs (admin_id, action, target_user_id, details, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![admin_id, action, target_user_id, details, created_at],
    )?;
    Ok(AuditLogEntry {
        id: conn.last_insert_rowid(),
        admin_id,
        action,
        target_user_id,
        details: details.to_string(),
        created_at,
    })
}

/// 某用户的全部审计记录，按写入顺序
pub fn list_for_user(conn: &Connection, target_user_id: i64) -> rusqlite::Result<Vec<AuditLogEntry>> {
    let mut stmt = conn.prepare(
        "SELECT id, admin_id, action, target_user_id, details, created_at
         FROM audit_logs WHERE target_user_id = ?1 ORDER BY id ASC",
    )?;
    let entries = stmt.query_map([target_user_id], |row| {
        Ok(AuditLogEntry {
            id: row.get(0)?,
            admin_id: row.get(1)?,
            action: row.get(2)?,
            target_user_id: row.get(3)?,
            details: row.get(4)?,
            created_at: row.get(5)?,
        })
    })?
    .collect();
    entries
}
