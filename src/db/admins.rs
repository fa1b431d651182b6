//! 管理员凭据存储

use rusqlite::{Connection, OptionalExtension, Row, params};

use super::model::{Admin, AdminRole};

const SELECT_ADMIN: &str = "SELECT id, username, password_hash, role FROM admins";

fn map_admin(row: &Row<'_>) -> rusqlite::Result<Admin> {
    Ok(Admin {
        id: row.get(0)?,
        username: row.get(1)?,
        password_hash: row.get(2)?,
        role: row.get(3)?,
    })
}

pub fn find_by_username(conn: &Connection, username: &str) -> rusqlite::Result<Option<Admin>> {
    conn.query_row(
        &format!("{} WHERE username = ?1", SELECT_ADMIN),
        [username],
        map_admin,
    )
    .optional()
}

pub fn find_by_id(conn: &Connection, id: i64) -> rusqlite::Result<Option<Admin>> {
    conn.query_row(&format!("{} WHERE id = ?1", SELECT_ADMIN), [id], map_admin)
        .optional()
}

/// 插入管理员；用户名重复时返回约束错误
pub fn create(
    conn: &Connection,
    username: &str,
    password_hash: &str,
    role: AdminRole,
) -> rusqlite::Result<Admin> {
    conn.execute(
        "INSERT INTO admins (username, password_hash, role) VALUES (?1, ?2, ?3)",
        params![username, password_hash, role],
    )?;
    Ok(Admin {
        id: conn.last_insert_rowid(),
        username: username.to_string(),
        password_hash: password_hash.to_string(),
        role,
    })
}

pub fn count(conn: &Connection) -> rusqlite::Result<i64> {
    conn.query_row("SELECT COUNT(*) FROM admins", [], |row| row.get(0))
}
