//! 用户账本
//!
//! 余额与封禁状态的唯一写入入口。调用方负责把这些操作放进同一个事务，
//! 本模块只保证单条操作内"先校验后写入"。

use std::fmt;

use rusqlite::{Connection, OptionalExtension, Row, params};

use super::model::User;
use super::now_rfc3339;

/// 账本操作错误
#[derive(Debug)]
pub enum LedgerError {
    /// 用户不存在
    UserNotFound,
    /// 变更后余额为负
    NegativeBalance { current: f64, amount: f64 },
    /// 金额不是有限数
    InvalidAmount(f64),
    Storage(rusqlite::Error),
}

impl fmt::Display for LedgerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LedgerError::UserNotFound => write!(f, "用户不存在"),
            LedgerError::NegativeBalance { current, amount } => {
                write!(f, "余额不能为负: 当前 {}，变动 {}", current, amount)
            }
            LedgerError::InvalidAmount(amount) => write!(f, "无效的金额: {}", amount),
            LedgerError::Storage(e) => write!(f, "存储错误: {}", e),
        }
    }
}

impl std::error::Error for LedgerError {}

impl From<rusqlite::Error> for LedgerError {
    fn from(e: rusqlite::Error) -> Self {
        LedgerError::Storage(e)
    }
}

const SELECT_USER: &str =
    "SELECT id, external_id, name, balance, is_blocked, created_at, updated_at FROM users";

fn map_user(row: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        external_id: row.get(1)?,
        name: row.get(2)?,
        balance: row.get(3)?,
        is_blocked: row.get(4)?,
        created_at: row.get(5)?,
        updated_at: row.get(6)?,
    })
}

pub fn get_by_external_id(conn: &Connection, external_id: &str) -> rusqlite::Result<Option<User>> {
    conn.query_row(
        &format!("{} WHERE external_id = ?1", SELECT_USER),
        [external_id],
        map_user,
    )
    .optional()
}

/// 创建余额为 0 的用户
///
/// 用户通常由所属平台写入，这里供测试和数据准备使用
#[cfg(test)]
pub fn create(conn: &Connection, external_id: &str, name: &str) -> rusqlite::Result<User> {
    let now = now_rfc3339();
    conn.execute(
        "INSERT INTO users (external_id, name, balance, is_blocked, created_at, updated_at)
         VALUES (?1, ?2, 0, 0, ?3, ?3)",
        params![external_id, name, now],
    )?;
    Ok(User {
        id: conn.last_insert_rowid(),
        external_id: external_id.to_string(),
        name: name.to_string(),
        balance: 0.0,
        is_blocked: false,
        created_at: now.clone(),
        updated_at: now,
    })
}

/// 余额加上 `amount`（可为负），返回新余额
///
/// 结果为负时不做任何写入
pub fn apply_balance_delta(
    conn: &Connection,
    external_id: &str,
    amount: f64,
) -> Result<f64, LedgerError> {
    if !amount.is_finite() {
        return Err(LedgerError::InvalidAmount(amount));
    }

    let user = get_by_external_id(conn, external_id)?.ok_or(LedgerError::UserNotFound)?;
    let new_balance = user.balance + amount;
    if new_balance < 0.0 {
        return Err(LedgerError::NegativeBalance {
            current: user.balance,
            amount,
        });
    }

    conn.execute(
        "UPDATE users SET balance = ?1, updated_at = ?2 WHERE id = ?3",
        params![new_balance, now_rfc3339(), user.id],
    )?;
    Ok(new_balance)
}

/// 封禁用户（幂等）
pub fn block(conn: &Connection, external_id: &str) -> Result<(), LedgerError> {
    let updated = conn.execute(
        "UPDATE users SET is_blocked = 1, updated_at = ?1 WHERE external_id = ?2",
        params![now_rfc3339(), external_id],
    )?;
    if updated == 0 {
        return Err(LedgerError::UserNotFound);
    }
    Ok(())
}
