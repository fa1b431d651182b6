//! Admin API 业务逻辑服务

use crate::db::model::{Admin, AdminRole, AuditAction, AuditLogEntry};
use crate::db::{Database, admins, audit, users};

use tokio::sync::OnceCell;

use super::error::AdminServiceError;
use super::jwt::{JwtManager, TokenSubject};
use super::password::{hash_password, verify_password};
use super::types::{LoginResponse, UserResponse};

/// Admin 服务
///
/// 封装所有 Admin API 的业务逻辑。每个写操作都在一个事务里同时完成
/// 账本变更和审计追加，任一步失败整体回滚。
pub struct AdminService {
    db: Database,
    jwt: JwtManager,
    bcrypt_cost: u32,
    /// 未知用户名登录时用于对齐耗时的哈希，首次需要时计算
    dummy_hash: OnceCell<String>,
}

const DUMMY_PASSWORD: &str = "ledger-admin-dummy-password";

impl AdminService {
    pub fn new(db: Database, jwt: JwtManager, bcrypt_cost: u32) -> Self {
        Self {
            db,
            jwt,
            bcrypt_cost,
            dummy_hash: OnceCell::new(),
        }
    }

    async fn dummy_hash(&self) -> Result<String, AdminServiceError> {
        let cost = self.bcrypt_cost;
        let hashed = self
            .dummy_hash
            .get_or_try_init(|| async move {
                let hashed =
                    tokio::task::spawn_blocking(move || hash_password(DUMMY_PASSWORD, cost))
                        .await??;
                Ok::<_, AdminServiceError>(hashed)
            })
            .await?;
        Ok(hashed.clone())
    }

    /// 创建第一个管理员（强制 superadmin）
    ///
    /// 已存在任何管理员时拒绝
    pub async fn bootstrap_superadmin(
        &self,
        username: &str,
        password: &str,
    ) -> Result<Admin, AdminServiceError> {
        // 先做一次廉价检查，避免无意义的哈希计算
        let existing = self
            .db
            .read(|conn| admins::count(conn).map_err(AdminServiceError::from))
            .await?;
        if existing > 0 {
            return Err(AdminServiceError::AdminsAlreadyExist);
        }

        if username.trim().is_empty() || password.is_empty() {
            return Err(AdminServiceError::InvalidRequest(
                "Username and password are required".to_string(),
            ));
        }

        let raw = password.to_string();
        let cost = self.bcrypt_cost;
        let password_hash = tokio::task::spawn_blocking(move || hash_password(&raw, cost)).await??;

        let username = username.to_string();
        let admin = self
            .db
            .transaction(move |tx| -> Result<Admin, AdminServiceError> {
                if admins::count(tx)? > 0 {
                    return Err(AdminServiceError::AdminsAlreadyExist);
                }
                Ok(admins::create(
                    tx,
                    &username,
                    &password_hash,
                    AdminRole::Superadmin,
                )?)
            })
            .await?;

        tracing::info!(admin_id = admin.id, username = %admin.username, "超级管理员初始化完成");
        Ok(admin)
    }

    /// 用户名密码登录，返回会话 Token
    pub async fn login(
        &self,
        username: &str,
        password: &str,
    ) -> Result<LoginResponse, AdminServiceError> {
        let name = username.to_string();
        let admin = self
            .db
            .read(move |conn| admins::find_by_username(conn, &name).map_err(AdminServiceError::from))
            .await?;

        let Some(admin) = admin else {
            // 用户名不存在时同样做一次 bcrypt 校验，耗时与密码错误一致
            let dummy = self.dummy_hash().await?;
            let raw = password.to_string();
            tokio::task::spawn_blocking(move || verify_password(&raw, &dummy)).await?;
            tracing::warn!(username = %username, "登录失败: 管理员不存在");
            return Err(AdminServiceError::InvalidCredentials);
        };

        let raw = password.to_string();
        let hashed = admin.password_hash.clone();
        let matched = tokio::task::spawn_blocking(move || verify_password(&raw, &hashed)).await?;
        if !matched {
            tracing::warn!(username = %username, "登录失败: 密码错误");
            return Err(AdminServiceError::InvalidCredentials);
        }

        let (token, expires_in) = self.jwt.issue(TokenSubject {
            admin_id: admin.id,
            role: admin.role,
        })?;

        tracing::info!(admin_id = admin.id, role = %admin.role, "管理员登录成功");
        Ok(LoginResponse {
            token,
            role: admin.role,
            expires_in,
        })
    }

    /// 校验 Token 并加载对应管理员
    ///
    /// 签名有效但管理员已被删除时返回 `AdminNotFound`
    pub async fn authenticate(&self, token: &str) -> Result<Admin, AdminServiceError> {
        let claims = self.jwt.validate(token).map_err(|e| {
            tracing::debug!("Token 验证失败: {}", e);
            AdminServiceError::InvalidToken
        })?;

        let admin_id = claims.admin_id;
        self.db
            .read(move |conn| admins::find_by_id(conn, admin_id).map_err(AdminServiceError::from))
            .await?
            .ok_or(AdminServiceError::AdminNotFound)
    }

    /// 查询用户
    pub async fn get_user(&self, external_id: &str) -> Result<UserResponse, AdminServiceError> {
        let id = external_id.to_string();
        let user = self
            .db
            .read(move |conn| users::get_by_external_id(conn, &id).map_err(AdminServiceError::from))
            .await?
            .ok_or_else(|| AdminServiceError::UserNotFound {
                external_id: external_id.to_string(),
            })?;
        Ok(user.into())
    }

    /// 调整余额并写审计，返回新余额
    pub async fn balance_delta(
        &self,
        admin: &Admin,
        external_id: &str,
        amount: f64,
        reason: &str,
    ) -> Result<f64, AdminServiceError> {
        let admin_id = admin.id;
        let id = external_id.to_string();
        let details = format!("{:?}; {}", amount, reason);

        let balance = self
            .db
            .transaction(move |tx| -> Result<f64, AdminServiceError> {
                let user = users::get_by_external_id(tx, &id)?.ok_or_else(|| {
                    AdminServiceError::UserNotFound {
                        external_id: id.clone(),
                    }
                })?;
                let balance = users::apply_balance_delta(tx, &id, amount)
                    .map_err(|e| AdminServiceError::from_ledger(e, &id))?;
                audit::append(tx, admin_id, AuditAction::DeltaBalance, user.id, &details)?;
                Ok(balance)
            })
            .await?;

        tracing::info!(
            admin_id,
            external_id = %external_id,
            amount,
            balance,
            "余额已调整"
        );
        Ok(balance)
    }

    /// 封禁用户并写审计（重复封禁同样成功并记录）
    pub async fn block(
        &self,
        admin: &Admin,
        external_id: &str,
        reason: &str,
    ) -> Result<(), AdminServiceError> {
        let admin_id = admin.id;
        let id = external_id.to_string();
        let details = reason.to_string();

        self.db
            .transaction(move |tx| -> Result<(), AdminServiceError> {
                let user = users::get_by_external_id(tx, &id)?.ok_or_else(|| {
                    AdminServiceError::UserNotFound {
                        external_id: id.clone(),
                    }
                })?;
                users::block(tx, &id).map_err(|e| AdminServiceError::from_ledger(e, &id))?;
                audit::append(tx, admin_id, AuditAction::Block, user.id, &details)?;
                Ok(())
            })
            .await?;

        tracing::info!(admin_id, external_id = %external_id, "用户已封禁");
        Ok(())
    }

    /// 查询用户的审计记录
    pub async fn user_audit_log(
        &self,
        external_id: &str,
    ) -> Result<Vec<AuditLogEntry>, AdminServiceError> {
        let id = external_id.to_string();
        self.db
            .read(move |conn| -> Result<Vec<AuditLogEntry>, AdminServiceError> {
                let user = users::get_by_external_id(conn, &id)?
                    .ok_or_else(|| AdminServiceError::UserNotFound { external_id: id.clone() })?;
                Ok(audit::list_for_user(conn, user.id)?)
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::admin::jwt::DEFAULT_TOKEN_TTL_SECONDS;
    use crate::db::model::User;

    const SECRET: &str = "service-test-secret";

    fn new_service() -> (AdminService, Database) {
        let db = Database::open_in_memory().unwrap();
        let jwt = JwtManager::new(SECRET, DEFAULT_TOKEN_TTL_SECONDS);
        (AdminService::new(db.clone(), jwt, 4), db)
    }

    async fn seed_user(db: &Database, external_id: &str) -> User {
        let id = external_id.to_string();
        db.transaction(move |tx| users::create(tx, &id, "tester").map_err(AdminServiceError::from))
            .await
            .unwrap()
    }

    async fn audit_entries(service: &AdminService, external_id: &str) -> Vec<AuditLogEntry> {
        service.user_audit_log(external_id).await.unwrap()
    }

    async fn logged_in_admin(service: &AdminService) -> Admin {
        service.bootstrap_superadmin("root", "pw1").await.unwrap();
        let login = service.login("root", "pw1").await.unwrap();
        service.authenticate(&login.token).await.unwrap()
    }

    #[tokio::test]
    async fn test_scenario_bootstrap_login_delta_block() {
        let (service, db) = new_service();
        seed_user(&db, "u1").await;

        let admin = service.bootstrap_superadmin("root", "pw1").await.unwrap();
        assert_eq!(admin.role, AdminRole::Superadmin);

        let login = service.login("root", "pw1").await.unwrap();
        assert_eq!(login.role, AdminRole::Superadmin);
        let admin = service.authenticate(&login.token).await.unwrap();

        let err = service.balance_delta(&admin, "u1", -5.0, "test").await.unwrap_err();
        assert!(matches!(err, AdminServiceError::NegativeBalance));
        assert_eq!(service.get_user("u1").await.unwrap().balance, 0.0);
        assert!(audit_entries(&service, "u1").await.is_empty());

        let balance = service.balance_delta(&admin, "u1", 100.0, "test").await.unwrap();
        assert_eq!(balance, 100.0);
        let entries = audit_entries(&service, "u1").await;
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].action, AuditAction::DeltaBalance);
        assert_eq!(entries[0].details, "100.0; test");

        service.block(&admin, "u1", "abuse").await.unwrap();
        let user = service.get_user("u1").await.unwrap();
        assert!(user.blocked);
        assert_eq!(user.balance, 100.0);
        let entries = audit_entries(&service, "u1").await;
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[1].action, AuditAction::Block);
        assert_eq!(entries[1].details, "abuse");
    }

    #[tokio::test]
    async fn test_bootstrap_is_allowed_only_once() {
        let (service, db) = new_service();
        service.bootstrap_superadmin("root", "pw1").await.unwrap();

        let err = service.bootstrap_superadmin("second", "pw2").await.unwrap_err();
        assert!(matches!(err, AdminServiceError::AdminsAlreadyExist));

        let count = db
            .read(|conn| admins::count(conn).map_err(AdminServiceError::from))
            .await
            .unwrap();
        assert_eq!(count, 1);
        assert!(matches!(
            service.login("second", "pw2").await,
            Err(AdminServiceError::InvalidCredentials)
        ));
    }

    #[tokio::test]
    async fn test_concurrent_bootstrap_creates_single_admin() {
        let (service, db) = new_service();
        let service = Arc::new(service);

        let handles: Vec<_> = (0..4)
            .map(|i| {
                let service = service.clone();
                tokio::spawn(async move {
                    service
                        .bootstrap_superadmin(&format!("root{}", i), "pw")
                        .await
                        .is_ok()
                })
            })
            .collect();

        let mut succeeded = 0;
        for handle in handles {
            if handle.await.unwrap() {
                succeeded += 1;
            }
        }
        assert_eq!(succeeded, 1);

        let count = db
            .read(|conn| admins::count(conn).map_err(AdminServiceError::from))
            .await
            .unwrap();
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn test_bootstrap_requires_username_and_password() {
        let (service, _db) = new_service();
        assert!(matches!(
            service.bootstrap_superadmin("", "pw").await,
            Err(AdminServiceError::InvalidRequest(_))
        ));
        assert!(matches!(
            service.bootstrap_superadmin("root", "").await,
            Err(AdminServiceError::InvalidRequest(_))
        ));
    }

    #[tokio::test]
    async fn test_second_bootstrap_with_empty_fields_is_conflict() {
        let (service, _db) = new_service();
        service.bootstrap_superadmin("root", "pw1").await.unwrap();

        assert!(matches!(
            service.bootstrap_superadmin("", "").await,
            Err(AdminServiceError::AdminsAlreadyExist)
        ));
        assert!(matches!(
            service.bootstrap_superadmin("second", "").await,
            Err(AdminServiceError::AdminsAlreadyExist)
        ));
    }

    #[tokio::test]
    async fn test_unknown_username_still_runs_password_check() {
        let (service, _db) = new_service();
        service.bootstrap_superadmin("root", "pw1").await.unwrap();
        assert!(service.dummy_hash.get().is_none());

        assert!(matches!(
            service.login("ghost", "pw1").await,
            Err(AdminServiceError::InvalidCredentials)
        ));
        let dummy = service.dummy_hash.get().cloned().unwrap();
        assert!(!verify_password("pw1", &dummy));

        // 再次登录复用同一个哈希
        service.login("ghost", "pw1").await.unwrap_err();
        assert_eq!(service.dummy_hash.get(), Some(&dummy));
    }

    #[tokio::test]
    async fn test_login_failures_are_indistinguishable() {
        let (service, _db) = new_service();
        service.bootstrap_superadmin("root", "pw1").await.unwrap();

        let wrong_password = service.login("root", "nope").await.unwrap_err();
        let unknown_user = service.login("ghost", "pw1").await.unwrap_err();
        assert!(matches!(wrong_password, AdminServiceError::InvalidCredentials));
        assert!(matches!(unknown_user, AdminServiceError::InvalidCredentials));
        assert_eq!(wrong_password.to_string(), unknown_user.to_string());
    }

    #[tokio::test]
    async fn test_authenticate_rejects_bad_and_expired_tokens() {
        let (service, _db) = new_service();
        let admin = logged_in_admin(&service).await;

        assert!(matches!(
            service.authenticate("garbage").await,
            Err(AdminServiceError::InvalidToken)
        ));

        let forged = JwtManager::new("other-secret", DEFAULT_TOKEN_TTL_SECONDS);
        let (token, _) = forged
            .issue(TokenSubject {
                admin_id: admin.id,
                role: admin.role,
            })
            .unwrap();
        assert!(matches!(
            service.authenticate(&token).await,
            Err(AdminServiceError::InvalidToken)
        ));

        let two_hours_ago = chrono::Utc::now().timestamp() - 2 * 60 * 60;
        let (expired, _) = service
            .jwt
            .issue_at(
                TokenSubject {
                    admin_id: admin.id,
                    role: admin.role,
                },
                two_hours_ago,
            )
            .unwrap();
        assert!(matches!(
            service.authenticate(&expired).await,
            Err(AdminServiceError::InvalidToken)
        ));
    }

    #[tokio::test]
    async fn test_token_of_deleted_admin_is_rejected() {
        let (service, db) = new_service();
        service.bootstrap_superadmin("root", "pw1").await.unwrap();
        let login = service.login("root", "pw1").await.unwrap();

        db.transaction(|tx| {
            tx.execute("DELETE FROM admins WHERE username = 'root'", [])
                .map_err(AdminServiceError::from)
        })
        .await
        .unwrap();

        assert!(matches!(
            service.authenticate(&login.token).await,
            Err(AdminServiceError::AdminNotFound)
        ));
    }

    #[tokio::test]
    async fn test_unknown_user_operations() {
        let (service, _db) = new_service();
        let admin = logged_in_admin(&service).await;

        assert!(matches!(
            service.get_user("ghost").await,
            Err(AdminServiceError::UserNotFound { .. })
        ));
        assert!(matches!(
            service.balance_delta(&admin, "ghost", 1.0, "x").await,
            Err(AdminServiceError::UserNotFound { .. })
        ));
        assert!(matches!(
            service.block(&admin, "ghost", "x").await,
            Err(AdminServiceError::UserNotFound { .. })
        ));
        assert!(matches!(
            service.user_audit_log("ghost").await,
            Err(AdminServiceError::UserNotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_audit_entries_reference_admin_and_user() {
        let (service, db) = new_service();
        let user = seed_user(&db, "u1").await;
        seed_user(&db, "u2").await;
        let admin = logged_in_admin(&service).await;

        service.balance_delta(&admin, "u1", 12.5, "bonus").await.unwrap();
        service.block(&admin, "u1", "fraud").await.unwrap();

        let entries = audit_entries(&service, "u1").await;
        assert_eq!(entries.len(), 2);
        for entry in &entries {
            assert_eq!(entry.admin_id, admin.id);
            assert_eq!(entry.target_user_id, user.id);
        }
        assert!(audit_entries(&service, "u2").await.is_empty());
    }

    #[tokio::test]
    async fn test_repeated_block_records_each_call() {
        let (service, db) = new_service();
        seed_user(&db, "u1").await;
        let admin = logged_in_admin(&service).await;

        service.block(&admin, "u1", "first").await.unwrap();
        service.block(&admin, "u1", "second").await.unwrap();

        assert!(service.get_user("u1").await.unwrap().blocked);
        let entries = audit_entries(&service, "u1").await;
        assert_eq!(entries.len(), 2);
        assert!(entries.iter().all(|e| e.action == AuditAction::Block));
    }

    #[tokio::test]
    async fn test_failed_audit_write_rolls_back_mutation() {
        let (service, db) = new_service();
        seed_user(&db, "u1").await;
        let admin = logged_in_admin(&service).await;

        db.transaction(|tx| {
            tx.execute_batch(
                "CREATE TRIGGER reject_audit BEFORE INSERT ON audit_logs
                 BEGIN SELECT RAISE(ABORT, 'audit store unavailable'); END;",
            )
            .map_err(AdminServiceError::from)
        })
        .await
        .unwrap();

        assert!(matches!(
            service.balance_delta(&admin, "u1", 50.0, "x").await,
            Err(AdminServiceError::InternalError(_))
        ));
        assert!(matches!(
            service.block(&admin, "u1", "x").await,
            Err(AdminServiceError::InternalError(_))
        ));

        let user = service.get_user("u1").await.unwrap();
        assert_eq!(user.balance, 0.0);
        assert!(!user.blocked);
    }

    #[tokio::test]
    async fn test_concurrent_withdrawals_never_overdraw() {
        let (service, db) = new_service();
        seed_user(&db, "u1").await;
        let admin = logged_in_admin(&service).await;
        service.balance_delta(&admin, "u1", 50.0, "deposit").await.unwrap();

        let service = Arc::new(service);
        let handles: Vec<_> = (0..10)
            .map(|_| {
                let service = service.clone();
                let admin = admin.clone();
                tokio::spawn(async move {
                    service
                        .balance_delta(&admin, "u1", -10.0, "withdraw")
                        .await
                        .is_ok()
                })
            })
            .collect();

        let mut succeeded = 0;
        for handle in handles {
            if handle.await.unwrap() {
                succeeded += 1;
            }
        }

        assert_eq!(succeeded, 5);
        assert_eq!(service.get_user("u1").await.unwrap().balance, 0.0);
        // 1 次充值 + 5 次成功扣款
        assert_eq!(audit_entries(&service, "u1").await.len(), 6);
    }
}
