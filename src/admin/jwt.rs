//! JWT Token 管理模块
//!
//! 提供管理员会话 Token 的签发和验证功能

use std::fmt;

use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::db::model::AdminRole;

/// JWT Token 默认有效期（60 分钟）
pub const DEFAULT_TOKEN_TTL_SECONDS: i64 = 60 * 60;

/// 签发时写入的身份信息
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenSubject {
    pub admin_id: i64,
    pub role: AdminRole,
}

/// JWT Claims 结构
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    pub admin_id: i64,
    pub role: AdminRole,
    /// 签发时间 (Unix timestamp)
    pub iat: i64,
    /// 过期时间 (Unix timestamp)
    pub exp: i64,
    /// Token 唯一 ID
    pub jti: String,
}

/// Token 验证错误
#[derive(Debug)]
pub enum TokenError {
    /// 格式错误或签名不匹配
    Invalid(String),
    /// 已过期
    Expired,
}

impl fmt::Display for TokenError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenError::Invalid(msg) => write!(f, "Invalid token: {}", msg),
            TokenError::Expired => write!(f, "Token expired"),
        }
    }
}

impl std::error::Error for TokenError {}

/// 从配置的密钥派生 HMAC 密钥
///
/// 使用 SHA256 哈希原始密钥作为 JWT 签名密钥
fn derive_secret_key(secret: &str) -> Vec<u8> {
    let mut hasher = Sha256::new();
    hasher.update(secret.as_bytes());
    hasher.finalize().to_vec()
}

/// JWT 管理器
///
/// 密钥和有效期在启动时确定，之后不可变
#[derive(Clone)]
pub struct JwtManager {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    ttl_secs: i64,
}

impl JwtManager {
    pub fn new(secret: &str, ttl_secs: i64) -> Self {
        let key = derive_secret_key(secret);
        Self {
            encoding_key: EncodingKey::from_secret(&key),
            decoding_key: DecodingKey::from_secret(&key),
            ttl_secs,
        }
    }

    /// 生成 Token
    ///
    /// # Returns
    /// * `Ok((token, expires_in))` - JWT Token 字符串和有效秒数
    pub fn issue(&self, subject: TokenSubject) -> Result<(String, i64), jsonwebtoken::errors::Error> {
        self.issue_at(subject, chrono::Utc::now().timestamp())
    }

    /// 以指定时间作为签发时间生成 Token
    pub fn issue_at(
        &self,
        subject: TokenSubject,
        now: i64,
    ) -> Result<(String, i64), jsonwebtoken::errors::Error> {
        let claims = Claims {
            admin_id: subject.admin_id,
            role: subject.role,
            iat: now,
            exp: now.saturating_add(self.ttl_secs),
            jti: uuid::Uuid::new_v4().to_string(),
        };
        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)?;
        Ok((token, self.ttl_secs))
    }

    /// 验证 Token
    ///
    /// # Returns
    /// * `Ok(Claims)` - 验证成功，返回 Claims
    /// * `Err(_)` - 验证失败（过期、签名错误、格式错误）
    pub fn validate(&self, token: &str) -> Result<Claims, TokenError> {
        self.validate_at(token, chrono::Utc::now().timestamp())
    }

    /// 以指定时间作为当前时间验证 Token
    ///
    /// `now >= exp` 即视为过期，不留宽限
    pub fn validate_at(&self, token: &str, now: i64) -> Result<Claims, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.set_required_spec_claims(&["exp"]);

        let claims = decode::<Claims>(token, &self.decoding_key, &validation)
            .map_err(|e| TokenError::Invalid(e.to_string()))?
            .claims;

        if now >= claims.exp {
            return Err(TokenError::Expired);
        }
        Ok(claims)
    }
}
