use anyhow::{Context, bail};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// 签名密钥环境变量
pub const ENV_JWT_SECRET: &str = "ADMIN_JWT_SECRET";
/// 数据库路径环境变量
pub const ENV_DATABASE_PATH: &str = "ADMIN_DATABASE_PATH";

/// bcrypt 允许的成本范围
const BCRYPT_COST_RANGE: std::ops::RangeInclusive<u32> = 4..=31;

/// Token 有效期上限（30 天）
const MAX_TOKEN_TTL_MINUTES: u64 = 30 * 24 * 60;

/// Admin 后台配置
///
/// 启动时构建一次，之后只读
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// SQLite 数据库文件路径（":memory:" 表示内存数据库）
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// JWT 签名密钥（必填，可通过 ADMIN_JWT_SECRET 覆盖）
    #[serde(default)]
    pub jwt_secret: Option<String>,

    /// Token 有效期（分钟）
    #[serde(default = "default_token_ttl_minutes")]
    pub token_ttl_minutes: u64,

    /// bcrypt 计算成本
    #[serde(default = "default_bcrypt_cost")]
    pub bcrypt_cost: u32,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_database_path() -> String {
    "db.sqlite3".to_string()
}

fn default_token_ttl_minutes() -> u64 {
    60
}

fn default_bcrypt_cost() -> u32 {
    bcrypt::DEFAULT_COST
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            database_path: default_database_path(),
            jwt_secret: None,
            token_ttl_minutes: default_token_ttl_minutes(),
            bcrypt_cost: default_bcrypt_cost(),
        }
    }
}

impl Config {
    /// 获取默认配置文件路径
    pub fn default_config_path() -> &'static str {
        "config.json"
    }

    /// 从文件加载配置，文件不存在时使用默认值
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("读取配置文件失败: {}", path.display()))?;
        let config: Config = serde_json::from_str(&content)
            .with_context(|| format!("解析配置文件失败: {}", path.display()))?;
        Ok(config)
    }

    /// 用环境变量覆盖文件配置
    pub fn with_env_overrides(mut self) -> Self {
        self.apply_overrides(
            std::env::var(ENV_JWT_SECRET).ok(),
            std::env::var(ENV_DATABASE_PATH).ok(),
        );
        self
    }

    fn apply_overrides(&mut self, jwt_secret: Option<String>, database_path: Option<String>) {
        if let Some(secret) = jwt_secret.filter(|s| !s.is_empty()) {
            self.jwt_secret = Some(secret);
        }
        if let Some(path) = database_path.filter(|p| !p.is_empty()) {
            self.database_path = path;
        }
    }

    /// 校验配置，返回签名密钥
    pub fn validate(&self) -> anyhow::Result<&str> {
        let secret = match self.jwt_secret.as_deref() {
            Some(s) if !s.trim().is_empty() => s,
            _ => bail!("未配置 jwtSecret（或环境变量 {}）", ENV_JWT_SECRET),
        };
        if self.token_ttl_minutes == 0 || self.token_ttl_minutes > MAX_TOKEN_TTL_MINUTES {
            bail!("tokenTtlMinutes 必须在 1..={} 之间", MAX_TOKEN_TTL_MINUTES);
        }
        if !BCRYPT_COST_RANGE.contains(&self.bcrypt_cost) {
            bail!(
                "bcryptCost 必须在 {}..={} 之间",
                BCRYPT_COST_RANGE.start(),
                BCRYPT_COST_RANGE.end()
            );
        }
        Ok(secret)
    }

    pub fn token_ttl_secs(&self) -> i64 {
        i64::try_from(self.token_ttl_minutes)
            .unwrap_or(i64::MAX)
            .saturating_mul(60)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.port, 8080);
        assert_eq!(config.token_ttl_minutes, 60);
        assert_eq!(config.token_ttl_secs(), 3600);
        assert_eq!(config.database_path, "db.sqlite3");
        assert!(config.jwt_secret.is_none());
    }

    #[test]
    fn test_parse_camel_case_json() {
        let config: Config = serde_json::from_str(
            r#"{"port": 9000, "databasePath": "/tmp/a.db", "jwtSecret": "s3cret", "tokenTtlMinutes": 15}"#,
        )
        .unwrap();
        assert_eq!(config.port, 9000);
        assert_eq!(config.database_path, "/tmp/a.db");
        assert_eq!(config.jwt_secret.as_deref(), Some("s3cret"));
        assert_eq!(config.token_ttl_secs(), 900);
        assert_eq!(config.host, "127.0.0.1");
    }

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        let config = Config::load("/nonexistent/ledger-admin/config.json").unwrap();
        assert_eq!(config.port, 8080);
    }

    #[test]
    fn test_validate_requires_secret() {
        let mut config = Config::default();
        assert!(config.validate().is_err());

        config.jwt_secret = Some("   ".to_string());
        assert!(config.validate().is_err());

        config.jwt_secret = Some("secret".to_string());
        assert_eq!(config.validate().unwrap(), "secret");
    }

    #[test]
    fn test_validate_rejects_zero_ttl_and_bad_cost() {
        let mut config = Config {
            jwt_secret: Some("secret".to_string()),
            token_ttl_minutes: 0,
            ..Config::default()
        };
        assert!(config.validate().is_err());

        config.token_ttl_minutes = 60;
        config.bcrypt_cost = 2;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_oversized_ttl() {
        let mut config = Config {
            jwt_secret: Some("secret".to_string()),
            token_ttl_minutes: u64::MAX,
            ..Config::default()
        };
        assert!(config.validate().is_err());
        assert_eq!(config.token_ttl_secs(), i64::MAX);

        config.token_ttl_minutes = MAX_TOKEN_TTL_MINUTES + 1;
        assert!(config.validate().is_err());

        config.token_ttl_minutes = MAX_TOKEN_TTL_MINUTES;
        assert!(config.validate().is_ok());
        assert_eq!(config.token_ttl_secs(), 30 * 24 * 3600);
    }

    #[test]
    fn test_overrides_replace_non_empty_values_only() {
        let mut config = Config {
            jwt_secret: Some("from-file".to_string()),
            ..Config::default()
        };

        config.apply_overrides(Some(String::new()), None);
        assert_eq!(config.jwt_secret.as_deref(), Some("from-file"));

        config.apply_overrides(Some("from-env".to_string()), Some(":memory:".to_string()));
        assert_eq!(config.jwt_secret.as_deref(), Some("from-env"));
        assert_eq!(config.database_path, ":memory:");
    }
}
