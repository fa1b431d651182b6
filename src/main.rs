mod admin;
mod common;
mod db;
mod model;

use axum::Router;
use clap::Parser;
use http::{Method, header};
use tower_http::cors::{Any, CorsLayer};
use tracing_subscriber::EnvFilter;

use admin::jwt::JwtManager;
use admin::{AdminService, AdminState, create_admin_router};
use db::Database;
use model::config::Config;

/// 用户余额与封禁管理后台
#[derive(Parser, Debug)]
#[command(name = "ledger-admin", version, about)]
struct Args {
    /// 配置文件路径
    #[arg(short, long)]
    config: Option<String>,
}

#[tokio::main]
async fn main() {
    // .env 不存在时忽略
    dotenvy::dotenv().ok();

    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config_path = args
        .config
        .unwrap_or_else(|| Config::default_config_path().to_string());
    let config = match Config::load(&config_path) {
        Ok(config) => config.with_env_overrides(),
        Err(e) => {
            tracing::error!("加载配置失败: {:#}", e);
            std::process::exit(1);
        }
    };

    let secret = match config.validate() {
        Ok(secret) => secret,
        Err(e) => {
            tracing::error!("配置无效: {:#}", e);
            std::process::exit(1);
        }
    };

    let db = match Database::open(&config.database_path) {
        Ok(db) => db,
        Err(e) => {
            tracing::error!("初始化数据库失败: {:#}", e);
            std::process::exit(1);
        }
    };
    tracing::info!("数据库已就绪: {}", config.database_path);

    let jwt = JwtManager::new(secret, config.token_ttl_secs());
    let admin_service = AdminService::new(db, jwt, config.bcrypt_cost);
    let admin_state = AdminState::new(admin_service);

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);

    let app = Router::new()
        .nest("/api/admin", create_admin_router(admin_state))
        .layer(cors);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!("监听 {} 失败: {}", addr, e);
            std::process::exit(1);
        }
    };

    tracing::info!("Admin API 已启动: http://{}/api/admin", addr);
    tracing::info!("Token 有效期: {} 分钟", config.token_ttl_minutes);

    if let Err(e) = axum::serve(listener, app).await {
        tracing::error!("服务异常退出: {}", e);
        std::process::exit(1);
    }
}
