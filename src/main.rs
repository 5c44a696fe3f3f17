use axum::{
    routing::{get, post},
    Router,
};
use po_recon_rust::{api, create_pool_with_retry, AppConfig};
use std::sync::Arc;
use tower::ServiceBuilder;
use tracing::info;
use tracing_subscriber::fmt::time::ChronoLocal;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 初始化日志 - 本地时间格式
    tracing_subscriber::fmt()
        .with_timer(ChronoLocal::new("%Y-%m-%d %H:%M:%S".to_string()))
        .with_target(true)
        .with_level(true)
        .init();

    // 加载配置
    let config = AppConfig::from_env();
    info!("Starting server with config: {:?}", config);

    // 创建数据库连接池 (带退避重试)
    let pool =
        create_pool_with_retry(&config.database.url(), config.engine.max_retries).await?;

    let state = Arc::new(api::AppState {
        pool,
        config: config.clone(),
    });

    // 构建路由
    let app = Router::new()
        .route("/health", get(api::health_check))
        .route("/api/recon/batch", post(api::run_recon))
        .with_state(state)
        .layer(ServiceBuilder::new());

    // 启动服务器
    let addr = format!("{}:{}", config.server.host, config.server.port);
    info!("Server listening on {}", addr);
    info!("API Endpoints:");
    info!("  POST /api/recon/batch  - run the disposition pipeline");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
