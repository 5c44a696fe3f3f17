use crate::error::ReconError;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::{ConnectOptions, PgPool};
use std::str::FromStr;
use std::time::Duration;

/// 创建数据库连接池
pub async fn create_pool(database_url: &str) -> Result<PgPool, sqlx::Error> {
    let mut connect_options = PgConnectOptions::from_str(database_url)?;

    // 设置慢查询日志阈值为 5秒
    connect_options = connect_options
        .log_slow_statements(tracing::log::LevelFilter::Warn, Duration::from_secs(5));

    PgPoolOptions::new()
        .max_connections(20)
        .acquire_timeout(Duration::from_secs(30))
        .connect_with(connect_options)
        .await
}

/// 带退避的连接建立: 每次失败睡 1s × 次数, 重试耗尽后归类为 ConnectionFailed
pub async fn create_pool_with_retry(
    database_url: &str,
    max_retries: u32,
) -> Result<PgPool, ReconError> {
    let attempts = max_retries.max(1);
    let mut last_err = None;
    for attempt in 1..=attempts {
        match create_pool(database_url).await {
            Ok(pool) => {
                tracing::info!("Database pool created on attempt {}", attempt);
                return Ok(pool);
            }
            Err(e) => {
                tracing::warn!("Connection attempt {}/{} failed: {}", attempt, attempts, e);
                last_err = Some(e);
                if attempt < attempts {
                    tokio::time::sleep(Duration::from_secs(attempt as u64)).await;
                }
            }
        }
    }
    Err(ReconError::ConnectionFailed {
        attempts,
        source: last_err.unwrap_or(sqlx::Error::PoolClosed),
    })
}
