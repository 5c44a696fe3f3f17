use crate::config::AppConfig;
use crate::host::{vars, HostBus, MemoryBus};
use crate::models::RunSummary;
use crate::service::ReconRunner;
use axum::{
    extract::{Json, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use std::sync::Arc;

/// 共享状态
#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: AppConfig,
}

/// 请求体: 可选的宿主配置映射 (严格 JSON 或宽松字面量文本)
#[derive(Debug, Deserialize)]
pub struct ReconRequest {
    pub config: Option<String>,
}

/// 响应体
#[derive(Debug, Serialize)]
pub struct ReconResponse {
    pub success: bool,
    pub message: String,
    pub summary: Option<RunSummary>,
    pub error_detail: Option<String>,
    pub system_error_tag: Option<String>,
}

/// 健康检查
pub async fn health_check() -> &'static str {
    "OK"
}

/// 批量对账接口: 套用配置覆盖, 跑完整流水线, 回传宿主结果变量
pub async fn run_recon(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ReconRequest>,
) -> Response {
    let mut config = state.config.clone();
    if let Some(raw) = &req.config {
        if let Err(e) = config.apply_overrides(raw) {
            let response = ReconResponse {
                success: false,
                message: format!("Error: {e}"),
                summary: None,
                error_detail: Some(format!("{e:?}")),
                system_error_tag: None,
            };
            return (StatusCode::BAD_REQUEST, Json(response)).into_response();
        }
    }

    let runner = ReconRunner::new(state.pool.clone(), config);
    let mut bus = MemoryBus::new();
    match runner.run_with_bus(&mut bus).await {
        Ok(summary) => {
            let response = ReconResponse {
                success: true,
                message: summary.result_line(),
                summary: Some(summary),
                error_detail: None,
                system_error_tag: None,
            };
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(e) => {
            let response = ReconResponse {
                success: false,
                message: format!("Error: {e}"),
                summary: None,
                error_detail: bus.get(vars::ERROR_DETAIL),
                system_error_tag: bus.get(vars::SYSTEM_ERROR_TAG),
            };
            (StatusCode::INTERNAL_SERVER_ERROR, Json(response)).into_response()
        }
    }
}
