//! 健康检查接口

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use chrono::Utc;
use once_cell::sync::OnceCell;
use std::time::Instant;

use crate::build_info;
use crate::model::{ComponentStatus, ComponentsHealth, HealthStatus};
use crate::AppState;

static START_TIME: OnceCell<Instant> = OnceCell::new();

/// 记录进程启动时间，须在引导早期调用一次
pub fn init_start_time() {
    let _ = START_TIME.set(Instant::now());
}

fn uptime_seconds() -> u64 {
    START_TIME
        .get()
        .map(|start| start.elapsed().as_secs())
        .unwrap_or(0)
}

/// GET /api/health
pub async fn basic_health_check(State(app_state): State<AppState>) -> impl IntoResponse {
    let db_healthy = app_state.database.health_check().await.unwrap_or(false);

    let status = HealthStatus {
        status: if db_healthy { "ok" } else { "degraded" }.to_string(),
        version: build_info::summary(),
        uptime: uptime_seconds(),
        timestamp: Utc::now().to_rfc3339(),
    };

    let code = if db_healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (code, Json(status))
}

/// GET /api/health/components
pub async fn components_health_check(State(app_state): State<AppState>) -> Json<ComponentsHealth> {
    let mut components = Vec::new();

    match app_state.database.health_check().await {
        Ok(true) => components.push(ComponentStatus {
            name: "database".to_string(),
            status: "healthy".to_string(),
            details: None,
        }),
        Ok(false) => components.push(ComponentStatus {
            name: "database".to_string(),
            status: "error".to_string(),
            details: Some("健康查询返回异常".to_string()),
        }),
        Err(e) => components.push(ComponentStatus {
            name: "database".to_string(),
            status: "error".to_string(),
            details: Some(format!("{e:#}")),
        }),
    }

    // 地图服务商只检查配置是否可用，不主动打流量
    let maps_configured = !app_state.config.maps.api_key.trim().is_empty();
    components.push(ComponentStatus {
        name: "maps_provider".to_string(),
        status: if maps_configured {
            "configured"
        } else {
            "unconfigured"
        }
        .to_string(),
        details: (!maps_configured).then(|| "липсва maps.api_key".to_string()),
    });

    Json(ComponentsHealth { components })
}
