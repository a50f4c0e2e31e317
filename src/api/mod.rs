mod documents;
mod error;
mod evaluations;
mod geo;
mod monitoring;
mod properties;
mod rooms;
mod utils;

pub use error::ApiError;
pub use monitoring::init_start_time;

use axum::routing::{get, post};
use axum::Router;
use std::time::Duration;
use tower_http::cors::CorsLayer;
use tower_http::timeout::TimeoutLayer;
use tracing::warn;

use crate::AppState;

/// 创建CORS配置
fn create_cors_layer(app_state: &AppState) -> CorsLayer {
    let origins: Vec<axum::http::HeaderValue> = app_state
        .config
        .server
        .cors_allowed_origins
        .iter()
        .filter_map(|s| match s.trim().parse() {
            Ok(origin) => Some(origin),
            Err(e) => {
                warn!("无效的CORS源: {} - {}", s, e);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([axum::http::Method::GET, axum::http::Method::POST])
        .allow_headers([
            axum::http::header::CONTENT_TYPE,
            axum::http::header::ACCEPT,
        ])
}

/// 组装应用路由
pub fn routes(app_state: AppState) -> Router {
    let cors_layer = create_cors_layer(&app_state);
    let timeout_layer = TimeoutLayer::new(Duration::from_secs(
        app_state.config.server.request_timeout_secs,
    ));

    Router::new()
        // 健康检查
        .route("/api/health", get(monitoring::basic_health_check))
        .route(
            "/api/health/components",
            get(monitoring::components_health_check),
        )
        // 地理接口
        .route("/api/geocode", get(geo::geocode))
        .route("/api/places/nearby", get(geo::places_nearby))
        .route("/api/maps/config", get(geo::maps_config))
        // 房产
        .route("/api/properties", post(properties::create_property))
        .route("/api/properties/:id", get(properties::get_property))
        .route(
            "/api/properties/:id/documents",
            get(documents::list_property_documents),
        )
        // 文档
        .route("/api/documents", post(documents::create_document))
        // 房间照片分类（桩模型）
        .route("/api/rooms/classify", post(rooms::classify_room))
        // 估价
        .route("/api/evaluations", post(evaluations::create_evaluation))
        .route(
            "/api/evaluations/history",
            get(evaluations::evaluation_history),
        )
        .route(
            "/api/evaluations/property/:property_id",
            get(evaluations::latest_evaluation_for_property),
        )
        .route("/api/evaluations/:id", get(evaluations::get_evaluation))
        .route(
            "/api/evaluations/:id/verify",
            post(evaluations::verify_evaluation),
        )
        .layer(cors_layer)
        .layer(timeout_layer)
        .with_state(app_state)
}
