//! 房产接口
//! 表单提交创建与查询

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{Datelike, Utc};
use serde::Deserialize;
use tracing::{info, warn};

use crate::api::error::{ApiError, ApiJson};
use crate::api::utils::generate_record_id;
use crate::db::traits::PropertyRecord;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct CreatePropertyRequest {
    pub address: String,
    pub area: f64,
    #[serde(default)]
    pub construction_type: Option<String>,
    #[serde(default)]
    pub construction_year: Option<i32>,
    #[serde(default)]
    pub metro_distance_m: Option<i64>,
    #[serde(default)]
    pub green_zones: Option<i64>,
    #[serde(default)]
    pub price_range: Option<String>,
}

/// POST /api/properties
pub async fn create_property(
    State(app_state): State<AppState>,
    ApiJson(request): ApiJson<CreatePropertyRequest>,
) -> Result<(StatusCode, Json<PropertyRecord>), ApiError> {
    let address = request.address.trim();
    if address.is_empty() {
        return Err(ApiError::bad_field("address", "адресът е задължителен"));
    }
    if !request.area.is_finite() || request.area <= 0.0 {
        return Err(ApiError::bad_field("area", "площта трябва да е положително число"));
    }
    if let Some(year) = request.construction_year {
        if !(1800..=Utc::now().year() + 1).contains(&year) {
            return Err(ApiError::bad_field(
                "construction_year",
                "годината на строителство е извън допустимия интервал",
            ));
        }
    }

    // 坐标尽力解析：失败不阻塞创建，估价阶段会再次经过缓存请求
    let (lat, lng) = match app_state.geocoder.geocode(address).await {
        Ok(Some(hit)) => (Some(hit.lat), Some(hit.lng)),
        Ok(None) => {
            info!(event = "api.property.geocode_miss", address);
            (None, None)
        }
        Err(e) => {
            warn!(event = "api.property.geocode_failed", address, error = %e);
            (None, None)
        }
    };

    let record = PropertyRecord {
        id: generate_record_id(),
        address: address.to_string(),
        area: request.area,
        lat,
        lng,
        metro_distance_m: request.metro_distance_m,
        green_zones: request.green_zones,
        price_range: request.price_range,
        construction_type: request.construction_type,
        construction_year: request.construction_year,
        created_at: Utc::now(),
    };

    app_state.database.save_property(&record).await?;
    info!(event = "api.property.created", id = %record.id, area = record.area);

    Ok((StatusCode::CREATED, Json(record)))
}

/// GET /api/properties/:id
pub async fn get_property(
    State(app_state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<PropertyRecord>, ApiError> {
    app_state
        .database
        .get_property(&id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("имотът не е намерен"))
}
