//! 地理接口
//! 地理编码代理、周边检索代理与前端地图配置

use axum::extract::{Query, State};
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::api::error::ApiError;
use crate::model::geo::GeoPoint;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct GeocodeQuery {
    pub address: Option<String>,
    /// "lat,lng" 形式的反向查询
    pub latlng: Option<String>,
}

/// GET /api/geocode
///
/// 响应保持服务商形状：{results: [...], status}
pub async fn geocode(
    State(app_state): State<AppState>,
    Query(query): Query<GeocodeQuery>,
) -> Result<Json<Value>, ApiError> {
    if let Some(address) = query.address.as_deref().map(str::trim) {
        if address.is_empty() {
            return Err(ApiError::bad_field("address", "адресът не може да е празен"));
        }

        let result = app_state
            .geocoder
            .geocode(address)
            .await
            .map_err(|e| ApiError::Upstream(format!("{e:#}")))?;

        return Ok(Json(match result {
            Some(hit) => json!({
                "results": [{
                    "geometry": { "location": { "lat": hit.lat, "lng": hit.lng } },
                    "formatted_address": hit.display_name,
                }],
                "status": "OK",
            }),
            None => json!({ "results": [], "status": "ZERO_RESULTS" }),
        }));
    }

    if let Some(latlng) = query.latlng.as_deref() {
        let point = parse_latlng(latlng)?;
        let result = app_state
            .geocoder
            .reverse_geocode(point.lat, point.lng)
            .await
            .map_err(|e| ApiError::Upstream(format!("{e:#}")))?;

        return Ok(Json(match result {
            Some(display_name) => json!({
                "results": [{
                    "geometry": { "location": { "lat": point.lat, "lng": point.lng } },
                    "formatted_address": display_name,
                }],
                "status": "OK",
            }),
            None => json!({ "results": [], "status": "ZERO_RESULTS" }),
        }));
    }

    Err(ApiError::bad_request(
        "изисква се параметър address или latlng",
    ))
}

#[derive(Debug, Deserialize)]
pub struct NearbyQuery {
    /// "lat,lng"
    pub location: String,
    #[serde(rename = "type")]
    pub place_kind: String,
    pub radius: Option<u32>,
}

/// GET /api/places/nearby
pub async fn places_nearby(
    State(app_state): State<AppState>,
    Query(query): Query<NearbyQuery>,
) -> Result<Json<Value>, ApiError> {
    let origin = parse_latlng(&query.location)?;
    if query.place_kind.trim().is_empty() {
        return Err(ApiError::bad_field("type", "видът на обекта е задължителен"));
    }
    let radius = query
        .radius
        .unwrap_or(app_state.config.proximity.default_radius_m);

    let places = app_state
        .places
        .nearby(origin, query.place_kind.trim(), radius)
        .await
        .map_err(|e| ApiError::Upstream(format!("{e:#}")))?;

    let results: Vec<Value> = places
        .into_iter()
        .map(|p| {
            json!({
                "name": p.name,
                "geometry": { "location": { "lat": p.location.lat, "lng": p.location.lng } },
                "rating": p.rating,
            })
        })
        .collect();

    Ok(Json(json!({ "results": results, "status": "OK" })))
}

/// GET /api/maps/config - 仅供地图渲染侧使用
pub async fn maps_config(State(app_state): State<AppState>) -> Json<Value> {
    Json(json!({ "apiKey": app_state.config.maps.api_key }))
}

/// 解析 "lat,lng" 参数
fn parse_latlng(raw: &str) -> Result<GeoPoint, ApiError> {
    let mut parts = raw.split(',');
    let lat = parts.next().map(str::trim).and_then(|s| s.parse::<f64>().ok());
    let lng = parts.next().map(str::trim).and_then(|s| s.parse::<f64>().ok());

    match (lat, lng, parts.next()) {
        (Some(lat), Some(lng), None) if (-90.0..=90.0).contains(&lat) && (-180.0..=180.0).contains(&lng) => {
            Ok(GeoPoint { lat, lng })
        }
        _ => Err(ApiError::bad_field(
            "latlng",
            "очаква се формат \"lat,lng\" с валидни координати",
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_latlng_valid() {
        let point = parse_latlng("42.6977, 23.3219").unwrap();
        assert_eq!(point.lat, 42.6977);
        assert_eq!(point.lng, 23.3219);
    }

    #[test]
    fn test_parse_latlng_rejects_garbage() {
        assert!(parse_latlng("abc").is_err());
        assert!(parse_latlng("42.0").is_err());
        assert!(parse_latlng("91.0,23.0").is_err());
        assert!(parse_latlng("42.0,23.0,7.0").is_err());
    }
}
