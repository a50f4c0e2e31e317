//! 周边设施检索客户端
//! 按设施种类调用上游 places 接口，返回原始条目

use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::sync::Arc;
use tracing::debug;

use crate::model::geo::GeoPoint;
use crate::util::config::MapsConfig;
use crate::util::http_client::HttpClient;

/// 上游返回的设施条目
#[derive(Debug, Clone)]
pub struct ProviderPlace {
    pub name: String,
    pub location: GeoPoint,
    pub rating: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct NearbyResponse {
    #[serde(default)]
    results: Vec<NearbyResult>,
    status: String,
    #[serde(default)]
    error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct NearbyResult {
    name: String,
    geometry: Geometry,
    #[serde(default)]
    rating: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct Geometry {
    location: LatLng,
}

#[derive(Debug, Deserialize)]
struct LatLng {
    lat: f64,
    lng: f64,
}

/// 周边检索客户端
pub struct PlacesClient {
    http: Arc<HttpClient>,
    config: MapsConfig,
}

impl PlacesClient {
    pub fn new(http: Arc<HttpClient>, config: MapsConfig) -> Self {
        Self { http, config }
    }

    /// 检索指定坐标周边某一种类的设施
    ///
    /// 上游错误返回Err由调用方决定降级策略；零结果返回空列表
    pub async fn nearby(
        &self,
        origin: GeoPoint,
        kind: &str,
        radius_m: u32,
    ) -> Result<Vec<ProviderPlace>> {
        let url = format!(
            "{}/place/nearbysearch/json?location={},{}&radius={}&type={}&language={}&key={}",
            self.config.base_url.trim_end_matches('/'),
            origin.lat,
            origin.lng,
            radius_m,
            urlencoding::encode(kind),
            self.config.language,
            self.config.api_key,
        );

        let response = self
            .http
            .reqwest_client()
            .get(&url)
            .send()
            .await
            .context("周边检索请求失败")?;

        let status = response.status();
        if !status.is_success() {
            return Err(anyhow!("周边检索返回 HTTP {}", status.as_u16()));
        }

        let body: NearbyResponse = response.json().await.context("周边检索响应解析失败")?;

        match body.status.as_str() {
            "OK" | "ZERO_RESULTS" => {
                debug!(
                    event = "geo.places.fetched",
                    kind,
                    radius_m,
                    count = body.results.len()
                );
                Ok(body
                    .results
                    .into_iter()
                    .map(|r| ProviderPlace {
                        name: r.name,
                        location: GeoPoint {
                            lat: r.geometry.location.lat,
                            lng: r.geometry.location.lng,
                        },
                        rating: r.rating,
                    })
                    .collect())
            }
            other => Err(anyhow!(
                "周边检索服务商返回错误状态 {}: {}",
                other,
                body.error_message.unwrap_or_default()
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nearby_response_parsing() {
        let raw = r#"{
            "results": [
                {"name": "Метростанция Младост 1", "geometry": {"location": {"lat": 42.65, "lng": 23.38}}, "rating": 4.4},
                {"name": "Спирка 72", "geometry": {"location": {"lat": 42.66, "lng": 23.37}}}
            ],
            "status": "OK"
        }"#;
        let parsed: NearbyResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.status, "OK");
        assert_eq!(parsed.results.len(), 2);
        assert_eq!(parsed.results[0].rating, Some(4.4));
        assert!(parsed.results[1].rating.is_none());
    }

    #[test]
    fn test_zero_results_parsing() {
        let raw = r#"{"results": [], "status": "ZERO_RESULTS"}"#;
        let parsed: NearbyResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.status, "ZERO_RESULTS");
        assert!(parsed.results.is_empty());
    }
}
