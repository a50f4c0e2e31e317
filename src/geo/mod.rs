//! 地理模块
//!
//! - 地理编码网关：地址⇄坐标，结果限定单一国家，带有界LRU缓存
//! - 周边检索客户端 (places.rs)
//! - 大圆距离计算

pub mod cache;
pub mod places;

pub use cache::GeocodeCache;
pub use places::{PlacesClient, ProviderPlace};

use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::model::geo::{GeoPoint, GeocodedAddress};
use crate::util::config::MapsConfig;
use crate::util::http_client::HttpClient;

#[derive(Debug, Deserialize)]
struct GeocodeResponse {
    #[serde(default)]
    results: Vec<GeocodeResult>,
    status: String,
    #[serde(default)]
    error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeocodeResult {
    geometry: Geometry,
    formatted_address: String,
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

/// 地理编码网关
///
/// 成功结果按输入串记入注入的LRU缓存；找不到返回 Ok(None)，
/// 服务商/网络错误返回 Err，由上层决定呈现方式，绝不自动重试
pub struct GeocodingGateway {
    http: Arc<HttpClient>,
    config: MapsConfig,
    cache: Arc<GeocodeCache>,
}

impl GeocodingGateway {
    pub fn new(http: Arc<HttpClient>, config: MapsConfig, cache: Arc<GeocodeCache>) -> Self {
        Self {
            http,
            config,
            cache,
        }
    }

    /// 地址→坐标
    pub async fn geocode(&self, address: &str) -> Result<Option<GeocodedAddress>> {
        let address = address.trim();
        if address.is_empty() {
            return Err(anyhow!("地址不能为空"));
        }

        if let Some(cached) = self.cache.get(address) {
            debug!(event = "geo.geocode.cache_hit", address);
            return Ok(Some(cached));
        }

        let url = format!(
            "{}/geocode/json?address={}&components=country:{}&language={}&key={}",
            self.config.base_url.trim_end_matches('/'),
            urlencoding::encode(address),
            self.config.country,
            self.config.language,
            self.config.api_key,
        );

        match self.fetch_first_result(&url).await? {
            Some(result) => {
                let hit = GeocodedAddress {
                    lat: result.geometry.location.lat,
                    lng: result.geometry.location.lng,
                    display_name: result.formatted_address,
                };
                self.cache.put(address, hit.clone());
                debug!(event = "geo.geocode.resolved", address, lat = hit.lat, lng = hit.lng);
                Ok(Some(hit))
            }
            None => {
                debug!(event = "geo.geocode.not_found", address);
                Ok(None)
            }
        }
    }

    /// 坐标→地址
    pub async fn reverse_geocode(&self, lat: f64, lng: f64) -> Result<Option<String>> {
        let url = format!(
            "{}/geocode/json?latlng={},{}&language={}&key={}",
            self.config.base_url.trim_end_matches('/'),
            lat,
            lng,
            self.config.language,
            self.config.api_key,
        );

        Ok(self
            .fetch_first_result(&url)
            .await?
            .map(|r| r.formatted_address))
    }

    async fn fetch_first_result(&self, url: &str) -> Result<Option<GeocodeResult>> {
        let response = self
            .http
            .reqwest_client()
            .get(url)
            .send()
            .await
            .context("地理编码请求失败")?;

        let status = response.status();
        if !status.is_success() {
            warn!(event = "geo.geocode.http_error", status = status.as_u16());
            return Err(anyhow!("地理编码服务返回 HTTP {}", status.as_u16()));
        }

        let body: GeocodeResponse = response.json().await.context("地理编码响应解析失败")?;

        match body.status.as_str() {
            "OK" => Ok(body.results.into_iter().next()),
            "ZERO_RESULTS" => Ok(None),
            other => {
                warn!(
                    event = "geo.geocode.provider_error",
                    status = other,
                    message = body.error_message.as_deref().unwrap_or("")
                );
                Err(anyhow!("地理编码服务商返回错误状态 {}", other))
            }
        }
    }
}

/// 大圆距离（米），haversine公式
pub fn haversine_distance_m(a: GeoPoint, b: GeoPoint) -> f64 {
    const EARTH_RADIUS_M: f64 = 6_371_000.0;

    let lat_a = a.lat.to_radians();
    let lat_b = b.lat.to_radians();
    let d_lat = (b.lat - a.lat).to_radians();
    let d_lng = (b.lng - a.lng).to_radians();

    let h = (d_lat / 2.0).sin().powi(2) + lat_a.cos() * lat_b.cos() * (d_lng / 2.0).sin().powi(2);

    2.0 * EARTH_RADIUS_M * h.sqrt().asin()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_haversine_zero_distance() {
        let p = GeoPoint { lat: 42.6977, lng: 23.3219 };
        assert_eq!(haversine_distance_m(p, p), 0.0);
    }

    #[test]
    fn test_haversine_known_distance() {
        // София център → Пловдив център，约132公里
        let sofia = GeoPoint { lat: 42.6977, lng: 23.3219 };
        let plovdiv = GeoPoint { lat: 42.1354, lng: 24.7453 };
        let d = haversine_distance_m(sofia, plovdiv);
        assert!((130_000.0..140_000.0).contains(&d), "distance = {}", d);
    }

    #[test]
    fn test_haversine_short_distance() {
        // 相距约一个街区
        let a = GeoPoint { lat: 42.6977, lng: 23.3219 };
        let b = GeoPoint { lat: 42.6986, lng: 23.3219 };
        let d = haversine_distance_m(a, b);
        assert!((90.0..110.0).contains(&d), "distance = {}", d);
    }

    #[test]
    fn test_geocode_response_parsing() {
        let raw = r#"{
            "results": [{
                "geometry": {"location": {"lat": 42.6977, "lng": 23.3219}},
                "formatted_address": "гр. София, България"
            }],
            "status": "OK"
        }"#;
        let parsed: GeocodeResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.status, "OK");
        assert_eq!(parsed.results[0].formatted_address, "гр. София, България");
    }
}
