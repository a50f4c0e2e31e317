//! 周边评分器
//! 按类别检索周边设施，把数量与评分折算为 [0,10] 的类别得分

use futures::future::join_all;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::geo::{haversine_distance_m, GeocodingGateway, PlacesClient};
use crate::model::evaluation::AreaAnalysis;
use crate::model::geo::{GeoPoint, NearbyPlaceInfo, PlaceCategory};
use crate::util::config::ProximityConfig;
use crate::valuation::market::MarketDataProvider;

/// 区域分析失败原因
#[derive(Debug, thiserror::Error)]
pub enum AreaAnalysisError {
    /// 原点无法解析：所有类别计算都依赖它，必须整体失败而不是给出残缺评分
    #[error("адресът не може да бъде геокодиран")]
    OriginNotFound,
    #[error(transparent)]
    Upstream(#[from] anyhow::Error),
}

/// 周边评分器
pub struct ProximityScorer {
    geocoder: Arc<GeocodingGateway>,
    places: Arc<PlacesClient>,
    market: MarketDataProvider,
    config: ProximityConfig,
}

impl ProximityScorer {
    pub fn new(
        geocoder: Arc<GeocodingGateway>,
        places: Arc<PlacesClient>,
        market: MarketDataProvider,
        config: ProximityConfig,
    ) -> Self {
        Self {
            geocoder,
            places,
            market,
            config,
        }
    }

    /// 对地址做完整区域分析
    ///
    /// 地理编码失败时整体失败；单个类别的上游错误只降级该类别为0分
    pub async fn score_area(&self, address: &str) -> Result<AreaAnalysis, AreaAnalysisError> {
        let origin = self
            .geocoder
            .geocode(address)
            .await?
            .ok_or(AreaAnalysisError::OriginNotFound)?;
        let origin_point = origin.point();

        // 四个类别互不依赖，可并发检索
        let fetches = PlaceCategory::ALL.map(|category| self.category_places(origin_point, category));
        let per_category = join_all(fetches).await;

        let mut analysis = AreaAnalysis {
            origin,
            transport_score: 0.0,
            education_score: 0.0,
            shopping_score: 0.0,
            leisure_score: 0.0,
            average_price: 0,
            price_change: 0.0,
            infrastructure_projects: Vec::new(),
            nearby: Vec::new(),
        };

        for (category, places) in per_category {
            let score = Self::category_score(&places);
            debug!(
                event = "valuation.proximity.category_scored",
                category = category.as_str(),
                count = places.len(),
                score
            );
            match category {
                PlaceCategory::Transport => analysis.transport_score = score,
                PlaceCategory::Education => analysis.education_score = score,
                PlaceCategory::Shopping => analysis.shopping_score = score,
                PlaceCategory::Leisure => analysis.leisure_score = score,
            }
            analysis.nearby.extend(places);
        }

        let snapshot = self.market.snapshot_for_address(address);
        analysis.average_price = snapshot.average_price;
        analysis.price_change = snapshot.price_change;
        analysis.infrastructure_projects = snapshot.infrastructure_projects;

        Ok(analysis)
    }

    /// 检索单个类别的全部设施种类，映射为带距离的条目
    async fn category_places(
        &self,
        origin: GeoPoint,
        category: PlaceCategory,
    ) -> (PlaceCategory, Vec<NearbyPlaceInfo>) {
        let radius = self.radius_for(category);
        let mut found = Vec::new();

        for kind in category.place_kinds() {
            match self.places.nearby(origin, kind, radius).await {
                Ok(places) => found.extend(places),
                Err(e) => {
                    // 单类别失败降级为0分，不让整次分析失败
                    warn!(
                        event = "valuation.proximity.kind_failed",
                        category = category.as_str(),
                        kind,
                        error = %e
                    );
                }
            }
        }

        let infos = found
            .into_iter()
            .map(|place| NearbyPlaceInfo {
                distance_m: haversine_distance_m(origin, place.location),
                name: place.name,
                category,
                location: place.location,
                rating: place.rating,
            })
            .collect();

        (category, infos)
    }

    /// 类别半径：配置覆盖优先，否则用默认值
    fn radius_for(&self, category: PlaceCategory) -> u32 {
        self.config
            .category_radius_m
            .get(category.as_str())
            .copied()
            .unwrap_or(self.config.default_radius_m)
    }

    /// 类别得分 = round((min(10, 数量×2) + 平均评分) / 2)，限定 [0,10]
    ///
    /// 没有任何评分时平均评分按0计；没有任何设施时得分恰为0，绝不缺失
    pub fn category_score(places: &[NearbyPlaceInfo]) -> f64 {
        if places.is_empty() {
            return 0.0;
        }

        let count_component = (places.len() as f64 * 2.0).min(10.0);
        let ratings: Vec<f64> = places.iter().filter_map(|p| p.rating).collect();
        let average_rating = if ratings.is_empty() {
            0.0
        } else {
            ratings.iter().sum::<f64>() / ratings.len() as f64
        };

        ((count_component + average_rating) / 2.0)
            .round()
            .clamp(0.0, 10.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn place(rating: Option<f64>) -> NearbyPlaceInfo {
        NearbyPlaceInfo {
            name: "тест".to_string(),
            category: PlaceCategory::Transport,
            location: GeoPoint { lat: 42.7, lng: 23.3 },
            rating,
            distance_m: 120.0,
        }
    }

    #[test]
    fn test_zero_places_scores_exactly_zero() {
        assert_eq!(ProximityScorer::category_score(&[]), 0.0);
    }

    #[test]
    fn test_score_without_ratings_uses_zero_average() {
        // 3个设施、无评分：round((6 + 0) / 2) = 3
        let places = vec![place(None), place(None), place(None)];
        assert_eq!(ProximityScorer::category_score(&places), 3.0);
    }

    #[test]
    fn test_count_component_caps_at_ten() {
        // 8个设施（数量项封顶10）、平均评分4：round((10 + 4) / 2) = 7
        let places: Vec<_> = (0..8).map(|_| place(Some(4.0))).collect();
        assert_eq!(ProximityScorer::category_score(&places), 7.0);
    }

    #[test]
    fn test_score_rounding() {
        // 2个设施、平均评分4.5：round((4 + 4.5) / 2) = round(4.25) = 4
        let places = vec![place(Some(4.0)), place(Some(5.0))];
        assert_eq!(ProximityScorer::category_score(&places), 4.0);
    }

    #[test]
    fn test_rating_average_skips_unrated() {
        // 评分只在有评分的设施上取平均：round((4 + 5) / 2) = 5（数量2 → 4；平均5）
        let places = vec![place(Some(5.0)), place(None)];
        assert_eq!(ProximityScorer::category_score(&places), 5.0);
    }
}
