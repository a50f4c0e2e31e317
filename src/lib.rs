use std::sync::Arc;

pub mod api;
pub mod build_info;
pub mod db;
pub mod geo;
pub mod model;
pub mod server;
pub mod util;
pub mod valuation;

use geo::{GeocodingGateway, PlacesClient};
use util::config::Config;
use util::http_client::HttpClient;
use valuation::{ProximityScorer, RoomClassifier, ValuationEngine};

/// 应用状态结构
///
/// 除地理编码网关内部的LRU缓存外，所有服务都是无状态的；
/// 统一在引导阶段显式构造并注入，不依赖全局可变单例
#[derive(Clone)]
pub struct AppState {
    pub database: Arc<dyn db::Database>,
    pub config: Config,
    /// HTTP客户端（支持依赖注入和配置管理）
    pub http_client: Arc<HttpClient>,
    /// 地理编码网关（含进程级LRU缓存）
    pub geocoder: Arc<GeocodingGateway>,
    /// 周边检索客户端
    pub places: Arc<PlacesClient>,
    /// 周边评分器
    pub scorer: Arc<ProximityScorer>,
    /// 估价引擎
    pub engine: Arc<ValuationEngine>,
    /// 房间图像分类器（桩实现，可替换为真实模型）
    pub classifier: Arc<dyn RoomClassifier>,
}
