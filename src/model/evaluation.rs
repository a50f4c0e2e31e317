use serde::{Deserialize, Serialize};

use super::geo::{GeocodedAddress, NearbyPlaceInfo};

/// 区位因子 - 地址关键词分层匹配的结果
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LocationFactor {
    /// 乘入基准价的系数
    pub factor: f64,
    /// 该判断的置信度，范围 [0,1]
    pub confidence: f64,
}

/// 估价因子明细 - 仅用于展示，0~100量纲（系数×100取整）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValuationFactors {
    pub location: i64,
    pub condition: i64,
    pub market: i64,
    pub potential: i64,
}

/// 估价引擎输出 - 纯计算结果，不包含任何持久化细节
///
/// confidence 为 [0,1]，与落库的百分比刻度不同
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Valuation {
    /// 估算市值（EUR，取整）
    pub estimated_value: i64,
    /// 综合置信度，范围 [0,1]，保留两位小数
    pub confidence: f64,
    pub factors: ValuationFactors,
    pub recommendations: Vec<String>,
}

/// 市场行情快照 - 静态行情表的投影，真实数据源接入前的占位
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketSnapshot {
    /// 区域平均单价（EUR/кв.м）
    pub average_price: i64,
    /// 年同比价格变动（百分比）
    pub price_change: f64,
    /// 在建/规划基础设施项目
    pub infrastructure_projects: Vec<String>,
}

/// 区域分析结果 - 周边设施评分与行情快照
///
/// 每项评分范围 [0,10]；某类别没有任何设施时评分为 0，而不是缺失
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AreaAnalysis {
    pub origin: GeocodedAddress,
    pub transport_score: f64,
    pub education_score: f64,
    pub shopping_score: f64,
    pub leisure_score: f64,
    pub average_price: i64,
    pub price_change: f64,
    pub infrastructure_projects: Vec<String>,
    pub nearby: Vec<NearbyPlaceInfo>,
}

impl AreaAnalysis {
    /// 四类评分的算术平均，用作估价记录的基建评分
    pub fn mean_score(&self) -> f64 {
        (self.transport_score + self.education_score + self.shopping_score + self.leisure_score)
            / 4.0
    }
}

/// 房间分类结果（注入式AI接口的输出）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomClassification {
    pub room_type: String,
    /// 分类置信度，范围 [0,1]
    pub confidence: f64,
    pub features: Vec<String>,
}
