//! 估价核心模块
//!
//! - engine: 确定性估价公式（基准单价 × 面积 × 建筑 × 房龄 × 区位）
//! - proximity: 周边设施评分
//! - market: 静态市场行情表
//! - classify: 可注入的房间图像分类接口（桩实现）

pub mod classify;
pub mod engine;
pub mod market;
pub mod proximity;

pub use classify::{MockRoomClassifier, RoomClassifier};
pub use engine::ValuationEngine;
pub use market::MarketDataProvider;
pub use proximity::{AreaAnalysisError, ProximityScorer};
