//! 市场行情数据提供者
//! 静态城市行情表，真实数据源接入前的占位实现

use crate::model::evaluation::MarketSnapshot;

struct CityMarketRow {
    city: &'static str,
    average_price: i64,
    price_change: f64,
    infrastructure_projects: &'static [&'static str],
}

/// 城市行情表（均价 EUR/кв.м、年同比变动%、在建基础设施项目）
const CITY_MARKET_DATA: [CityMarketRow; 4] = [
    CityMarketRow {
        city: "софия",
        average_price: 1850,
        price_change: 8.4,
        infrastructure_projects: &[
            "Разширение на метро линия 3 към кв. Слатина",
            "Реконструкция на Околовръстния път",
        ],
    },
    CityMarketRow {
        city: "пловдив",
        average_price: 1280,
        price_change: 6.1,
        infrastructure_projects: &["Нов пробив под Централна гара"],
    },
    CityMarketRow {
        city: "варна",
        average_price: 1440,
        price_change: 7.2,
        infrastructure_projects: &["Продължение на бул. Васил Левски"],
    },
    CityMarketRow {
        city: "бургас",
        average_price: 1310,
        price_change: 5.8,
        infrastructure_projects: &[],
    },
];

/// 未识别城市的兜底行情
const DEFAULT_MARKET: CityMarketRow = CityMarketRow {
    city: "",
    average_price: 900,
    price_change: 3.5,
    infrastructure_projects: &[],
};

/// 市场行情提供者 - 无状态，显式构造后注入
pub struct MarketDataProvider;

impl MarketDataProvider {
    pub fn new() -> Self {
        Self
    }

    /// 按地址子串匹配城市行情，未识别城市用默认行
    pub fn snapshot_for_address(&self, address: &str) -> MarketSnapshot {
        let lowered = address.to_lowercase();
        let row = CITY_MARKET_DATA
            .iter()
            .find(|row| lowered.contains(row.city))
            .unwrap_or(&DEFAULT_MARKET);

        MarketSnapshot {
            average_price: row.average_price,
            price_change: row.price_change,
            infrastructure_projects: row
                .infrastructure_projects
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

impl Default for MarketDataProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_city_snapshot() {
        let provider = MarketDataProvider::new();
        let snapshot = provider.snapshot_for_address("гр. СОФИЯ, ж.к. Младост");
        assert_eq!(snapshot.average_price, 1850);
        assert_eq!(snapshot.infrastructure_projects.len(), 2);
    }

    #[test]
    fn test_unknown_city_uses_default() {
        let provider = MarketDataProvider::new();
        let snapshot = provider.snapshot_for_address("с. Бания");
        assert_eq!(snapshot.average_price, 900);
        assert!(snapshot.infrastructure_projects.is_empty());
    }
}
