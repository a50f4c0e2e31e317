//! 估价引擎
//! 确定性乘法公式：基准单价 × 面积 × 建筑系数 × 房龄系数 × 区位系数

use chrono::{Datelike, Utc};

use crate::db::traits::{DocumentDataRecord, PropertyRecord};
use crate::model::evaluation::{LocationFactor, Valuation, ValuationFactors};

/// 城市基准单价表（EUR/кв.м），按地址子串匹配
const CITY_BASE_PRICES: [(&str, f64); 6] = [
    ("софия", 2200.0),
    ("пловдив", 1450.0),
    ("варна", 1650.0),
    ("бургас", 1500.0),
    ("русе", 1100.0),
    ("стара загора", 1150.0),
];

/// 未识别城市的兜底单价
const DEFAULT_BASE_PRICE: f64 = 950.0;

/// 建筑类型系数表，按类型串等值匹配（不区分大小写）
const CONSTRUCTION_FACTORS: [(&str, f64); 9] = [
    ("тухла", 1.2),
    ("brick", 1.2),
    ("стоманобетон", 1.1),
    ("concrete", 1.1),
    ("епк", 1.0),
    ("пк", 0.95),
    ("панел", 0.85),
    ("panel", 0.85),
    ("гредоред", 0.8),
];

/// 高端街区关键词（区位系数1.2，置信度0.9）
const PREMIUM_NEIGHBORHOODS: [&str; 5] = [
    "лозенец",
    "докторски паметник",
    "иван вазов",
    "изгрев",
    "бояна",
];

/// 优质街区关键词（区位系数1.1，置信度0.85）
const GOOD_NEIGHBORHOODS: [&str; 5] = [
    "младост",
    "витоша",
    "студентски град",
    "овча купел",
    "гео милев",
];

/// 状况与行情维度的固定占位置信度，真实数据源接入前不变
const CONDITION_CONFIDENCE: f64 = 0.8;
const MARKET_CONFIDENCE: f64 = 0.9;

/// 估价引擎 - 无内部状态，显式构造后注入调用方
pub struct ValuationEngine;

impl ValuationEngine {
    pub fn new() -> Self {
        Self
    }

    /// 估算市值
    ///
    /// 文档抽取数据比表单自报数据更权威：面积、建造年份、地址均以抽取值优先。
    /// 缺失的可选项用文档化的默认系数兜底，绝不报错。
    pub fn estimate(
        &self,
        property: &PropertyRecord,
        extracted: Option<&DocumentDataRecord>,
    ) -> Valuation {
        let address = extracted
            .and_then(|d| d.address.as_deref())
            .unwrap_or(&property.address);
        let square_meters = extracted
            .and_then(|d| d.square_meters)
            .unwrap_or(property.area);
        let construction_year = extracted
            .and_then(|d| d.construction_year)
            .or(property.construction_year);

        let base_price = Self::base_price_for_address(address);
        let construction_factor =
            Self::construction_factor(property.construction_type.as_deref());
        let age_factor = Self::age_factor(construction_year, Utc::now().year());
        let location = Self::location_factor(Some(address));

        // 面积为0时结果自然为0，公式中不存在除法
        let estimated_value =
            (base_price * square_meters * construction_factor * age_factor * location.factor)
                .round() as i64;

        let confidence = round2(
            (location.confidence + CONDITION_CONFIDENCE + MARKET_CONFIDENCE) / 3.0,
        );

        let mut recommendations = Vec::new();
        if age_factor < 0.8 {
            recommendations.push(
                "Сградата е на значителна възраст — основен ремонт би повишил пазарната стойност."
                    .to_string(),
            );
        }
        if construction_factor < 1.0 {
            recommendations.push(
                "Инвестиция в енергийна ефективност би компенсирала по-ниския строителен клас."
                    .to_string(),
            );
        }
        if location.factor > 1.1 {
            recommendations.push(
                "Районът е с отлична перспектива — очаква се ръст на цените.".to_string(),
            );
        }

        // 因子明细仅用于展示：系数×100取整，不参与后续计算
        let factors = ValuationFactors {
            location: (location.factor * 100.0).round() as i64,
            condition: (age_factor * 100.0).round() as i64,
            market: (construction_factor * 100.0).round() as i64,
            potential: ((location.factor + age_factor + construction_factor) / 3.0 * 100.0).round()
                as i64,
        };

        Valuation {
            estimated_value,
            confidence,
            factors,
            recommendations,
        }
    }

    /// 城市基准单价：地址小写后做子串匹配，未识别城市用默认值
    pub fn base_price_for_address(address: &str) -> f64 {
        let lowered = address.to_lowercase();
        CITY_BASE_PRICES
            .iter()
            .find(|(city, _)| lowered.contains(city))
            .map(|(_, price)| *price)
            .unwrap_or(DEFAULT_BASE_PRICE)
    }

    /// 建筑类型系数：等值匹配（不区分大小写），未知/缺失为1.0
    pub fn construction_factor(construction_type: Option<&str>) -> f64 {
        let Some(raw) = construction_type else {
            return 1.0;
        };
        let lowered = raw.trim().to_lowercase();
        CONSTRUCTION_FACTORS
            .iter()
            .find(|(name, _)| *name == lowered)
            .map(|(_, factor)| *factor)
            .unwrap_or(1.0)
    }

    /// 房龄系数：按房龄分段，年份缺失为0.9
    pub fn age_factor(construction_year: Option<i32>, current_year: i32) -> f64 {
        let Some(year) = construction_year else {
            return 0.9;
        };
        let age = current_year.saturating_sub(year);
        match age {
            i32::MIN..=4 => 1.3,
            5..=14 => 1.1,
            15..=29 => 0.9,
            30..=49 => 0.7,
            _ => 0.5,
        }
    }

    /// 区位系数：地址按两级街区关键词分层匹配（不区分大小写）
    pub fn location_factor(address: Option<&str>) -> LocationFactor {
        let Some(address) = address.filter(|a| !a.trim().is_empty()) else {
            return LocationFactor {
                factor: 1.0,
                confidence: 0.6,
            };
        };

        let lowered = address.to_lowercase();
        if PREMIUM_NEIGHBORHOODS.iter().any(|n| lowered.contains(n)) {
            LocationFactor {
                factor: 1.2,
                confidence: 0.9,
            }
        } else if GOOD_NEIGHBORHOODS.iter().any(|n| lowered.contains(n)) {
            LocationFactor {
                factor: 1.1,
                confidence: 0.85,
            }
        } else {
            LocationFactor {
                factor: 1.0,
                confidence: 0.75,
            }
        }
    }
}

impl Default for ValuationEngine {
    fn default() -> Self {
        Self::new()
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Utc};

    fn property(address: &str, area: f64) -> PropertyRecord {
        PropertyRecord {
            id: "prop-1".to_string(),
            address: address.to_string(),
            area,
            lat: None,
            lng: None,
            metro_distance_m: None,
            green_zones: None,
            price_range: None,
            construction_type: None,
            construction_year: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_sofia_brick_two_year_flat() {
        // София、50кв.м、тухла、房龄2年、无街区关键词：
        // 2200 × 50 × 1.2 × 1.3 × 1.0 = 171 600
        let mut p = property("София", 50.0);
        p.construction_type = Some("тухла".to_string());
        p.construction_year = Some(Utc::now().year() - 2);

        let engine = ValuationEngine::new();
        let valuation = engine.estimate(&p, None);
        assert_eq!(valuation.estimated_value, 171_600);
        // mean(0.75, 0.8, 0.9) = 0.8167 → 0.82
        assert_eq!(valuation.confidence, 0.82);
    }

    #[test]
    fn test_zero_square_meters_yields_zero_value() {
        let engine = ValuationEngine::new();
        let valuation = engine.estimate(&property("гр. Варна", 0.0), None);
        assert_eq!(valuation.estimated_value, 0);
    }

    #[test]
    fn test_city_table_exact_and_default() {
        assert_eq!(
            ValuationEngine::base_price_for_address("гр. София, ул. Шипка 3"),
            2200.0
        );
        assert_eq!(ValuationEngine::base_price_for_address("ПЛОВДИВ"), 1450.0);
        assert_eq!(
            ValuationEngine::base_price_for_address("с. Равадиново, общ. Созопол"),
            950.0
        );
    }

    #[test]
    fn test_construction_factor_case_insensitive() {
        assert_eq!(
            ValuationEngine::construction_factor(Some("тухла")),
            ValuationEngine::construction_factor(Some("ТУХЛА"))
        );
        assert_eq!(ValuationEngine::construction_factor(Some("Тухла")), 1.2);
        assert_eq!(ValuationEngine::construction_factor(Some("панел")), 0.85);
        // 等值匹配："пк" 不得与 "епк" 混淆
        assert_eq!(ValuationEngine::construction_factor(Some("ЕПК")), 1.0);
        assert_eq!(ValuationEngine::construction_factor(Some("пк")), 0.95);
        assert_eq!(ValuationEngine::construction_factor(Some("неизвестен")), 1.0);
        assert_eq!(ValuationEngine::construction_factor(None), 1.0);
    }

    #[test]
    fn test_age_factor_exact_boundaries() {
        let year = 2026;
        let cases = [
            (4, 1.3),
            (5, 1.1),
            (14, 1.1),
            (15, 0.9),
            (29, 0.9),
            (30, 0.7),
            (49, 0.7),
            (50, 0.5),
        ];
        for (age, expected) in cases {
            assert_eq!(
                ValuationEngine::age_factor(Some(year - age), year),
                expected,
                "age {}",
                age
            );
        }
        assert_eq!(ValuationEngine::age_factor(None, year), 0.9);
    }

    #[test]
    fn test_location_factor_tiers() {
        let premium = ValuationEngine::location_factor(Some("ж.к. ЛОЗЕНЕЦ, ул. Златовръх"));
        assert_eq!(premium.factor, 1.2);
        assert_eq!(premium.confidence, 0.9);

        let good = ValuationEngine::location_factor(Some("кв. Младост 2"));
        assert_eq!(good.factor, 1.1);
        assert_eq!(good.confidence, 0.85);

        let plain = ValuationEngine::location_factor(Some("кв. Надежда"));
        assert_eq!(plain.factor, 1.0);
        assert_eq!(plain.confidence, 0.75);

        let missing = ValuationEngine::location_factor(None);
        assert_eq!(missing.factor, 1.0);
        assert_eq!(missing.confidence, 0.6);
    }

    #[test]
    fn test_extracted_data_takes_precedence() {
        let mut p = property("София", 50.0);
        p.construction_type = Some("тухла".to_string());
        p.construction_year = Some(Utc::now().year() - 2);

        let extracted = DocumentDataRecord {
            square_meters: Some(100.0),
            construction_year: Some(Utc::now().year() - 40),
            ..Default::default()
        };

        let engine = ValuationEngine::new();
        let valuation = engine.estimate(&p, Some(&extracted));
        // 2200 × 100 × 1.2 × 0.7 × 1.0 = 184 800
        assert_eq!(valuation.estimated_value, 184_800);
    }

    #[test]
    fn test_recommendations_triggering() {
        let engine = ValuationEngine::new();

        let mut old_panel = property("кв. Лозенец", 60.0);
        old_panel.construction_type = Some("панел".to_string());
        old_panel.construction_year = Some(Utc::now().year() - 45);
        let valuation = engine.estimate(&old_panel, None);
        // 房龄系数0.7 + 建筑系数0.85 + 区位系数1.2 → 三条建议全触发
        assert_eq!(valuation.recommendations.len(), 3);

        let mut fresh = property("София", 60.0);
        fresh.construction_type = Some("тухла".to_string());
        fresh.construction_year = Some(Utc::now().year() - 1);
        assert!(engine.estimate(&fresh, None).recommendations.is_empty());
    }

    #[test]
    fn test_factors_display_scale() {
        let mut p = property("кв. Младост 1", 70.0);
        p.construction_type = Some("панел".to_string());
        p.construction_year = Some(Utc::now().year() - 20);

        let valuation = ValuationEngine::new().estimate(&p, None);
        assert_eq!(valuation.factors.location, 110);
        assert_eq!(valuation.factors.condition, 90);
        assert_eq!(valuation.factors.market, 85);
        assert_eq!(valuation.factors.potential, 95);
    }
}
