//! 文档字段抽取模块
//!
//! 对OCR文本做轻量结构化抽取：按字段维护有序的（字段, 正则, 解析器）规则表，
//! 各字段相互独立求值，同字段首个命中生效；没有命中就留空，绝不填默认值。
//! 词表和数字格式面向保加利亚语文档（小数点为逗号），正则是区域敏感的。

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

use crate::db::traits::DocumentType;

/// 结构化抽取结果 - 全部字段可选
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtractedFields {
    pub square_meters: Option<f64>,
    pub construction_year: Option<i32>,
    pub address: Option<String>,
    pub rooms: Option<i32>,
    pub floor: Option<i32>,
    pub total_floors: Option<i32>,
    pub price: Option<f64>,
    pub owner: Option<String>,
    pub cadastral_number: Option<String>,
    pub tax_assessment_value: Option<f64>,
}

/// 单条抽取规则：一个字段 + 一个正则 + 一个解析器
struct FieldRule {
    field: &'static str,
    pattern: Regex,
    /// 仅当目标字段尚未填充时写入；返回是否成功解析
    apply: fn(&mut ExtractedFields, &Captures) -> bool,
}

fn rule(
    field: &'static str,
    pattern: &str,
    apply: fn(&mut ExtractedFields, &Captures) -> bool,
) -> FieldRule {
    FieldRule {
        field,
        pattern: Regex::new(pattern).expect("extraction regex compiles"),
        apply,
    }
}

/// 有序规则表：同一字段可挂多条规则，排前者优先
static FIELD_RULES: Lazy<Vec<FieldRule>> = Lazy::new(|| {
    vec![
        // 面积："85 кв.м"、"застроена площ 85,50 кв. м"、"квадратни метра"
        rule(
            "square_meters",
            r"(?i)(\d+(?:[.,]\d+)?)\s*(?:кв\.?\s*м|квадратни\s+метра)",
            |fields, caps| {
                if fields.square_meters.is_none() {
                    if let Some(value) = parse_bg_number(&caps[1]) {
                        fields.square_meters = Some(value);
                        return true;
                    }
                }
                false
            },
        ),
        // 建造年份："построена през 1998"
        rule(
            "construction_year",
            r"(?i)построен[аио]?\s+през\s+(\d{4})",
            set_construction_year,
        ),
        // 建造年份（备选表述）："година на строителство: 1998"
        rule(
            "construction_year",
            r"(?i)година\s+на\s+строителство[:\s]+(\d{4})",
            set_construction_year,
        ),
        // 地址："адрес: гр. София, ..."
        rule(
            "address",
            r"(?i)адрес[:\s]+([^\n;]+)",
            set_address,
        ),
        // 地址（公证书表述）："находящ се в гр. Пловдив, ..."
        rule(
            "address",
            r"(?i)находящ[а-я]*\s+се\s+(?:в|на)\s+([^\n;]+)",
            set_address,
        ),
        // 房间数（数字）："3 стаи"
        rule("rooms", r"(?i)(\d+)\s*ста[ия]", |fields, caps| {
            if fields.rooms.is_none() {
                if let Ok(value) = caps[1].parse::<i32>() {
                    fields.rooms = Some(value);
                    return true;
                }
            }
            false
        }),
        // 房间数（词形）："двустаен апартамент"
        rule(
            "rooms",
            r"(?i)(едностаен|двустаен|тристаен|четиристаен|многостаен)",
            |fields, caps| {
                if fields.rooms.is_none() {
                    fields.rooms = Some(match caps[1].to_lowercase().as_str() {
                        "едностаен" => 1,
                        "двустаен" => 2,
                        "тристаен" => 3,
                        "четиристаен" => 4,
                        _ => 5,
                    });
                    return true;
                }
                false
            },
        ),
        // 所在楼层："етаж 4"、"ет. 4"
        rule("floor", r"(?i)ет(?:аж)?\.?\s*(\d+)", |fields, caps| {
            if fields.floor.is_none() {
                if let Ok(value) = caps[1].parse::<i32>() {
                    fields.floor = Some(value);
                    return true;
                }
            }
            false
        }),
        // 总楼层："от 8 етажа"、"8-етажна сграда"
        rule(
            "total_floors",
            r"(?i)(?:от\s+(\d+)\s*етажа|(\d+)[\s-]*етажна)",
            |fields, caps| {
                if fields.total_floors.is_none() {
                    let digits = caps.get(1).or_else(|| caps.get(2));
                    if let Some(value) = digits.and_then(|m| m.as_str().parse::<i32>().ok()) {
                        fields.total_floors = Some(value);
                        return true;
                    }
                }
                false
            },
        ),
        // 成交/标的价格："цена: 185 000 лв"、"продажна цена 94 500,50 евро"
        rule(
            "price",
            r"(?i)(?:продажна\s+)?цена[:\s]+(\d[\d\s]*(?:[.,]\d+)?)\s*(?:лв|лева|евро|eur|€)",
            |fields, caps| {
                if fields.price.is_none() {
                    if let Some(value) = parse_bg_number(&caps[1]) {
                        fields.price = Some(value);
                        return true;
                    }
                }
                false
            },
        ),
        // 所有人："собственик: Иван Петров"
        rule(
            "owner",
            r"(?i)собственик[:\s]+([^\n,;]+)",
            |fields, caps| {
                if fields.owner.is_none() {
                    let value = caps[1].trim();
                    if !value.is_empty() {
                        fields.owner = Some(value.to_string());
                        return true;
                    }
                }
                false
            },
        ),
        // 地籍标识："идентификатор 68134.900.123.1.5"、"кадастрален номер ..."
        rule(
            "cadastral_number",
            r"(?i)(?:идентификатор|кадастрален\s+номер)[:\s№]*([\d][\d.]+)",
            |fields, caps| {
                if fields.cadastral_number.is_none() {
                    fields.cadastral_number = Some(caps[1].trim_end_matches('.').to_string());
                    return true;
                }
                false
            },
        ),
        // 税务评估价："данъчна оценка: 48 200 лв"
        rule(
            "tax_assessment_value",
            r"(?i)данъчна\s+оценка[:\s]+(\d[\d\s]*(?:[.,]\d+)?)",
            |fields, caps| {
                if fields.tax_assessment_value.is_none() {
                    if let Some(value) = parse_bg_number(&caps[1]) {
                        fields.tax_assessment_value = Some(value);
                        return true;
                    }
                }
                false
            },
        ),
    ]
});

fn set_construction_year(fields: &mut ExtractedFields, caps: &Captures) -> bool {
    if fields.construction_year.is_none() {
        if let Ok(year) = caps[1].parse::<i32>() {
            fields.construction_year = Some(year);
            return true;
        }
    }
    false
}

fn set_address(fields: &mut ExtractedFields, caps: &Captures) -> bool {
    if fields.address.is_none() {
        let value = caps[1].trim().trim_end_matches(['.', ',']);
        if !value.is_empty() {
            fields.address = Some(value.to_string());
            return true;
        }
    }
    false
}

/// 入口：对OCR文本做结构化抽取，纯同步、无I/O
pub fn extract(text: &str) -> ExtractedFields {
    let mut fields = ExtractedFields::default();
    for rule in FIELD_RULES.iter() {
        if let Some(caps) = rule.pattern.captures(text) {
            if (rule.apply)(&mut fields, &caps) {
                tracing::trace!(event = "extract.field_matched", field = rule.field);
            }
        }
    }
    fields
}

/// 文档类型关键词，按固定优先级排列
const TYPE_KEYWORDS: [(&str, DocumentType); 3] = [
    ("нотариален акт", DocumentType::NotaryAct),
    ("скица", DocumentType::Sketch),
    ("данъчна оценка", DocumentType::TaxAssessment),
];

/// 文档类型判定：小写文本按优先级做子串匹配，首个命中即定型，无命中返回None
pub fn classify(text: &str) -> Option<DocumentType> {
    let lowered = text.to_lowercase();
    TYPE_KEYWORDS
        .iter()
        .find(|(keyword, _)| lowered.contains(keyword))
        .map(|(_, doc_type)| *doc_type)
}

/// 保加利亚语数字解析：逗号为小数点，空格/点为千位分隔
fn parse_bg_number(raw: &str) -> Option<f64> {
    let compact: String = raw.chars().filter(|c| !c.is_whitespace()).collect();
    let normalized = if compact.contains(',') {
        // "1.250,75" → "1250.75"
        compact.replace('.', "").replace(',', ".")
    } else {
        compact
    };
    normalized.parse::<f64>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extracts_synthetic_notary_text() {
        let text = "НОТАРИАЛЕН АКТ за покупко-продажба.\n\
                    Апартамент с площ 85 кв.м, построена през 1998 г.,\n\
                    адрес: гр. София, ж.к. Младост 1, бл. 25, ет. 4";
        let fields = extract(text);
        assert_eq!(fields.square_meters, Some(85.0));
        assert_eq!(fields.construction_year, Some(1998));
        assert_eq!(
            fields.address.as_deref(),
            Some("гр. София, ж.к. Младост 1, бл. 25, ет. 4")
        );
        assert_eq!(fields.floor, Some(4));
    }

    #[test]
    fn test_comma_decimal_and_thousand_separators() {
        let text = "застроена площ 85,50 кв. м, продажна цена 94 500,50 евро,\n\
                    данъчна оценка: 48 200 лв";
        let fields = extract(text);
        assert_eq!(fields.square_meters, Some(85.5));
        assert_eq!(fields.price, Some(94_500.5));
        assert_eq!(fields.tax_assessment_value, Some(48_200.0));
    }

    #[test]
    fn test_first_match_wins_per_field() {
        // 两种年份表述同时出现时，排前的规则（"построена през"）生效
        let text = "построена през 1987, година на строителство: 1990";
        let fields = extract(text);
        assert_eq!(fields.construction_year, Some(1987));

        // 词形房间数不覆盖已命中的数字房间数
        let text = "3 стаи, двустаен";
        assert_eq!(extract(text).rooms, Some(3));
    }

    #[test]
    fn test_word_form_rooms_and_total_floors() {
        let fields = extract("двустаен апартамент в 8-етажна сграда");
        assert_eq!(fields.rooms, Some(2));
        assert_eq!(fields.total_floors, Some(8));

        let fields = extract("таванско помещение от 14 етажа");
        assert_eq!(fields.total_floors, Some(14));
    }

    #[test]
    fn test_owner_and_cadastral_number() {
        let fields = extract(
            "собственик: Иван Петров, идентификатор 68134.900.123.1.5, скица № 1234",
        );
        assert_eq!(fields.owner.as_deref(), Some("Иван Петров"));
        assert_eq!(fields.cadastral_number.as_deref(), Some("68134.900.123.1.5"));
    }

    #[test]
    fn test_absent_fields_stay_unset() {
        let fields = extract("нечетлив текст без полезни данни");
        assert_eq!(fields, ExtractedFields::default());
    }

    #[test]
    fn test_classify_priority_order() {
        assert_eq!(
            classify("НОТАРИАЛЕН АКТ, приложена данъчна оценка"),
            Some(DocumentType::NotaryAct)
        );
        assert_eq!(
            classify("Скица на поземлен имот"),
            Some(DocumentType::Sketch)
        );
        assert_eq!(
            classify("удостоверение за данъчна оценка"),
            Some(DocumentType::TaxAssessment)
        );
        assert_eq!(classify("обикновен текст"), None);
    }
}
