use serde::{Deserialize, Serialize};

/// 地理坐标点
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

/// 地理编码结果
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeocodedAddress {
    pub lat: f64,
    pub lng: f64,
    pub display_name: String,
}

impl GeocodedAddress {
    pub fn point(&self) -> GeoPoint {
        GeoPoint {
            lat: self.lat,
            lng: self.lng,
        }
    }
}

/// 周边设施类别 - 固定四类
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaceCategory {
    Transport,
    Education,
    Shopping,
    Leisure,
}

impl PlaceCategory {
    pub const ALL: [PlaceCategory; 4] = [
        PlaceCategory::Transport,
        PlaceCategory::Education,
        PlaceCategory::Shopping,
        PlaceCategory::Leisure,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PlaceCategory::Transport => "transport",
            PlaceCategory::Education => "education",
            PlaceCategory::Shopping => "shopping",
            PlaceCategory::Leisure => "leisure",
        }
    }

    /// 类别对应的设施种类（上游 places 接口的 type 取值）
    pub fn place_kinds(&self) -> &'static [&'static str] {
        match self {
            PlaceCategory::Transport => &["bus_station", "subway_station"],
            PlaceCategory::Education => &["school", "university"],
            PlaceCategory::Shopping => &["shopping_mall", "supermarket"],
            PlaceCategory::Leisure => &["park", "gym"],
        }
    }
}

/// 周边设施条目（含到原点的大圆距离）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NearbyPlaceInfo {
    pub name: String,
    pub category: PlaceCategory,
    pub location: GeoPoint,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rating: Option<f64>,
    pub distance_m: f64,
}
