//! 房间图像分类接口
//! 当前为桩实现：返回合理的随机结果，接口保持可注入，
//! 后续替换为真实模型时调用方无需改动

use anyhow::Result;
use async_trait::async_trait;
use rand::seq::SliceRandom;
use rand::Rng;

use crate::model::evaluation::RoomClassification;

/// 房间分类器 - 可注入接口
#[async_trait]
pub trait RoomClassifier: Send + Sync {
    /// 对单张房间照片做类型分类
    async fn classify_room(&self, image: &[u8]) -> Result<RoomClassification>;
}

const ROOM_TYPES: [&str; 6] = [
    "дневна",
    "спалня",
    "кухня",
    "баня",
    "коридор",
    "тераса",
];

const ROOM_FEATURES: [&str; 6] = [
    "естествена светлина",
    "ламиниран паркет",
    "вградено осветление",
    "климатик",
    "PVC дограма",
    "свеж ремонт",
];

/// 桩分类器：固定词表内随机取值
pub struct MockRoomClassifier;

impl MockRoomClassifier {
    pub fn new() -> Self {
        Self
    }
}

impl Default for MockRoomClassifier {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RoomClassifier for MockRoomClassifier {
    async fn classify_room(&self, image: &[u8]) -> Result<RoomClassification> {
        anyhow::ensure!(!image.is_empty(), "изображението е празно");

        let mut rng = rand::thread_rng();
        let room_type = ROOM_TYPES
            .choose(&mut rng)
            .expect("room type table is non-empty")
            .to_string();
        let feature_count = rng.gen_range(1..=3);
        let features = ROOM_FEATURES
            .choose_multiple(&mut rng, feature_count)
            .map(|s| s.to_string())
            .collect();

        Ok(RoomClassification {
            room_type,
            confidence: rng.gen_range(0.6..0.95),
            features,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_classifier_returns_plausible_values() {
        let classifier = MockRoomClassifier::new();
        let result = classifier.classify_room(&[0xFF, 0xD8, 0xFF]).await.unwrap();
        assert!(ROOM_TYPES.contains(&result.room_type.as_str()));
        assert!((0.0..=1.0).contains(&result.confidence));
        assert!(!result.features.is_empty() && result.features.len() <= 3);
    }

    #[tokio::test]
    async fn test_mock_classifier_rejects_empty_image() {
        let classifier = MockRoomClassifier::new();
        assert!(classifier.classify_room(&[]).await.is_err());
    }
}
