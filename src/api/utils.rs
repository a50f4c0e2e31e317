//! API工具函数模块
//! 包含API处理中使用的共享工具函数

use chrono::Utc;
use nanoid::nanoid;

const RECORD_ID_RANDOM_ALPHABET: &[char] = &[
    '0', '1', '2', '3', '4', '5', '6', '7', '8', '9', 'A', 'B', 'C', 'D', 'E', 'F', 'G', 'H', 'J',
    'K', 'L', 'M', 'N', 'P', 'Q', 'R', 'S', 'T', 'U', 'V', 'W', 'X', 'Y', 'Z',
];
const RECORD_ID_RANDOM_LEN: usize = 8;

/// 生成记录ID
///
/// 格式：{13位毫秒时间戳}{8位大写随机码}
/// 总长度：21 字符，首位必为数字，按时间近似有序
pub fn generate_record_id() -> String {
    let timestamp = format!("{:013}", Utc::now().timestamp_millis().abs());
    let random = nanoid!(RECORD_ID_RANDOM_LEN, RECORD_ID_RANDOM_ALPHABET);
    format!("{}{}", timestamp, random)
}

/// 将置信度收敛到 [0,1]
pub fn clamp_unit_confidence(value: f64) -> f64 {
    value.clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_record_id() {
        let id = generate_record_id();
        assert!(id.chars().next().unwrap().is_ascii_digit());
        assert_eq!(id.len(), 13 + RECORD_ID_RANDOM_LEN);
    }

    #[test]
    fn test_record_ids_are_unique() {
        let a = generate_record_id();
        let b = generate_record_id();
        assert_ne!(a, b);
    }

    #[test]
    fn test_clamp_unit_confidence() {
        assert_eq!(clamp_unit_confidence(1.7), 1.0);
        assert_eq!(clamp_unit_confidence(-0.2), 0.0);
        assert_eq!(clamp_unit_confidence(0.42), 0.42);
    }
}
