//! 地理编码结果缓存
//! 按输入串精确记忆的有界LRU，进程级共享、可注入

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use crate::model::geo::GeocodedAddress;

/// 有界LRU缓存
///
/// 并发填充同一键是良性竞争：值一旦算出即不可变，后写覆盖先写
pub struct GeocodeCache {
    inner: Mutex<CacheInner>,
}

struct CacheInner {
    capacity: usize,
    map: HashMap<String, GeocodedAddress>,
    /// 访问顺序，队首最旧
    order: VecDeque<String>,
}

impl GeocodeCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Mutex::new(CacheInner {
                capacity: capacity.max(1),
                map: HashMap::new(),
                order: VecDeque::new(),
            }),
        }
    }

    /// 命中时将键提升为最新
    pub fn get(&self, key: &str) -> Option<GeocodedAddress> {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        let value = inner.map.get(key).cloned()?;
        inner.order.retain(|k| k != key);
        inner.order.push_back(key.to_string());
        Some(value)
    }

    pub fn put(&self, key: &str, value: GeocodedAddress) {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        if inner.map.insert(key.to_string(), value).is_none() {
            inner.order.push_back(key.to_string());
        } else {
            inner.order.retain(|k| k != key);
            inner.order.push_back(key.to_string());
        }

        while inner.order.len() > inner.capacity {
            if let Some(oldest) = inner.order.pop_front() {
                inner.map.remove(&oldest);
                tracing::trace!(event = "geo.cache.evicted", key = %oldest);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.inner.lock().unwrap_or_else(|e| e.into_inner()).map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hit(name: &str) -> GeocodedAddress {
        GeocodedAddress {
            lat: 42.7,
            lng: 23.3,
            display_name: name.to_string(),
        }
    }

    #[test]
    fn test_get_returns_cached_value() {
        let cache = GeocodeCache::new(4);
        assert!(cache.get("София").is_none());
        cache.put("София", hit("гр. София"));
        assert_eq!(cache.get("София").unwrap().display_name, "гр. София");
    }

    #[test]
    fn test_capacity_evicts_least_recently_used() {
        let cache = GeocodeCache::new(2);
        cache.put("a", hit("a"));
        cache.put("b", hit("b"));
        // 触碰a使其最新，随后插入c应淘汰b
        cache.get("a");
        cache.put("c", hit("c"));

        assert!(cache.get("a").is_some());
        assert!(cache.get("b").is_none());
        assert!(cache.get("c").is_some());
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_overwrite_does_not_grow() {
        let cache = GeocodeCache::new(2);
        cache.put("a", hit("old"));
        cache.put("a", hit("new"));
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get("a").unwrap().display_name, "new");
    }
}
