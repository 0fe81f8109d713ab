use std::collections::HashMap;
use std::time::{Duration, Instant};

use serde_json::Value;
use tokio::sync::Mutex;

/// Formatted api responses, kept for a fixed time to live.
pub struct ResponseCache {
    ttl: Duration,
    entries: Mutex<HashMap<String, (Instant, Value)>>,
}

impl ResponseCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub async fn get(&self, key: &str) -> Option<Value> {
        let mut entries = self.entries.lock().await;
        let (stored, value) = entries.get(key)?;
        if stored.elapsed() < self.ttl {
            return Some(value.clone());
        }
        entries.remove(key);
        None
    }

    pub async fn insert(&self, key: String, value: Value) {
        let mut entries = self.entries.lock().await;
        let ttl = self.ttl;
        entries.retain(|_, (stored, _)| stored.elapsed() < ttl);
        entries.insert(key, (Instant::now(), value));
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use serde_json::json;

    use crate::api::model::response_cache::ResponseCache;

    #[tokio::test]
    async fn test_cache_hit_and_expiry() {
        let cache = ResponseCache::new(Duration::from_secs(60));
        cache.insert("stream-a".to_string(), json!({"streams": []})).await;
        assert_eq!(cache.get("stream-a").await, Some(json!({"streams": []})));
        assert!(cache.get("stream-b").await.is_none());

        let expired = ResponseCache::new(Duration::ZERO);
        expired.insert("stream-a".to_string(), json!(null)).await;
        assert!(expired.get("stream-a").await.is_none());
    }
}
