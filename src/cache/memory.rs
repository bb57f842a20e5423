use super::Cache;
use async_trait::async_trait;
use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::Mutex;

/// Process-lifetime cache with least-recently-used eviction.
pub struct MemoryCache {
    entries: Mutex<LruCache<String, String>>,
}

impl MemoryCache {
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
        }
    }
}

#[async_trait]
impl Cache for MemoryCache {
    async fn get(&self, key: &str) -> anyhow::Result<Option<String>> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| anyhow::anyhow!("memory cache lock poisoned"))?;
        Ok(entries.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> anyhow::Result<()> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| anyhow::anyhow!("memory cache lock poisoned"))?;
        entries.put(key.to_string(), value.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_get_set() {
        let cache = MemoryCache::new(4);
        assert_eq!(cache.get("a").await.unwrap(), None);
        cache.set("a", "1").await.unwrap();
        assert_eq!(cache.get("a").await.unwrap().as_deref(), Some("1"));
    }

    #[tokio::test]
    async fn test_evicts_least_recently_used() {
        let cache = MemoryCache::new(2);
        cache.set("a", "1").await.unwrap();
        cache.set("b", "2").await.unwrap();
        // touch "a" so "b" is the eviction candidate
        cache.get("a").await.unwrap();
        cache.set("c", "3").await.unwrap();

        assert!(cache.get("a").await.unwrap().is_some());
        assert!(cache.get("b").await.unwrap().is_none());
        assert!(cache.get("c").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_zero_capacity_still_holds_one() {
        let cache = MemoryCache::new(0);
        cache.set("a", "1").await.unwrap();
        assert_eq!(cache.get("a").await.unwrap().as_deref(), Some("1"));
    }
}
