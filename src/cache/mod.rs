//! Key-value cache used for artist ids, resolved songs and scraped lyrics.
//!
//! Keys are namespaced by prefix (`artist:`, `song:`, `lyrics:`). Values are
//! plain strings; callers encode what they need.

mod memory;
mod sqlite;

pub use memory::MemoryCache;
pub use sqlite::SqliteCache;

use crate::config::{CacheBackend, CacheConfig};
use async_trait::async_trait;
use std::sync::Arc;

#[async_trait]
pub trait Cache: Send + Sync {
    async fn get(&self, key: &str) -> anyhow::Result<Option<String>>;
    async fn set(&self, key: &str, value: &str) -> anyhow::Result<()>;
}

pub fn artist_key(artist: &str) -> String {
    format!("artist:{artist}")
}

pub fn lyrics_key(url: &str) -> String {
    format!("lyrics:{url}")
}

/// Build the cache backend selected in config.
pub fn open(cfg: &CacheConfig) -> anyhow::Result<Arc<dyn Cache>> {
    Ok(match cfg.backend {
        CacheBackend::Memory => Arc::new(MemoryCache::new(cfg.capacity)),
        CacheBackend::Sqlite => Arc::new(SqliteCache::open(&cfg.path)?),
    })
}

/// Read a key, treating backend failures as a miss.
pub async fn get_or_miss(cache: &dyn Cache, key: &str) -> Option<String> {
    match cache.get(key).await {
        Ok(v) => v,
        Err(e) => {
            tracing::warn!(key, error = %e, "cache read failed");
            None
        }
    }
}

/// Write a key, logging and swallowing backend failures.
pub async fn set_or_warn(cache: &dyn Cache, key: &str, value: &str) {
    if let Err(e) = cache.set(key, value).await {
        tracing::warn!(key, error = %e, "cache write failed");
    }
}

/// Write only when the key is absent; the first writer wins.
/// Concurrent writers may both land, which is fine for identical values.
pub async fn set_if_absent(cache: &dyn Cache, key: &str, value: &str) -> bool {
    if get_or_miss(cache, key).await.is_some() {
        return false;
    }
    set_or_warn(cache, key, value).await;
    true
}
