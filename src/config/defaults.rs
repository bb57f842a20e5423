use super::{CacheConfig, Config, GeniusConfig, HttpConfig, ScrapeConfig};
use std::collections::BTreeMap;

/// Artists whose provider ids are known up front, so the catalog fallback
/// works before the cache has learned anything.
pub const SEED_ARTISTS: &[(&str, u64)] = &[
    ("lil tecca", 213210),
    ("yeat", 2193783),
    ("drake", 130),
    ("kendrick lamar", 1421),
];

pub fn defaults() -> Config {
    Config {
        genius: GeniusConfig::default(),
        http: HttpConfig::default(),
        scrape: ScrapeConfig::default(),
        cache: CacheConfig::default(),
        artists: seed_artists(),
    }
}

pub fn seed_artists() -> BTreeMap<String, u64> {
    SEED_ARTISTS
        .iter()
        .map(|(name, id)| (name.to_string(), *id))
        .collect()
}
