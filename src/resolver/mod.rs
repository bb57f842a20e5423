//! Song resolution
//!
//! Turns a [`NormalizedQuery`] into a canonical song URL:
//! 1. full-text search, keeping only song hits not credited to translation pages
//! 2. confident match: artist and title both contain the query segments
//! 3. canonical URL from the detail endpoint
//! 4. otherwise scan the artist's catalog, with the artist id taken from the
//!    cache or the seed table

pub mod traits;

pub use traits::MetadataApi;

use crate::cache::{self, Cache};
use crate::error::{LookupError, ProviderError};
use crate::genius::{CandidateHit, CatalogSong};
use crate::normalize::{NormalizedQuery, match_form};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Artist credits used by community translation pages. Matched as
/// substrings of the folded artist name.
pub const TRANSLATION_MARKERS: &[&str] = &[
    "translation",
    "traduccion",
    "traducao",
    "traduction",
    "traduzion",
    "ubersetzung",
    "tłumaczeni",
    "ceviri",
    "romanization",
    "перевод",
    "переклад",
    "翻译",
    "翻譯",
    "翻訳",
    "번역",
    "ترجمة",
    "תרגום",
];

/// Markers in the same folded form as the artist names they are matched
/// against. NFKD splits Hangul syllables into jamo, so "번역" must be folded too.
static FOLDED_MARKERS: Lazy<Vec<String>> =
    Lazy::new(|| TRANSLATION_MARKERS.iter().map(|m| match_form(m)).collect());

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    Search,
    Catalog,
}

/// Final output of a resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedSong {
    pub id: u64,
    pub url: String,
    /// Present when the provider's detail record carried plain lyrics.
    #[serde(default)]
    pub plain_lyrics: Option<String>,
    pub strategy: Strategy,
}

#[derive(Debug, Clone)]
pub struct ResolverOptions {
    pub catalog_page_size: u32,
    /// Upper bound on catalog pages fetched per resolution.
    pub catalog_max_pages: u32,
    /// Normalized artist name -> provider artist id, consulted on cache miss.
    pub seed_artists: BTreeMap<String, u64>,
}

impl Default for ResolverOptions {
    fn default() -> Self {
        Self {
            catalog_page_size: 50,
            catalog_max_pages: 3,
            seed_artists: crate::config::defaults::seed_artists(),
        }
    }
}

pub struct Resolver {
    api: Arc<dyn MetadataApi>,
    cache: Arc<dyn Cache>,
    options: ResolverOptions,
}

pub fn is_translation_artist(artist_name: &str) -> bool {
    let folded = match_form(artist_name);
    FOLDED_MARKERS.iter().any(|m| folded.contains(m.as_str()))
}

/// Song hits only, minus translation pages. Provider order is kept.
pub fn filter_song_hits(hits: Vec<CandidateHit>) -> Vec<CandidateHit> {
    hits.into_iter()
        .filter(|h| h.is_song() && !is_translation_artist(&h.primary_artist_name))
        .collect()
}

/// Best hit for `query` among already filtered hits.
///
/// With a song segment, the first hit whose artist contains the query artist
/// and whose title contains the query song. Without one, the top hit.
pub fn select_best_match<'a>(
    query: &NormalizedQuery,
    hits: &'a [CandidateHit],
) -> Option<&'a CandidateHit> {
    if query.song.is_empty() {
        return hits.first();
    }
    hits.iter().find(|h| {
        match_form(&h.primary_artist_name).contains(&query.artist)
            && match_form(&h.title).contains(&query.song)
    })
}

/// Nothing resolved: a provider failure along the way means "try again later".
fn exhausted(failure: Option<ProviderError>, message: &str) -> LookupError {
    match failure {
        Some(e) => LookupError::Provider(e),
        None => LookupError::NotFound(message.to_string()),
    }
}

impl Resolver {
    pub fn new(api: Arc<dyn MetadataApi>, cache: Arc<dyn Cache>, options: ResolverOptions) -> Self {
        Self {
            api,
            cache,
            options,
        }
    }

    pub async fn resolve(&self, query: &NormalizedQuery) -> Result<ResolvedSong, LookupError> {
        if query.is_empty() {
            return Err(LookupError::InvalidInput("Missing title parameter".to_string()));
        }
        info!(artist = %query.artist, song = %query.song, "resolving");

        let mut failure: Option<ProviderError> = None;

        let hits = match self.api.search(&query.search_text()).await {
            Ok(hits) => filter_song_hits(hits),
            Err(e) => {
                warn!(error = %e, "search failed, falling back to catalog");
                failure = Some(e);
                Vec::new()
            }
        };
        for (i, h) in hits.iter().enumerate() {
            debug!("[{i}] {} - {} ({})", h.primary_artist_name, h.title, h.url);
        }
        self.remember_artist(query, &hits).await;

        if let Some(hit) = select_best_match(query, &hits) {
            match self.api.song_detail(hit.id).await {
                Ok(detail) => {
                    info!(url = %detail.url, "resolved via search");
                    return Ok(ResolvedSong {
                        id: detail.id,
                        url: detail.url,
                        plain_lyrics: detail.plain_lyrics,
                        strategy: Strategy::Search,
                    });
                }
                Err(e) => {
                    warn!(song_id = hit.id, error = %e, "detail fetch failed");
                    failure = Some(e);
                }
            }
        }

        if query.song.is_empty() {
            // An artist-only query has nothing to pick from a catalog with.
            return Err(exhausted(failure, "Lyrics not found and no fallback available"));
        }

        match self.catalog_scan(query).await {
            Ok(Some(song)) => {
                info!(url = %song.url, "resolved via artist catalog");
                Ok(ResolvedSong {
                    id: song.id,
                    url: song.url,
                    plain_lyrics: None,
                    strategy: Strategy::Catalog,
                })
            }
            Ok(None) => Err(exhausted(failure, "Lyrics not found from artist fallback")),
            Err(e) => {
                warn!(error = %e, "catalog scan failed");
                Err(exhausted(Some(e), ""))
            }
        }
    }

    /// Learn the artist id from a hit credited to exactly the query artist.
    async fn remember_artist(&self, query: &NormalizedQuery, hits: &[CandidateHit]) {
        let learned = hits.iter().find_map(|h| {
            let id = h.primary_artist_id?;
            (match_form(&h.primary_artist_name) == query.artist).then_some(id)
        });
        if let Some(id) = learned
            && cache::set_if_absent(
                self.cache.as_ref(),
                &cache::artist_key(&query.artist),
                &id.to_string(),
            )
            .await
        {
            debug!(artist = %query.artist, artist_id = id, "cached artist id");
        }
    }

    /// Cache first, then the seed table.
    async fn artist_id(&self, artist: &str) -> Option<u64> {
        let key = cache::artist_key(artist);
        if let Some(raw) = cache::get_or_miss(self.cache.as_ref(), &key).await {
            match raw.parse::<u64>() {
                Ok(id) => return Some(id),
                Err(_) => warn!(key = %key, value = %raw, "ignoring malformed cached artist id"),
            }
        }
        let id = *self.options.seed_artists.get(artist)?;
        cache::set_if_absent(self.cache.as_ref(), &key, &id.to_string()).await;
        Some(id)
    }

    /// Page through the artist's catalog looking for the query song.
    async fn catalog_scan(
        &self,
        query: &NormalizedQuery,
    ) -> Result<Option<CatalogSong>, ProviderError> {
        let Some(artist_id) = self.artist_id(&query.artist).await else {
            warn!(artist = %query.artist, "no artist id known, catalog fallback unavailable");
            return Ok(None);
        };

        for page in 1..=self.options.catalog_max_pages.max(1) {
            let listing = self
                .api
                .artist_songs(artist_id, page, self.options.catalog_page_size)
                .await?;
            debug!(artist_id, page, songs = listing.songs.len(), "catalog page");

            if let Some(song) = listing
                .songs
                .into_iter()
                .find(|s| match_form(&s.title).contains(&query.song))
            {
                return Ok(Some(song));
            }
            if !listing.has_next_page {
                break;
            }
        }

        warn!(artist_id, song = %query.song, "no title match in artist catalog");
        Ok(None)
    }
}
