//! Lookup entry points: raw query in, `{lyricsUrl}` / `{lyrics}` or a typed error out.

use crate::cache::{self, Cache};
use crate::error::{LookupError, ProviderError};
use crate::lyrics::{self, PageSource};
use crate::normalize::{NormalizedQuery, normalize_with_channel};
use crate::resolver::{ResolvedSong, Resolver};
use serde::Serialize;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Successful result of a lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum LookupOutcome {
    Url {
        #[serde(rename = "lyricsUrl")]
        lyrics_url: String,
    },
    Lyrics {
        lyrics: String,
    },
}

impl From<ResolvedSong> for LookupOutcome {
    fn from(song: ResolvedSong) -> Self {
        match song.plain_lyrics {
            Some(lyrics) => LookupOutcome::Lyrics { lyrics },
            None => LookupOutcome::Url {
                lyrics_url: song.url,
            },
        }
    }
}

pub struct LyricsService {
    resolver: Resolver,
    pages: Arc<dyn PageSource>,
    cache: Arc<dyn Cache>,
    deadline: Duration,
}

impl LyricsService {
    pub fn new(
        resolver: Resolver,
        pages: Arc<dyn PageSource>,
        cache: Arc<dyn Cache>,
        deadline: Duration,
    ) -> Self {
        Self {
            resolver,
            pages,
            cache,
            deadline,
        }
    }

    /// Resolve a raw title to its canonical lyrics URL (or plain lyrics when
    /// the provider has them).
    pub async fn resolve_url(
        &self,
        raw: &str,
        channel: Option<&str>,
    ) -> Result<LookupOutcome, LookupError> {
        let query = parse_query(raw, channel)?;
        let song = self.with_deadline(self.resolve_cached(&query)).await?;
        Ok(song.into())
    }

    /// Resolve, then scrape the song page unless plain lyrics came with the detail.
    pub async fn lookup_lyrics(
        &self,
        raw: &str,
        channel: Option<&str>,
    ) -> Result<LookupOutcome, LookupError> {
        let query = parse_query(raw, channel)?;
        let lyrics = self
            .with_deadline(async {
                let song = self.resolve_cached(&query).await?;
                match song.plain_lyrics {
                    Some(text) => Ok(text),
                    None => self.scrape_cached(&song.url).await,
                }
            })
            .await?;
        Ok(LookupOutcome::Lyrics { lyrics })
    }

    /// Scrape lyrics from an already known song page.
    pub async fn lyrics_from_page(&self, page_url: &str) -> Result<LookupOutcome, LookupError> {
        let page_url = page_url.trim();
        if page_url.is_empty() {
            return Err(LookupError::InvalidInput("Missing url parameter".to_string()));
        }
        let lyrics = self.with_deadline(self.scrape_cached(page_url)).await?;
        Ok(LookupOutcome::Lyrics { lyrics })
    }

    async fn resolve_cached(&self, query: &NormalizedQuery) -> Result<ResolvedSong, LookupError> {
        let key = query.cache_key();
        if let Some(raw) = cache::get_or_miss(self.cache.as_ref(), &key).await {
            match serde_json::from_str::<ResolvedSong>(&raw) {
                Ok(song) => {
                    debug!(key = %key, url = %song.url, "resolution cache hit");
                    return Ok(song);
                }
                Err(e) => warn!(key = %key, error = %e, "discarding unreadable cached resolution"),
            }
        }

        let song = self.resolver.resolve(query).await?;
        match serde_json::to_string(&song) {
            Ok(raw) => cache::set_or_warn(self.cache.as_ref(), &key, &raw).await,
            Err(e) => warn!(error = %e, "serialize resolution for cache"),
        }
        Ok(song)
    }

    async fn scrape_cached(&self, page_url: &str) -> Result<String, LookupError> {
        let key = cache::lyrics_key(page_url);
        if let Some(text) = cache::get_or_miss(self.cache.as_ref(), &key).await {
            debug!(page_url, "lyrics cache hit");
            return Ok(text);
        }

        let html = self.pages.fetch_html(page_url).await?;
        match lyrics::extract_with_layout(&html) {
            Some((text, layout)) => {
                info!(page_url, ?layout, lines = text.lines().count(), "extracted lyrics");
                cache::set_or_warn(self.cache.as_ref(), &key, &text).await;
                Ok(text)
            }
            None => {
                warn!(page_url, html_bytes = html.len(), "page has no recognizable lyrics container");
                Err(LookupError::Extraction("Lyrics not found on page".to_string()))
            }
        }
    }

    /// Bound a whole lookup; on expiry the in-flight request is dropped.
    async fn with_deadline<T>(
        &self,
        fut: impl Future<Output = Result<T, LookupError>>,
    ) -> Result<T, LookupError> {
        match tokio::time::timeout(self.deadline, fut).await {
            Ok(result) => result,
            Err(_) => {
                warn!(deadline_ms = self.deadline.as_millis() as u64, "lookup deadline exceeded");
                Err(ProviderError::Deadline.into())
            }
        }
    }
}

fn parse_query(raw: &str, channel: Option<&str>) -> Result<NormalizedQuery, LookupError> {
    if raw.trim().is_empty() {
        return Err(LookupError::InvalidInput("Missing title parameter".to_string()));
    }
    Ok(normalize_with_channel(raw, channel))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryCache;
    use crate::error::ErrorKind;
    use crate::genius::SongDetail;
    use crate::resolver::ResolverOptions;
    use crate::resolver::traits::mocks::{MockApi, hit};
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const GODS_PLAN_URL: &str = "https://genius.com/Drake-gods-plan-lyrics";

    /// Serves one fixed response and counts fetches.
    struct MockPages {
        html: Result<String, reqwest::StatusCode>,
        delay: Duration,
        calls: AtomicUsize,
    }

    impl MockPages {
        fn html(html: &str) -> Self {
            Self {
                html: Ok(html.to_string()),
                delay: Duration::ZERO,
                calls: AtomicUsize::new(0),
            }
        }

        fn status(status: reqwest::StatusCode) -> Self {
            Self {
                html: Err(status),
                delay: Duration::ZERO,
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl PageSource for MockPages {
        async fn fetch_html(&self, _page_url: &str) -> Result<String, ProviderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            self.html.clone().map_err(ProviderError::Status)
        }
    }

    fn service(api: Arc<MockApi>, pages: Arc<MockPages>) -> LyricsService {
        let cache: Arc<dyn Cache> = Arc::new(MemoryCache::new(64));
        let resolver = Resolver::new(api, cache.clone(), ResolverOptions::default());
        LyricsService::new(resolver, pages, cache, Duration::from_secs(5))
    }

    fn gods_plan_api() -> MockApi {
        MockApi::with_hits(vec![hit(1, "Drake", "God's Plan")]).detail(1, GODS_PLAN_URL)
    }

    const PAGE: &str = r#"<div data-lyrics-container="true">Contributors<br>Yeah, they wishin' and wishin'<br>God's plan, God's plan</div>"#;

    #[tokio::test]
    async fn test_empty_query_is_invalid_without_network_calls() {
        let api = Arc::new(gods_plan_api());
        let pages = Arc::new(MockPages::html(PAGE));
        let svc = service(api.clone(), pages.clone());

        for raw in ["", "   "] {
            let err = svc.resolve_url(raw, None).await.unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidInput);
            assert_eq!(err.to_string(), "Missing title parameter");
            let err = svc.lookup_lyrics(raw, None).await.unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidInput);
        }
        assert_eq!(api.network_calls(), 0);
        assert_eq!(pages.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_resolve_url_shape() {
        let svc = service(Arc::new(gods_plan_api()), Arc::new(MockPages::html(PAGE)));

        let out = svc
            .resolve_url("Drake - God's Plan (Official Video)", None)
            .await
            .unwrap();
        assert_eq!(
            serde_json::to_value(&out).unwrap(),
            json!({ "lyricsUrl": GODS_PLAN_URL })
        );
    }

    #[tokio::test]
    async fn test_repeat_resolution_served_from_cache() {
        let api = Arc::new(gods_plan_api());
        let svc = service(api.clone(), Arc::new(MockPages::html(PAGE)));

        let first = svc.resolve_url("Drake - God's Plan", None).await.unwrap();
        let calls = api.network_calls();
        let second = svc.resolve_url("drake   -   GOD'S PLAN [HD]", None).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(api.network_calls(), calls);
    }

    #[tokio::test]
    async fn test_plain_lyrics_from_detail() {
        let mut api = MockApi::with_hits(vec![hit(1, "Drake", "God's Plan")]);
        api.details.insert(
            1,
            SongDetail {
                id: 1,
                url: GODS_PLAN_URL.to_string(),
                plain_lyrics: Some("God's plan, God's plan".to_string()),
            },
        );
        let pages = Arc::new(MockPages::html(PAGE));
        let svc = service(Arc::new(api), pages.clone());

        let out = svc.resolve_url("Drake - God's Plan", None).await.unwrap();
        assert_eq!(
            serde_json::to_value(&out).unwrap(),
            json!({ "lyrics": "God's plan, God's plan" })
        );
        // no scrape needed either
        svc.lookup_lyrics("Drake - God's Plan", None).await.unwrap();
        assert_eq!(pages.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_lookup_lyrics_scrapes_once() {
        let pages = Arc::new(MockPages::html(PAGE));
        let svc = service(Arc::new(gods_plan_api()), pages.clone());

        let out = svc.lookup_lyrics("Drake - God's Plan", None).await.unwrap();
        assert_eq!(
            out,
            LookupOutcome::Lyrics {
                lyrics: "Yeah, they wishin' and wishin'\nGod's plan, God's plan".to_string()
            }
        );
        let again = svc.lookup_lyrics("Drake - God's Plan", None).await.unwrap();
        assert_eq!(out, again);
        assert_eq!(pages.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_page_without_container_is_extraction_failure() {
        let svc = service(
            Arc::new(gods_plan_api()),
            Arc::new(MockPages::html("<html><body>Captcha</body></html>")),
        );
        let err = svc.lyrics_from_page(GODS_PLAN_URL).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ExtractionFailure);
        assert_eq!(err.to_string(), "Lyrics not found on page");
        assert_eq!(err.exit_code(), 1);
    }

    #[tokio::test]
    async fn test_page_fetch_failure_is_provider_error() {
        let svc = service(
            Arc::new(gods_plan_api()),
            Arc::new(MockPages::status(reqwest::StatusCode::BAD_GATEWAY)),
        );
        let err = svc.lyrics_from_page(GODS_PLAN_URL).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ProviderError);

        let err = svc.lyrics_from_page("  ").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
    }

    #[tokio::test]
    async fn test_not_found_is_not_provider_error() {
        let svc = service(
            Arc::new(MockApi::default()),
            Arc::new(MockPages::html(PAGE)),
        );
        let err = svc.resolve_url("Nobody Known - Some Song", None).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_channel_hint_supplies_artist() {
        let svc = service(Arc::new(gods_plan_api()), Arc::new(MockPages::html(PAGE)));
        let out = svc
            .resolve_url("God's Plan (Official Video)", Some("DrakeVEVO"))
            .await
            .unwrap();
        assert_eq!(
            out,
            LookupOutcome::Url {
                lyrics_url: GODS_PLAN_URL.to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_deadline_aborts_slow_scrape() {
        let pages = Arc::new(MockPages {
            delay: Duration::from_secs(30),
            ..MockPages::html(PAGE)
        });
        let cache: Arc<dyn Cache> = Arc::new(MemoryCache::new(8));
        let resolver = Resolver::new(
            Arc::new(gods_plan_api()),
            cache.clone(),
            ResolverOptions::default(),
        );
        let svc = LyricsService::new(resolver, pages, cache, Duration::from_millis(20));

        let err = svc.lyrics_from_page(GODS_PLAN_URL).await.unwrap_err();
        assert!(matches!(err, LookupError::Provider(ProviderError::Deadline)));
    }
}
