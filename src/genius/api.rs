//! Genius API client
//!
//! Search, song detail and paged artist catalogs.
//! API Documentation: https://docs.genius.com

use crate::config::{GeniusConfig, HttpConfig};
use crate::error::ProviderError;
use crate::genius::models::{
    ArtistSongsPage, ArtistSongsResponse, CandidateHit, Envelope, SearchResponse, SongDetail,
    SongResponse,
};
use anyhow::Context;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue, USER_AGENT};
use serde::de::DeserializeOwned;
use std::sync::Arc;

#[derive(Debug)]
struct Inner {
    http: reqwest::Client,
    base_url: String,
}

#[derive(Debug, Clone)]
pub struct GeniusClient {
    inner: Arc<Inner>,
}

impl GeniusClient {
    pub fn new(
        genius: &GeniusConfig,
        http: &HttpConfig,
        access_token: Option<&str>,
    ) -> anyhow::Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&http.user_agent).context("user agent header")?,
        );
        if let Some(token) = access_token.filter(|t| !t.is_empty()) {
            let mut v = HeaderValue::from_str(&format!("Bearer {token}"))
                .context("authorization header")?;
            v.set_sensitive(true);
            headers.insert(AUTHORIZATION, v);
        }

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(http.timeout())
            .build()
            .context("build reqwest client")?;

        Ok(Self {
            inner: Arc::new(Inner {
                http: client,
                base_url: genius.api_base.trim_end_matches('/').to_string(),
            }),
        })
    }

    /// Full-text search; hits come back in the provider's relevance order.
    pub async fn search(&self, text: &str) -> Result<Vec<CandidateHit>, ProviderError> {
        let url = format!("{}/search?q={}", self.inner.base_url, urlencoding::encode(text));
        let body = self.get_text(&url).await?;
        parse_search(&body)
    }

    pub async fn song_detail(&self, id: u64) -> Result<SongDetail, ProviderError> {
        let url = format!("{}/songs/{id}?text_format=plain", self.inner.base_url);
        let body = self.get_text(&url).await?;
        parse_song(&body)
    }

    /// One page of an artist's catalog, title-sorted. Pages start at 1.
    pub async fn artist_songs(
        &self,
        artist_id: u64,
        page: u32,
        per_page: u32,
    ) -> Result<ArtistSongsPage, ProviderError> {
        let url = format!(
            "{}/artists/{artist_id}/songs?per_page={per_page}&page={page}&sort=title",
            self.inner.base_url
        );
        let body = self.get_text(&url).await?;
        parse_artist_songs(&body)
    }

    async fn get_text(&self, url: &str) -> Result<String, ProviderError> {
        let response = self.inner.http.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ProviderError::Status(status));
        }
        Ok(response.text().await?)
    }
}

fn decode<T: DeserializeOwned>(body: &str) -> Result<T, ProviderError> {
    serde_json::from_str::<Envelope<T>>(body)
        .map(|e| e.response)
        .map_err(|e| ProviderError::Malformed(e.to_string()))
}

pub(crate) fn parse_search(body: &str) -> Result<Vec<CandidateHit>, ProviderError> {
    let r: SearchResponse = decode(body)?;
    Ok(r.hits.into_iter().filter_map(CandidateHit::from_raw).collect())
}

pub(crate) fn parse_song(body: &str) -> Result<SongDetail, ProviderError> {
    let r: SongResponse = decode(body)?;
    Ok(r.song.into())
}

pub(crate) fn parse_artist_songs(body: &str) -> Result<ArtistSongsPage, ProviderError> {
    let r: ArtistSongsResponse = decode(body)?;
    Ok(r.into())
}
