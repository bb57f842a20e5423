//! Seam between the resolver and the metadata provider.
//!
//! Production code uses [`GeniusClient`]; tests substitute [`mocks::MockApi`].

use async_trait::async_trait;

use crate::error::ProviderError;
use crate::genius::{ArtistSongsPage, CandidateHit, GeniusClient, SongDetail};

#[async_trait]
pub trait MetadataApi: Send + Sync {
    /// Free-text search, best effort ranking, no pagination.
    async fn search(&self, text: &str) -> Result<Vec<CandidateHit>, ProviderError>;

    /// Canonical detail for a known song id.
    async fn song_detail(&self, id: u64) -> Result<SongDetail, ProviderError>;

    /// One title-sorted page of an artist's catalog. Pages start at 1.
    async fn artist_songs(
        &self,
        artist_id: u64,
        page: u32,
        per_page: u32,
    ) -> Result<ArtistSongsPage, ProviderError>;
}

#[async_trait]
impl MetadataApi for GeniusClient {
    async fn search(&self, text: &str) -> Result<Vec<CandidateHit>, ProviderError> {
        self.search(text).await
    }

    async fn song_detail(&self, id: u64) -> Result<SongDetail, ProviderError> {
        self.song_detail(id).await
    }

    async fn artist_songs(
        &self,
        artist_id: u64,
        page: u32,
        per_page: u32,
    ) -> Result<ArtistSongsPage, ProviderError> {
        self.artist_songs(artist_id, page, per_page).await
    }
}
