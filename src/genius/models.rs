use serde::Deserialize;

/// Every API payload is wrapped as `{"meta": {...}, "response": {...}}`.
#[derive(Debug, Deserialize)]
pub(crate) struct Envelope<T> {
    pub response: T,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SearchResponse {
    #[serde(default)]
    pub hits: Vec<RawHit>,
}

/// `result` is left undecoded: its shape depends on `type` (song, user,
/// artist, ...), and only song results are of interest.
#[derive(Debug, Deserialize)]
pub(crate) struct RawHit {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub result: serde_json::Value,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawSong {
    pub id: u64,
    #[serde(default)]
    pub title: String,
    pub url: String,
    #[serde(default)]
    pub primary_artist: Option<RawArtist>,
    #[serde(default)]
    pub lyrics: Option<RawLyrics>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawArtist {
    pub id: u64,
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawLyrics {
    pub plain: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SongResponse {
    pub song: RawSong,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ArtistSongsResponse {
    #[serde(default)]
    pub songs: Vec<RawSong>,
    pub next_page: Option<u32>,
}

/// A single search result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateHit {
    pub id: u64,
    /// Result type as reported by the provider; only `"song"` hits are matchable.
    pub kind: String,
    pub primary_artist_name: String,
    pub primary_artist_id: Option<u64>,
    pub title: String,
    pub url: String,
}

impl CandidateHit {
    pub fn is_song(&self) -> bool {
        self.kind == "song"
    }

    /// Song hits whose result decodes; everything else is skipped.
    pub(crate) fn from_raw(hit: RawHit) -> Option<Self> {
        if hit.kind != "song" {
            return None;
        }
        let song: RawSong = match serde_json::from_value(hit.result) {
            Ok(song) => song,
            Err(e) => {
                tracing::debug!(error = %e, "skipping undecodable song hit");
                return None;
            }
        };
        let (primary_artist_name, primary_artist_id) = match song.primary_artist {
            Some(a) => (a.name, Some(a.id)),
            None => (String::new(), None),
        };
        Some(Self {
            id: song.id,
            kind: hit.kind,
            primary_artist_name,
            primary_artist_id,
            title: song.title,
            url: song.url,
        })
    }
}

/// Canonical record for a known song id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SongDetail {
    pub id: u64,
    pub url: String,
    pub plain_lyrics: Option<String>,
}

impl From<RawSong> for SongDetail {
    fn from(song: RawSong) -> Self {
        Self {
            id: song.id,
            url: song.url,
            plain_lyrics: song
                .lyrics
                .and_then(|l| l.plain)
                .filter(|p| !p.trim().is_empty()),
        }
    }
}

/// One entry of an artist's song catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogSong {
    pub id: u64,
    pub title: String,
    pub url: String,
}

/// One page of an artist's catalog.
#[derive(Debug, Clone, Default)]
pub struct ArtistSongsPage {
    pub songs: Vec<CatalogSong>,
    pub has_next_page: bool,
}

impl From<ArtistSongsResponse> for ArtistSongsPage {
    fn from(r: ArtistSongsResponse) -> Self {
        Self {
            songs: r
                .songs
                .into_iter()
                .map(|s| CatalogSong {
                    id: s.id,
                    title: s.title,
                    url: s.url,
                })
                .collect(),
            has_next_page: r.next_page.is_some(),
        }
    }
}
