//! Lyrics metadata provider (genius.com)

pub mod api;
pub mod models;

pub use api::GeniusClient;
pub use models::{ArtistSongsPage, CandidateHit, CatalogSong, SongDetail};
